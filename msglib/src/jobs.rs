/*
 * msgview - jobs executor
 *
 * Copyright 2024 msgview contributors
 *
 * This file is part of msgview.
 *
 * msgview is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * msgview is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with msgview. If not, see <http://www.gnu.org/licenses/>.
 */

//! Async job executor thread pool

use std::{
    borrow::Cow,
    future::Future,
    iter,
    panic::catch_unwind,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

use crossbeam::{
    deque::{Injector, Stealer, Worker},
    sync::{Parker, Unparker},
};
pub use futures::channel::oneshot;
use indexmap::IndexMap;

use crate::{
    error::{Error, Result},
    utils::datetime::{self, UnixTimestamp},
};

type AsyncTask = async_task::Runnable;

#[derive(Clone, Debug)]
struct FinishedTimestamp(Arc<Mutex<UnixTimestamp>>);

impl FinishedTimestamp {
    fn finished(&self) -> Option<UnixTimestamp> {
        match self.0.lock() {
            Ok(v) if *v == 0 => None,
            Ok(v) => Some(*v),
            Err(poison) => {
                let guard = poison.into_inner();
                Some(*guard)
            }
        }
    }

    fn set_finished(&self, new_value: Option<UnixTimestamp>) {
        let new_value = new_value.unwrap_or_default();
        match self.0.lock() {
            Ok(mut f) => *f = new_value,
            Err(poison) => {
                let mut guard = poison.into_inner();
                *guard = new_value;
            }
        }
    }
}

fn find_task(
    local: &Worker<Job>,
    global: &Injector<Job>,
    stealers: &[Stealer<Job>],
) -> Option<Job> {
    // Pop a task from the local queue, if not empty.
    local.pop().or_else(|| {
        // Otherwise, we need to look for a task elsewhere.
        iter::repeat_with(|| {
            // Try stealing a batch of tasks from the global queue.
            global
                .steal_batch_and_pop(local)
                // Or try stealing a task from one of the other threads.
                .or_else(|| stealers.iter().map(|s| s.steal()).collect())
        })
        // Loop while no task was stolen and any steal operation needs to be retried.
        .find(|s| !s.is_retry())
        // Extract the stolen task, if there is one.
        .and_then(|s| s.success())
    })
}

uuid_hash_type!(JobId);

/// A spawned future and its current state.
pub struct Job {
    task: AsyncTask,
    id: JobId,
    desc: Cow<'static, str>,
}

#[derive(Clone, Debug)]
/// A spawned future's metadata for book-keeping.
pub struct JobMetadata {
    id: JobId,
    desc: Cow<'static, str>,
    started: UnixTimestamp,
    finished: FinishedTimestamp,
}

impl JobMetadata {
    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.desc
    }

    pub fn started(&self) -> UnixTimestamp {
        self.started
    }

    pub fn finished(&self) -> Option<UnixTimestamp> {
        self.finished.finished()
    }
}

/// Runs spawned futures on a pool of worker threads, one per available CPU.
///
/// Workers stop once the executor is dropped.
#[derive(Debug)]
pub struct JobExecutor {
    global_queue: Arc<Injector<Job>>,
    workers: Vec<Stealer<Job>>,
    parkers: Arc<Vec<Unparker>>,
    shutdown: Arc<AtomicBool>,
    pub jobs: Arc<Mutex<IndexMap<JobId, JobMetadata>>>,
}

impl Drop for JobExecutor {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        for unparker in self.parkers.iter() {
            unparker.unpark();
        }
    }
}

impl JobExecutor {
    pub fn new() -> Result<Self> {
        Self::with_threads(
            thread::available_parallelism()
                .map(Into::into)
                .unwrap_or(1),
        )
    }

    pub fn with_threads(threads: usize) -> Result<Self> {
        let mut workers = vec![];
        let mut stealers = vec![];
        let mut parkers = vec![];
        for _ in 0..threads.max(1) {
            let new_worker = Worker::new_fifo();
            stealers.push(new_worker.stealer());
            let p = Parker::new();
            parkers.push(p.unparker().clone());
            workers.push((new_worker, p));
        }
        let ret = Self {
            global_queue: Arc::new(Injector::new()),
            workers: stealers,
            parkers: Arc::new(parkers),
            shutdown: Arc::new(AtomicBool::new(false)),
            jobs: Arc::new(Mutex::new(IndexMap::default())),
        };

        for (i, (local, parker)) in workers.into_iter().enumerate() {
            let global = ret.global_queue.clone();
            let stealers = ret.workers.clone();
            let shutdown = ret.shutdown.clone();
            thread::Builder::new()
                .name(format!("msgview-executor-{i}"))
                .spawn(move || loop {
                    if shutdown.load(Ordering::SeqCst) {
                        break;
                    }
                    let task = find_task(&local, &global, stealers.as_slice());
                    if let Some(job) = task {
                        let Job { task, id, desc } = job;
                        log::trace!("Worker {} got task {:?} {:?}", i, desc, id);
                        let _ = catch_unwind(|| task.run());
                        log::trace!("Worker {} returned after {:?} {:?}", i, desc, id);
                    } else {
                        parker.park_timeout(Duration::from_millis(100));
                    }
                })
                .map_err(|err| Error::from(err).set_summary("Could not spawn job executor thread"))?;
        }
        Ok(ret)
    }

    /// Spawns a future with a generic return value `R`.
    pub fn spawn<F, R>(&self, desc: Cow<'static, str>, future: F) -> JoinHandle<R>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let job_id = JobId::new();
        let injector = self.global_queue.clone();
        let parkers = self.parkers.clone();
        // We do not use `AtomicU64` because it's not portable, so ignore the lint.
        #[allow(clippy::mutex_integer)]
        let finished = FinishedTimestamp(Arc::new(Mutex::new(0)));
        let cancel = Arc::new(AtomicBool::new(false));

        if let Ok(mut jobs) = self.jobs.lock() {
            // Cancelled jobs never run to the end, so they are not removed
            // below.
            jobs.retain(|_, job| job.finished().is_none());
            jobs.insert(
                job_id,
                JobMetadata {
                    id: job_id,
                    desc: desc.clone(),
                    started: datetime::now(),
                    finished: finished.clone(),
                },
            );
        }

        // Create a task and schedule it for execution.
        let (runnable, task) = {
            let cancel = cancel.clone();
            let finished = finished.clone();
            let jobs = self.jobs.clone();
            async_task::spawn(
                async move {
                    let res = future.await;
                    let _ = sender.send(res);
                    finished.set_finished(Some(datetime::now()));
                    if let Ok(mut jobs) = jobs.lock() {
                        jobs.shift_remove(&job_id);
                    }
                },
                move |task| {
                    if cancel.load(Ordering::SeqCst) {
                        return;
                    }
                    injector.push(Job {
                        task,
                        id: job_id,
                        desc: desc.clone(),
                    });
                    for unparker in parkers.iter() {
                        unparker.unpark();
                    }
                },
            )
        };
        runnable.schedule();

        JoinHandle {
            task: Some(task),
            cancel,
            finished,
            chan: receiver,
            job_id,
        }
    }

    /// Spawns a future with a generic return value `R` that might block on a
    /// new thread.
    pub fn spawn_blocking<F, R>(&self, desc: Cow<'static, str>, future: F) -> JoinHandle<R>
    where
        F: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        self.spawn(
            desc,
            smol::unblock(move || futures::executor::block_on(future)),
        )
    }

    /// Drop book-keeping entries of jobs that were cancelled. Jobs that run
    /// to completion remove their own entry.
    pub fn prune_finished(&self) {
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.retain(|_, job| job.finished().is_none());
        }
    }
}

pub type JobChannel<T> = oneshot::Receiver<T>;

/// `JoinHandle` for the future that allows us to cancel the task.
///
/// Dropping the handle cancels the task; call [`JoinHandle::detach`] to let
/// it run to completion on its own.
#[derive(Debug)]
pub struct JoinHandle<T> {
    task: Option<async_task::Task<()>>,
    pub chan: JobChannel<T>,
    cancel: Arc<AtomicBool>,
    finished: FinishedTimestamp,
    pub job_id: JobId,
}

impl<T> JoinHandle<T> {
    /// Returns `true` if this call canceled the task.
    pub fn cancel(&mut self) -> bool {
        let was_active = !self.cancel.swap(true, Ordering::SeqCst);
        if was_active {
            self.finished.set_finished(Some(datetime::now()));
        }
        drop(self.task.take());
        was_active
    }

    pub fn detach(mut self) -> JobChannel<T> {
        if let Some(task) = self.task.take() {
            task.detach();
        }
        let (_, dummy) = oneshot::channel();
        std::mem::replace(&mut self.chan, dummy)
    }

    pub fn finished(&self) -> Option<UnixTimestamp> {
        self.finished.finished()
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

impl<T> std::cmp::PartialEq<JobId> for JoinHandle<T> {
    fn eq(&self, other: &JobId) -> bool {
        self.job_id == *other
    }
}

impl<T> Drop for JoinHandle<T> {
    fn drop(&mut self) {
        if self.task.is_some() {
            _ = self.cancel();
        }
    }
}
