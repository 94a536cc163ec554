/*
 * msgview - mock controller
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

//! A deterministic controller for tests.
//!
//! Fetches stay pending until the test resolves them, unless a responder is
//! set. Attachment saves happen at once, unless saves are held. Nothing runs
//! on other threads: callbacks happen on the thread that resolves.

use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use super::{
    FetchCompletion, FetchId, FetchRequest, ListenerRegistry, MessageListener,
    MessagingController, SaveId,
};
use crate::{
    email::{Attachment, Message},
    error::{Error, Result},
    utils::files,
};

/// Answers a fetch immediately, or returns `None` to leave it pending.
pub type Responder = dyn Fn(&FetchRequest) -> Option<Result<Message>> + Send + Sync;

struct PendingSave {
    id: SaveId,
    request: FetchRequest,
    attachment: Attachment,
    directory: PathBuf,
    requester: Weak<dyn MessageListener>,
}

#[derive(Default)]
struct MockState {
    pending: VecDeque<FetchCompletion>,
    requests: Vec<(FetchId, FetchRequest)>,
    deleted: Vec<FetchRequest>,
    seen: Vec<(FetchRequest, bool)>,
    saved: Vec<(FetchRequest, String)>,
    hold_saves: bool,
    pending_saves: VecDeque<PendingSave>,
    responder: Option<Arc<Responder>>,
}

#[derive(Default)]
pub struct MockController {
    state: Mutex<MockState>,
    listeners: Arc<ListenerRegistry>,
}

impl std::fmt::Debug for MockController {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        let state = self.lock();
        fmt.debug_struct(stringify!(MockController))
            .field("pending", &state.pending.len())
            .field("requests", &state.requests.len())
            .field("pending_saves", &state.pending_saves.len())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl MockController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responder<F>(self, responder: F) -> Self
    where
        F: Fn(&FetchRequest) -> Option<Result<Message>> + Send + Sync + 'static,
    {
        self.set_responder(Some(Arc::new(responder)));
        self
    }

    pub fn set_responder(&self, responder: Option<Arc<Responder>>) {
        self.lock().responder = responder;
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve the oldest pending fetch. Returns its id, or `None` if nothing
    /// was pending.
    pub fn resolve_next(&self, result: Result<Message>) -> Option<FetchId> {
        let completion = self.lock().pending.pop_front()?;
        let id = completion.id();
        completion.resolve(result);
        Some(id)
    }

    /// Resolve a specific pending fetch. Returns `false` if it is not pending.
    pub fn resolve(&self, fetch_id: FetchId, result: Result<Message>) -> bool {
        let completion = {
            let mut state = self.lock();
            let Some(pos) = state.pending.iter().position(|c| c.id() == fetch_id) else {
                return false;
            };
            state.pending.remove(pos)
        };
        match completion {
            Some(completion) => {
                completion.resolve(result);
                true
            }
            None => false,
        }
    }

    /// Fail every pending fetch with `err`. Returns how many were pending.
    pub fn fail_all(&self, err: Error) -> usize {
        let pending = std::mem::take(&mut self.lock().pending);
        let count = pending.len();
        for completion in pending {
            completion.resolve(Err(err.clone()));
        }
        count
    }

    /// Drop every pending fetch without resolving it.
    pub fn drop_pending(&self) -> usize {
        let pending = std::mem::take(&mut self.lock().pending);
        pending.len()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn pending_ids(&self) -> Vec<FetchId> {
        self.lock().pending.iter().map(FetchCompletion::id).collect()
    }

    /// Every fetch issued so far, in order.
    pub fn requests(&self) -> Vec<(FetchId, FetchRequest)> {
        self.lock().requests.clone()
    }

    pub fn deleted(&self) -> Vec<FetchRequest> {
        self.lock().deleted.clone()
    }

    pub fn seen_changes(&self) -> Vec<(FetchRequest, bool)> {
        self.lock().seen.clone()
    }

    /// Attachment save requests, with the attachment's filename.
    pub fn saved(&self) -> Vec<(FetchRequest, String)> {
        self.lock().saved.clone()
    }

    /// While set, saves wait for [`MockController::complete_save`] instead
    /// of being written at once.
    pub fn hold_saves(&self, value: bool) {
        self.lock().hold_saves = value;
    }

    pub fn pending_save_ids(&self) -> Vec<SaveId> {
        self.lock().pending_saves.iter().map(|s| s.id).collect()
    }

    /// Write a held save and report it. Returns `false` if it is not pending.
    pub fn complete_save(&self, save_id: SaveId) -> bool {
        let save = {
            let mut state = self.lock();
            let Some(pos) = state.pending_saves.iter().position(|s| s.id == save_id) else {
                return false;
            };
            state.pending_saves.remove(pos)
        };
        match save {
            Some(save) => {
                self.perform_save(save);
                true
            }
            None => false,
        }
    }

    fn perform_save(&self, save: PendingSave) {
        let PendingSave {
            id,
            request,
            attachment,
            directory,
            requester,
        } = save;
        match files::save_attachment(&directory, &attachment.filename, &attachment.bytes) {
            Ok(path) => self.listeners.deliver(requester.upgrade(), |l| {
                l.attachment_saved(id, &request, &path)
            }),
            Err(err) => self.listeners.deliver(requester.upgrade(), |l| {
                l.attachment_save_failed(id, &request, &attachment.filename, &err)
            }),
        }
    }

    pub fn listeners(&self) -> &Arc<ListenerRegistry> {
        &self.listeners
    }
}

impl MessagingController for MockController {
    fn fetch_message(
        &self,
        request: FetchRequest,
        listener: Arc<dyn MessageListener>,
    ) -> FetchId {
        let completion = FetchCompletion::new(request.clone(), &listener, self.listeners.clone());
        let id = completion.id();
        let responder = {
            let mut state = self.lock();
            state.requests.push((id, request.clone()));
            state.responder.clone()
        };
        match responder.and_then(|r| r(&request)) {
            Some(result) => completion.resolve(result),
            None => self.lock().pending.push_back(completion),
        }
        id
    }

    fn add_listener(&self, listener: Arc<dyn MessageListener>) -> bool {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, listener: &Arc<dyn MessageListener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Saves synchronously on the calling thread, unless saves are held.
    fn save_attachment(
        &self,
        request: FetchRequest,
        attachment: Attachment,
        directory: PathBuf,
        listener: Arc<dyn MessageListener>,
    ) -> SaveId {
        let save = PendingSave {
            id: SaveId::new(),
            request,
            attachment,
            directory,
            requester: Arc::downgrade(&listener),
        };
        let id = save.id;
        let mut state = self.lock();
        state
            .saved
            .push((save.request.clone(), save.attachment.filename.clone()));
        if state.hold_saves {
            state.pending_saves.push_back(save);
        } else {
            drop(state);
            self.perform_save(save);
        }
        id
    }

    fn delete_message(&self, request: FetchRequest) {
        self.lock().deleted.push(request);
    }

    fn set_seen(&self, request: FetchRequest, value: bool) {
        self.lock().seen.push((request, value));
    }
}
