/*
 * msgview - listener registry
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

//! Listeners interested in controller activity, and the registry that
//! delivers to them.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::{FetchId, FetchRequest, SaveId};
use crate::{email::Message, error::Error};

/// Receives controller results. Every method defaults to a no-op, so
/// implementors override only what they care about.
///
/// Methods are called from job executor threads.
pub trait MessageListener: Send + Sync {
    fn message_loaded(&self, _fetch_id: FetchId, _request: &FetchRequest, _message: &Message) {}

    fn message_load_failed(&self, _fetch_id: FetchId, _request: &FetchRequest, _err: &Error) {}

    fn attachment_saved(&self, _save_id: SaveId, _request: &FetchRequest, _path: &Path) {}

    fn attachment_save_failed(
        &self,
        _save_id: SaveId,
        _request: &FetchRequest,
        _filename: &str,
        _err: &Error,
    ) {
    }
}

pub type ListenerSnapshot = SmallVec<[Arc<dyn MessageListener>; 8]>;

#[inline]
fn identity(listener: &Arc<dyn MessageListener>) -> usize {
    Arc::as_ptr(listener) as *const () as usize
}

/// Set of listeners keyed by identity, in insertion order.
///
/// Broadcasts iterate over a snapshot; the lock is released before any
/// callback runs, so callbacks may add or remove listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<IndexMap<usize, Arc<dyn MessageListener>>>,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct(stringify!(ListenerRegistry))
            .field("len", &self.len())
            .finish()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<usize, Arc<dyn MessageListener>>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `false` if the listener was already registered.
    pub fn add(&self, listener: Arc<dyn MessageListener>) -> bool {
        let mut listeners = self.lock();
        let key = identity(&listener);
        if listeners.contains_key(&key) {
            return false;
        }
        listeners.insert(key, listener);
        true
    }

    /// Returns `false` if the listener was not registered.
    pub fn remove(&self, listener: &Arc<dyn MessageListener>) -> bool {
        self.lock().shift_remove(&identity(listener)).is_some()
    }

    pub fn contains(&self, listener: &Arc<dyn MessageListener>) -> bool {
        self.lock().contains_key(&identity(listener))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> ListenerSnapshot {
        self.lock().values().cloned().collect()
    }

    pub fn broadcast<F>(&self, f: F)
    where
        F: Fn(&dyn MessageListener),
    {
        self.deliver(None, f)
    }

    /// Deliver to the registered listeners and to `extra`, which receives the
    /// call once even if it is also registered.
    pub fn deliver<F>(&self, extra: Option<Arc<dyn MessageListener>>, f: F)
    where
        F: Fn(&dyn MessageListener),
    {
        let mut targets = self.snapshot();
        if let Some(extra) = extra {
            let key = identity(&extra);
            if !targets.iter().any(|l| identity(l) == key) {
                targets.push(extra);
            }
        }
        for listener in targets {
            f(listener.as_ref());
        }
    }
}
