/*
 * msgview - messaging controller
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

//! The asynchronous messaging controller.
//!
//! A [`MessagingController`] performs storage work off the caller's thread
//! and reports results to [`MessageListener`]s. Every fetch gets exactly one
//! terminal callback for its requester: `message_loaded` or
//! `message_load_failed`. If the pending work is dropped without a result,
//! the failure has kind [`ErrorKind::Cancelled`].

use std::{
    path::PathBuf,
    sync::{Arc, Weak},
};

use crate::{
    accounts::AccountId,
    email::{Attachment, Message},
    error::{Error, ErrorKind, Result},
};

pub mod listeners;
#[cfg(any(test, feature = "test-seam"))]
pub mod mock;
pub mod production;

pub use listeners::{ListenerRegistry, MessageListener};
#[cfg(any(test, feature = "test-seam"))]
pub use mock::MockController;
pub use production::ProductionController;

uuid_hash_type!(FetchId);
uuid_hash_type!(SaveId);

/// What to fetch, and where it sits among its siblings. Immutable once
/// built; navigation creates a new request with
/// [`FetchRequest::with_message_id`].
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct FetchRequest {
    account_id: AccountId,
    folder: String,
    message_id: String,
    siblings: Arc<Vec<String>>,
}

impl FetchRequest {
    pub fn new(
        account_id: AccountId,
        folder: impl Into<String>,
        message_id: impl Into<String>,
        siblings: Vec<String>,
    ) -> Self {
        Self {
            account_id,
            folder: folder.into(),
            message_id: message_id.into(),
            siblings: Arc::new(siblings),
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn siblings(&self) -> &[String] {
        &self.siblings
    }

    /// Index of the message among its siblings.
    pub fn position(&self) -> Option<usize> {
        self.siblings.iter().position(|s| *s == self.message_id)
    }

    pub fn next_sibling(&self) -> Option<&str> {
        let pos = self.position()?;
        self.siblings.get(pos + 1).map(String::as_str)
    }

    pub fn previous_sibling(&self) -> Option<&str> {
        let pos = self.position()?;
        self.siblings
            .get(pos.checked_sub(1)?)
            .map(String::as_str)
    }

    /// Same account, folder and siblings, different message.
    pub fn with_message_id(&self, message_id: impl Into<String>) -> Self {
        Self {
            account_id: self.account_id,
            folder: self.folder.clone(),
            message_id: message_id.into(),
            siblings: self.siblings.clone(),
        }
    }
}

/// The pending result of one fetch.
///
/// Resolving consumes the completion, so a fetch is delivered at most once.
/// Dropping it unresolved delivers a [`ErrorKind::Cancelled`] failure, so it
/// is delivered at least once. The requester is held weakly: a requester
/// that has gone away is skipped.
pub struct FetchCompletion {
    id: FetchId,
    request: FetchRequest,
    requester: Weak<dyn MessageListener>,
    registry: Arc<ListenerRegistry>,
    resolved: bool,
}

impl std::fmt::Debug for FetchCompletion {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct(stringify!(FetchCompletion))
            .field("id", &self.id)
            .field("request", &self.request)
            .field("resolved", &self.resolved)
            .finish()
    }
}

impl FetchCompletion {
    pub fn new(
        request: FetchRequest,
        requester: &Arc<dyn MessageListener>,
        registry: Arc<ListenerRegistry>,
    ) -> Self {
        Self {
            id: FetchId::new(),
            request,
            requester: Arc::downgrade(requester),
            registry,
            resolved: false,
        }
    }

    pub fn id(&self) -> FetchId {
        self.id
    }

    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    pub fn resolve(mut self, result: Result<Message>) {
        self.deliver(result);
    }

    fn deliver(&mut self, result: Result<Message>) {
        self.resolved = true;
        let (id, request) = (self.id, &self.request);
        match result {
            Ok(message) => {
                log::trace!("Fetch {} of {:?} loaded.", id, request.message_id());
                self.registry.deliver(self.requester.upgrade(), |l| {
                    l.message_loaded(id, request, &message)
                });
            }
            Err(err) => {
                log::debug!(
                    "Fetch {} of {:?} failed: {}",
                    id,
                    request.message_id(),
                    err.summary
                );
                self.registry.deliver(self.requester.upgrade(), |l| {
                    l.message_load_failed(id, request, &err)
                });
            }
        }
    }
}

impl Drop for FetchCompletion {
    fn drop(&mut self) {
        if !self.resolved {
            self.deliver(Err(Error::new(format!(
                "Fetch of message {} was dropped before completing.",
                self.request.message_id()
            ))
            .set_kind(ErrorKind::Cancelled)));
        }
    }
}

/// The controller seam between a view and storage.
pub trait MessagingController: std::fmt::Debug + Send + Sync {
    /// Start fetching `request` and return immediately. `listener` receives
    /// the terminal callback whether or not it is registered.
    fn fetch_message(&self, request: FetchRequest, listener: Arc<dyn MessageListener>)
        -> FetchId;

    /// Returns `false` if `listener` was already registered.
    fn add_listener(&self, listener: Arc<dyn MessageListener>) -> bool;

    /// Returns `false` if `listener` was not registered.
    fn remove_listener(&self, listener: &Arc<dyn MessageListener>) -> bool;

    /// Save `attachment` under a unique name in `directory` and return
    /// immediately. Reports `attachment_saved` or `attachment_save_failed`
    /// with the returned id; saves may finish in any order.
    fn save_attachment(
        &self,
        request: FetchRequest,
        attachment: Attachment,
        directory: PathBuf,
        listener: Arc<dyn MessageListener>,
    ) -> SaveId;

    fn delete_message(&self, request: FetchRequest);

    fn set_seen(&self, request: FetchRequest, value: bool);
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        loaded: Mutex<Vec<FetchId>>,
        failed: Mutex<Vec<(FetchId, ErrorKind)>>,
    }

    impl MessageListener for Recorder {
        fn message_loaded(&self, fetch_id: FetchId, _: &FetchRequest, _: &Message) {
            self.loaded.lock().unwrap().push(fetch_id);
        }

        fn message_load_failed(&self, fetch_id: FetchId, _: &FetchRequest, err: &Error) {
            self.failed.lock().unwrap().push((fetch_id, err.kind));
        }
    }

    fn request() -> FetchRequest {
        FetchRequest::new(
            AccountId(1),
            "INBOX",
            "b",
            vec!["a".into(), "b".into(), "c".into()],
        )
    }

    #[test]
    fn test_controller_request_siblings() {
        let req = request();
        assert_eq!(req.position(), Some(1));
        assert_eq!(req.next_sibling(), Some("c"));
        assert_eq!(req.previous_sibling(), Some("a"));
        let first = req.with_message_id("a");
        assert_eq!(first.previous_sibling(), None);
        assert_eq!(first.siblings(), req.siblings());
        let last = req.with_message_id("c");
        assert_eq!(last.next_sibling(), None);
        let orphan = req.with_message_id("z");
        assert_eq!(orphan.position(), None);
        assert_eq!(orphan.next_sibling(), None);
        assert_eq!(orphan.previous_sibling(), None);
    }

    #[test]
    fn test_controller_completion_once() {
        let registry = Arc::new(ListenerRegistry::new());
        let recorder = Arc::new(Recorder::default());
        let requester: Arc<dyn MessageListener> = recorder.clone();
        // Registered and requester at once: still one callback.
        registry.add(requester.clone());
        let completion = FetchCompletion::new(request(), &requester, registry.clone());
        let id = completion.id();
        completion.resolve(Ok(Message::new("b", "INBOX")));
        assert_eq!(*recorder.loaded.lock().unwrap(), vec![id]);
        assert!(recorder.failed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_controller_completion_dropped_is_cancelled() {
        let registry = Arc::new(ListenerRegistry::new());
        let recorder = Arc::new(Recorder::default());
        let requester: Arc<dyn MessageListener> = recorder.clone();
        let completion = FetchCompletion::new(request(), &requester, registry);
        let id = completion.id();
        drop(completion);
        assert_eq!(
            *recorder.failed.lock().unwrap(),
            vec![(id, ErrorKind::Cancelled)]
        );
    }

    #[test]
    fn test_controller_completion_requester_gone() {
        let registry = Arc::new(ListenerRegistry::new());
        let observer = Arc::new(Recorder::default());
        registry.add(observer.clone());
        let requester: Arc<dyn MessageListener> = Arc::new(Recorder::default());
        let completion = FetchCompletion::new(request(), &requester, registry);
        drop(requester);
        let id = completion.id();
        completion.resolve(Ok(Message::new("b", "INBOX")));
        assert_eq!(*observer.loaded.lock().unwrap(), vec![id]);
    }
}
