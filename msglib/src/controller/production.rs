/*
 * msgview - production controller
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

use std::{
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
};

use indexmap::IndexMap;

use super::{
    FetchCompletion, FetchId, FetchRequest, ListenerRegistry, MessageListener,
    MessagingController, SaveId,
};
use crate::{
    accounts::{AccountId, Accounts},
    conf::FileSettings,
    email::Attachment,
    error::{Error, ErrorKind, Result},
    jobs::JobExecutor,
    store::{FsStore, MessageStore},
    utils::{files, shellexpand::ShellExpandTrait},
    BytesDisplay,
};

/// Controller backed by [`MessageStore`]s, one per account. Store I/O runs
/// on the job executor's worker threads.
#[derive(Debug)]
pub struct ProductionController {
    executor: JobExecutor,
    stores: RwLock<IndexMap<AccountId, Arc<dyn MessageStore>>>,
    listeners: Arc<ListenerRegistry>,
    max_unique_attempts: usize,
}

impl ProductionController {
    pub fn new(executor: JobExecutor) -> Self {
        Self {
            executor,
            stores: RwLock::new(IndexMap::default()),
            listeners: Arc::new(ListenerRegistry::new()),
            max_unique_attempts: files::MAX_UNIQUE_FILE_ATTEMPTS,
        }
    }

    /// One [`FsStore`] for every configured account that has a `root`.
    pub fn from_settings(settings: &FileSettings, accounts: &Accounts) -> Result<Self> {
        let ret = Self::new(JobExecutor::new()?)
            .with_max_unique_attempts(settings.attachments.max_unique_attempts);
        for id in accounts.ids() {
            let account = accounts.restore_account(id)?;
            if let Some(root) = account.root.as_ref() {
                let root = root.expand();
                log::debug!("Account {} uses store at {}.", account.name, root.display());
                ret.add_store(id, Arc::new(FsStore::new(root)));
            }
        }
        Ok(ret)
    }

    pub fn with_max_unique_attempts(mut self, value: usize) -> Self {
        self.max_unique_attempts = value;
        self
    }

    pub fn with_store(self, account_id: AccountId, store: Arc<dyn MessageStore>) -> Self {
        self.add_store(account_id, store);
        self
    }

    /// Returns the store previously set for this account, if any.
    pub fn add_store(
        &self,
        account_id: AccountId,
        store: Arc<dyn MessageStore>,
    ) -> Option<Arc<dyn MessageStore>> {
        self.stores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account_id, store)
    }

    pub fn executor(&self) -> &JobExecutor {
        &self.executor
    }

    pub fn listeners(&self) -> &Arc<ListenerRegistry> {
        &self.listeners
    }

    fn store(&self, account_id: AccountId) -> Result<Arc<dyn MessageStore>> {
        self.stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&account_id)
            .cloned()
            .ok_or_else(|| {
                Error::new(format!("No message store for account {account_id}."))
                    .set_kind(ErrorKind::NotFound)
            })
    }
}

impl MessagingController for ProductionController {
    fn fetch_message(
        &self,
        request: FetchRequest,
        listener: Arc<dyn MessageListener>,
    ) -> FetchId {
        let store = self.store(request.account_id());
        let completion = FetchCompletion::new(request, &listener, self.listeners.clone());
        let fetch_id = completion.id();
        let desc = format!("fetch message {}", completion.request().message_id());
        let handle = self.executor.spawn_blocking(desc.into(), async move {
            let request = completion.request();
            let result =
                store.and_then(|store| store.fetch(request.folder(), request.message_id()));
            completion.resolve(result);
        });
        _ = handle.detach();
        fetch_id
    }

    fn add_listener(&self, listener: Arc<dyn MessageListener>) -> bool {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, listener: &Arc<dyn MessageListener>) -> bool {
        self.listeners.remove(listener)
    }

    fn save_attachment(
        &self,
        request: FetchRequest,
        attachment: Attachment,
        directory: PathBuf,
        listener: Arc<dyn MessageListener>,
    ) -> SaveId {
        let save_id = SaveId::new();
        let requester = Arc::downgrade(&listener);
        let registry = self.listeners.clone();
        let max_attempts = self.max_unique_attempts;
        let desc = format!(
            "save attachment {} ({})",
            attachment.filename,
            BytesDisplay(attachment.len())
        );
        let handle = self.executor.spawn_blocking(desc.into(), async move {
            match files::save_attachment_with_limit(
                &directory,
                &attachment.filename,
                &attachment.bytes,
                max_attempts,
            ) {
                Ok(path) => {
                    log::debug!("Saved attachment {} to {}.", save_id, path.display());
                    registry.deliver(requester.upgrade(), |l| {
                        l.attachment_saved(save_id, &request, &path)
                    });
                }
                Err(err) => {
                    log::error!(
                        "Could not save attachment {} in {}: {}",
                        attachment.filename,
                        directory.display(),
                        err
                    );
                    registry.deliver(requester.upgrade(), |l| {
                        l.attachment_save_failed(save_id, &request, &attachment.filename, &err)
                    });
                }
            }
        });
        _ = handle.detach();
        save_id
    }

    fn delete_message(&self, request: FetchRequest) {
        let store = self.store(request.account_id());
        let desc = format!("delete message {}", request.message_id());
        let handle = self.executor.spawn_blocking(desc.into(), async move {
            if let Err(err) =
                store.and_then(|store| store.delete(request.folder(), request.message_id()))
            {
                log::error!("Could not delete message {}: {}", request.message_id(), err);
            }
        });
        _ = handle.detach();
    }

    fn set_seen(&self, request: FetchRequest, value: bool) {
        let store = self.store(request.account_id());
        let desc = format!("set seen={} on message {}", value, request.message_id());
        let handle = self.executor.spawn_blocking(desc.into(), async move {
            if let Err(err) = store.and_then(|store| {
                store.set_seen(request.folder(), request.message_id(), value)
            }) {
                log::error!(
                    "Could not set seen={} on message {}: {}",
                    value,
                    request.message_id(),
                    err
                );
            }
        });
        _ = handle.detach();
    }
}
