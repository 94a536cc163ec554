/*
 * msgview - accounts
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

//! Account registry with first-run bootstrap of a default account.

use std::{
    hash::{Hash, Hasher},
    path::PathBuf,
    sync::Mutex,
};

use indexmap::IndexMap;

use crate::{
    conf::FileSettings,
    error::{Error, ErrorKind, Result},
};

/// Name of the account created when none is configured.
pub const BOOTSTRAP_ACCOUNT_NAME: &str = "default";

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[repr(transparent)]
pub struct AccountId(pub u64);

impl AccountId {
    pub fn from_name(name: &str) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        name.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub identity: String,
    pub display_name: Option<String>,
    /// Root of the account's message store, if it has one.
    pub root: Option<PathBuf>,
    pub is_default: bool,
}

impl Account {
    pub fn new(name: &str, identity: &str) -> Self {
        Self {
            id: AccountId::from_name(name),
            name: name.to_string(),
            identity: identity.to_string(),
            display_name: None,
            root: None,
            is_default: false,
        }
    }

    /// Create the account's display name from fields
    /// [`Account::identity`] and [`Account::display_name`].
    pub fn make_display_name(&self) -> String {
        if let Some(d) = self.display_name.as_ref() {
            format!("{} <{}>", d, self.identity)
        } else {
            self.identity.to_string()
        }
    }
}

#[derive(Debug, Default)]
struct AccountsInner {
    accounts: IndexMap<AccountId, Account>,
    default: Option<AccountId>,
}

/// All known accounts. Exactly one of them is the default once
/// [`Accounts::default_account_id`] has been called.
#[derive(Debug, Default)]
pub struct Accounts {
    inner: Mutex<AccountsInner>,
}

impl Accounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &FileSettings) -> Self {
        let ret = Self::new();
        for (name, conf) in settings.accounts.iter() {
            let mut account = Account::new(name, &conf.identity);
            account.display_name.clone_from(&conf.display_name);
            account.root.clone_from(&conf.root);
            account.is_default = conf.default;
            ret.insert(account);
        }
        ret
    }

    /// Add or replace an account. If it is marked as default, it takes over
    /// from the previous default.
    pub fn insert(&self, mut account: Account) {
        let mut inner = self.lock();
        if account.is_default {
            if let Some(prev) = inner.default.replace(account.id) {
                if let Some(prev) = inner.accounts.get_mut(&prev) {
                    prev.is_default = prev.id == account.id;
                }
            }
        } else if inner.default == Some(account.id) {
            account.is_default = true;
        }
        inner.accounts.insert(account.id, account);
    }

    /// The default account's id. When no account is marked as default the
    /// first configured account becomes the default, and when there are no
    /// accounts at all one is created.
    pub fn default_account_id(&self) -> AccountId {
        let mut inner = self.lock();
        if let Some(id) = inner.default {
            return id;
        }
        let id = if let Some((&id, account)) = inner.accounts.first_mut() {
            account.is_default = true;
            id
        } else {
            log::info!("No accounts configured, creating `{BOOTSTRAP_ACCOUNT_NAME}` account.");
            let mut account = Account::new(BOOTSTRAP_ACCOUNT_NAME, "");
            account.is_default = true;
            let id = account.id;
            inner.accounts.insert(id, account);
            id
        };
        inner.default = Some(id);
        id
    }

    pub fn restore_account(&self, id: AccountId) -> Result<Account> {
        self.lock().accounts.get(&id).cloned().ok_or_else(|| {
            Error::new(format!("Account {id} not found.")).set_kind(ErrorKind::NotFound)
        })
    }

    pub fn len(&self) -> usize {
        self.lock().accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<AccountId> {
        self.lock().accounts.keys().copied().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AccountsInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_accounts_bootstrap_default() {
        let accounts = Accounts::new();
        assert!(accounts.is_empty());
        let id = accounts.default_account_id();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts.default_account_id(), id);
        assert_eq!(accounts.len(), 1);
        let account = accounts.restore_account(id).unwrap();
        assert_eq!(account.name, BOOTSTRAP_ACCOUNT_NAME);
        assert!(account.is_default);
    }

    #[test]
    fn test_accounts_bootstrap_concurrent() {
        let accounts = Arc::new(Accounts::new());
        let ids = (0..8)
            .map(|_| {
                let accounts = accounts.clone();
                std::thread::spawn(move || accounts.default_account_id())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>();
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(accounts.len(), 1);
    }

    #[test]
    fn test_accounts_from_settings() {
        let settings = FileSettings::validate_string(
            "[accounts.work]\nidentity = \"me@example.com\"\n[accounts.home]\nidentity = \
             \"me@example.org\"\ndefault = true\n",
        )
        .unwrap();
        let accounts = Accounts::from_settings(&settings);
        assert_eq!(accounts.len(), 2);
        let id = accounts.default_account_id();
        assert_eq!(id, AccountId::from_name("home"));
        assert_eq!(accounts.len(), 2);
        assert!(!accounts
            .restore_account(AccountId::from_name("work"))
            .unwrap()
            .is_default);
    }

    #[test]
    fn test_accounts_first_becomes_default() {
        let accounts = Accounts::new();
        accounts.insert(Account::new("a", "a@example.com"));
        accounts.insert(Account::new("b", "b@example.com"));
        assert_eq!(accounts.default_account_id(), AccountId::from_name("a"));
        assert!(accounts.restore_account(AccountId::from_name("a")).unwrap().is_default);

        let mut c = Account::new("c", "c@example.com");
        c.is_default = true;
        accounts.insert(c);
        assert_eq!(accounts.default_account_id(), AccountId::from_name("c"));
        assert!(!accounts.restore_account(AccountId::from_name("a")).unwrap().is_default);
    }

    #[test]
    fn test_accounts_restore_missing() {
        let accounts = Accounts::new();
        let err = accounts.restore_account(AccountId(42)).unwrap_err();
        assert!(err.kind.is_not_found());
    }
}
