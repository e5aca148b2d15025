// crates/sync-engine/src/status.rs
//! Accounts whose sync setting is being changed

use crate::accounts::{Profile, SyncableAccount};
use crate::error::{SyncError, SyncResult};
use crate::types::{BookmarkSyncEnableStatus, SyncEnableResult};
use pagemark_core::AccountId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Thread-safe set of accounts with an enable/disable request in flight
#[derive(Clone, Default)]
pub struct ChangingAccounts {
    inner: Arc<Mutex<HashSet<AccountId>>>,
}

impl ChangingAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the account; it is removed again when the guard drops
    pub fn mark(&self, account_id: AccountId) -> SyncResult<ChangingGuard> {
        self.inner
            .lock()
            .map_err(|_| SyncError::lock_poisoned())?
            .insert(account_id);
        Ok(ChangingGuard {
            set: self.clone(),
            account_id,
        })
    }

    pub fn contains(&self, account_id: AccountId) -> bool {
        self.inner
            .lock()
            .map(|set| set.contains(&account_id))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().map(|set| set.is_empty()).unwrap_or(true)
    }

    fn remove(&self, account_id: AccountId) {
        match self.inner.lock() {
            Ok(mut set) => {
                set.remove(&account_id);
            }
            Err(poisoned) => {
                poisoned.into_inner().remove(&account_id);
            }
        }
    }
}

/// Keeps an account in the changing set while alive
pub struct ChangingGuard {
    set: ChangingAccounts,
    account_id: AccountId,
}

impl Drop for ChangingGuard {
    fn drop(&mut self) {
        self.set.remove(self.account_id);
    }
}

/// Current sync setting state of an account, without waiting for the worker
pub fn sync_status(
    profile: &dyn Profile,
    account_id: AccountId,
    changing: &ChangingAccounts,
) -> SyncResult<BookmarkSyncEnableStatus> {
    let account = profile.account(account_id)?;
    if SyncableAccount::of_account(&account).is_none() {
        return Ok(BookmarkSyncEnableStatus::Idle {
            account_id,
            status: SyncEnableResult::NotSupported,
        });
    }
    if changing.contains(account_id) {
        return Ok(BookmarkSyncEnableStatus::Changing { account_id });
    }
    Ok(BookmarkSyncEnableStatus::Idle {
        account_id,
        status: SyncEnableResult::from_permitted(account.preferences().bookmark_syncing_permitted),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Account;
    use crate::memory::{MemoryAccount, MemoryProfile};
    use pagemark_core::{AccountCredentials, AccountPreferences};
    use url::Url;

    #[test]
    fn test_guard_removes_on_drop() {
        let changing = ChangingAccounts::new();
        let account_id = AccountId::new();
        {
            let _guard = changing.mark(account_id).unwrap();
            assert!(changing.contains(account_id));
        }
        assert!(!changing.contains(account_id));
        assert!(changing.is_empty());
    }

    #[test]
    fn test_guard_removes_on_unwind() {
        let changing = ChangingAccounts::new();
        let account_id = AccountId::new();
        let cloned = changing.clone();
        let result = std::thread::spawn(move || {
            let _guard = cloned.mark(account_id).unwrap();
            panic!("remote call exploded");
        })
        .join();
        assert!(result.is_err());
        assert!(!changing.contains(account_id));
    }

    #[test]
    fn test_status_reports_each_state() {
        let profile = MemoryProfile::new();
        let plain = profile.add_account(MemoryAccount::new());
        let syncable = profile.add_account(
            MemoryAccount::new()
                .with_credentials(
                    AccountCredentials::bearer("t")
                        .with_annotations_uri(Url::parse("https://example.com/a/").unwrap()),
                )
                .with_settings_uri(Url::parse("https://example.com/p/").unwrap())
                .with_preferences(AccountPreferences {
                    bookmark_syncing_permitted: true,
                }),
        );
        let changing = ChangingAccounts::new();

        assert_eq!(
            sync_status(&profile, plain.id(), &changing).unwrap(),
            BookmarkSyncEnableStatus::Idle {
                account_id: plain.id(),
                status: SyncEnableResult::NotSupported
            }
        );
        assert_eq!(
            sync_status(&profile, syncable.id(), &changing).unwrap(),
            BookmarkSyncEnableStatus::Idle {
                account_id: syncable.id(),
                status: SyncEnableResult::Enabled
            }
        );

        let _guard = changing.mark(syncable.id()).unwrap();
        assert_eq!(
            sync_status(&profile, syncable.id(), &changing).unwrap(),
            BookmarkSyncEnableStatus::Changing {
                account_id: syncable.id()
            }
        );
    }
}
