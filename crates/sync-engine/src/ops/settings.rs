// crates/sync-engine/src/ops/settings.rs
//! Reading and changing the patron's sync permission

use crate::accounts::{Profile, SyncableAccount};
use crate::error::SyncResult;
use crate::status::ChangingGuard;
use crate::types::{BookmarkEvent, BookmarkSyncEnableStatus, SyncEnableResult};
use crate::worker::WorkerContext;

/// Asks the server whether sync is permitted and stores the answer.
///
/// Failures are logged and leave the stored preference untouched.
pub(crate) fn check_sync_status_for_account(
    context: &WorkerContext,
    profile: &dyn Profile,
    syncable: &SyncableAccount,
) {
    log::debug!(
        "[{}]: checking sync status for account {}",
        profile.id(),
        syncable.id()
    );

    let permitted = match context
        .http
        .syncing_is_enabled(&syncable.settings_uri, &syncable.credentials)
    {
        Ok(permitted) => permitted,
        Err(e) => {
            log::error!(
                "[{}]: error checking account {} for syncing: {}",
                profile.id(),
                syncable.id(),
                e
            );
            return;
        }
    };

    log::debug!(
        "[{}]: account {} has syncing {}",
        profile.id(),
        syncable.id(),
        if permitted { "enabled" } else { "disabled" }
    );

    let mut preferences = syncable.account.preferences();
    preferences.bookmark_syncing_permitted = permitted;
    if let Err(e) = syncable.account.set_preferences(preferences) {
        log::error!(
            "[{}]: unable to store preferences for account {}: {}",
            profile.id(),
            syncable.id(),
            e
        );
    }
}

/// Runs the status check for every syncable account of the profile
pub(crate) fn check_sync_status_for_profile(context: &WorkerContext, profile: &dyn Profile) {
    for account in profile.accounts() {
        if let Some(syncable) = SyncableAccount::of_account(&account) {
            check_sync_status_for_account(context, profile, &syncable);
        }
    }
}

/// Turns sync on or off on the server, then locally.
///
/// `changing` keeps the account in the changing set until this returns, on
/// success or failure.
pub(crate) fn enable_sync(
    context: &WorkerContext,
    profile: &dyn Profile,
    syncable: &SyncableAccount,
    enabled: bool,
    changing: ChangingGuard,
) -> SyncResult<SyncEnableResult> {
    let account_id = syncable.id();
    log::debug!(
        "[{}]: {} syncing for account {}",
        profile.id(),
        if enabled { "enabling" } else { "disabling" },
        account_id
    );

    let outcome = apply_setting(context, syncable, enabled);
    drop(changing);

    let status = match &outcome {
        Ok(status) => *status,
        Err(e) => {
            log::error!(
                "[{}]: unable to change sync setting for account {}: {}",
                profile.id(),
                account_id,
                e
            );
            SyncEnableResult::from_permitted(syncable.account.preferences().bookmark_syncing_permitted)
        }
    };

    context.events.publish(BookmarkEvent::SyncSettingChanged {
        account_id,
        status: BookmarkSyncEnableStatus::Idle { account_id, status },
    });
    outcome
}

fn apply_setting(
    context: &WorkerContext,
    syncable: &SyncableAccount,
    enabled: bool,
) -> SyncResult<SyncEnableResult> {
    context
        .http
        .syncing_enable(&syncable.settings_uri, &syncable.credentials, enabled)?;

    let mut preferences = syncable.account.preferences();
    preferences.bookmark_syncing_permitted = enabled;
    syncable.account.set_preferences(preferences)?;
    Ok(SyncEnableResult::from_permitted(enabled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Account;
    use crate::memory::{HttpCall, MemoryAnnotationServer};
    use crate::ops::tests::{context_with, syncable_account};
    use crate::types::BookmarkEvent;
    use std::sync::Arc;

    #[test]
    fn test_check_status_stores_server_answer() {
        let server = Arc::new(MemoryAnnotationServer::new().with_sync_permitted(true));
        let context = context_with(&server);
        let (profile, account) = syncable_account(false);
        let syncable = SyncableAccount::of_account(&(account.clone() as Arc<dyn Account>)).unwrap();

        check_sync_status_for_account(&context, &*profile, &syncable);

        assert!(account.preferences().bookmark_syncing_permitted);
        assert_eq!(server.calls(), vec![HttpCall::SyncingIsEnabled]);
    }

    #[test]
    fn test_check_status_failure_keeps_preference() {
        let server = Arc::new(MemoryAnnotationServer::new().failing(HttpCall::SyncingIsEnabled));
        let context = context_with(&server);
        let (profile, account) = syncable_account(true);
        let syncable = SyncableAccount::of_account(&(account.clone() as Arc<dyn Account>)).unwrap();

        check_sync_status_for_account(&context, &*profile, &syncable);

        assert!(account.preferences().bookmark_syncing_permitted);
    }

    #[test]
    fn test_enable_failure_clears_changing_set() {
        let server = Arc::new(MemoryAnnotationServer::new().failing(HttpCall::SyncingEnable(true)));
        let context = context_with(&server);
        let events = context.events.subscribe();
        let (profile, account) = syncable_account(false);
        let syncable = SyncableAccount::of_account(&(account.clone() as Arc<dyn Account>)).unwrap();
        let guard = context.changing.mark(account.id()).unwrap();

        let result = enable_sync(&context, &*profile, &syncable, true, guard);

        assert!(result.is_err());
        assert!(!context.changing.contains(account.id()));
        assert!(!account.preferences().bookmark_syncing_permitted);
        assert_eq!(
            events.try_recv().unwrap(),
            BookmarkEvent::SyncSettingChanged {
                account_id: account.id(),
                status: BookmarkSyncEnableStatus::Idle {
                    account_id: account.id(),
                    status: SyncEnableResult::Disabled
                }
            }
        );
    }

    #[test]
    fn test_enable_updates_preference() {
        let server = Arc::new(MemoryAnnotationServer::new());
        let context = context_with(&server);
        let (profile, account) = syncable_account(false);
        let syncable = SyncableAccount::of_account(&(account.clone() as Arc<dyn Account>)).unwrap();
        let guard = context.changing.mark(account.id()).unwrap();

        let result = enable_sync(&context, &*profile, &syncable, true, guard).unwrap();

        assert_eq!(result, SyncEnableResult::Enabled);
        assert!(account.preferences().bookmark_syncing_permitted);
        assert!(server.sync_permitted());
        assert!(context.changing.is_empty());
    }
}
