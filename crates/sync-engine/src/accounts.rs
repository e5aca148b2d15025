// crates/sync-engine/src/accounts.rs
//! Contracts for the account and profile registry

use crate::error::{SyncError, SyncResult};
use crate::storage::BookDatabase;
use crossbeam_channel::Receiver;
use pagemark_core::{AccountCredentials, AccountId, AccountPreferences, ProfileId};
use pagemark_network::TokenRefreshHandler;
use std::sync::Arc;
use url::Url;

/// A library account
pub trait Account: Send + Sync {
    fn id(&self) -> AccountId;

    /// Login credentials, if the account is signed in
    fn credentials(&self) -> Option<AccountCredentials>;

    /// Replaces the login credentials
    fn set_credentials(&self, credentials: AccountCredentials) -> SyncResult<()>;

    /// Patron settings endpoint advertised by the library, if any
    fn settings_uri(&self) -> Option<Url>;

    fn preferences(&self) -> AccountPreferences;

    fn set_preferences(&self, preferences: AccountPreferences) -> SyncResult<()>;

    /// The books this account holds
    fn book_database(&self) -> Arc<dyn BookDatabase>;
}

/// A reader profile owning a set of accounts
pub trait Profile: Send + Sync {
    fn id(&self) -> ProfileId;

    fn accounts(&self) -> Vec<Arc<dyn Account>>;

    fn account(&self, id: AccountId) -> SyncResult<Arc<dyn Account>> {
        self.accounts()
            .into_iter()
            .find(|account| account.id() == id)
            .ok_or(SyncError::AccountNotFound(id))
    }
}

/// Profile lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileEvent {
    SelectionInProgress(ProfileId),
    SelectionCompleted(ProfileId),
}

/// Account lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountEvent {
    LoggingIn(AccountId),
    LoggedIn(AccountId),
    LoginFailed(AccountId),
    LoggedOut(AccountId),
    Deleted(AccountId),
}

/// The registry of profiles and accounts
pub trait ProfilesController: Send + Sync {
    /// The selected profile
    fn profile_current(&self) -> SyncResult<Arc<dyn Profile>>;

    /// Stream of profile events
    fn profile_events(&self) -> Receiver<ProfileEvent>;

    /// Stream of account events
    fn account_events(&self) -> Receiver<AccountEvent>;
}

/// An account that has everything needed to talk to the annotation server
#[derive(Clone)]
pub struct SyncableAccount {
    pub account: Arc<dyn Account>,
    pub settings_uri: Url,
    pub annotations_uri: Url,
    pub credentials: AccountCredentials,
}

impl SyncableAccount {
    /// Returns `None` unless the account is signed in with an annotations URI
    /// and its library exposes a patron settings URI.
    pub fn of_account(account: &Arc<dyn Account>) -> Option<Self> {
        let credentials = account.credentials()?;
        let annotations_uri = credentials.annotations_uri.clone()?;
        let settings_uri = account.settings_uri()?;
        Some(Self {
            account: Arc::clone(account),
            settings_uri,
            annotations_uri,
            credentials,
        })
    }

    pub fn id(&self) -> AccountId {
        self.account.id()
    }
}

/// Builds a handler that stores refreshed access tokens on the account
/// whose credentials were used for the request.
pub fn token_refresh_handler(profiles: Arc<dyn ProfilesController>) -> TokenRefreshHandler {
    Arc::new(move |used: &AccountCredentials, token: &str| {
        let profile = match profiles.profile_current() {
            Ok(profile) => profile,
            Err(e) => {
                log::error!("unable to store refreshed token: {}", e);
                return;
            }
        };
        for account in profile.accounts() {
            if account.credentials().as_ref() == Some(used) {
                log::debug!("[{}]: storing refreshed access token", account.id());
                if let Err(e) = account.set_credentials(used.with_refreshed_token(token)) {
                    log::error!("[{}]: unable to store refreshed token: {}", account.id(), e);
                }
            }
        }
    })
}
