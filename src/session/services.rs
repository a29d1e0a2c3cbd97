use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

use crate::auth::{AuthClient, AuthEvent, ProviderSession};
use crate::cache::RoleCache;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::remote::RemoteStore;

use super::dto::{Account, AccountState, Role};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

struct ResolvedIdentity {
    role: Role,
    name: String,
    is_new: bool,
}

/// Reconciles the provider's auth-state stream with the remote role table
/// and publishes [`AccountState`] on a watch channel. A cached identity is
/// published immediately on sign-in; reconciliation then catches up in the
/// background and refreshes the cache.
pub struct SessionSync {
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthClient>,
    cache: Arc<dyn RoleCache>,
    config: SyncConfig,
    state: watch::Sender<AccountState>,
}

impl SessionSync {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        auth: Arc<dyn AuthClient>,
        cache: Arc<dyn RoleCache>,
        config: SyncConfig,
    ) -> Self {
        let (state, _) = watch::channel(AccountState::SignedOut);
        Self {
            remote,
            auth,
            cache,
            config,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AccountState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> AccountState {
        self.state.borrow().clone()
    }

    /// Drive the state machine from the provider's event stream until the
    /// sender side is dropped. Failures are logged here; callers needing to
    /// surface them directly can use [`SessionSync::handle_event`].
    pub async fn run(&self, mut events: mpsc::Receiver<AuthEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle_event(event).await {
                error!(error = %e, "auth event handling failed");
            }
        }
    }

    /// Reconcile a session the provider already holds, before any stream
    /// events arrive (startup fast path).
    pub async fn bootstrap(&self) -> Result<(), SyncError> {
        let session = self
            .auth
            .current_session()
            .await
            .context("fetch current session")?;
        match session {
            Some(session) => self.handle_sign_in(session).await,
            None => {
                self.state.send_replace(AccountState::SignedOut);
                Ok(())
            }
        }
    }

    /// Start the OAuth flow; the resulting session arrives on the stream.
    pub async fn sign_in_with_google(&self) -> anyhow::Result<()> {
        self.auth
            .sign_in_with_google()
            .await
            .context("google sign-in")
    }

    pub async fn handle_event(&self, event: AuthEvent) -> Result<(), SyncError> {
        match event {
            AuthEvent::SignedIn(session) => self.handle_sign_in(session).await,
            AuthEvent::SignedOut => {
                self.state.send_replace(AccountState::SignedOut);
                Ok(())
            }
        }
    }

    #[instrument(skip(self, session), fields(email = %session.email))]
    async fn handle_sign_in(&self, session: ProviderSession) -> Result<(), SyncError> {
        let provider_name = session.provider_name();
        let cached_role = self.cache.get_role(&session.email);

        if let Some(role) = cached_role {
            let name = self
                .cache
                .get_name(&session.email)
                .unwrap_or_else(|| provider_name.clone());
            info!(role = %role, "rendering from cached identity");
            self.state.send_replace(AccountState::Ready(Account {
                id: session.account_id,
                email: session.email.clone(),
                name,
                avatar_url: session.avatar_url.clone(),
                role,
                is_new_account: false,
            }));
        } else {
            self.state.send_replace(AccountState::Reconciling);
        }

        let deadline = Duration::from_secs(self.config.timeout_secs);
        let resolved = match timeout(
            deadline,
            self.resolve_identity(&session.email, &provider_name),
        )
        .await
        {
            Ok(Ok(resolved)) => resolved,
            Ok(Err(e)) => {
                if cached_role.is_some() {
                    warn!(error = %e, "background reconciliation failed; keeping cached identity");
                    return Ok(());
                }
                error!(error = %e, "session reconciliation failed");
                self.state.send_replace(AccountState::SignedOut);
                return Err(SyncError::Remote(e));
            }
            Err(_elapsed) => {
                if cached_role.is_some() {
                    warn!("session sync timed out; keeping cached identity");
                    return Ok(());
                }
                error!("session sync timed out with no cached identity");
                if let Err(e) = self.auth.sign_out().await {
                    error!(error = %e, "sign-out after sync timeout failed");
                }
                self.state.send_replace(AccountState::SignedOut);
                return Err(SyncError::Timeout);
            }
        };

        self.cache
            .put(&session.email, resolved.role, Some(&resolved.name));
        self.state.send_replace(AccountState::Ready(Account {
            id: session.account_id,
            email: session.email,
            name: resolved.name,
            avatar_url: session.avatar_url,
            role: resolved.role,
            is_new_account: resolved.is_new,
        }));
        Ok(())
    }

    /// Look up the role record, bootstrapping one on first sign-in. A
    /// missing record is the "new account" signal, not an error.
    async fn resolve_identity(
        &self,
        email: &str,
        provider_name: &str,
    ) -> anyhow::Result<ResolvedIdentity> {
        let record = self
            .remote
            .select_role_by_email(email)
            .await
            .context("look up role record")?;

        if self
            .config
            .admin_overrides
            .iter()
            .any(|e| e.eq_ignore_ascii_case(email))
        {
            warn!(%email, "admin override applied");
            let name = record
                .as_ref()
                .and_then(|r| r.name.clone())
                .unwrap_or_else(|| provider_name.to_string());
            return Ok(ResolvedIdentity {
                role: Role::Admin,
                name,
                is_new: false,
            });
        }

        match record {
            Some(record) => {
                let stored_name = record
                    .name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty());
                Ok(ResolvedIdentity {
                    role: Role::parse(&record.role),
                    name: stored_name
                        .map(str::to_string)
                        .unwrap_or_else(|| provider_name.to_string()),
                    is_new: stored_name.is_none(),
                })
            }
            None => {
                anyhow::ensure!(is_valid_email(email), "refusing to bootstrap account for invalid email");
                info!(%email, "no role record found, creating one");
                self.remote
                    .insert_role(email, Role::User, provider_name)
                    .await
                    .context("create role record")?;
                Ok(ResolvedIdentity {
                    role: Role::User,
                    name: provider_name.to_string(),
                    is_new: true,
                })
            }
        }
    }

    /// Confirm the display name a new account was prompted for. The state
    /// updates optimistically; the remote write and cache refresh follow.
    #[instrument(skip(self))]
    pub async fn complete_profile(&self, name: &str) -> anyhow::Result<()> {
        let account = match self.current() {
            AccountState::Ready(account) => account,
            _ => anyhow::bail!("no signed-in account"),
        };

        let mut updated = account.clone();
        updated.name = name.to_string();
        updated.is_new_account = false;
        self.state.send_replace(AccountState::Ready(updated));

        self.remote
            .update_role_name(&account.email, name)
            .await
            .context("update display name")?;
        self.cache.put(&account.email, account.role, Some(name));
        Ok(())
    }

    /// Sign out. Local state clears immediately; the remote sign-out is
    /// best-effort. The role cache is deliberately left intact so the next
    /// sign-in renders instantly.
    pub async fn sign_out(&self) {
        self.state.send_replace(AccountState::SignedOut);
        if let Err(e) = self.auth.sign_out().await {
            error!(error = %e, "remote sign-out failed");
        }
    }

    /// Password sign-in for pre-provisioned accounts with a known role,
    /// pre-seeding the cache so the follow-up sync is a cache hit. The
    /// resulting session arrives on the provider's event stream as usual.
    #[instrument(skip(self, password))]
    pub async fn sign_in_known_account(
        &self,
        email: &str,
        password: &str,
        role: Role,
        name: &str,
    ) -> anyhow::Result<()> {
        self.cache.put(email, role, Some(name));
        self.auth
            .sign_in_with_password(email, password)
            .await
            .context("password sign-in")
    }
}
