use async_trait::async_trait;
use uuid::Uuid;

/// Session payload delivered by the hosted auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub account_id: Uuid,
    pub email: String,
    /// OAuth profile name, when the provider supplies one.
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProviderSession {
    /// Display name to use before the remote record is consulted: the OAuth
    /// full name, else the local part of the email.
    pub fn provider_name(&self) -> String {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }
}

/// One event on the provider's auth-state stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(ProviderSession),
    SignedOut,
}

/// Outbound calls to the hosted auth provider. Session *events* arrive
/// separately, on the channel fed to [`crate::session::SessionSync::run`].
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Start the OAuth redirect flow; the session arrives on the stream.
    async fn sign_in_with_google(&self) -> anyhow::Result<()>;
    async fn sign_in_with_password(&self, email: &str, password: &str) -> anyhow::Result<()>;
    /// Session already held by the provider, if any (startup fast path).
    async fn current_session(&self) -> anyhow::Result<Option<ProviderSession>>;
    async fn sign_out(&self) -> anyhow::Result<()>;
}
