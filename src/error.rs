use thiserror::Error;

/// Failures of the sign-in reconciliation flow. A role-record miss is not an
/// error; it triggers account bootstrap and never surfaces here.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reconciliation exceeded the configured deadline with no cached
    /// identity to fall back on. A remote sign-out has already been issued.
    #[error("session sync timed out")]
    Timeout,

    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}
