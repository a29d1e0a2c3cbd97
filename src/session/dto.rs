use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authorization level stored in the remote `user_roles` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    GroupOrder,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::GroupOrder => "group_order",
            Role::Admin => "admin",
        }
    }

    /// Unknown strings fall back to the lowest privilege.
    pub fn parse(s: &str) -> Role {
        match s {
            "admin" => Role::Admin,
            "group_order" => Role::GroupOrder,
            _ => Role::User,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signed-in account after (or optimistically before) reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    /// True when no role record existed remotely before this sign-in, or the
    /// stored display name was empty. Forces a name-confirmation step.
    pub is_new_account: bool,
}

/// Session state published to the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AccountState {
    #[default]
    SignedOut,
    /// Signed in, no cached identity, waiting on the remote role record.
    Reconciling,
    Ready(Account),
}

impl AccountState {
    pub fn account(&self) -> Option<&Account> {
        match self {
            AccountState::Ready(account) => Some(account),
            _ => None,
        }
    }
}
