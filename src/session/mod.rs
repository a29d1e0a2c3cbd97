mod dto;
mod services;

pub use dto::{Account, AccountState, Role};
pub use services::SessionSync;
