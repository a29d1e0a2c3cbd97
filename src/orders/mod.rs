mod dto;
mod services;
mod store;
pub mod toggle;

pub use dto::{ClickOutcome, DayUpdate, EditTarget, MealCounts};
pub use services::CalendarOrders;
pub use store::SelectionStore;
