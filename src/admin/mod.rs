mod dto;
mod services;

pub use dto::{DayTotals, OrderDetail, RosterEntry};
pub use services::{aggregate, day_details, AdminBoard};
