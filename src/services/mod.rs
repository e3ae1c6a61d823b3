//! Domain services, one per entity family.
//!
//! A service owns the repositories of its family, carries the default seed
//! data and adds the operations that need more than plain CRUD.

mod adoptions;
mod applications;
mod donations;
mod events;
mod facility;
mod foster;
mod health;
mod inventory;
mod pets;
mod vaccinations;
mod volunteers;
mod weather;

pub use adoptions::*;
pub use applications::*;
pub use donations::*;
pub use events::*;
pub use facility::*;
pub use foster::*;
pub use health::*;
pub use inventory::*;
pub use pets::*;
pub use vaccinations::*;
pub use volunteers::*;
pub use weather::*;

use chrono::{Days, NaiveDate, Utc};

use crate::errors::AppError;

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// `YYYY-MM-DD` of the day `days` after today, for seed rows that stay ahead
/// of the calendar.
pub(crate) fn days_from_today(days: u64) -> String {
    let today = today();
    today
        .checked_add_days(Days::new(days))
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

pub(crate) fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}
