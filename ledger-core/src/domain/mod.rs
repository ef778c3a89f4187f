//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with parsing logic - no I/O or external dependencies.

mod filter;
mod month;
pub mod result;
mod summary;
mod transaction;

pub use filter::{DateBounds, FilterSpec, TypeFilter};
pub use month::Month;
pub use summary::{
    CategoryBreakdown, CategoryShare, ComparisonKind, MonthOverview, MonthlySummary, PeriodComparison,
    OTHER_CATEGORY,
};
pub use transaction::{parse_amount, parse_calendar_date, Transaction, TransactionType};
