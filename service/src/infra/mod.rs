//! Infrastructure layer.

pub mod audit;
pub mod database;

pub use self::{audit::Audit, database::Database};
