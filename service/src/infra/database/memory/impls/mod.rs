//! [`Database`] implementations.

mod financial_entry;
mod maintenance;
mod negotiation;
mod property;
mod remediation;

#[cfg(doc)]
use crate::infra::Database;
