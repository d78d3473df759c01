//! Read entities definitions.

pub mod financial_entry;
pub mod maintenance;
pub mod remediation;
