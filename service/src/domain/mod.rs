//! Domain definitions.

pub mod financial_entry;
pub mod maintenance;
pub mod negotiation;
pub mod property;
pub mod remediation;

use derive_more::Display;

pub use self::{
    financial_entry::FinancialEntry, negotiation::Negotiation,
    property::Property, remediation::Remediation,
};

/// Optimistic concurrency token of an aggregate.
///
/// Storage bumps it on every successful update, and rejects an update whose
/// token differs from the stored one.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
pub struct Version(u64);

impl Version {
    /// Returns the [`Version`] following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}
