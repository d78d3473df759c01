//! Classification of [`Command`] failures.

use derive_more::Display;

#[cfg(doc)]
use crate::Command;

/// Kind of a [`Command`] failure, independent of the [`Command`] itself.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Kind {
    /// Referenced aggregate does not exist.
    NotFound,

    /// Operation contradicts the current state of another aggregate.
    Conflict,

    /// Operation is not permitted from the current state of the aggregate.
    InvalidTransition,

    /// Provided arguments are malformed.
    InvalidInput,

    /// Storage failed to perform the operation.
    Infrastructure,
}
