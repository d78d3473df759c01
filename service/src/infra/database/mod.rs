//! [`Database`]-related implementations.

pub mod memory;

use derive_more::{Display, Error as StdError, From};

use crate::error;

pub use self::memory::Memory;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Memory`] error.
    Memory(memory::Error),
}

impl Error {
    /// Returns [`error::Kind`] of this [`Error`].
    ///
    /// Concurrent writes to the same aggregate are reported as
    /// [`error::Kind::Conflict`], so that the caller may re-read and retry.
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        use memory::Error as M;

        match self {
            Self::Memory(
                M::AlreadyExists { .. } | M::DuplicateCode(_) | M::Stale { .. },
            ) => error::Kind::Conflict,
            Self::Memory(M::NotExists { .. }) => error::Kind::Infrastructure,
        }
    }
}
