//! [`FinancialEntry`] read model definition.

#[cfg(doc)]
use crate::domain::{FinancialEntry, Property};

/// Wrapper around [`FinancialEntry`] indicating that it [`is_blocking()`] its
/// [`Property`].
///
/// [`is_blocking()`]: FinancialEntry::is_blocking
#[derive(Clone, Copy, Debug)]
pub struct Blocking<T>(pub T);
