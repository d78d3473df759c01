//! [`Remediation`] read model definition.

#[cfg(doc)]
use crate::domain::Remediation;

/// Wrapper around a [`Remediation`] indicating that it [`is_open()`].
///
/// [`is_open()`]: Remediation::is_open
#[derive(Clone, Copy, Debug)]
pub struct Open<T>(pub T);
