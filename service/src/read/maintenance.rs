//! Maintenance [`Order`] read model definition.

#[cfg(doc)]
use crate::domain::maintenance::Order;

/// Wrapper around a maintenance [`Order`] indicating that it [`is_open()`].
///
/// [`is_open()`]: Order::is_open
#[derive(Clone, Copy, Debug)]
pub struct Open<T>(pub T);
