//! [`Query`] collection related to a single [`Property`].

use common::operations::By;

use crate::domain::{property, Property};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Property`] by its [`property::Id`].
pub type ById = DatabaseQuery<By<Option<Property>, property::Id>>;

/// Queries a [`Property`] by its [`property::Code`].
pub type ByCode = DatabaseQuery<By<Option<Property>, property::Code>>;
