//! [`Query`] collection related to maintenance [`Order`]s.

use common::operations::By;

use crate::{
    domain::{
        maintenance::{self, Order},
        property,
    },
    read::maintenance::Open,
};
#[cfg(doc)]
use crate::{domain::Property, Query};

use super::DatabaseQuery;

/// Queries an [`Order`] by its [`maintenance::Id`].
pub type ById = DatabaseQuery<By<Option<Order>, maintenance::Id>>;

/// Queries open [`Order`]s of the [`Property`] with the provided
/// [`property::Id`].
pub type OpenByProperty = DatabaseQuery<By<Vec<Open<Order>>, property::Id>>;
