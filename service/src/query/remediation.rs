//! [`Query`] collection related to [`Remediation`]s.

use common::operations::By;

use crate::{
    domain::{property, remediation, Remediation},
    read::remediation::Open,
};
#[cfg(doc)]
use crate::{domain::Property, Query};

use super::DatabaseQuery;

/// Queries a [`Remediation`] by its [`remediation::Id`].
pub type ById = DatabaseQuery<By<Option<Remediation>, remediation::Id>>;

/// Queries open [`Remediation`]s of the [`Property`] with the provided
/// [`property::Id`].
pub type OpenByProperty =
    DatabaseQuery<By<Vec<Open<Remediation>>, property::Id>>;

/// Queries open [`Remediation`]s due before the provided
/// [`remediation::DueDateTime`].
pub type Overdue =
    DatabaseQuery<By<Vec<Open<Remediation>>, remediation::DueDateTime>>;
