//! [`Query`] collection related to [`FinancialEntry`]s.

use common::operations::By;

use crate::{
    domain::{financial_entry, property, FinancialEntry},
    read::financial_entry::Blocking,
};
#[cfg(doc)]
use crate::{domain::Property, Query};

use super::DatabaseQuery;

/// Queries a [`FinancialEntry`] by its [`financial_entry::Id`].
pub type ById = DatabaseQuery<By<Option<FinancialEntry>, financial_entry::Id>>;

/// Queries [`FinancialEntry`]s currently blocking the [`Property`] with the
/// provided [`property::Id`].
pub type BlockingByProperty =
    DatabaseQuery<By<Vec<Blocking<FinancialEntry>>, property::Id>>;
