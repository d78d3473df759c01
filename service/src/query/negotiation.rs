//! [`Query`] collection related to a single [`Negotiation`].

use common::operations::By;

use crate::domain::{negotiation, property, Negotiation};
#[cfg(doc)]
use crate::{domain::Property, Query};

use super::DatabaseQuery;

/// Queries a [`Negotiation`] by its [`negotiation::Id`].
pub type ById = DatabaseQuery<By<Option<Negotiation>, negotiation::Id>>;

/// Queries [`Negotiation`]s whose proposals expired before the provided
/// [`negotiation::ProposalExpirationDateTime`].
pub type ExpiredProposals = DatabaseQuery<
    By<Vec<Negotiation>, negotiation::ProposalExpirationDateTime>,
>;

/// Queries every [`Negotiation`] ever opened about the [`Property`] with the
/// provided [`property::Id`], oldest first.
pub type ByProperty = DatabaseQuery<By<Vec<Negotiation>, property::Id>>;
