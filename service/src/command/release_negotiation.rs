//! [`Command`] for unlinking a [`Negotiation`] from its [`Property`].

use std::fmt;

use common::{
    operations::{By, Record, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{negotiation, property, Negotiation, Property},
    error,
    infra::{audit, database, Audit, Database},
    Service,
};

use super::Command;

/// [`Command`] for unlinking a [`Negotiation`] from its [`Property`] and
/// moving the [`Property`] back into [`property::Status::Available`].
///
/// Does nothing if the [`Property`] isn't linked to the [`Negotiation`], so
/// it's safe to be re-issued.
#[derive(Clone, Copy, Debug)]
pub struct ReleaseNegotiation {
    /// ID of the [`Property`] to unlink the [`Negotiation`] from.
    pub property_id: property::Id,

    /// ID of the [`Negotiation`] to be unlinked.
    pub negotiation_id: negotiation::Id,

    /// [`audit::Actor`] unlinking the [`Negotiation`].
    pub actor: audit::Actor,
}

impl<Db, Au> Command<ReleaseNegotiation> for Service<Db, Au>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Negotiation>, negotiation::Id>>,
            Ok = Option<Negotiation>,
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ReleaseNegotiation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReleaseNegotiation {
            property_id,
            negotiation_id,
            actor,
        } = cmd;

        let negotiation = self
            .database()
            .execute(Select(By::<Option<Negotiation>, _>::new(negotiation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NegotiationNotExists(negotiation_id))
            .map_err(tracerr::wrap!())?;
        if negotiation.property_id != property_id {
            return Err(tracerr::new!(E::WrongProperty {
                negotiation_id,
                property_id,
            }));
        }

        let mut property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        if !property.release_negotiation(negotiation_id, DateTime::now()) {
            log::debug!(
                "`Property(id: {property_id})` is not held by \
                 `Negotiation(id: {negotiation_id})`",
            );
            return Ok(property);
        }
        if property.is_available_while_pending() {
            log::warn!(
                "`Property(id: {property_id})` became `AVAILABLE` while \
                 having open pending issues",
            );
        }

        self.database()
            .execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Negotiation(id: {negotiation_id})` released \
             `Property(id: {property_id})`",
        );
        self.record(audit::Entry::now(
            actor,
            audit::Action::NegotiationReleased,
            property_id,
            format!("negotiation: {negotiation_id}"),
        ))
        .await;

        Ok(property)
    }
}

/// Error of [`ReleaseNegotiation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Negotiation`] with the provided ID does not exist.
    #[display("`Negotiation(id: {_0})` does not exist")]
    NegotiationNotExists(#[error(not(source))] negotiation::Id),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`Negotiation`] is about another [`Property`].
    #[display(
        "`Negotiation(id: {negotiation_id})` is not about \
         `Property(id: {property_id})`"
    )]
    WrongProperty {
        /// ID of the [`Negotiation`].
        negotiation_id: negotiation::Id,

        /// ID of the [`Property`].
        property_id: property::Id,
    },
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(e) => e.kind(),
            Self::NegotiationNotExists(_) | Self::PropertyNotExists(_) => {
                error::Kind::NotFound
            }
            Self::WrongProperty { .. } => error::Kind::Conflict,
        }
    }
}
