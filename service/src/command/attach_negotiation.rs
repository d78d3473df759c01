//! [`Command`] for linking a [`Negotiation`] to its [`Property`].

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

/// [`Command`] for linking a non-terminal [`Negotiation`] to its [`Property`]
/// and moving the [`Property`] into [`property::Status::InNegotiation`].
#[derive(Clone, Copy, Debug)]
pub struct AttachNegotiation {
    /// ID of the [`Property`] to link the [`Negotiation`] to.
    pub property_id: property::Id,

    /// ID of the [`Negotiation`] to be linked.
    pub negotiation_id: negotiation::Id,

    /// [`audit::Actor`] linking the [`Negotiation`].
    pub actor: audit::Actor,
}

impl<Db, Au> Command<AttachNegotiation> for Service<Db, Au>
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
        cmd: AttachNegotiation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AttachNegotiation {
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
        if negotiation.is_terminal() {
            return Err(tracerr::new!(E::NegotiationTerminal(negotiation_id)));
        }

        let mut property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        let changed = property
            .attach_negotiation(negotiation_id, DateTime::now())
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if !changed {
            log::debug!(
                "`Negotiation(id: {negotiation_id})` is attached to \
                 `Property(id: {property_id})` already",
            );
            return Ok(property);
        }

        self.database()
            .execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Negotiation(id: {negotiation_id})` attached to \
             `Property(id: {property_id})`",
        );
        self.record(audit::Entry::now(
            actor,
            audit::Action::NegotiationAttached,
            property_id,
            format!("negotiation: {negotiation_id}"),
        ))
        .await;

        Ok(property)
    }
}

/// Error of [`AttachNegotiation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Property`] is held by another [`Negotiation`].
    #[display("{_0}")]
    #[from]
    Conflict(property::NegotiationConflict),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Negotiation`] with the provided ID does not exist.
    #[display("`Negotiation(id: {_0})` does not exist")]
    NegotiationNotExists(#[error(not(source))] negotiation::Id),

    /// [`Negotiation`] is terminal and cannot hold a [`Property`].
    #[display("`Negotiation(id: {_0})` is terminal")]
    NegotiationTerminal(#[error(not(source))] negotiation::Id),

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
            Self::Conflict(_) | Self::WrongProperty { .. } => {
                error::Kind::Conflict
            }
            Self::Db(e) => e.kind(),
            Self::NegotiationNotExists(_) | Self::PropertyNotExists(_) => {
                error::Kind::NotFound
            }
            Self::NegotiationTerminal(_) => error::Kind::InvalidTransition,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{domain::property::Status, error, fixture};

    use super::AttachNegotiation;

    #[tokio::test]
    async fn attaching_same_negotiation_twice_is_noop() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let n = fixture::negotiation(&svc, p.id).await;

        let p = fixture::exec(
            &svc,
            AttachNegotiation {
                property_id: p.id,
                negotiation_id: n.id,
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap();
        assert_eq!(p.status(), Status::InNegotiation);
        assert_eq!(p.active_negotiation_id(), Some(n.id));
        assert_eq!(p.history().len(), 2);
    }

    #[tokio::test]
    async fn rejects_negotiation_of_another_property() {
        let svc = fixture::service();
        let p1 = fixture::property(&svc, "AP-101").await;
        let p2 = fixture::property(&svc, "AP-102").await;
        let n = fixture::negotiation(&svc, p1.id).await;

        let err = fixture::exec(
            &svc,
            AttachNegotiation {
                property_id: p2.id,
                negotiation_id: n.id,
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), error::Kind::Conflict);

        let p2 = fixture::get_property(&svc, p2.id).await;
        assert_eq!(p2.status(), Status::Available);
        assert!(p2.active_negotiation_id().is_none());
    }
}
