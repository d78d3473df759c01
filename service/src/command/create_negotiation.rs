//! [`Command`] for creating a new [`Negotiation`].

use std::fmt;

use common::{
    operations::{By, Insert, Record, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        negotiation::{self, Stage},
        property, Negotiation, Property,
    },
    error,
    infra::{audit, database, Audit, Database},
    Service,
};

use super::{attach_negotiation, AttachNegotiation, Command};

/// [`Command`] for creating a new [`Negotiation`] about a [`Property`] and
/// linking it to that [`Property`].
///
/// A [`Property`] is negotiated by at most one non-terminal [`Negotiation`]
/// at a time.
#[derive(Clone, Debug)]
pub struct CreateNegotiation {
    /// ID of the [`Property`] to be negotiated.
    pub property_id: property::Id,

    /// [`negotiation::ClientName`] of the interested party.
    pub client_name: negotiation::ClientName,

    /// [`audit::Actor`] creating the [`Negotiation`].
    pub actor: audit::Actor,
}

impl<Db, Au> Command<CreateNegotiation> for Service<Db, Au>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Negotiation>, Err = Traced<database::Error>>
        + Database<Update<Negotiation>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
    Self: Command<
        AttachNegotiation,
        Ok = Property,
        Err = Traced<attach_negotiation::ExecutionError>,
    >,
{
    type Ok = Negotiation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateNegotiation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateNegotiation {
            property_id,
            client_name,
            actor,
        } = cmd;

        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if let Some(active) = property.active_negotiation_id() {
            return Err(tracerr::new!(E::PropertyNegotiated {
                property_id,
                active,
            }));
        }

        let mut negotiation = Negotiation::new(
            property_id,
            client_name,
            DateTime::now().coerce(),
        );
        self.database()
            .execute(Insert(negotiation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let attached = self
            .execute(AttachNegotiation {
                property_id,
                negotiation_id: negotiation.id,
                actor,
            })
            .await;
        if let Err(e) = attached {
            // `Negotiation` never stays non-terminal without its `Property`.
            let now = DateTime::now();
            if negotiation
                .advance(Stage::Cancelled, "property link failed", None, now)
                .is_ok()
            {
                _ = self
                    .database()
                    .execute(Update(negotiation.clone()))
                    .await
                    .map_err(|db| {
                        log::warn!(
                            "failed to cancel unlinked \
                             `Negotiation(id: {})`: {db}",
                            negotiation.id,
                        );
                    });
            }
            return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
        }

        log::info!(
            "`Negotiation(id: {})` created for `Property(id: {property_id})`",
            negotiation.id,
        );
        self.record(audit::Entry::now(
            actor,
            audit::Action::NegotiationCreated,
            negotiation.id,
            format!(
                "property: {property_id}, client: {}",
                negotiation.client_name,
            ),
        ))
        .await;

        Ok(negotiation)
    }
}

/// Error of [`CreateNegotiation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Failed to link the [`Negotiation`] to the [`Property`].
    #[display("Failed to attach `Negotiation`: {_0}")]
    #[from]
    Attach(attach_negotiation::ExecutionError),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] is negotiated by another [`Negotiation`] already.
    #[display(
        "`Property(id: {property_id})` is negotiated by \
         `Negotiation(id: {active})`"
    )]
    PropertyNegotiated {
        /// ID of the [`Property`].
        property_id: property::Id,

        /// ID of the active [`Negotiation`].
        active: negotiation::Id,
    },

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Attach(e) => e.kind(),
            Self::Db(e) => e.kind(),
            Self::PropertyNegotiated { .. } => error::Kind::Conflict,
            Self::PropertyNotExists(_) => error::Kind::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use tracerr::Traced;

    use crate::{
        domain::{negotiation, property::Status},
        error, fixture, query, Command as _,
    };

    use super::CreateNegotiation;

    #[tokio::test]
    async fn holds_property_by_single_negotiation() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;

        let n1 = fixture::exec(
            &svc,
            CreateNegotiation {
                property_id: p.id,
                client_name: negotiation::ClientName::new("Ana Lima").unwrap(),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap();
        assert_eq!(n1.stage(), negotiation::Stage::LeadCaptured);

        let p = fixture::get_property(&svc, p.id).await;
        assert_eq!(p.status(), Status::InNegotiation);
        assert_eq!(p.active_negotiation_id(), Some(n1.id));

        let err = fixture::exec(
            &svc,
            CreateNegotiation {
                property_id: p.id,
                client_name: negotiation::ClientName::new("Rui Costa").unwrap(),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), error::Kind::Conflict);

        let p = fixture::get_property(&svc, p.id).await;
        assert_eq!(p.active_negotiation_id(), Some(n1.id));
        assert_eq!(p.history().len(), 2);
    }

    #[tokio::test]
    async fn fails_on_unknown_property() {
        let svc = fixture::service();

        let err = fixture::exec(
            &svc,
            CreateNegotiation {
                property_id: crate::domain::property::Id::new(),
                client_name: negotiation::ClientName::new("Ana Lima").unwrap(),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), error::Kind::NotFound);
    }

    #[tokio::test]
    async fn cancels_negotiation_left_without_property() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let faulty = fixture::faulty(&svc, [p.id]);

        let err = faulty
            .execute(CreateNegotiation {
                property_id: p.id,
                client_name: negotiation::ClientName::new("Ana Lima").unwrap(),
                actor: fixture::operator(),
            })
            .await
            .map_err(Traced::into_inner)
            .unwrap_err();
        assert_eq!(err.kind(), error::Kind::Conflict);

        let p = fixture::get_property(&svc, p.id).await;
        assert_eq!(p.status(), Status::Available);
        assert!(p.active_negotiation_id().is_none());

        let negotiations = svc
            .execute(query::negotiation::ByProperty::by(p.id))
            .await
            .unwrap();
        assert_eq!(negotiations.len(), 1);
        assert_eq!(negotiations[0].stage(), negotiation::Stage::Cancelled);
        assert_eq!(
            negotiations[0].history().last().map(|h| h.reason.as_str()),
            Some("property link failed"),
        );

        let n = fixture::negotiation(&svc, p.id).await;
        assert_eq!(
            fixture::get_property(&svc, p.id).await.active_negotiation_id(),
            Some(n.id),
        );
    }
}
