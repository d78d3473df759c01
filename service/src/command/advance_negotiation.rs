//! [`Command`] for advancing a [`Negotiation`] through its stages.

use std::fmt;

use common::{
    history::Reason,
    operations::{By, Record, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        negotiation::{self, AdvanceError, Stage},
        Negotiation, Property,
    },
    error,
    infra::{audit, database, Audit, Database},
    Service,
};

use super::{release_negotiation, Command, ReleaseNegotiation};

/// [`Command`] for moving a [`Negotiation`] into the provided [`Stage`].
///
/// Reaching a terminal [`Stage`] releases the [`Property`]. Re-issuing this
/// [`Command`] for the terminal [`Stage`] the [`Negotiation`] is in already
/// repeats the release only, converging a previously interrupted one.
#[derive(Clone, Debug)]
pub struct AdvanceNegotiation {
    /// ID of the [`Negotiation`] to be advanced.
    pub negotiation_id: negotiation::Id,

    /// [`Stage`] to move the [`Negotiation`] into.
    pub stage: Stage,

    /// [`Reason`] of the move.
    pub reason: Reason,

    /// [`DateTime`] when the proposal expires, taken into account only when
    /// moving into [`Stage::ProposalSent`].
    pub proposal_expires_at: Option<negotiation::ProposalExpirationDateTime>,

    /// [`audit::Actor`] advancing the [`Negotiation`].
    pub actor: audit::Actor,
}

impl<Db, Au> Command<AdvanceNegotiation> for Service<Db, Au>
where
    Db: Database<
            Select<By<Option<Negotiation>, negotiation::Id>>,
            Ok = Option<Negotiation>,
            Err = Traced<database::Error>,
        > + Database<Update<Negotiation>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
    Self: Command<
        ReleaseNegotiation,
        Ok = Property,
        Err = Traced<release_negotiation::ExecutionError>,
    >,
{
    type Ok = Negotiation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AdvanceNegotiation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AdvanceNegotiation {
            negotiation_id,
            stage,
            reason,
            proposal_expires_at,
            actor,
        } = cmd;

        let mut negotiation = self
            .database()
            .execute(Select(By::<Option<Negotiation>, _>::new(negotiation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NegotiationNotExists(negotiation_id))
            .map_err(tracerr::wrap!())?;
        let from = negotiation.stage();

        let advanced = negotiation
            .advance(
                stage,
                reason.clone(),
                proposal_expires_at,
                DateTime::now(),
            )
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if advanced {
            self.database()
                .execute(Update(negotiation.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            log::info!(
                "`Negotiation(id: {negotiation_id})` advanced from `{from}` to \
                 `{stage}`",
            );
            self.record(audit::Entry::now(
                actor,
                audit::Action::NegotiationAdvanced,
                negotiation_id,
                format!("{from} -> {stage}: {}", reason.as_str()),
            ))
            .await;
        } else {
            log::debug!(
                "`Negotiation(id: {negotiation_id})` is in `{stage}` already",
            );
        }

        if negotiation.is_terminal() {
            self.execute(ReleaseNegotiation {
                property_id: negotiation.property_id,
                negotiation_id,
                actor,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        }

        Ok(negotiation)
    }
}

/// Error of [`AdvanceNegotiation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Negotiation`] is terminal already.
    #[display("{_0}")]
    #[from]
    Advance(AdvanceError),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Negotiation`] with the provided ID does not exist.
    #[display("`Negotiation(id: {_0})` does not exist")]
    NegotiationNotExists(#[error(not(source))] negotiation::Id),

    /// Failed to release the [`Property`].
    #[display("Failed to release `Property`: {_0}")]
    #[from]
    Release(release_negotiation::ExecutionError),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Advance(AdvanceError::Cancelled(_)) => {
                error::Kind::InvalidTransition
            }
            Self::Advance(AdvanceError::Completed(_)) => error::Kind::Conflict,
            Self::Db(e) => e.kind(),
            Self::NegotiationNotExists(_) => error::Kind::NotFound,
            Self::Release(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::{
        domain::{negotiation::Stage, property::Status},
        error, fixture,
    };

    use super::AdvanceNegotiation;

    fn cmd(
        negotiation_id: crate::domain::negotiation::Id,
        stage: Stage,
    ) -> AdvanceNegotiation {
        AdvanceNegotiation {
            negotiation_id,
            stage,
            reason: "operator decision".into(),
            proposal_expires_at: None,
            actor: fixture::operator(),
        }
    }

    #[tokio::test]
    async fn completing_releases_property() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let n = fixture::negotiation(&svc, p.id).await;

        let n = fixture::exec(&svc, cmd(n.id, Stage::ContractDrafting))
            .await
            .unwrap();
        assert_eq!(
            fixture::get_property(&svc, p.id).await.status(),
            Status::InNegotiation,
        );

        let n = fixture::exec(&svc, cmd(n.id, Stage::Completed))
            .await
            .unwrap();
        assert!(n.is_terminal());
        let p = fixture::get_property(&svc, p.id).await;
        assert_eq!(p.status(), Status::Available);
        assert!(p.active_negotiation_id().is_none());
    }

    #[tokio::test]
    async fn sets_proposal_expiration() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let n = fixture::negotiation(&svc, p.id).await;
        let expires = (DateTime::now() + Duration::from_secs(3600)).coerce();

        let n = fixture::exec(
            &svc,
            AdvanceNegotiation {
                proposal_expires_at: Some(expires),
                ..cmd(n.id, Stage::ProposalSent)
            },
        )
        .await
        .unwrap();
        assert_eq!(n.proposal_expires_at(), Some(expires));
        assert_eq!(
            fixture::get_negotiation(&svc, n.id)
                .await
                .proposal_expires_at(),
            Some(expires),
        );
    }

    #[tokio::test]
    async fn cancelled_negotiation_never_advances() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let n = fixture::negotiation(&svc, p.id).await;
        _ = fixture::exec(&svc, cmd(n.id, Stage::Cancelled))
            .await
            .unwrap();

        let err = fixture::exec(&svc, cmd(n.id, Stage::ProposalSent))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), error::Kind::InvalidTransition);

        let n = fixture::get_negotiation(&svc, n.id).await;
        assert_eq!(n.stage(), Stage::Cancelled);
        assert_eq!(n.history().len(), 2);
    }

    #[tokio::test]
    async fn completed_negotiation_never_reopens() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let n = fixture::negotiation(&svc, p.id).await;
        _ = fixture::exec(&svc, cmd(n.id, Stage::Completed))
            .await
            .unwrap();

        let err = fixture::exec(&svc, cmd(n.id, Stage::LeadCaptured))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), error::Kind::Conflict);
    }

    #[tokio::test]
    async fn repeated_terminal_stage_converges_release() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let n = fixture::negotiation(&svc, p.id).await;
        _ = fixture::exec(&svc, cmd(n.id, Stage::Cancelled))
            .await
            .unwrap();
        let before = fixture::get_property(&svc, p.id).await;

        let n = fixture::exec(&svc, cmd(n.id, Stage::Cancelled))
            .await
            .unwrap();
        assert_eq!(n.history().len(), 2);

        let after = fixture::get_property(&svc, p.id).await;
        assert_eq!(after.status(), Status::Available);
        assert_eq!(after.history().len(), before.history().len());
    }

    #[tokio::test]
    async fn new_negotiation_allowed_after_cancellation() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let n1 = fixture::negotiation(&svc, p.id).await;
        _ = fixture::exec(&svc, cmd(n1.id, Stage::Cancelled))
            .await
            .unwrap();

        let n2 = fixture::negotiation(&svc, p.id).await;
        let p = fixture::get_property(&svc, p.id).await;
        assert_eq!(p.active_negotiation_id(), Some(n2.id));
        assert_eq!(p.status(), Status::InNegotiation);
    }
}
