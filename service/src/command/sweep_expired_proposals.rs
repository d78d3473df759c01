//! [`Command`] for cancelling [`Negotiation`]s with expired proposals.

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        negotiation::{self, Stage},
        Negotiation,
    },
    error,
    infra::{audit, database, Database},
    Service,
};

use super::{advance_negotiation, AdvanceNegotiation, Command, SweepReport};

/// [`Command`] for cancelling every [`Negotiation`] in
/// [`Stage::ProposalSent`] whose proposal expired before the provided moment.
///
/// Each cancellation releases the negotiated [`Property`].
///
/// [`Property`]: crate::domain::Property
#[derive(Clone, Copy, Debug)]
pub struct SweepExpiredProposals {
    /// Moment to check the proposal expirations against.
    pub now: DateTime,
}

impl<Db, Au> Command<SweepExpiredProposals> for Service<Db, Au>
where
    Db: Database<
        Select<By<Vec<Negotiation>, negotiation::ProposalExpirationDateTime>>,
        Ok = Vec<Negotiation>,
        Err = Traced<database::Error>,
    >,
    Self: Command<
        AdvanceNegotiation,
        Ok = Negotiation,
        Err = Traced<advance_negotiation::ExecutionError>,
    >,
{
    type Ok = SweepReport<
        negotiation::Id,
        Traced<advance_negotiation::ExecutionError>,
    >;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SweepExpiredProposals,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SweepExpiredProposals { now } = cmd;

        let expired = self
            .database()
            .execute(Select(By::<
                Vec<Negotiation>,
                negotiation::ProposalExpirationDateTime,
            >::new(now.coerce())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut report = SweepReport::default();
        for negotiation_id in expired.into_iter().map(|n| n.id) {
            let res = self
                .execute(AdvanceNegotiation {
                    negotiation_id,
                    stage: Stage::Cancelled,
                    reason: "proposal expired".into(),
                    proposal_expires_at: None,
                    actor: audit::Actor::System,
                })
                .await;
            match res {
                Ok(_) => report.processed.push(negotiation_id),
                Err(e) => {
                    log::error!(
                        "failed to cancel expired \
                         `Negotiation(id: {negotiation_id})`: {e}",
                    );
                    report.failed.push((negotiation_id, e));
                }
            }
        }
        if !report.processed.is_empty() {
            log::info!(
                "cancelled {} `Negotiation`s with expired proposals",
                report.processed.len(),
            );
        }
        Ok(report)
    }
}

/// Error of [`SweepExpiredProposals`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::{
        command::AdvanceNegotiation,
        domain::{negotiation::Stage, property::Status, Negotiation},
        error, fixture,
        infra::audit,
        Command as _,
    };

    use super::SweepExpiredProposals;

    async fn expired(svc: &fixture::TestService, code: &str) -> Negotiation {
        let p = fixture::property(svc, code).await;
        let n = fixture::negotiation(svc, p.id).await;
        fixture::exec(
            svc,
            AdvanceNegotiation {
                negotiation_id: n.id,
                stage: Stage::ProposalSent,
                reason: "proposal sent".into(),
                proposal_expires_at: Some(
                    (DateTime::now() - Duration::from_secs(60)).coerce(),
                ),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn cancels_expired_and_releases_property() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let n = fixture::negotiation(&svc, p.id).await;
        let expires = DateTime::now() - Duration::from_secs(60);
        _ = fixture::exec(
            &svc,
            AdvanceNegotiation {
                negotiation_id: n.id,
                stage: Stage::ProposalSent,
                reason: "proposal sent".into(),
                proposal_expires_at: Some(expires.coerce()),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap();

        let report = fixture::exec(
            &svc,
            SweepExpiredProposals {
                now: DateTime::now(),
            },
        )
        .await
        .unwrap();
        assert_eq!(report.processed, [n.id]);
        assert!(report.is_clean());

        let n = fixture::get_negotiation(&svc, n.id).await;
        assert_eq!(n.stage(), Stage::Cancelled);
        assert_eq!(
            n.history().last().map(|h| h.reason.as_str()),
            Some("proposal expired"),
        );
        let p = fixture::get_property(&svc, p.id).await;
        assert_eq!(p.status(), Status::Available);
        assert!(p.active_negotiation_id().is_none());

        let audited = svc.audit().entries().await;
        assert!(audited.iter().any(|e| {
            e.actor == audit::Actor::System
                && e.action == audit::Action::NegotiationAdvanced
                && e.target == audit::Target::Negotiation(n.id)
        }));
    }

    #[tokio::test]
    async fn second_run_finds_nothing() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let n = fixture::negotiation(&svc, p.id).await;
        _ = fixture::exec(
            &svc,
            AdvanceNegotiation {
                negotiation_id: n.id,
                stage: Stage::ProposalSent,
                reason: "proposal sent".into(),
                proposal_expires_at: Some(
                    (DateTime::now() - Duration::from_secs(60)).coerce(),
                ),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap();
        let now = DateTime::now();
        _ = fixture::exec(&svc, SweepExpiredProposals { now })
            .await
            .unwrap();
        let history = fixture::get_negotiation(&svc, n.id).await.history().len();

        let report = fixture::exec(&svc, SweepExpiredProposals { now })
            .await
            .unwrap();
        assert!(report.processed.is_empty());
        assert!(report.failed.is_empty());
        assert_eq!(
            fixture::get_negotiation(&svc, n.id).await.history().len(),
            history,
        );
    }

    #[tokio::test]
    async fn ignores_proposals_not_expired_yet() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let n = fixture::negotiation(&svc, p.id).await;
        _ = fixture::exec(
            &svc,
            AdvanceNegotiation {
                negotiation_id: n.id,
                stage: Stage::ProposalSent,
                reason: "proposal sent".into(),
                proposal_expires_at: Some(
                    (DateTime::now() + Duration::from_secs(3600)).coerce(),
                ),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap();

        let report = fixture::exec(
            &svc,
            SweepExpiredProposals {
                now: DateTime::now(),
            },
        )
        .await
        .unwrap();
        assert!(report.processed.is_empty());
        assert_eq!(
            fixture::get_negotiation(&svc, n.id).await.stage(),
            Stage::ProposalSent,
        );
    }

    #[tokio::test]
    async fn failed_item_does_not_stop_sweep() {
        let svc = fixture::service();
        let n1 = expired(&svc, "AP-101").await;
        let n2 = expired(&svc, "AP-102").await;
        let faulty = fixture::faulty(&svc, [n1.property_id]);

        let report = faulty
            .execute(SweepExpiredProposals {
                now: DateTime::now(),
            })
            .await
            .unwrap();
        assert_eq!(report.processed, [n2.id]);
        let [(failed_id, err)]: [_; 1] = report.failed.try_into().unwrap();
        assert_eq!(failed_id, n1.id);
        assert_eq!(err.into_inner().kind(), error::Kind::Conflict);

        let p2 = fixture::get_property(&svc, n2.property_id).await;
        assert_eq!(p2.status(), Status::Available);
        let p1 = fixture::get_property(&svc, n1.property_id).await;
        assert_eq!(p1.active_negotiation_id(), Some(n1.id));

        // Repeating the terminal stage converges the interrupted release.
        _ = fixture::exec(
            &svc,
            AdvanceNegotiation {
                negotiation_id: n1.id,
                stage: Stage::Cancelled,
                reason: "proposal expired".into(),
                proposal_expires_at: None,
                actor: audit::Actor::System,
            },
        )
        .await
        .unwrap();
        let p1 = fixture::get_property(&svc, n1.property_id).await;
        assert_eq!(p1.status(), Status::Available);
        assert!(p1.active_negotiation_id().is_none());
    }
}
