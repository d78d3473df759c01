//! [`Command`] for raising the pending signal of [`Property`]s whose
//! pending issues became overdue.

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{property, remediation, Property, Remediation},
    error,
    infra::{audit, database, Database},
    read::remediation::Open,
    Service,
};

use super::{sync_pending_status, Command, SweepReport, SyncPendingStatus};

/// [`Command`] for recomputing the pending signal of every [`Property`]
/// having an open [`remediation::Kind::PendingIssue`] past its due date.
///
/// A [`Remediation`] becomes overdue by the passage of time only, so nothing
/// else recomputes the pending signal at that moment.
#[derive(Clone, Copy, Debug)]
pub struct SyncOverdueRemediations {
    /// Moment to check the due dates of [`Remediation`]s against.
    pub now: DateTime,
}

impl<Db, Au> Command<SyncOverdueRemediations> for Service<Db, Au>
where
    Db: Database<
        Select<By<Vec<Open<Remediation>>, remediation::DueDateTime>>,
        Ok = Vec<Open<Remediation>>,
        Err = Traced<database::Error>,
    >,
    Self: Command<
        SyncPendingStatus,
        Ok = Property,
        Err = Traced<sync_pending_status::ExecutionError>,
    >,
{
    type Ok = SweepReport<
        property::Id,
        Traced<sync_pending_status::ExecutionError>,
    >;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SyncOverdueRemediations,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SyncOverdueRemediations { now } = cmd;

        let overdue = self
            .database()
            .execute(Select(By::<Vec<Open<Remediation>>, _>::new(
                now.coerce(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut property_ids = Vec::<property::Id>::new();
        for Open(r) in overdue {
            let pending = r.is_pending_issue(now);
            if pending && !property_ids.contains(&r.property_id) {
                property_ids.push(r.property_id);
            }
        }

        let mut report = SweepReport::default();
        for property_id in property_ids {
            let res = self
                .execute(SyncPendingStatus {
                    property_id,
                    now,
                    actor: audit::Actor::System,
                })
                .await;
            match res {
                Ok(_) => report.processed.push(property_id),
                Err(e) => {
                    log::error!(
                        "failed to sync pending signal of \
                         `Property(id: {property_id})`: {e}",
                    );
                    report.failed.push((property_id, e));
                }
            }
        }
        Ok(report)
    }
}

/// Error of [`SyncOverdueRemediations`] [`Command`] execution.
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
        domain::{property::Status, remediation},
        fixture,
        infra::audit,
    };

    use super::SyncOverdueRemediations;

    #[tokio::test]
    async fn blocks_property_once_issue_becomes_overdue() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let due = DateTime::now() + Duration::from_secs(60);
        _ = fixture::remediation(
            &svc,
            p.id,
            remediation::Kind::PendingIssue,
            due,
        )
        .await;
        _ = fixture::remediation(&svc, p.id, remediation::Kind::Routine, due)
            .await;
        assert_eq!(
            fixture::get_property(&svc, p.id).await.status(),
            Status::Available,
        );

        let later = due + Duration::from_secs(1);
        let report =
            fixture::exec(&svc, SyncOverdueRemediations { now: later })
                .await
                .unwrap();
        assert_eq!(report.processed, [p.id]);
        assert!(report.is_clean());

        let p = fixture::get_property(&svc, p.id).await;
        assert!(p.has_open_pending());
        assert_eq!(p.status(), Status::Unavailable);
        let audited = svc.audit().entries().await;
        assert!(audited.iter().any(|e| {
            e.actor == audit::Actor::System
                && e.action == audit::Action::PendingStatusChanged
        }));

        let history = p.history().len();
        _ = fixture::exec(&svc, SyncOverdueRemediations { now: later })
            .await
            .unwrap();
        assert_eq!(
            fixture::get_property(&svc, p.id).await.history().len(),
            history,
        );
    }

    #[tokio::test]
    async fn ignores_issues_not_due_yet() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        _ = fixture::remediation(
            &svc,
            p.id,
            remediation::Kind::PendingIssue,
            DateTime::now() + Duration::from_secs(3600),
        )
        .await;

        let report = fixture::exec(
            &svc,
            SyncOverdueRemediations {
                now: DateTime::now(),
            },
        )
        .await
        .unwrap();
        assert!(report.processed.is_empty());
        assert!(!fixture::get_property(&svc, p.id).await.has_open_pending());
    }
}
