//! [`Command`] for applying due scheduled [`Property`] statuses.

use std::fmt;

use common::{
    operations::{By, Record, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        property::{self, ScheduleOutcome},
        Property,
    },
    error,
    infra::{audit, database, Audit, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::property::ScheduledStatus;

use super::{Command, SweepReport};

/// [`Command`] for applying every [`ScheduledStatus`] due at the provided
/// moment.
///
/// A [`ScheduledStatus`] is applied only if its [`Property`] is still in the
/// expected status, and is discarded otherwise.
#[derive(Clone, Copy, Debug)]
pub struct ApplyScheduledStatuses {
    /// Moment to check the [`ScheduledStatus`]es against.
    pub now: DateTime,
}

impl<Db, Au> Command<ApplyScheduledStatuses> for Service<Db, Au>
where
    Db: Database<
            Select<By<Vec<Property>, property::ScheduleDateTime>>,
            Ok = Vec<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
{
    type Ok = SweepReport<property::Id, Traced<ExecutionError>>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ApplyScheduledStatuses,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ApplyScheduledStatuses { now } = cmd;

        let due = self
            .database()
            .execute(Select(
                By::<Vec<Property>, property::ScheduleDateTime>::new(
                    now.coerce(),
                ),
            ))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut report = SweepReport::default();
        for property_id in due.into_iter().map(|p| p.id) {
            match self.apply_scheduled(property_id, now).await {
                Ok(()) => report.processed.push(property_id),
                Err(e) => {
                    log::error!(
                        "failed to apply scheduled status of \
                         `Property(id: {property_id})`: {e}",
                    );
                    report.failed.push((property_id, e));
                }
            }
        }
        Ok(report)
    }
}

impl<Db, Au> Service<Db, Au>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
{
    /// Applies the scheduled status of the freshly read [`Property`].
    async fn apply_scheduled(
        &self,
        property_id: property::Id,
        now: DateTime,
    ) -> Result<(), Traced<ExecutionError>> {
        use ExecutionError as E;

        let mut property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        let outcome = property.apply_scheduled(now);
        match outcome {
            ScheduleOutcome::Nothing | ScheduleOutcome::NotDue => {
                return Ok(());
            }
            ScheduleOutcome::Discarded => log::debug!(
                "`Property(id: {property_id})` left the expected status, \
                 discarding its schedule",
            ),
            ScheduleOutcome::Applied => log::info!(
                "`Property(id: {property_id})` moved to `{}` as scheduled",
                property.status(),
            ),
        }

        self.database()
            .execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if outcome == ScheduleOutcome::Applied {
            self.record(audit::Entry::now(
                audit::Actor::System,
                audit::Action::ScheduledStatusApplied,
                property_id,
                format!("status: {}", property.status()),
            ))
            .await;
        }
        Ok(())
    }
}

/// Error of [`ApplyScheduledStatuses`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(e) => e.kind(),
            Self::PropertyNotExists(_) => error::Kind::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{HandleMoveOutNotice, OpenMaintenance},
        domain::{maintenance, property::Status},
        fixture,
    };

    use super::ApplyScheduledStatuses;

    #[tokio::test]
    async fn applies_only_due_schedules() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        _ = fixture::exec(
            &svc,
            HandleMoveOutNotice {
                property_id: p.id,
                move_out_at: fixture::at("2024-05-31T12:00:00Z").coerce(),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap();

        let report = fixture::exec(
            &svc,
            ApplyScheduledStatuses {
                now: fixture::at("2024-06-01T00:00:00Z"),
            },
        )
        .await
        .unwrap();
        assert!(report.processed.is_empty());
        let p = fixture::get_property(&svc, p.id).await;
        assert_eq!(p.status(), Status::InMoveOutInspection);

        let report = fixture::exec(
            &svc,
            ApplyScheduledStatuses {
                now: fixture::at("2024-06-01T13:00:00Z"),
            },
        )
        .await
        .unwrap();
        assert_eq!(report.processed, [p.id]);
        assert!(report.is_clean());
        let p = fixture::get_property(&svc, p.id).await;
        assert_eq!(p.status(), Status::ScheduledForAvailability);
        assert!(p.scheduled().is_none());
    }

    #[tokio::test]
    async fn discards_outdated_schedule() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        _ = fixture::exec(
            &svc,
            HandleMoveOutNotice {
                property_id: p.id,
                move_out_at: fixture::at("2024-05-31T12:00:00Z").coerce(),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap();
        _ = fixture::exec(
            &svc,
            OpenMaintenance {
                property_id: p.id,
                description: maintenance::Description::new("Broken window")
                    .unwrap(),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap();

        let now = fixture::at("2024-06-02T00:00:00Z");
        _ = fixture::exec(&svc, ApplyScheduledStatuses { now })
            .await
            .unwrap();
        let p = fixture::get_property(&svc, p.id).await;
        assert_eq!(p.status(), Status::InMaintenance);
        assert!(p.scheduled().is_none());

        let report = fixture::exec(&svc, ApplyScheduledStatuses { now })
            .await
            .unwrap();
        assert!(report.processed.is_empty());
    }
}
