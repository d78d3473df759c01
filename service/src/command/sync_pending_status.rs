//! [`Command`] for recomputing the pending signal of a [`Property`].

use std::fmt;

use common::{
    operations::{By, Record, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{property, FinancialEntry, Property, Remediation},
    error,
    infra::{audit, database, Audit, Database},
    read::{financial_entry::Blocking, remediation::Open},
    Service,
};
#[cfg(doc)]
use crate::domain::{financial_entry, remediation};

use super::Command;

/// [`Command`] for recomputing the pending signal of a [`Property`] from its
/// blocking [`FinancialEntry`]s and overdue [`Remediation`]s.
///
/// The pending signal is raised if at least one [`FinancialEntry`] blocks the
/// [`Property`], or at least one [`remediation::Kind::PendingIssue`] is open
/// past its due date.
#[derive(Clone, Copy, Debug)]
pub struct SyncPendingStatus {
    /// ID of the [`Property`] to recompute the pending signal of.
    pub property_id: property::Id,

    /// Moment to check the due dates of [`Remediation`]s against.
    pub now: DateTime,

    /// [`audit::Actor`] initiating the recomputation.
    pub actor: audit::Actor,
}

impl<Db, Au> Command<SyncPendingStatus> for Service<Db, Au>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Blocking<FinancialEntry>>, property::Id>>,
            Ok = Vec<Blocking<FinancialEntry>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Open<Remediation>>, property::Id>>,
            Ok = Vec<Open<Remediation>>,
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SyncPendingStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SyncPendingStatus {
            property_id,
            now,
            actor,
        } = cmd;

        let mut property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        let blocking = self
            .database()
            .execute(Select(By::<Vec<Blocking<FinancialEntry>>, _>::new(
                property_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let pending = !blocking.is_empty()
            || self
                .database()
                .execute(Select(By::<Vec<Open<Remediation>>, _>::new(
                    property_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .iter()
                .any(|Open(r)| r.is_pending_issue(now));

        if !apply_pending(&mut property, pending, now) {
            log::debug!(
                "`Property(id: {property_id})` pending signal is unchanged: \
                 {pending}",
            );
            return Ok(property);
        }

        self.database()
            .execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.record(audit::Entry::now(
            actor,
            audit::Action::PendingStatusChanged,
            property_id,
            format!("pending: {pending}, status: {}", property.status()),
        ))
        .await;

        Ok(property)
    }
}

/// Sets the pending signal of the provided [`Property`], moving it between
/// [`property::Status::Available`] and [`property::Status::Unavailable`]
/// only.
///
/// Any other [`property::Status`] is left untouched, so that the pending
/// signal never overrides negotiation, maintenance or inspection.
///
/// Returns `false` if the signal hasn't changed.
pub(crate) fn apply_pending(
    property: &mut Property,
    pending: bool,
    at: DateTime,
) -> bool {
    use property::Status as S;

    if !property.set_open_pending(pending) {
        return false;
    }
    if pending && property.status() == S::Available {
        _ = property.change_status(S::Unavailable, "pending issues opened", at);
    } else if !pending && property.status() == S::Unavailable {
        _ = property.change_status(S::Available, "pending issues cleared", at);
    } else {
        log::info!(
            "`Property(id: {})` keeps `{}` status with pending signal set to \
             {pending}",
            property.id,
            property.status(),
        );
    }
    true
}

/// Error of [`SyncPendingStatus`] [`Command`] execution.
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
    use std::time::Duration;

    use common::DateTime;

    use crate::{
        domain::{
            property::{self, Status},
            remediation, Property,
        },
        fixture,
        infra::audit,
    };

    use super::{apply_pending, SyncPendingStatus};

    fn property() -> Property {
        Property::new(
            property::Code::new("AP-101").unwrap(),
            property::Address::new("Rua das Flores, 10").unwrap(),
            property::Kind::Apartment,
            DateTime::now().coerce(),
        )
    }

    #[test]
    fn blocks_only_available_property() {
        let now = DateTime::now();
        let mut p = property();

        assert!(apply_pending(&mut p, true, now));
        assert_eq!(p.status(), Status::Unavailable);
        assert!(!apply_pending(&mut p, true, now));

        assert!(apply_pending(&mut p, false, now));
        assert_eq!(p.status(), Status::Available);
        assert_eq!(p.history().len(), 3);
    }

    #[test]
    fn keeps_other_statuses() {
        let now = DateTime::now();
        let mut p = property();
        _ = p.change_status(Status::InMaintenance, "leak", now);

        assert!(apply_pending(&mut p, true, now));
        assert!(p.has_open_pending());
        assert_eq!(p.status(), Status::InMaintenance);

        assert!(apply_pending(&mut p, false, now));
        assert_eq!(p.status(), Status::InMaintenance);
    }

    #[tokio::test]
    async fn accounts_overdue_pending_issues_only() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let past = DateTime::now() - Duration::from_secs(3600);
        let future = DateTime::now() + Duration::from_secs(3600);

        _ = fixture::remediation(&svc, p.id, remediation::Kind::Routine, past)
            .await;
        _ = fixture::remediation(
            &svc,
            p.id,
            remediation::Kind::PendingIssue,
            future,
        )
        .await;
        let p = fixture::get_property(&svc, p.id).await;
        assert!(!p.has_open_pending());
        assert_eq!(p.status(), Status::Available);

        _ = fixture::remediation(
            &svc,
            p.id,
            remediation::Kind::PendingIssue,
            past,
        )
        .await;
        let p = fixture::get_property(&svc, p.id).await;
        assert!(p.has_open_pending());
        assert_eq!(p.status(), Status::Unavailable);
    }

    #[tokio::test]
    async fn fails_on_unknown_property() {
        let svc = fixture::service();

        let err = fixture::exec(
            &svc,
            SyncPendingStatus {
                property_id: property::Id::new(),
                now: DateTime::now(),
                actor: audit::Actor::System,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::NotFound);
    }
}
