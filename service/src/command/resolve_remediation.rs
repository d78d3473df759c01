//! [`Command`] for closing a [`Remediation`] of a [`Property`].

use std::fmt;

use common::{
    operations::{By, Record, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{remediation, Property, Remediation},
    error,
    infra::{audit, database, Audit, Database},
    Service,
};

use super::{sync_pending_status, Command, SyncPendingStatus};

/// [`Command`] for moving an open [`Remediation`] into a terminal
/// [`remediation::Status`] and recomputing the pending signal of its
/// [`Property`].
#[derive(Clone, Copy, Debug)]
pub struct ResolveRemediation {
    /// ID of the [`Remediation`] to be closed.
    pub remediation_id: remediation::Id,

    /// Terminal [`remediation::Status`] to close the [`Remediation`] with.
    pub resolution: remediation::Status,

    /// [`audit::Actor`] closing the [`Remediation`].
    pub actor: audit::Actor,
}

impl<Db, Au> Command<ResolveRemediation> for Service<Db, Au>
where
    Db: Database<
            Select<By<Option<Remediation>, remediation::Id>>,
            Ok = Option<Remediation>,
            Err = Traced<database::Error>,
        > + Database<Update<Remediation>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
    Self: Command<
        SyncPendingStatus,
        Ok = Property,
        Err = Traced<sync_pending_status::ExecutionError>,
    >,
{
    type Ok = Remediation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ResolveRemediation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ResolveRemediation {
            remediation_id,
            resolution,
            actor,
        } = cmd;

        if resolution == remediation::Status::Open {
            return Err(tracerr::new!(E::OpenResolution(remediation_id)));
        }

        let mut remediation = self
            .database()
            .execute(Select(By::<Option<Remediation>, _>::new(remediation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RemediationNotExists(remediation_id))
            .map_err(tracerr::wrap!())?;

        if !remediation.close(resolution) {
            if remediation.status == resolution {
                log::debug!(
                    "`Remediation(id: {remediation_id})` is `{resolution}` \
                     already",
                );
                return Ok(remediation);
            }
            return Err(tracerr::new!(E::RemediationClosed {
                id: remediation_id,
                status: remediation.status,
            }));
        }

        self.database()
            .execute(Update(remediation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`Remediation(id: {remediation_id})` is `{resolution}`");
        self.record(audit::Entry::now(
            actor,
            audit::Action::RemediationClosed,
            remediation_id,
            format!("status: {resolution}"),
        ))
        .await;

        self.execute(SyncPendingStatus {
            property_id: remediation.property_id,
            now: DateTime::now(),
            actor,
        })
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        Ok(remediation)
    }
}

/// Error of [`ResolveRemediation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`remediation::Status::Open`] is not a resolution.
    #[display("`Remediation(id: {_0})` cannot be resolved as `OPEN`")]
    OpenResolution(#[error(not(source))] remediation::Id),

    /// [`Remediation`] is closed with another [`remediation::Status`]
    /// already.
    #[display("`Remediation(id: {id})` is `{status}` already")]
    RemediationClosed {
        /// ID of the [`Remediation`].
        id: remediation::Id,

        /// Current [`remediation::Status`] of the [`Remediation`].
        status: remediation::Status,
    },

    /// [`Remediation`] with the provided ID does not exist.
    #[display("`Remediation(id: {_0})` does not exist")]
    RemediationNotExists(#[error(not(source))] remediation::Id),

    /// Failed to recompute the pending signal of the [`Property`].
    #[display("Failed to recompute pending signal: {_0}")]
    #[from]
    Sync(sync_pending_status::ExecutionError),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(e) => e.kind(),
            Self::OpenResolution(_) => error::Kind::InvalidInput,
            Self::RemediationClosed { .. } => error::Kind::InvalidTransition,
            Self::RemediationNotExists(_) => error::Kind::NotFound,
            Self::Sync(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::{
        domain::{
            property::Status,
            remediation::{self, Kind},
        },
        error, fixture,
    };

    use super::ResolveRemediation;

    #[tokio::test]
    async fn unblocks_property_once_resolved() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let past = DateTime::now() - Duration::from_secs(3600);
        let r = fixture::remediation(&svc, p.id, Kind::PendingIssue, past).await;
        assert_eq!(
            fixture::get_property(&svc, p.id).await.status(),
            Status::Unavailable,
        );

        let cmd = ResolveRemediation {
            remediation_id: r.id,
            resolution: remediation::Status::Resolved,
            actor: fixture::operator(),
        };
        let r = fixture::exec(&svc, cmd).await.unwrap();
        assert_eq!(r.status, remediation::Status::Resolved);

        let p = fixture::get_property(&svc, p.id).await;
        assert!(!p.has_open_pending());
        assert_eq!(p.status(), Status::Available);

        _ = fixture::exec(&svc, cmd).await.unwrap();
        assert_eq!(fixture::get_property(&svc, p.id).await.history().len(), 3);
    }

    #[tokio::test]
    async fn rejects_changing_resolution() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let future = DateTime::now() + Duration::from_secs(3600);
        let r = fixture::remediation(&svc, p.id, Kind::Routine, future).await;
        _ = fixture::exec(
            &svc,
            ResolveRemediation {
                remediation_id: r.id,
                resolution: remediation::Status::Cancelled,
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap();

        let err = fixture::exec(
            &svc,
            ResolveRemediation {
                remediation_id: r.id,
                resolution: remediation::Status::Resolved,
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), error::Kind::InvalidTransition);

        let err = fixture::exec(
            &svc,
            ResolveRemediation {
                remediation_id: r.id,
                resolution: remediation::Status::Open,
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), error::Kind::InvalidInput);
    }
}
