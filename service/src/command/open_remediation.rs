//! [`Command`] for opening a [`Remediation`] of a [`Property`].

use std::fmt;

use common::{
    operations::{By, Insert, Record, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{maintenance, property, remediation, Property, Remediation},
    error,
    infra::{audit, database, Audit, Database},
    Service,
};

use super::{sync_pending_status, Command, SyncPendingStatus};

/// [`Command`] for opening a [`Remediation`] and recomputing the pending
/// signal of its [`Property`].
#[derive(Clone, Debug)]
pub struct OpenRemediation {
    /// ID of the [`Property`] the [`Remediation`] is about.
    pub property_id: property::Id,

    /// [`remediation::Kind`] of the new [`Remediation`].
    pub kind: remediation::Kind,

    /// [`maintenance::Description`] of the new [`Remediation`].
    pub description: maintenance::Description,

    /// [`DateTime`] before which the [`Remediation`] should be resolved.
    pub due_at: remediation::DueDateTime,

    /// [`audit::Actor`] opening the [`Remediation`].
    pub actor: audit::Actor,
}

impl<Db, Au> Command<OpenRemediation> for Service<Db, Au>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Remediation>, Err = Traced<database::Error>>,
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
        cmd: OpenRemediation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let OpenRemediation {
            property_id,
            kind,
            description,
            due_at,
            actor,
        } = cmd;

        self.database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let now = DateTime::now();
        let remediation = Remediation::new(
            property_id,
            kind,
            description,
            due_at,
            now.coerce(),
        );
        self.database()
            .execute(Insert(remediation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Remediation(id: {})` opened for `Property(id: {property_id})`",
            remediation.id,
        );
        self.record(audit::Entry::now(
            actor,
            audit::Action::RemediationOpened,
            remediation.id,
            format!(
                "property: {property_id}, kind: {kind}, due at: {due_at}",
            ),
        ))
        .await;

        self.execute(SyncPendingStatus {
            property_id,
            now,
            actor,
        })
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        Ok(remediation)
    }
}

/// Error of [`OpenRemediation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

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
            Self::PropertyNotExists(_) => error::Kind::NotFound,
            Self::Sync(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::{
        domain::{maintenance, property, remediation},
        error, fixture,
    };

    use super::OpenRemediation;

    #[tokio::test]
    async fn fails_on_unknown_property() {
        let svc = fixture::service();

        let err = fixture::exec(
            &svc,
            OpenRemediation {
                property_id: property::Id::new(),
                kind: remediation::Kind::PendingIssue,
                description: maintenance::Description::new("Gas leak")
                    .unwrap(),
                due_at: (DateTime::now() + Duration::from_secs(60)).coerce(),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), error::Kind::NotFound);
    }
}
