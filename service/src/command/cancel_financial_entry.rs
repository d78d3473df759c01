//! [`Command`] for cancelling a [`FinancialEntry`].

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
    domain::{financial_entry, FinancialEntry, Property},
    error,
    infra::{audit, database, Audit, Database},
    Service,
};

use super::{sync_pending_status, Command, SyncPendingStatus};

/// [`Command`] for marking a [`FinancialEntry`] as
/// [`financial_entry::Status::Cancelled`] and recomputing the pending signal
/// of its [`Property`].
#[derive(Clone, Debug)]
pub struct CancelFinancialEntry {
    /// ID of the [`FinancialEntry`] to be cancelled.
    pub entry_id: financial_entry::Id,

    /// [`Reason`] of the cancellation.
    pub reason: Reason,

    /// [`audit::Actor`] cancelling the [`FinancialEntry`].
    pub actor: audit::Actor,
}

impl<Db, Au> Command<CancelFinancialEntry> for Service<Db, Au>
where
    Db: Database<
            Select<By<Option<FinancialEntry>, financial_entry::Id>>,
            Ok = Option<FinancialEntry>,
            Err = Traced<database::Error>,
        > + Database<Update<FinancialEntry>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
    Self: Command<
        SyncPendingStatus,
        Ok = Property,
        Err = Traced<sync_pending_status::ExecutionError>,
    >,
{
    type Ok = FinancialEntry;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CancelFinancialEntry,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelFinancialEntry {
            entry_id,
            reason,
            actor,
        } = cmd;

        let mut entry = self
            .database()
            .execute(Select(By::<Option<FinancialEntry>, _>::new(entry_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::EntryNotExists(entry_id))
            .map_err(tracerr::wrap!())?;

        let now = DateTime::now();
        let cancelled = entry
            .cancel(reason.clone(), now)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if !cancelled {
            log::debug!(
                "`FinancialEntry(id: {entry_id})` is cancelled already",
            );
            return Ok(entry);
        }

        self.database()
            .execute(Update(entry.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`FinancialEntry(id: {entry_id})` is cancelled: {reason}");
        self.record(audit::Entry::now(
            actor,
            audit::Action::FinancialEntryCancelled,
            entry_id,
            reason.as_str(),
        ))
        .await;

        self.execute(SyncPendingStatus {
            property_id: entry.reference_id,
            now,
            actor,
        })
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        Ok(entry)
    }
}

/// Error of [`CancelFinancialEntry`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`FinancialEntry`] with the provided ID does not exist.
    #[display("`FinancialEntry(id: {_0})` does not exist")]
    EntryNotExists(#[error(not(source))] financial_entry::Id),

    /// Failed to recompute the pending signal of the [`Property`].
    #[display("Failed to recompute pending signal: {_0}")]
    #[from]
    Sync(sync_pending_status::ExecutionError),

    /// [`FinancialEntry`] cannot be cancelled.
    #[display("{_0}")]
    #[from]
    Transition(financial_entry::TransitionError),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(e) => e.kind(),
            Self::EntryNotExists(_) => error::Kind::NotFound,
            Self::Sync(e) => e.kind(),
            Self::Transition(_) => error::Kind::InvalidTransition,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{
        command::RegisterPayment,
        domain::{financial_entry, property::Status},
        error, fixture,
    };

    use super::CancelFinancialEntry;

    #[tokio::test]
    async fn unblocks_property() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let entry = fixture::financial_entry(&svc, p.id, "1000BRL", true).await;
        let cmd = CancelFinancialEntry {
            entry_id: entry.id,
            reason: "contract dropped".into(),
            actor: fixture::operator(),
        };

        let e = fixture::exec(&svc, cmd.clone()).await.unwrap();
        assert_eq!(e.status(), financial_entry::Status::Cancelled);
        let p = fixture::get_property(&svc, p.id).await;
        assert!(!p.has_open_pending());
        assert_eq!(p.status(), Status::Available);

        let history = p.history().len();
        _ = fixture::exec(&svc, cmd).await.unwrap();
        assert_eq!(
            fixture::get_property(&svc, p.id).await.history().len(),
            history,
        );
    }

    #[tokio::test]
    async fn rejects_cancelling_received_entry() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let entry = fixture::financial_entry(&svc, p.id, "1000BRL", true).await;
        _ = fixture::exec(
            &svc,
            RegisterPayment {
                entry_id: entry.id,
                paid_at: DateTime::now().coerce(),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap();

        let err = fixture::exec(
            &svc,
            CancelFinancialEntry {
                entry_id: entry.id,
                reason: "too late".into(),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), error::Kind::InvalidTransition);
        assert_eq!(
            fixture::get_entry(&svc, entry.id).await.status(),
            financial_entry::Status::Received,
        );
    }
}
