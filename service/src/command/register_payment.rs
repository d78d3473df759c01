//! [`Command`] for registering a payment of a [`FinancialEntry`].

use std::fmt;

use common::{
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
/// [`financial_entry::Status::Received`] and recomputing the pending signal
/// of its [`Property`].
///
/// Paying an already received [`FinancialEntry`] changes nothing.
#[derive(Clone, Copy, Debug)]
pub struct RegisterPayment {
    /// ID of the paid [`FinancialEntry`].
    pub entry_id: financial_entry::Id,

    /// [`DateTime`] when the payment has been made.
    pub paid_at: financial_entry::PaymentDateTime,

    /// [`audit::Actor`] registering the payment.
    pub actor: audit::Actor,
}

impl<Db, Au> Command<RegisterPayment> for Service<Db, Au>
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
        cmd: RegisterPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RegisterPayment {
            entry_id,
            paid_at,
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
        let received = entry
            .receive(paid_at, now)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if !received {
            log::debug!("`FinancialEntry(id: {entry_id})` is paid already");
            return Ok(entry);
        }

        self.database()
            .execute(Update(entry.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`FinancialEntry(id: {entry_id})` is paid at {paid_at}");
        self.record(audit::Entry::now(
            actor,
            audit::Action::PaymentRegistered,
            entry_id,
            format!("amount: {}, paid at: {paid_at}", entry.amount),
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

/// Error of [`RegisterPayment`] [`Command`] execution.
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

    /// [`FinancialEntry`] cannot be paid.
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
        command::CancelFinancialEntry,
        domain::{financial_entry, property::Status},
        error, fixture,
    };

    use super::RegisterPayment;

    fn pay(entry_id: financial_entry::Id) -> RegisterPayment {
        RegisterPayment {
            entry_id,
            paid_at: DateTime::now().coerce(),
            actor: fixture::operator(),
        }
    }

    #[tokio::test]
    async fn unblocks_once_last_blocking_entry_is_paid() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let deposit = fixture::financial_entry(&svc, p.id, "1000BRL", true).await;
        let fee = fixture::financial_entry(&svc, p.id, "150BRL", true).await;
        assert_eq!(
            fixture::get_property(&svc, p.id).await.status(),
            Status::Unavailable,
        );

        let e = fixture::exec(&svc, pay(deposit.id)).await.unwrap();
        assert_eq!(e.status(), financial_entry::Status::Received);
        assert!(e.paid_at().is_some());
        let p = fixture::get_property(&svc, p.id).await;
        assert!(p.has_open_pending());
        assert_eq!(p.status(), Status::Unavailable);

        _ = fixture::exec(&svc, pay(fee.id)).await.unwrap();
        let p = fixture::get_property(&svc, p.id).await;
        assert!(!p.has_open_pending());
        assert_eq!(p.status(), Status::Available);
    }

    #[tokio::test]
    async fn repeated_payment_changes_nothing() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let entry = fixture::financial_entry(&svc, p.id, "1000BRL", true).await;

        let first = fixture::exec(&svc, pay(entry.id)).await.unwrap();
        let history = fixture::get_property(&svc, p.id).await.history().len();

        let second = fixture::exec(&svc, pay(entry.id)).await.unwrap();
        assert_eq!(first.paid_at(), second.paid_at());
        assert_eq!(first.history().len(), second.history().len());
        assert_eq!(
            fixture::get_property(&svc, p.id).await.history().len(),
            history,
        );
    }

    #[tokio::test]
    async fn rejects_paying_cancelled_entry() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        let entry = fixture::financial_entry(&svc, p.id, "1000BRL", false).await;
        _ = fixture::exec(
            &svc,
            CancelFinancialEntry {
                entry_id: entry.id,
                reason: "waived".into(),
                actor: fixture::operator(),
            },
        )
        .await
        .unwrap();

        let err = fixture::exec(&svc, pay(entry.id)).await.unwrap_err();
        assert_eq!(err.kind(), error::Kind::InvalidTransition);
    }

    #[tokio::test]
    async fn fails_on_unknown_entry() {
        let svc = fixture::service();

        let err = fixture::exec(&svc, pay(financial_entry::Id::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), error::Kind::NotFound);
    }
}
