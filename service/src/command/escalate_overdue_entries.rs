//! [`Command`] for escalating [`FinancialEntry`]s past their due date.

use std::fmt;

use common::{
    operations::{By, Record, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{financial_entry, FinancialEntry},
    error,
    infra::{audit, database, Audit, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::Property;

use super::{Command, SweepReport};

/// [`Command`] for marking every [`financial_entry::Status::Pending`]
/// [`FinancialEntry`] due before the provided reference date as
/// [`financial_entry::Status::Overdue`].
///
/// Escalation never touches the pending signal of a [`Property`], since an
/// overdue [`FinancialEntry`] blocks it exactly as a pending one does.
#[derive(Clone, Copy, Debug)]
pub struct EscalateOverdueEntries {
    /// Reference date to compare due dates against.
    pub reference: financial_entry::DueDateTime,
}

impl<Db, Au> Command<EscalateOverdueEntries> for Service<Db, Au>
where
    Db: Database<
            Select<By<Vec<FinancialEntry>, financial_entry::DueDateTime>>,
            Ok = Vec<FinancialEntry>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<FinancialEntry>, financial_entry::Id>>,
            Ok = Option<FinancialEntry>,
            Err = Traced<database::Error>,
        > + Database<Update<FinancialEntry>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
{
    type Ok = SweepReport<financial_entry::Id, Traced<ExecutionError>>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: EscalateOverdueEntries,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let EscalateOverdueEntries { reference } = cmd;

        let due = self
            .database()
            .execute(Select(By::<Vec<FinancialEntry>, _>::new(reference)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut report = SweepReport::default();
        for entry_id in due.into_iter().map(|e| e.id) {
            match self.escalate(entry_id, reference).await {
                Ok(()) => report.processed.push(entry_id),
                Err(e) => {
                    log::error!(
                        "failed to escalate \
                         `FinancialEntry(id: {entry_id})`: {e}",
                    );
                    report.failed.push((entry_id, e));
                }
            }
        }
        if !report.processed.is_empty() {
            log::info!(
                "escalated {} overdue `FinancialEntry`s",
                report.processed.len(),
            );
        }
        Ok(report)
    }
}

impl<Db, Au> Service<Db, Au>
where
    Db: Database<
            Select<By<Option<FinancialEntry>, financial_entry::Id>>,
            Ok = Option<FinancialEntry>,
            Err = Traced<database::Error>,
        > + Database<Update<FinancialEntry>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
{
    /// Escalates the freshly read [`FinancialEntry`].
    async fn escalate(
        &self,
        entry_id: financial_entry::Id,
        reference: financial_entry::DueDateTime,
    ) -> Result<(), Traced<ExecutionError>> {
        use ExecutionError as E;

        let mut entry = self
            .database()
            .execute(Select(By::<Option<FinancialEntry>, _>::new(entry_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::EntryNotExists(entry_id))
            .map_err(tracerr::wrap!())?;

        // Paid or cancelled since being listed.
        if !entry.escalate(reference, DateTime::now()) {
            return Ok(());
        }

        self.database()
            .execute(Update(entry.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.record(audit::Entry::now(
            audit::Actor::System,
            audit::Action::FinancialEntryEscalated,
            entry_id,
            format!("due at: {}, reference: {reference}", entry.due_at),
        ))
        .await;

        Ok(())
    }
}

/// Error of [`EscalateOverdueEntries`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`FinancialEntry`] with the provided ID does not exist.
    #[display("`FinancialEntry(id: {_0})` does not exist")]
    EntryNotExists(#[error(not(source))] financial_entry::Id),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(e) => e.kind(),
            Self::EntryNotExists(_) => error::Kind::NotFound,
        }
    }
}
