//! [`Command`] for registering a new [`FinancialEntry`].

use std::fmt;

use common::{
    operations::{By, Insert, Record, Select},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{financial_entry, property, FinancialEntry, Property},
    error,
    infra::{audit, database, Audit, Database},
    Service,
};

use super::{raise_pending_block, Command, RaisePendingBlock};

/// [`Command`] for registering a new [`FinancialEntry`] of a [`Property`].
///
/// A blocking [`FinancialEntry`] raises the pending signal of its
/// [`Property`] immediately.
#[derive(Clone, Debug)]
pub struct RegisterFinancialEntry {
    /// ID of the [`Property`] the [`FinancialEntry`] refers to.
    pub reference_id: property::Id,

    /// [`financial_entry::Kind`] of the new [`FinancialEntry`].
    pub kind: financial_entry::Kind,

    /// Amount of the new [`FinancialEntry`].
    pub amount: Money,

    /// [`DateTime`] when the new [`FinancialEntry`] is due.
    pub due_at: financial_entry::DueDateTime,

    /// Indicator whether the new [`FinancialEntry`] blocks its [`Property`].
    pub blocks_availability: bool,

    /// [`audit::Actor`] registering the [`FinancialEntry`].
    pub actor: audit::Actor,
}

impl<Db, Au> Command<RegisterFinancialEntry> for Service<Db, Au>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<FinancialEntry>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
    Self: Command<
        RaisePendingBlock,
        Ok = Property,
        Err = Traced<raise_pending_block::ExecutionError>,
    >,
{
    type Ok = FinancialEntry;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RegisterFinancialEntry,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RegisterFinancialEntry {
            reference_id,
            kind,
            amount,
            due_at,
            blocks_availability,
            actor,
        } = cmd;

        if !amount.is_positive() {
            return Err(tracerr::new!(E::NonPositiveAmount(amount)));
        }

        self.database()
            .execute(Select(By::<Option<Property>, _>::new(reference_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(reference_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let entry = FinancialEntry::new(
            reference_id,
            kind,
            amount,
            due_at,
            blocks_availability,
            DateTime::now().coerce(),
        );
        self.database()
            .execute(Insert(entry.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`FinancialEntry(id: {})` registered for \
             `Property(id: {reference_id})`",
            entry.id,
        );
        self.record(audit::Entry::now(
            actor,
            audit::Action::FinancialEntryRegistered,
            entry.id,
            format!(
                "property: {reference_id}, kind: {kind}, amount: {}, \
                 blocking: {blocks_availability}",
                entry.amount,
            ),
        ))
        .await;

        if blocks_availability {
            self.execute(RaisePendingBlock {
                property_id: reference_id,
                actor,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        }

        Ok(entry)
    }
}

/// Error of [`RegisterFinancialEntry`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Failed to raise the pending signal of the [`Property`].
    #[display("Failed to block `Property`: {_0}")]
    #[from]
    Block(raise_pending_block::ExecutionError),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Amount of the [`FinancialEntry`] is zero or negative.
    #[display("`FinancialEntry` amount must be positive, provided: {_0}")]
    NonPositiveAmount(#[error(not(source))] Money),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Block(e) => e.kind(),
            Self::Db(e) => e.kind(),
            Self::NonPositiveAmount(_) => error::Kind::InvalidInput,
            Self::PropertyNotExists(_) => error::Kind::NotFound,
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::{financial_entry, property, property::Status},
        error, fixture,
    };

    use super::RegisterFinancialEntry;

    fn cmd(
        reference_id: property::Id,
        amount: &str,
        blocks_availability: bool,
    ) -> RegisterFinancialEntry {
        RegisterFinancialEntry {
            reference_id,
            kind: financial_entry::Kind::Deposit,
            amount: fixture::money(amount),
            due_at: fixture::at("2024-04-10T00:00:00Z").coerce(),
            blocks_availability,
            actor: fixture::operator(),
        }
    }

    #[tokio::test]
    async fn blocking_entry_makes_property_unavailable() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;

        let e = fixture::exec(&svc, cmd(p.id, "1000BRL", true))
            .await
            .unwrap();
        assert!(e.is_blocking());
        assert_eq!(e.status(), financial_entry::Status::Pending);

        let p = fixture::get_property(&svc, p.id).await;
        assert!(p.has_open_pending());
        assert_eq!(p.status(), Status::Unavailable);
    }

    #[tokio::test]
    async fn non_blocking_entry_keeps_property() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;

        _ = fixture::exec(&svc, cmd(p.id, "250BRL", false))
            .await
            .unwrap();

        let p = fixture::get_property(&svc, p.id).await;
        assert!(!p.has_open_pending());
        assert_eq!(p.status(), Status::Available);
    }

    #[tokio::test]
    async fn blocking_entry_never_overrides_negotiation() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;
        _ = fixture::negotiation(&svc, p.id).await;

        _ = fixture::exec(&svc, cmd(p.id, "1000BRL", true))
            .await
            .unwrap();

        let p = fixture::get_property(&svc, p.id).await;
        assert!(p.has_open_pending());
        assert_eq!(p.status(), Status::InNegotiation);
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let svc = fixture::service();
        let p = fixture::property(&svc, "AP-101").await;

        let err = fixture::exec(&svc, cmd(p.id, "0BRL", true))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), error::Kind::InvalidInput);
        assert_eq!(
            fixture::get_property(&svc, p.id).await.status(),
            Status::Available,
        );
    }

    #[tokio::test]
    async fn fails_on_unknown_property() {
        let svc = fixture::service();

        let err = fixture::exec(&svc, cmd(property::Id::new(), "10BRL", true))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), error::Kind::NotFound);
    }
}
