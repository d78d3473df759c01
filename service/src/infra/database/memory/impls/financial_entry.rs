//! [`FinancialEntry`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{financial_entry, property, FinancialEntry},
    infra::{
        database::{self, memory, Memory},
        Database,
    },
    read::financial_entry::Blocking,
};

impl Database<Select<By<Option<FinancialEntry>, financial_entry::Id>>>
    for Memory
{
    type Ok = Option<FinancialEntry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<FinancialEntry>, financial_entry::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read().await.financial_entries.get(&id).cloned())
    }
}

impl Database<Select<By<Vec<Blocking<FinancialEntry>>, property::Id>>>
    for Memory
{
    type Ok = Vec<Blocking<FinancialEntry>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Blocking<FinancialEntry>>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let property_id = by.into_inner();
        let mut blocking = self
            .0
            .read()
            .await
            .financial_entries
            .values()
            .filter(|e| e.reference_id == property_id && e.is_blocking())
            .cloned()
            .collect::<Vec<_>>();
        blocking.sort_by_key(|e| e.created_at);
        Ok(blocking.into_iter().map(Blocking).collect())
    }
}

/// Selects [`financial_entry::Status::Pending`] entries due before the
/// provided reference date.
impl Database<Select<By<Vec<FinancialEntry>, financial_entry::DueDateTime>>>
    for Memory
{
    type Ok = Vec<FinancialEntry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<FinancialEntry>, financial_entry::DueDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let reference = by.into_inner();
        let mut overdue = self
            .0
            .read()
            .await
            .financial_entries
            .values()
            .filter(|e| {
                e.status() == financial_entry::Status::Pending
                    && e.due_at < reference
            })
            .cloned()
            .collect::<Vec<_>>();
        overdue.sort_by_key(|e| e.due_at);
        Ok(overdue)
    }
}

impl Database<Insert<FinancialEntry>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<FinancialEntry>,
    ) -> Result<Self::Ok, Self::Err> {
        memory::insert(
            &mut self.0.write().await.financial_entries,
            "FinancialEntry",
            entry.id,
            entry,
        )
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl Database<Update<FinancialEntry>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(entry): Update<FinancialEntry>,
    ) -> Result<Self::Ok, Self::Err> {
        memory::update(
            &mut self.0.write().await.financial_entries,
            "FinancialEntry",
            entry.id,
            entry,
        )
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}
