//! [`Remediation`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{property, remediation, Remediation},
    infra::{
        database::{self, memory, Memory},
        Database,
    },
    read::remediation::Open,
};

impl Database<Select<By<Option<Remediation>, remediation::Id>>> for Memory {
    type Ok = Option<Remediation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Remediation>, remediation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read().await.remediations.get(&id).cloned())
    }
}

impl Database<Select<By<Vec<Open<Remediation>>, property::Id>>> for Memory {
    type Ok = Vec<Open<Remediation>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Open<Remediation>>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let property_id = by.into_inner();
        let mut open = self
            .0
            .read()
            .await
            .remediations
            .values()
            .filter(|r| r.property_id == property_id && r.is_open())
            .cloned()
            .collect::<Vec<_>>();
        open.sort_by_key(|r| r.due_at);
        Ok(open.into_iter().map(Open).collect())
    }
}

impl Database<Select<By<Vec<Open<Remediation>>, remediation::DueDateTime>>>
    for Memory
{
    type Ok = Vec<Open<Remediation>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Open<Remediation>>, remediation::DueDateTime>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let now = by.into_inner().coerce();
        let mut overdue = self
            .0
            .read()
            .await
            .remediations
            .values()
            .filter(|r| r.is_overdue(now))
            .cloned()
            .collect::<Vec<_>>();
        overdue.sort_by_key(|r| r.due_at);
        Ok(overdue.into_iter().map(Open).collect())
    }
}

impl Database<Insert<Remediation>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(remediation): Insert<Remediation>,
    ) -> Result<Self::Ok, Self::Err> {
        memory::insert(
            &mut self.0.write().await.remediations,
            "Remediation",
            remediation.id,
            remediation,
        )
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl Database<Update<Remediation>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(remediation): Update<Remediation>,
    ) -> Result<Self::Ok, Self::Err> {
        memory::update(
            &mut self.0.write().await.remediations,
            "Remediation",
            remediation.id,
            remediation,
        )
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}
