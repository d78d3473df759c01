//! [`Negotiation`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{negotiation, property, Negotiation},
    infra::{
        database::{self, memory, Memory},
        Database,
    },
};

impl Database<Select<By<Option<Negotiation>, negotiation::Id>>> for Memory {
    type Ok = Option<Negotiation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Negotiation>, negotiation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read().await.negotiations.get(&id).cloned())
    }
}

/// Selects [`Negotiation`]s whose sent proposal expired before the provided
/// moment.
impl
    Database<
        Select<By<Vec<Negotiation>, negotiation::ProposalExpirationDateTime>>,
    > for Memory
{
    type Ok = Vec<Negotiation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Negotiation>, negotiation::ProposalExpirationDateTime>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let now = by.into_inner().coerce();
        let mut expired = self
            .0
            .read()
            .await
            .negotiations
            .values()
            .filter(|n| n.is_proposal_expired(now))
            .cloned()
            .collect::<Vec<_>>();
        expired.sort_by_key(|n| n.created_at);
        Ok(expired)
    }
}

impl Database<Select<By<Vec<Negotiation>, property::Id>>> for Memory {
    type Ok = Vec<Negotiation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Negotiation>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let property_id = by.into_inner();
        let mut negotiations = self
            .0
            .read()
            .await
            .negotiations
            .values()
            .filter(|n| n.property_id == property_id)
            .cloned()
            .collect::<Vec<_>>();
        negotiations.sort_by_key(|n| n.created_at);
        Ok(negotiations)
    }
}

impl Database<Insert<Negotiation>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(negotiation): Insert<Negotiation>,
    ) -> Result<Self::Ok, Self::Err> {
        memory::insert(
            &mut self.0.write().await.negotiations,
            "Negotiation",
            negotiation.id,
            negotiation,
        )
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl Database<Update<Negotiation>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(negotiation): Update<Negotiation>,
    ) -> Result<Self::Ok, Self::Err> {
        memory::update(
            &mut self.0.write().await.negotiations,
            "Negotiation",
            negotiation.id,
            negotiation,
        )
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}
