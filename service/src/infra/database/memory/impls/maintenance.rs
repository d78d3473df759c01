//! Maintenance [`Order`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{
        maintenance::{self, Order},
        property,
    },
    infra::{
        database::{self, memory, Memory},
        Database,
    },
    read::maintenance::Open,
};

impl Database<Select<By<Option<Order>, maintenance::Id>>> for Memory {
    type Ok = Option<Order>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Order>, maintenance::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read().await.maintenance_orders.get(&id).cloned())
    }
}

impl Database<Select<By<Vec<Open<Order>>, property::Id>>> for Memory {
    type Ok = Vec<Open<Order>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Open<Order>>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let property_id = by.into_inner();
        let mut open = self
            .0
            .read()
            .await
            .maintenance_orders
            .values()
            .filter(|o| o.property_id == property_id && o.is_open())
            .cloned()
            .collect::<Vec<_>>();
        open.sort_by_key(|o| o.opened_at);
        Ok(open.into_iter().map(Open).collect())
    }
}

impl Database<Insert<Order>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(order): Insert<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        memory::insert(
            &mut self.0.write().await.maintenance_orders,
            "MaintenanceOrder",
            order.id,
            order,
        )
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl Database<Update<Order>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(order): Update<Order>,
    ) -> Result<Self::Ok, Self::Err> {
        memory::update(
            &mut self.0.write().await.maintenance_orders,
            "MaintenanceOrder",
            order.id,
            order,
        )
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}
