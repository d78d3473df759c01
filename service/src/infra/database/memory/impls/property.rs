//! [`Property`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{property, Property},
    infra::{
        database::{self, memory, Memory},
        Database,
    },
};

impl Database<Select<By<Option<Property>, property::Id>>> for Memory {
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.read().await.properties.get(&id).cloned())
    }
}

impl Database<Select<By<Option<Property>, property::Code>>> for Memory {
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Code>>,
    ) -> Result<Self::Ok, Self::Err> {
        let code = by.into_inner();
        Ok(self
            .0
            .read()
            .await
            .properties
            .values()
            .find(|p| p.code == code)
            .cloned())
    }
}

impl Database<Select<By<Vec<Property>, property::ScheduleDateTime>>>
    for Memory
{
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, property::ScheduleDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let now = by.into_inner();
        let mut due = self
            .0
            .read()
            .await
            .properties
            .values()
            .filter(|p| p.scheduled().is_some_and(|s| s.effective_at <= now))
            .cloned()
            .collect::<Vec<_>>();
        due.sort_by_key(|p| p.created_at);
        Ok(due)
    }
}

impl Database<Insert<Property>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut storage = self.0.write().await;
        if storage.properties.values().any(|p| p.code == property.code) {
            return Err(tracerr::new!(database::Error::from(
                memory::Error::DuplicateCode(property.code)
            )));
        }
        memory::insert(
            &mut storage.properties,
            "Property",
            property.id,
            property,
        )
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl Database<Update<Property>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut storage = self.0.write().await;
        if storage
            .properties
            .values()
            .any(|p| p.code == property.code && p.id != property.id)
        {
            return Err(tracerr::new!(database::Error::from(
                memory::Error::DuplicateCode(property.code)
            )));
        }
        memory::update(
            &mut storage.properties,
            "Property",
            property.id,
            property,
        )
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}
