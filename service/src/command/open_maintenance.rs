//! [`Command`] for opening a maintenance [`Order`] of a [`Property`].

use std::fmt;

use common::{
    operations::{By, Insert, Record, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        maintenance::{self, Order},
        property, Property,
    },
    error,
    infra::{audit, database, Audit, Database},
    Service,
};

use super::Command;

/// [`Command`] for opening a maintenance [`Order`] and moving its
/// [`Property`] into [`property::Status::InMaintenance`].
///
/// Maintenance takes over any other [`property::Status`].
#[derive(Clone, Debug)]
pub struct OpenMaintenance {
    /// ID of the [`Property`] requiring maintenance.
    pub property_id: property::Id,

    /// [`maintenance::Description`] of the work to be done.
    pub description: maintenance::Description,

    /// [`audit::Actor`] opening the [`Order`].
    pub actor: audit::Actor,
}

impl<Db, Au> Command<OpenMaintenance> for Service<Db, Au>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Order>, Err = Traced<database::Error>>
        + Database<Update<Property>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
{
    type Ok = Order;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: OpenMaintenance,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let OpenMaintenance {
            property_id,
            description,
            actor,
        } = cmd;

        let mut property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        let now = DateTime::now();
        let order = Order::open(property_id, description, now.coerce());
        self.database()
            .execute(Insert(order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let flagged = property.set_open_maintenance(true);
        let moved = property.change_status(
            property::Status::InMaintenance,
            "maintenance opened",
            now,
        );
        if flagged || moved {
            self.database()
                .execute(Update(property))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        log::info!(
            "`MaintenanceOrder(id: {})` opened for \
             `Property(id: {property_id})`",
            order.id,
        );
        self.record(audit::Entry::now(
            actor,
            audit::Action::MaintenanceOpened,
            order.id,
            format!(
                "property: {property_id}, description: {}",
                order.description,
            ),
        ))
        .await;

        Ok(order)
    }
}

/// Error of [`OpenMaintenance`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(e) => e.kind(),
            Self::PropertyNotExists(_) => error::Kind::NotFound,
        }
    }
}
