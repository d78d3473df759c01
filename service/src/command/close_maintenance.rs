//! [`Command`] for closing a maintenance [`Order`] of a [`Property`].

use std::fmt;

use common::{
    operations::{By, Record, Select, Update},
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
    read::maintenance::Open,
    Service,
};

use super::Command;

/// [`Command`] for closing a maintenance [`Order`].
///
/// Once no open [`Order`]s remain, the [`Property`] leaves
/// [`property::Status::InMaintenance`] for [`property::Status::Available`].
/// Closing an already closed [`Order`] re-evaluates the [`Property`] only.
#[derive(Clone, Copy, Debug)]
pub struct CloseMaintenance {
    /// ID of the [`Property`] the [`Order`] is about.
    pub property_id: property::Id,

    /// ID of the [`Order`] to be closed.
    pub order_id: maintenance::Id,

    /// [`audit::Actor`] closing the [`Order`].
    pub actor: audit::Actor,
}

impl<Db, Au> Command<CloseMaintenance> for Service<Db, Au>
where
    Db: Database<
            Select<By<Option<Order>, maintenance::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Open<Order>>, property::Id>>,
            Ok = Vec<Open<Order>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Order>, Err = Traced<database::Error>>
        + Database<Update<Property>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CloseMaintenance,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CloseMaintenance {
            property_id,
            order_id,
            actor,
        } = cmd;
        let now = DateTime::now();

        let mut order = self
            .database()
            .execute(Select(By::<Option<Order>, _>::new(order_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(order_id))
            .map_err(tracerr::wrap!())?;
        if order.property_id != property_id {
            return Err(tracerr::new!(E::WrongProperty {
                order_id,
                property_id,
            }));
        }

        let closed = order.close(now);
        if closed {
            self.database()
                .execute(Update(order))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            self.record(audit::Entry::now(
                actor,
                audit::Action::MaintenanceClosed,
                order_id,
                format!("property: {property_id}"),
            ))
            .await;
        } else {
            log::debug!("`MaintenanceOrder(id: {order_id})` is closed already");
        }

        let mut property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        let remaining = self
            .database()
            .execute(Select(By::<Vec<Open<Order>>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .len();
        if remaining > 0 {
            log::debug!(
                "`Property(id: {property_id})` has {remaining} open \
                 maintenance orders left",
            );
            return Ok(property);
        }

        let unflagged = property.set_open_maintenance(false);
        let reverted = property.status() == property::Status::InMaintenance
            && property.change_status(
                property::Status::Available,
                "maintenance closed",
                now,
            );
        if !unflagged && !reverted {
            return Ok(property);
        }
        if property.is_available_while_pending() {
            log::warn!(
                "`Property(id: {property_id})` became `AVAILABLE` while \
                 having open pending issues",
            );
        }

        self.database()
            .execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Property(id: {property_id})` has no open maintenance orders, \
             status: `{}`",
            property.status(),
        );

        Ok(property)
    }
}

/// Error of [`CloseMaintenance`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Order`] with the provided ID does not exist.
    #[display("`MaintenanceOrder(id: {_0})` does not exist")]
    OrderNotExists(#[error(not(source))] maintenance::Id),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`Order`] is about another [`Property`].
    #[display(
        "`MaintenanceOrder(id: {order_id})` is not about \
         `Property(id: {property_id})`"
    )]
    WrongProperty {
        /// ID of the [`Order`].
        order_id: maintenance::Id,

        /// ID of the [`Property`].
        property_id: property::Id,
    },
}

impl ExecutionError {
    /// Returns [`error::Kind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> error::Kind {
        match self {
            Self::Db(e) => e.kind(),
            Self::OrderNotExists(_) | Self::PropertyNotExists(_) => {
                error::Kind::NotFound
            }
            Self::WrongProperty { .. } => error::Kind::Conflict,
        }
    }
}
