//! [`Command`] for raising the pending signal of a [`Property`].

use std::fmt;

use common::{
    operations::{By, Record, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{property, Property},
    error,
    infra::{audit, database, Audit, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::FinancialEntry;

use super::{sync_pending_status::apply_pending, Command};

/// [`Command`] for raising the pending signal of a [`Property`] right away,
/// without recomputing it.
///
/// Used when a blocking [`FinancialEntry`] is registered.
#[derive(Clone, Copy, Debug)]
pub struct RaisePendingBlock {
    /// ID of the [`Property`] to be blocked.
    pub property_id: property::Id,

    /// [`audit::Actor`] raising the block.
    pub actor: audit::Actor,
}

impl<Db, Au> Command<RaisePendingBlock> for Service<Db, Au>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Err = Traced<database::Error>>,
    Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RaisePendingBlock,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RaisePendingBlock { property_id, actor } = cmd;

        let mut property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        if !apply_pending(&mut property, true, DateTime::now()) {
            log::debug!("`Property(id: {property_id})` is pending already");
            return Ok(property);
        }

        self.database()
            .execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.record(audit::Entry::now(
            actor,
            audit::Action::PendingStatusChanged,
            property_id,
            format!("pending: true, status: {}", property.status()),
        ))
        .await;

        Ok(property)
    }
}

/// Error of [`RaisePendingBlock`] [`Command`] execution.
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
