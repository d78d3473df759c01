//! [`Command`] for handling a move-out notice of a [`Property`] tenant.

use std::{fmt, time::Duration};

use common::{
    operations::{By, Record, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        property::{self, ScheduledStatus, Status},
        Property,
    },
    error,
    infra::{audit, database, Audit, Database},
    Service,
};
#[cfg(doc)]
use crate::command::ApplyScheduledStatuses;

use super::Command;

/// Duration of the inspection window after the move-out date.
const INSPECTION_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// [`Command`] for moving a [`Property`] into
/// [`Status::InMoveOutInspection`] and scheduling it to become
/// [`Status::ScheduledForAvailability`] a day after the move-out date.
///
/// The scheduled change is applied by [`ApplyScheduledStatuses`].
#[derive(Clone, Copy, Debug)]
pub struct HandleMoveOutNotice {
    /// ID of the [`Property`] being vacated.
    pub property_id: property::Id,

    /// [`DateTime`] when the tenant moves out.
    pub move_out_at: property::MoveOutDateTime,

    /// [`audit::Actor`] handling the notice.
    pub actor: audit::Actor,
}

impl<Db, Au> Command<HandleMoveOutNotice> for Service<Db, Au>
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
        cmd: HandleMoveOutNotice,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let HandleMoveOutNotice {
            property_id,
            move_out_at,
            actor,
        } = cmd;

        let mut property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        _ = property.change_status(
            Status::InMoveOutInspection,
            "move-out notice",
            DateTime::now(),
        );
        let effective_at = (move_out_at + INSPECTION_WINDOW).coerce();
        property.schedule(ScheduledStatus {
            status: Status::ScheduledForAvailability,
            expected: Status::InMoveOutInspection,
            effective_at,
            reason: "move-out inspection window elapsed".into(),
        });

        self.database()
            .execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Property(id: {property_id})` awaits move-out inspection until \
             {effective_at}",
        );
        self.record(audit::Entry::now(
            actor,
            audit::Action::MoveOutNoticed,
            property_id,
            format!("move out at: {move_out_at}"),
        ))
        .await;

        Ok(property)
    }
}

/// Error of [`HandleMoveOutNotice`] [`Command`] execution.
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
