//! [`SyncOverdueRemediations`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{By, Perform, Start},
    DateTime,
};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    command::{
        sync_overdue_remediations, sync_pending_status, Command, SweepReport,
        SyncOverdueRemediations as SyncOverdue,
    },
    domain::property,
    Service,
};

use super::Task;

/// Configuration for [`SyncOverdueRemediations`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between overdue remediations sweeps.
    #[default(time::Duration::from_secs(600))]
    pub interval: time::Duration,
}

/// [`Task`] for periodic [`SyncOverdue`] execution.
#[derive(Clone, Copy, Debug)]
pub struct SyncOverdueRemediations<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db, Au> Task<Start<By<SyncOverdueRemediations<Self>, Config>>>
    for Service<Db, Au>
where
    SyncOverdueRemediations<Service<Db, Au>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<SyncOverdueRemediations<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = SyncOverdueRemediations {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::SyncOverdueRemediations` failed: {e}");
            });
        }
    }
}

impl<Db, Au> Task<Perform<()>> for SyncOverdueRemediations<Service<Db, Au>>
where
    Service<Db, Au>: Command<
        SyncOverdue,
        Ok = SweepReport<
            property::Id,
            Traced<sync_pending_status::ExecutionError>,
        >,
        Err = Traced<sync_overdue_remediations::ExecutionError>,
    >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let report = self
            .service
            .execute(SyncOverdue {
                now: DateTime::now(),
            })
            .await
            .map_err(tracerr::wrap!())?;
        if !report.is_clean() {
            log::warn!(
                "`task::SyncOverdueRemediations` left {} `Property`s \
                 unprocessed",
                report.failed.len(),
            );
        }
        Ok(())
    }
}

/// Error of [`SyncOverdueRemediations`] execution.
pub type ExecutionError = Traced<sync_overdue_remediations::ExecutionError>;
