//! [`ApplyScheduledStatuses`] [`Task`].

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
        apply_scheduled_statuses, ApplyScheduledStatuses as Apply, Command,
        SweepReport,
    },
    domain::property,
    Service,
};

use super::Task;

/// Configuration for [`ApplyScheduledStatuses`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between scheduled statuses sweeps.
    #[default(time::Duration::from_secs(300))]
    pub interval: time::Duration,
}

/// [`Task`] for periodic [`Apply`] execution.
#[derive(Clone, Copy, Debug)]
pub struct ApplyScheduledStatuses<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db, Au> Task<Start<By<ApplyScheduledStatuses<Self>, Config>>>
    for Service<Db, Au>
where
    ApplyScheduledStatuses<Service<Db, Au>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ApplyScheduledStatuses<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ApplyScheduledStatuses {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::ApplyScheduledStatuses` failed: {e}");
            });
        }
    }
}

impl<Db, Au> Task<Perform<()>> for ApplyScheduledStatuses<Service<Db, Au>>
where
    Service<Db, Au>: Command<
        Apply,
        Ok = SweepReport<
            property::Id,
            Traced<apply_scheduled_statuses::ExecutionError>,
        >,
        Err = Traced<apply_scheduled_statuses::ExecutionError>,
    >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let report = self
            .service
            .execute(Apply {
                now: DateTime::now(),
            })
            .await
            .map_err(tracerr::wrap!())?;
        if !report.is_clean() {
            log::warn!(
                "`task::ApplyScheduledStatuses` left {} `Property`s \
                 unprocessed",
                report.failed.len(),
            );
        }
        Ok(())
    }
}

/// Error of [`ApplyScheduledStatuses`] execution.
pub type ExecutionError = Traced<apply_scheduled_statuses::ExecutionError>;
