//! [`ExpireProposals`] [`Task`].

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
        advance_negotiation, sweep_expired_proposals, Command,
        SweepExpiredProposals, SweepReport,
    },
    domain::negotiation,
    Service,
};

use super::Task;

/// Configuration for [`ExpireProposals`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between expired proposals sweeps.
    #[default(time::Duration::from_secs(60))]
    pub interval: time::Duration,
}

/// [`Task`] for periodic [`SweepExpiredProposals`] execution.
#[derive(Clone, Copy, Debug)]
pub struct ExpireProposals<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db, Au> Task<Start<By<ExpireProposals<Self>, Config>>> for Service<Db, Au>
where
    ExpireProposals<Service<Db, Au>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpireProposals<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ExpireProposals {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::ExpireProposals` failed: {e}");
            });
        }
    }
}

impl<Db, Au> Task<Perform<()>> for ExpireProposals<Service<Db, Au>>
where
    Service<Db, Au>: Command<
        SweepExpiredProposals,
        Ok = SweepReport<
            negotiation::Id,
            Traced<advance_negotiation::ExecutionError>,
        >,
        Err = Traced<sweep_expired_proposals::ExecutionError>,
    >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let report = self
            .service
            .execute(SweepExpiredProposals {
                now: DateTime::now(),
            })
            .await
            .map_err(tracerr::wrap!())?;
        if !report.is_clean() {
            log::warn!(
                "`task::ExpireProposals` left {} `Negotiation`s unprocessed",
                report.failed.len(),
            );
        }
        Ok(())
    }
}

/// Error of [`ExpireProposals`] execution.
pub type ExecutionError = Traced<sweep_expired_proposals::ExecutionError>;
