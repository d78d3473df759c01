//! [`EscalateOverdueEntries`] [`Task`].

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
        escalate_overdue_entries, Command, EscalateOverdueEntries as Escalate,
        SweepReport,
    },
    domain::financial_entry,
    Service,
};

use super::Task;

/// Configuration for [`EscalateOverdueEntries`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between overdue financial entries sweeps.
    #[default(time::Duration::from_secs(3600))]
    pub interval: time::Duration,
}

/// [`Task`] for periodic [`Escalate`] execution.
#[derive(Clone, Copy, Debug)]
pub struct EscalateOverdueEntries<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db, Au> Task<Start<By<EscalateOverdueEntries<Self>, Config>>>
    for Service<Db, Au>
where
    EscalateOverdueEntries<Service<Db, Au>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<EscalateOverdueEntries<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = EscalateOverdueEntries {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::EscalateOverdueEntries` failed: {e}");
            });
        }
    }
}

impl<Db, Au> Task<Perform<()>> for EscalateOverdueEntries<Service<Db, Au>>
where
    Service<Db, Au>: Command<
        Escalate,
        Ok = SweepReport<
            financial_entry::Id,
            Traced<escalate_overdue_entries::ExecutionError>,
        >,
        Err = Traced<escalate_overdue_entries::ExecutionError>,
    >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let report = self
            .service
            .execute(Escalate {
                reference: DateTime::now().coerce(),
            })
            .await
            .map_err(tracerr::wrap!())?;
        if !report.is_clean() {
            log::warn!(
                "`task::EscalateOverdueEntries` left {} `FinancialEntry`s \
                 unprocessed",
                report.failed.len(),
            );
        }
        Ok(())
    }
}

/// Error of [`EscalateOverdueEntries`] execution.
pub type ExecutionError = Traced<escalate_overdue_entries::ExecutionError>;
