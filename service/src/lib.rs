//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod error;
#[cfg(test)]
mod fixture;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::{error::Error, fmt};

use common::operations::{By, Record, Start};
use tracing as log;

use self::infra::{audit, Audit};
#[cfg(doc)]
use self::infra::Database;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct Config {
    /// [`task::ExpireProposals`] configuration.
    pub expire_proposals: task::expire_proposals::Config,

    /// [`task::EscalateOverdueEntries`] configuration.
    pub escalate_overdue_entries: task::escalate_overdue_entries::Config,

    /// [`task::ApplyScheduledStatuses`] configuration.
    pub apply_scheduled_statuses: task::apply_scheduled_statuses::Config,

    /// [`task::SyncOverdueRemediations`] configuration.
    pub sync_overdue_remediations: task::sync_overdue_remediations::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Au> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Audit`] sink of this [`Service`].
    audit: Au,
}

impl<Db, Au> Service<Db, Au> {
    /// Creates a new [`Service`] with the provided parameters, along with the
    /// [`task::Background`] running its periodic sweeps.
    pub fn new(
        config: Config,
        database: Db,
        audit: Au,
    ) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::ExpireProposals<Self>,
                        task::expire_proposals::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Task<
                Start<
                    By<
                        task::EscalateOverdueEntries<Self>,
                        task::escalate_overdue_entries::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Task<
                Start<
                    By<
                        task::ApplyScheduledStatuses<Self>,
                        task::apply_scheduled_statuses::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Task<
                Start<
                    By<
                        task::SyncOverdueRemediations<Self>,
                        task::sync_overdue_remediations::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Self::from_parts(config, database, audit);

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("ExpireProposals", async move {
            svc.execute(Start(By::<task::ExpireProposals<Self>, _>::new(
                svc.config().expire_proposals,
            )))
            .await
        });
        let svc = this.clone();
        bg.spawn("EscalateOverdueEntries", async move {
            svc.execute(Start(By::<task::EscalateOverdueEntries<Self>, _>::new(
                svc.config().escalate_overdue_entries,
            )))
            .await
        });
        let svc = this.clone();
        bg.spawn("ApplyScheduledStatuses", async move {
            svc.execute(Start(
                By::<task::ApplyScheduledStatuses<Self>, _>::new(
                    svc.config().apply_scheduled_statuses,
                ),
            ))
            .await
        });
        let svc = this.clone();
        bg.spawn("SyncOverdueRemediations", async move {
            svc.execute(Start(
                By::<task::SyncOverdueRemediations<Self>, _>::new(
                    svc.config().sync_overdue_remediations,
                ),
            ))
            .await
        });

        (this, bg)
    }

    /// Creates a new [`Service`] without starting any [`Task`]s.
    pub(crate) fn from_parts(config: Config, database: Db, audit: Au) -> Self {
        Self {
            config,
            database,
            audit,
        }
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Audit`] sink of this [`Service`].
    #[must_use]
    pub fn audit(&self) -> &Au {
        &self.audit
    }

    /// Records the provided [`audit::Entry`], logging the failure instead of
    /// propagating it.
    pub(crate) async fn record(&self, entry: audit::Entry)
    where
        Au: Audit<Record<audit::Entry>, Ok = (), Err: fmt::Display>,
    {
        if let Err(e) = self.audit.execute(Record(entry)).await {
            log::warn!("failed to record audit entry: {e}");
        }
    }
}
