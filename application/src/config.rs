//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Service configuration.
    pub service: Service,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Service configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Service {
    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            tasks:
                Tasks {
                    expire_proposals,
                    escalate_overdue_entries,
                    apply_scheduled_statuses,
                    sync_overdue_remediations,
                },
        } = value;
        Self {
            expire_proposals: service::task::expire_proposals::Config {
                interval: expire_proposals.interval,
            },
            escalate_overdue_entries:
                service::task::escalate_overdue_entries::Config {
                    interval: escalate_overdue_entries.interval,
                },
            apply_scheduled_statuses:
                service::task::apply_scheduled_statuses::Config {
                    interval: apply_scheduled_statuses.interval,
                },
            sync_overdue_remediations:
                service::task::sync_overdue_remediations::Config {
                    interval: sync_overdue_remediations.interval,
                },
        }
    }
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `ExpireProposals` task configuration.
    #[default(Task::every(time::Duration::from_secs(60)))]
    pub expire_proposals: Task,

    /// `EscalateOverdueEntries` task configuration.
    #[default(Task::every(time::Duration::from_secs(60 * 60)))]
    pub escalate_overdue_entries: Task,

    /// `ApplyScheduledStatuses` task configuration.
    #[default(Task::every(time::Duration::from_secs(5 * 60)))]
    pub apply_scheduled_statuses: Task,

    /// `SyncOverdueRemediations` task configuration.
    #[default(Task::every(time::Duration::from_secs(10 * 60)))]
    pub sync_overdue_remediations: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60 * 60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

impl Task {
    /// Creates a new [`Task`] configuration executed with the provided
    /// `interval`.
    #[must_use]
    pub const fn every(interval: time::Duration) -> Self {
        Self { interval }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}
