use std::{future::IntoFuture as _, io, sync::OnceLock};

use application::{Args, Config, Service};
use service::infra::{audit, database};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (!STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .init();

    _ = start().await;
}

/// Hosts the periodic sweeps of a [`Service`] until any of them stops.
///
/// This binary is a shell around the sweeps only: it exposes no inbound
/// surface, so its in-memory storage stays empty and every sweep finds
/// nothing to do. Commands are executed by embedding the `service` crate.
async fn start() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config { service, log } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let tasks = service.tasks;
    let (_service, background) = Service::new(
        service.into(),
        database::Memory::default(),
        audit::Log,
    );

    log::info!(
        "sweeps scheduled: expire proposals every {:?}, escalate overdue \
         entries every {:?}, apply scheduled statuses every {:?}, sync \
         overdue remediations every {:?}",
        tasks.expire_proposals.interval,
        tasks.escalate_overdue_entries.interval,
        tasks.apply_scheduled_statuses.interval,
        tasks.sync_overdue_remediations.interval,
    );
    log::info!(
        "running {} sweeps: {}",
        background.tasks().count(),
        background.tasks().collect::<Vec<_>>().join(", "),
    );

    background.into_future().await.map_err(|e| {
        log::error!("background task failed: {e}");
    })
}
