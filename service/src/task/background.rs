//! [`Background`] environment of the sweep [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
};

use derive_more::{Display, Error as StdError};
use futures::future::{self, LocalBoxFuture, FutureExt as _};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::{Service, Task};

/// Environment running the sweep [`Task`]s of a [`Service`] on the current
/// thread.
///
/// Resolves as soon as any of its [`Task`]s stops.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are spawned onto.
    set: task::LocalSet,

    /// Names of the spawned [`Task`]s along with their handles.
    handles: Vec<(&'static str, task::JoinHandle<Result<(), Stopped>>)>,
}

impl Background {
    /// Spawns a new [`Task`] with the provided `name`.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        let handle = self.set.spawn_local(async move {
            future.await.map_err(|e| Stopped {
                task: name,
                cause: Box::new(e),
            })
        });
        self.handles.push((name, handle));
        log::debug!("`task::{name}` spawned");
    }

    /// Returns names of the spawned [`Task`]s.
    pub fn tasks(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handles.iter().map(|(name, _)| *name)
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Stopped>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        if handles.is_empty() {
            return future::ready(Ok(())).boxed_local();
        }

        let stopped = future::select_all(handles.into_iter().map(
            |(name, handle)| {
                handle
                    .map(move |res| {
                        let res = res.unwrap_or_else(|e| {
                            Err(Stopped {
                                task: name,
                                cause: Box::new(e),
                            })
                        });
                        match &res {
                            Ok(()) => log::info!("`task::{name}` finished"),
                            Err(e) => log::error!("{e}"),
                        }
                        res
                    })
                    .boxed_local()
            },
        ));
        async move { set.run_until(stopped).await.0 }.boxed_local()
    }
}

/// Error of a [`Task`] stopped in the [`Background`].
#[derive(Debug, Display, StdError)]
#[display("`task::{task}` stopped: {cause}")]
pub struct Stopped {
    /// Name of the stopped [`Task`].
    #[error(not(source))]
    pub task: &'static str,

    /// Cause of the stop.
    #[error(not(source))]
    pub cause: Box<dyn Error>,
}
