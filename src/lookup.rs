//! Single-use handles for in-flight collaborator calls
//!
//! A [`Lookup`] is created by spawning the collaborator call onto the runtime,
//! so the call makes progress as soon as it is issued. Awaiting the handle
//! consumes it and waits at most the configured limit. The spawned task is
//! never aborted: a lookup that outlives its waiter still runs to completion.

use std::future::{Future, IntoFuture};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::{Result, WeatherError};

/// Pending result of one collaborator call
#[must_use = "a lookup does nothing useful unless awaited"]
pub struct Lookup<T> {
    service: &'static str,
    limit: Duration,
    handle: JoinHandle<Result<T>>,
}

impl<T: Send + 'static> Lookup<T> {
    /// Issue `call` immediately on the runtime, in the current tracing span
    pub fn spawn<F>(service: &'static str, limit: Duration, call: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let handle = tokio::spawn(call.in_current_span());
        Self {
            service,
            limit,
            handle,
        }
    }

    /// Name of the collaborator this lookup talks to
    pub fn service(&self) -> &'static str {
        self.service
    }
}

impl<T: Send + 'static> IntoFuture for Lookup<T> {
    type Output = Result<T>;
    type IntoFuture = BoxFuture<'static, Result<T>>;

    fn into_future(self) -> Self::IntoFuture {
        let Lookup {
            service,
            limit,
            handle,
        } = self;

        Box::pin(async move {
            match tokio::time::timeout(limit, handle).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_error)) => {
                    tracing::error!("{} lookup task failed: {}", service, join_error);
                    Err(WeatherError::upstream(service, join_error.to_string()))
                }
                Err(_) => {
                    tracing::warn!("{} lookup exceeded {:?}", service, limit);
                    Err(WeatherError::timeout(service, limit))
                }
            }
        })
    }
}
