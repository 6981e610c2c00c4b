//! Shutdown coordination
//!
//! A single [`ShutdownCoordinator`] races three triggers:
//!
//! - an operator signal (SIGINT / SIGTERM),
//! - every registered path having been verified,
//! - the optional process deadline.
//!
//! The first one observed wins and drives exactly one graceful stop of the
//! server. The coordinator goes `Running` → `Stopping` → `Stopped`; the
//! losing triggers are dropped along with the deadline timer.

use crate::error::StopError;
use async_trait::async_trait;
use std::fmt;
use std::future::{self, Future};
use std::time::Duration;
use tokio::sync::watch;

/// Something that can be stopped gracefully within a bounded time.
#[async_trait]
pub trait GracefulStop: Send + Sync {
    /// Stop accepting work and drain what is in flight.
    ///
    /// Calling it again while a stop is underway must not disturb the
    /// first call; implementations return [`StopError::AlreadyStopping`].
    async fn stop(&self) -> Result<(), StopError>;
}

/// The cause of a shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTrigger {
    OperatorSignal,
    AllVerified,
    Deadline,
}

impl ShutdownTrigger {
    fn describe(self) -> &'static str {
        match self {
            ShutdownTrigger::OperatorSignal => "received stop signal",
            ShutdownTrigger::AllVerified => "all event hooks are verified",
            ShutdownTrigger::Deadline => "timed out",
        }
    }
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownTrigger::OperatorSignal => "operator_signal",
            ShutdownTrigger::AllVerified => "all_verified",
            ShutdownTrigger::Deadline => "deadline",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Running,
    Stopping,
    Stopped,
}

/// Outcome of a coordinated shutdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// The trigger that won the race
    pub trigger: ShutdownTrigger,
    /// Result of the graceful stop. A failure is logged, never escalated.
    pub stop: Result<(), StopError>,
}

pub struct ShutdownCoordinator<L> {
    lifecycle: L,
    deadline: Option<Duration>,
    state: watch::Sender<CoordinatorState>,
}

impl<L: GracefulStop> ShutdownCoordinator<L> {
    /// `deadline` of `None` removes the deadline trigger entirely.
    pub fn new(lifecycle: L, deadline: Option<Duration>) -> Self {
        let (state, _) = watch::channel(CoordinatorState::Running);
        Self {
            lifecycle,
            deadline,
            state,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        *self.state.borrow()
    }

    /// Watch the coordinator move through its states.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state.subscribe()
    }

    /// Wait for the first trigger, then stop the server once.
    pub async fn run<S, V>(self, signal: S, all_verified: V) -> ShutdownReport
    where
        S: Future<Output = ()>,
        V: Future<Output = ()>,
    {
        let trigger = wait_for_trigger(signal, all_verified, self.deadline).await;
        self.state.send_replace(CoordinatorState::Stopping);
        tracing::info!(%trigger, "{}", trigger.describe());

        let stop = self.lifecycle.stop().await;
        if let Err(err) = &stop {
            tracing::error!(err = %err, "failed to shutdown http server");
        }

        self.state.send_replace(CoordinatorState::Stopped);
        ShutdownReport { trigger, stop }
    }
}

/// Resolve with whichever trigger fires first.
///
/// The deadline timer only exists when `deadline` is set and is dropped as
/// soon as another trigger wins.
pub async fn wait_for_trigger<S, V>(
    signal: S,
    all_verified: V,
    deadline: Option<Duration>,
) -> ShutdownTrigger
where
    S: Future<Output = ()>,
    V: Future<Output = ()>,
{
    let deadline = async move {
        match deadline {
            Some(after) => tokio::time::sleep(after).await,
            None => future::pending().await,
        }
    };

    tokio::select! {
        () = signal => ShutdownTrigger::OperatorSignal,
        () = all_verified => ShutdownTrigger::AllVerified,
        () = deadline => ShutdownTrigger::Deadline,
    }
}

/// Resolves on SIGINT or, on unix, SIGTERM.
///
/// A signal source that cannot be installed is logged and never fires.
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(err = %err, "failed to install Ctrl+C handler");
            future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(err = %err, "failed to install SIGTERM handler");
                future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::debug!("received Ctrl+C"),
        () = terminate => tracing::debug!("received SIGTERM"),
    }
}
