//! Server initialization and lifecycle
//!
//! This module handles:
//! - Binding the listener and serving the verification router
//! - The Listening → Draining → Stopped lifecycle with a bounded grace period
//! - Wiring the shutdown coordinator to OS signals, completion and the deadline

use crate::config::{VerifierConfig, GRACE_PERIOD};
use crate::error::{StopError, VerifierError, VerifierResult};
use crate::routes::build_router;
use crate::shutdown::{self, GracefulStop, ShutdownCoordinator, ShutdownReport};
use crate::state::VerifierState;
use async_trait::async_trait;
use axum::Router;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Install the JSON tracing subscriber.
///
/// An invalid `log_level` falls back to `info`. Does nothing if a global
/// subscriber is already installed.
pub fn init_tracing(config: &VerifierConfig) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .json()
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Listening,
    Draining,
    Stopped,
    /// The grace period ran out with requests still in flight.
    ForceClosed,
}

/// Cloneable handle used to stop a running [`VerifierServer`]
#[derive(Debug, Clone)]
pub struct ServerHandle {
    state: Arc<watch::Sender<LifecycleState>>,
    grace_period: Duration,
}

impl ServerHandle {
    fn new(grace_period: Duration) -> Self {
        let (state, _) = watch::channel(LifecycleState::Listening);
        Self {
            state: Arc::new(state),
            grace_period,
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    /// Stop accepting connections and wait up to the grace period for
    /// in-flight requests. Connections still open after that are closed.
    ///
    /// Only the first call stops the server; later calls return
    /// [`StopError::AlreadyStopping`].
    pub async fn stop(&self) -> Result<(), StopError> {
        if !self.transition(LifecycleState::Listening, LifecycleState::Draining) {
            return Err(StopError::AlreadyStopping);
        }
        tracing::info!("shutting down server...");

        let mut state = self.subscribe();
        let drained = tokio::time::timeout(
            self.grace_period,
            state.wait_for(|state| *state == LifecycleState::Stopped),
        )
        .await
        .is_ok();

        if drained {
            return Ok(());
        }
        self.force_close()
    }

    /// Give up on draining. Fails only if the server was still draining;
    /// a server that reached `Stopped` in the meantime stopped cleanly.
    fn force_close(&self) -> Result<(), StopError> {
        if self.transition(LifecycleState::Draining, LifecycleState::ForceClosed) {
            Err(StopError::GraceElapsed(self.grace_period))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GracefulStop for ServerHandle {
    async fn stop(&self) -> Result<(), StopError> {
        ServerHandle::stop(self).await
    }
}

/// The bound listener plus the router it serves
pub struct VerifierServer {
    listener: TcpListener,
    router: Router,
    handle: ServerHandle,
}

impl VerifierServer {
    /// Bind `addr`. A bind failure is fatal for the process.
    pub async fn bind(addr: &str, router: Router) -> VerifierResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| VerifierError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        Ok(Self {
            listener,
            router,
            handle: ServerHandle::new(GRACE_PERIOD),
        })
    }

    /// Override the default grace period.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.handle = ServerHandle::new(grace_period);
        self
    }

    pub fn local_addr(&self) -> VerifierResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    /// Serve until the handle is stopped and in-flight requests drain, or
    /// until the grace period forces the remaining connections closed.
    pub async fn serve(self) -> VerifierResult<()> {
        let Self {
            listener,
            router,
            handle,
        } = self;

        let mut draining = handle.subscribe();
        let mut forced = handle.subscribe();

        let serve = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = draining
                    .wait_for(|state| *state != LifecycleState::Listening)
                    .await;
            })
            .into_future();

        tokio::select! {
            result = serve => {
                result?;
                handle.transition(LifecycleState::Draining, LifecycleState::Stopped);
                tracing::info!("server shutdown complete");
            }
            Ok(_) = forced.wait_for(|state| *state == LifecycleState::ForceClosed) => {
                tracing::warn!("grace period elapsed, closing remaining connections");
            }
        }

        Ok(())
    }
}

/// A bound verifier, ready to serve
pub struct Verifier {
    state: VerifierState,
    server: VerifierServer,
}

impl Verifier {
    /// Register every configured path and bind the listener.
    pub async fn bind(config: VerifierConfig) -> VerifierResult<Self> {
        let state = VerifierState::new(config);

        for endpoint in &state.endpoints {
            tracing::info!(path = %endpoint.path(), "registering event-hook verifier");
        }
        if state.endpoints.is_empty() {
            tracing::warn!("no event hook paths configured, only a signal or the deadline stops the server");
        }

        let router = build_router(&state);
        let server = VerifierServer::bind(&state.config.listen_addr(), router).await?;

        Ok(Self { state, server })
    }

    pub fn local_addr(&self) -> VerifierResult<SocketAddr> {
        self.server.local_addr()
    }

    /// Serve until the first shutdown trigger, treating `signal` as the
    /// operator signal.
    pub async fn run_until<S>(self, signal: S) -> VerifierResult<ShutdownReport>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let Self { state, server } = self;

        tracing::info!(
            addr = %server.local_addr()?,
            exit_when_done = state.config.exit_when_done,
            time_out_hours = state.config.time_out_hours,
            "starting event hook verifier"
        );

        let coordinator = ShutdownCoordinator::new(server.handle(), state.config.deadline());
        let coordinator = tokio::spawn(coordinator.run(signal, state.all_verified()));

        if let Err(err) = server.serve().await {
            coordinator.abort();
            return Err(err);
        }

        let report = coordinator.await?;
        tracing::info!(trigger = %report.trigger, clean = report.stop.is_ok(), "verifier stopped");
        Ok(report)
    }
}

/// Start the verifier and serve until it shuts down
///
/// Shutdown happens on SIGINT/SIGTERM, once every registered path has been
/// verified (when exit-when-done is on), or when the deadline elapses.
///
/// # Example
///
/// ```rust,no_run
/// use eventhook_verifier::{Cli, VerifierConfig};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = VerifierConfig::load(&Cli::default())?;
///     eventhook_verifier::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: VerifierConfig) -> VerifierResult<ShutdownReport> {
    Verifier::bind(config)
        .await?
        .run_until(shutdown::shutdown_signal())
        .await
}
