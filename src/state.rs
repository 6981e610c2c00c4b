use crate::config::VerifierConfig;
use crate::routes::verification::EndpointHandler;
use crate::tracker::CompletionTracker;
use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct VerifierState {
    /// Verifier configuration
    pub config: Arc<VerifierConfig>,

    /// One handler per distinct registered path
    pub endpoints: Vec<Arc<EndpointHandler>>,

    /// Present only when exit-when-done is enabled and paths are registered
    pub tracker: Option<Arc<CompletionTracker>>,
}

impl VerifierState {
    /// Create one handler per registered path.
    pub fn new(config: VerifierConfig) -> Self {
        let paths = config.registered_paths();

        let tracker =
            (config.exit_when_done && !paths.is_empty()).then(|| CompletionTracker::new(paths.len()));

        let endpoints = paths
            .into_iter()
            .map(|path| {
                let latch = tracker.as_ref().map(CompletionTracker::latch);
                Arc::new(EndpointHandler::new(path, latch))
            })
            .collect();

        Self {
            config: Arc::new(config),
            endpoints,
            tracker,
        }
    }

    /// Resolves once every path is verified; never resolves if completion
    /// does not end the process.
    pub fn all_verified(&self) -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> {
        match &self.tracker {
            Some(tracker) => Box::pin(tracker.all_done()),
            None => Box::pin(future::pending()),
        }
    }

    pub fn endpoint(&self, path: &str) -> Option<&Arc<EndpointHandler>> {
        self.endpoints.iter().find(|endpoint| endpoint.path() == path)
    }
}
