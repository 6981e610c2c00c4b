use crate::cli::Cli;
use crate::error::{VerifierError, VerifierResult};
use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Header Okta sends the one-time verification challenge in.
pub const VERIFICATION_HEADER: &str = "x-okta-verification-challenge";

/// How long a graceful stop waits for in-flight requests.
pub const GRACE_PERIOD: Duration = Duration::from_secs(30);

const SECS_PER_HOUR: u64 = 60 * 60;

/// Verifier configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VerifierConfig {
    /// Address the web server binds to, `:port` binds all interfaces
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Comma separated event hook paths
    #[serde(default = "default_event_hook_paths")]
    pub event_hook_paths: String,

    /// Exit once every path has been verified
    #[serde(default = "default_true")]
    pub exit_when_done: bool,

    /// Hard deadline in hours, 0 disables it
    #[serde(default)]
    pub time_out_hours: u64,

    /// Tracing filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            event_hook_paths: default_event_hook_paths(),
            exit_when_done: default_true(),
            time_out_hours: 0,
            log_level: default_log_level(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl VerifierConfig {
    /// Load configuration from flags and the process environment.
    ///
    /// Precedence is defaults < flags < environment. Empty environment
    /// values are ignored.
    pub fn load(cli: &Cli) -> VerifierResult<Self> {
        Self::from_sources(cli, Environment::default())
    }

    /// Same as [`load`](Self::load) with an explicit environment source.
    pub fn from_sources(cli: &Cli, env: Environment) -> VerifierResult<Self> {
        let defaults = Self::default();

        let builder = Config::builder()
            .set_default(
                "listen_address",
                cli.listen_address.clone().unwrap_or(defaults.listen_address),
            )?
            .set_default(
                "event_hook_paths",
                cli.event_hook_paths
                    .clone()
                    .unwrap_or(defaults.event_hook_paths),
            )?
            .set_default(
                "exit_when_done",
                cli.exit_when_done.unwrap_or(defaults.exit_when_done),
            )?
            .set_default(
                "time_out_hours",
                cli.time_out_hours.unwrap_or(defaults.time_out_hours),
            )?
            .set_default(
                "log_level",
                cli.log_level.clone().unwrap_or(defaults.log_level),
            )?
            .set_default(
                "request_timeout_secs",
                cli.request_timeout_secs
                    .unwrap_or(defaults.request_timeout_secs),
            )?
            .add_source(env.ignore_empty(true));

        let config: VerifierConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the router or the listener cannot work with.
    pub fn validate(&self) -> VerifierResult<()> {
        if self.listen_address.trim().is_empty() {
            return Err(VerifierError::invalid("listen address must not be empty"));
        }
        for path in self.registered_paths() {
            if !path.starts_with('/') {
                return Err(VerifierError::invalid(format!(
                    "event hook path {path:?} must start with '/'"
                )));
            }
            if path.contains(['{', '}']) {
                return Err(VerifierError::invalid(format!(
                    "event hook path {path:?} must not contain '{{' or '}}'"
                )));
            }
            if path
                .split('/')
                .any(|segment| segment.starts_with([':', '*']))
            {
                return Err(VerifierError::invalid(format!(
                    "event hook path {path:?} must not have a segment starting with ':' or '*'"
                )));
            }
        }
        Ok(())
    }

    /// Address to hand to the listener. `:9000` means every interface.
    pub fn listen_addr(&self) -> String {
        let addr = self.listen_address.trim();
        match addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => addr.to_string(),
        }
    }

    /// Distinct event hook paths in first-seen order.
    pub fn registered_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        for path in self.event_hook_paths.split(',').map(str::trim) {
            if path.is_empty() || paths.iter().any(|p| p == path) {
                continue;
            }
            paths.push(path.to_string());
        }
        paths
    }

    /// Process-wide deadline, if one is configured.
    pub fn deadline(&self) -> Option<Duration> {
        (self.time_out_hours > 0)
            .then(|| Duration::from_secs(self.time_out_hours.saturating_mul(SECS_PER_HOUR)))
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_listen_address() -> String {
    ":9000".to_string()
}

fn default_event_hook_paths() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}
