//! Command-line flags.
//!
//! Every flag is optional so the config layer can tell "not given" apart
//! from "given with the default value"; see [`crate::config::VerifierConfig::load`].

use clap::Parser;

/// An Okta event hook handler which only performs the initial one-time verification.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "okta-eventhook-verifier", version, about)]
pub struct Cli {
    /// Address the web server binds to (default: :9000) [$LISTEN_ADDRESS]
    #[arg(long, value_name = "ADDR")]
    pub listen_address: Option<String>,

    /// Comma separated list of event hook paths (default: /) [$EVENT_HOOK_PATHS]
    #[arg(long, value_name = "PATHS")]
    pub event_hook_paths: Option<String>,

    /// Exit once every event hook path is verified (default: true) [$EXIT_WHEN_DONE]
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub exit_when_done: Option<bool>,

    /// Exit after the given hours even if hooks are not verified, 0 disables (default: 0) [$TIME_OUT_HOURS]
    #[arg(long, value_name = "HOURS")]
    pub time_out_hours: Option<u64>,

    /// Tracing filter directive (default: info) [$LOG_LEVEL]
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Per-request timeout in seconds (default: 10) [$REQUEST_TIMEOUT_SECS]
    #[arg(long, value_name = "SECS")]
    pub request_timeout_secs: Option<u64>,
}
