//! Okta event hook verifier
//!
//! Okta proves that an event hook endpoint is under your control by sending a
//! single `GET` carrying an `x-okta-verification-challenge` header and
//! expecting the value echoed back as `{"verification" : "<value>"}`. This
//! crate serves that handshake on one or more paths and shuts itself down as
//! soon as one of these happens:
//!
//! - every registered path has been verified (with exit-when-done enabled),
//! - the process receives SIGINT or SIGTERM,
//! - the optional deadline elapses.
//!
//! In-flight responses get a bounded grace period before the server closes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use eventhook_verifier::{Cli, VerifierConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = VerifierConfig::load(&Cli::default())?;
//!     let report = eventhook_verifier::start_server(config).await?;
//!     println!("stopped by {}", report.trigger);
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! | Flag                     | Environment            | Default |
//! |--------------------------|------------------------|---------|
//! | `--listen-address`       | `LISTEN_ADDRESS`       | `:9000` |
//! | `--event-hook-paths`     | `EVENT_HOOK_PATHS`     | `/`     |
//! | `--exit-when-done`       | `EXIT_WHEN_DONE`       | `true`  |
//! | `--time-out-hours`       | `TIME_OUT_HOURS`       | `0`     |
//! | `--log-level`            | `LOG_LEVEL`            | `info`  |
//! | `--request-timeout-secs` | `REQUEST_TIMEOUT_SECS` | `10`    |
//!
//! Non-empty environment values win over flags.

pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod tracker;

pub use cli::Cli;
pub use config::VerifierConfig;
pub use error::{StopError, VerificationError, VerifierError, VerifierResult};
pub use server::{start_server, ServerHandle, Verifier, VerifierServer};
pub use shutdown::{ShutdownReport, ShutdownTrigger};
pub use state::VerifierState;
