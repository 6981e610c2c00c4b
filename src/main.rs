//! Okta event hook verifier binary
//!
//! Exit status: 0 after a graceful shutdown, 1 if the server cannot start,
//! 2 on invalid flags or configuration.

use anyhow::Context;
use clap::Parser;
use eventhook_verifier::{Cli, ShutdownReport, VerifierConfig, VerifierError};
use std::process::ExitCode;

fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = match VerifierConfig::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(err.exit_code());
        }
    };

    eventhook_verifier::server::init_tracing(&config);

    match serve(config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("unable to start server: {err:#}");
            let code = err
                .downcast_ref::<VerifierError>()
                .map_or(1, VerifierError::exit_code);
            ExitCode::from(code)
        }
    }
}

#[tokio::main]
async fn serve(config: VerifierConfig) -> anyhow::Result<ShutdownReport> {
    let addr = config.listen_addr();
    eventhook_verifier::start_server(config)
        .await
        .with_context(|| format!("verifier on {addr} failed"))
}
