//! This file defines the pageviews binary entry point.

use pageviews::app;
use pageviews::cli;
use pageviews::error;
use pageviews::metrics;
use pageviews::tracing;

use std::process::ExitCode;

/// Application entry point
#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    tracing::init_tracing();
    let result = match metrics::register_metrics() {
        Ok(()) => app::execute(&args).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error::log_report(&err);
            ExitCode::FAILURE
        }
    }
}
