//! Trustbed binary
//!
//! Runs population → bootstrap → hyperparameter search → simulation once,
//! configured from `trustbed.toml` and `TRUSTBED__*` environment variables.

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trustbed_cli::{pipeline, TrustbedConfig};
use trustbed_common::{CancelToken, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Trustbed v{}", VERSION);

    let config = TrustbedConfig::load()?;
    config.validate()?;
    info!("Loaded configuration: {:?}", config);

    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, cancelling run");
            on_signal.cancel();
        }
    });

    let report = tokio::task::spawn_blocking(move || pipeline::run(&config, &cancel)).await??;

    let (bad, ok, good) = report.percentages();
    info!(
        run_id = %report.run_id,
        train_reports = report.train_reports,
        test_reports = report.test_reports,
        champions = report.champions,
        failures = report.failures.len(),
        held_out_accuracy = report.held_out_accuracy,
        "Training summary"
    );
    info!(
        "Outcomes: bad {:.2}%, ok {:.2}%, good {:.2}% over {} transactions",
        bad,
        ok,
        good,
        report.tally.total()
    );
    info!("State written to {}", report.state_path.display());
    Ok(())
}
