// Watcher binary entry point

mod cli;

use clap::Parser;
use cli::Cli;
use common::config::Settings;
use common::errors::ConfigError;
use common::notifier::{MakerWebhookTransport, Notifier};
use common::renderer::HttpPageRenderer;
use common::scheduler::WatchEngine;
use common::telemetry;
use common::throttle::SystemClock;
use common::validation;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Usage errors share the exit code of missing arguments
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, exit_code = err.exit_code(), "Startup failed");
            eprintln!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), ConfigError> {
    let settings = Settings::load_from_path(&cli.config_dir)?;
    settings.validate().map_err(ConfigError::Settings)?;

    telemetry::init_logging(
        &settings.observability.log_level,
        settings.observability.log_format,
    )
    .map_err(|e| ConfigError::Settings(e.to_string()))?;

    if let Some(port) = settings.observability.metrics_port {
        telemetry::init_metrics(port).map_err(|e| ConfigError::Settings(e.to_string()))?;
    }

    info!("Starting page watcher");

    let watch = validation::validate(&cli.watch_args())?;
    info!(
        endpoints = watch.endpoints.len(),
        interval_seconds = watch.jitter.base_interval_seconds,
        jitter_percent = watch.jitter.jitter_percent,
        notifications = watch.notification.is_some(),
        "Configuration validated"
    );

    let renderer =
        HttpPageRenderer::new(&settings.render).map_err(|e| ConfigError::Settings(e.to_string()))?;

    let mut engine = WatchEngine::new(watch.endpoints, watch.jitter, Arc::new(renderer))
        .with_max_concurrency(settings.render.max_concurrency);

    if let Some(notification) = watch.notification {
        let transport = MakerWebhookTransport::new(&settings.notification)
            .map_err(|e| ConfigError::Settings(e.to_string()))?;
        engine = engine.with_notifier(Notifier::new(
            notification,
            Arc::new(transport),
            Arc::new(SystemClock),
        ));
        info!("Notifier initialized");
    }

    // Set up graceful shutdown
    let stop = engine.stop_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C signal, initiating graceful shutdown");
                stop.stop();
            }
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });

    engine.run().await;

    info!("Page watcher stopped");
    Ok(())
}
