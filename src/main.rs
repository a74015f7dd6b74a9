use anyhow::Context;
use clap::Parser;
use replica::config::Cli;
use replica::orchestrator::{JsonLinesSink, MultiSink, PassSink, TracingSink};
use replica::{run_periodic, Config, Orchestrator};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Convert CLI args to Config - this validates immediately
    let config = Config::try_from(cli)?;

    init_tracing(config.log_file.as_deref())?;
    tracing::info!(version = replica::VERSION, "replica starting");

    let mut sinks: Vec<Arc<dyn PassSink>> = vec![Arc::new(TracingSink)];
    if let Some(report) = &config.report_file {
        sinks.push(Arc::new(JsonLinesSink::create(report)?));
    }

    let orchestrator = Arc::new(
        Orchestrator::new(&config.source, &config.destination)
            .with_workers(config.workers)
            .with_sink(Arc::new(MultiSink::new(sinks))),
    );

    if config.once {
        let orch = Arc::clone(&orchestrator);
        let result = tokio::task::spawn_blocking(move || orch.run_once())
            .await
            .context("mirroring pass panicked")??;
        if result.failures > 0 {
            anyhow::bail!("{} action(s) failed during the pass", result.failures);
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("interrupt received");
                stop.cancel();
            }
            Err(err) => tracing::warn!(error = %err, "cannot listen for Ctrl-C"),
        }
    });

    run_periodic(orchestrator, config.interval, cancel).await?;
    Ok(())
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .context("failed to initialise logging")?;
    Ok(())
}
