//! Periodic pass scheduling

use super::Orchestrator;
use crate::types::{MirrorError, PassResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

type PassHandle = JoinHandle<Result<PassResult, MirrorError>>;

/// Run passes now and then every `interval` until `cancel` fires.
///
/// Ticks that land while a pass is still running are recorded as skipped;
/// missed ticks are dropped rather than queued. Cancellation is observed at
/// tick boundaries only: a running pass is never interrupted, and it is
/// awaited before this returns.
///
/// # Errors
/// `MirrorError::Config` for a zero interval. Failed passes are recorded by
/// the orchestrator's sink and do not stop the loop.
pub async fn run_periodic(
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
    cancel: CancellationToken,
) -> Result<(), MirrorError> {
    if interval.is_zero() {
        return Err(MirrorError::Config(
            "mirror interval must be greater than zero".to_string(),
        ));
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight: Option<PassHandle> = None;

    tracing::info!(
        source = %orchestrator.source().display(),
        destination = %orchestrator.destination().display(),
        interval_secs = interval.as_secs_f64(),
        "mirroring started"
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match orchestrator.guard().try_acquire() {
            None => orchestrator.record_skipped(),
            Some(permit) => {
                // The previous pass released its permit and is only reporting now.
                if let Some(previous) = in_flight.take() {
                    settle(previous.await);
                }
                let orch = Arc::clone(&orchestrator);
                in_flight = Some(tokio::task::spawn_blocking(move || {
                    orch.run_with_permit(permit)
                }));
            }
        }
    }

    if let Some(pass) = in_flight.take() {
        tracing::info!("stop requested; waiting for the running pass to finish");
        settle(pass.await);
    }
    tracing::info!("mirroring stopped");

    Ok(())
}

fn settle(joined: Result<Result<PassResult, MirrorError>, JoinError>) {
    match joined {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => tracing::debug!(error = %err, "pass ended with error"),
        Err(err) => tracing::error!(error = %err, "pass task panicked"),
    }
}
