//! Cancellable suspension until a platform's quota window resets.
use crate::error::FetchError;
use pulse_http::RateLimit;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;

/// Suspend the calling task until `rate`'s window resets.
///
/// Returns immediately when quota remains or the reset is already past.
/// Only the calling task sleeps; independent fetch flows keep running.
/// The sleep races the client's cancellation token so an unbounded wait
/// stays responsive: cancellation surfaces [`FetchError::Cancelled`]
/// without touching the network.
pub async fn wait_for_reset(
    platform: &'static str,
    rate: &RateLimit,
    cancel: &CancellationToken,
) -> Result<(), FetchError> {
    if !rate.exhausted() {
        return Ok(());
    }
    let wait = rate.wait_duration(SystemTime::now());
    if wait.is_zero() {
        return Ok(());
    }

    tracing::info!(
        target: "social.rate",
        platform,
        wait_secs = wait.as_secs(),
        reset_epoch = rate.reset_epoch_secs,
        "quota exhausted, waiting for window reset"
    );

    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(target: "social.rate", platform, "rate wait cancelled");
            Err(FetchError::Cancelled)
        }
        _ = tokio::time::sleep(wait) => Ok(()),
    }
}
