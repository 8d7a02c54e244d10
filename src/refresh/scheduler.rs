use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::HighlightService;

/// Refresh on a fixed period. A zero period disables the timer.
///
/// Must be called from inside a Tokio runtime. Passes run on the blocking pool so the
/// vault scan never stalls the runtime; abort the handle to stop the timer.
pub fn spawn_refresh_timer(
    service: Arc<HighlightService>,
    period: Duration,
) -> Option<JoinHandle<()>> {
    if period.is_zero() {
        log::info!("Refresh timer disabled");
        return None;
    }

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately; the initial pass is the caller's job
        interval.tick().await;

        loop {
            interval.tick().await;

            let service = Arc::clone(&service);
            match tokio::task::spawn_blocking(move || service.refresh()).await {
                Ok(status) => log::debug!("Timed refresh: {:?}", status),
                Err(e) => log::error!("Timed refresh task failed: {}", e),
            }
        }
    });

    log::info!("Refresh timer started (every {:?})", period);
    Some(handle)
}
