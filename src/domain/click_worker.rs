//! Background worker applying click counter updates.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::LinkRepository;

/// Attempts per event before it is dropped.
const MAX_ATTEMPTS: usize = 3;

/// Drains click events and increments link counters.
///
/// Each update is retried with exponential backoff. Events that still fail are
/// logged and dropped: click accounting is best-effort and never blocks a
/// redirect. Returns when every sender has been dropped.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    link_repository: Arc<dyn LinkRepository>,
) {
    while let Some(event) = rx.recv().await {
        let strategy = ExponentialBackoff::from_millis(10)
            .max_delay(Duration::from_secs(1))
            .map(jitter)
            .take(MAX_ATTEMPTS - 1);

        let repo = link_repository.clone();
        let result = Retry::spawn(strategy, || {
            let repo = repo.clone();
            let event = event.clone();
            async move { repo.increment_click(event.link_id, event.clicked_at).await }
        })
        .await;

        match result {
            Ok(()) => debug!(slug = %event.slug, "Click recorded"),
            Err(e) => {
                metrics::counter!("shortly_clicks_dropped_total").increment(1);
                warn!(slug = %event.slug, error = %e, "Dropping click after retries");
            }
        }
    }

    debug!("Click worker stopped: channel closed");
}
