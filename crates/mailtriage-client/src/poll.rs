//! Periodic analytics refresh.

use std::sync::Arc;
use std::time::Duration;

use mailtriage_core::Analytics;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::api::EmailApi;

/// Fetch analytics every `period` and publish each result on `latest`.
///
/// The first fetch starts immediately. Fetches are not serialized: a slow
/// response does not delay the next tick, and whichever response arrives
/// last wins. A failed fetch is logged and the previous value is kept.
/// The task ends once every receiver of `latest` has been dropped.
pub fn spawn_analytics_poller(
    api: Arc<dyn EmailApi>,
    period: Duration,
    latest: watch::Sender<Option<Analytics>>,
) -> JoinHandle<()> {
    let latest = Arc::new(latest);
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = latest.closed() => break,
            }

            let api = Arc::clone(&api);
            let latest = Arc::clone(&latest);
            tokio::spawn(async move {
                match api.analytics().await {
                    Ok(analytics) => {
                        latest.send_replace(Some(analytics));
                    }
                    Err(e) => warn!(error = %e, "Analytics refresh failed"),
                }
            });
        }

        debug!("Analytics poller stopped");
    })
}
