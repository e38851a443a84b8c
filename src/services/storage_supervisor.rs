use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{dao::stats_store::StatsStore, state::SharedState};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Keep the statistics store connected, toggling degraded mode as
/// connectivity comes and goes.
pub async fn run(state: SharedState, database_url: String) {
    let mut delay = INITIAL_DELAY;

    loop {
        if let Some(store) = state.stats_store().await {
            match store.ping().await {
                Ok(()) => {
                    // Healthy connection: reset the retry backoff.
                    delay = INITIAL_DELAY;
                    sleep(HEALTH_POLL_INTERVAL).await;
                }
                Err(err) => {
                    warn!(error = %err, "statistics store ping failed; entering degraded mode");
                    state.clear_stats_store().await;
                    sleep(delay).await;
                    delay = (delay * 2).min(MAX_DELAY);
                }
            }
            continue;
        }

        match StatsStore::connect(&database_url).await {
            Ok(store) => match store.ensure_schema().await {
                Ok(()) => {
                    info!("statistics store ready; leaving degraded mode");
                    state.install_stats_store(store).await;
                    delay = INITIAL_DELAY;
                }
                Err(err) => {
                    warn!(error = %err, "statistics schema creation failed; retrying");
                    sleep(delay).await;
                    delay = (delay * 2).min(MAX_DELAY);
                }
            },
            Err(err) => {
                warn!(error = %err, "statistics store connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}
