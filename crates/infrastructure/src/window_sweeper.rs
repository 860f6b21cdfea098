//! Periodic garbage collection for window stores.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use attestra_application::WindowStore;

#[cfg(test)]
mod tests;

/// Background task sweeping expired window entries on a fixed interval.
///
/// The interval is independent of any window length; the sweep only
/// removes entries that are already semantically dead, so it is safe to
/// run at any cadence alongside live checks. `stop` shuts the task down
/// without touching entries that are still valid.
pub struct WindowSweeper {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WindowSweeper {
    /// Spawns the sweep loop.
    #[must_use]
    pub fn start(store: Arc<dyn WindowStore>, interval: Duration) -> Self {
        let (shutdown, mut signal) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => match store.sweep_expired().await {
                        Ok(0) => {}
                        Ok(removed) => debug!(removed, "removed expired request windows"),
                        Err(error) => warn!(error = %error, "window sweep failed"),
                    },
                    _ = signal.changed() => break,
                }
            }
        });

        Self { shutdown, task }
    }

    /// Stops the loop and waits for the task to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
