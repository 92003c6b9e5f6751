use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::collaborators::PositionSource;

use super::loop_worker::{watch_loop, TrackerEvent};

/// Owns the position watch while the flow sits on the GPS step.
pub struct GeolocationTracker {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    subscription: u64,
    settle_after: Duration,
}

impl GeolocationTracker {
    pub fn new(settle_after: Duration) -> Self {
        Self {
            handle: None,
            cancel_token: None,
            subscription: 0,
            settle_after,
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Id of the most recent subscription.
    pub fn subscription(&self) -> u64 {
        self.subscription
    }

    pub fn start(
        &mut self,
        source: &dyn PositionSource,
        events: mpsc::UnboundedSender<TrackerEvent>,
    ) -> Result<u64> {
        if self.handle.is_some() {
            bail!("position watch already active");
        }

        self.subscription += 1;
        let subscription = self.subscription;
        let readings = source.watch();

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(watch_loop(
            subscription,
            readings,
            events,
            self.settle_after,
            cancel_token.clone(),
        ));

        info!("Started position watch {subscription}");
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(subscription)
    }

    /// Cancels the watch and waits for the loop to drop the position stream.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("position watch task failed to join")?;
            info!("Stopped position watch {}", self.subscription);
        }
        Ok(())
    }
}

impl Drop for GeolocationTracker {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}
