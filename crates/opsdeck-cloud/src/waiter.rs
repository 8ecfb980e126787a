//! Image readiness wait (exponential backoff)
//!
//! Polls the image until it reaches a terminal status or the overall
//! timeout elapses. Sleeping goes through tokio's clock, so tests can run
//! it with paused time.

use crate::error::Result;
use crate::model::{Image, ImageStatus};
use crate::provider::ResourceProvider;
use crate::resolve::{Resolution, resolve_image};
use opsdeck_config::SnapshotSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Polling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Overall deadline
    pub timeout: Duration,
    /// First delay (ms)
    pub initial_delay_ms: u64,
    /// Upper bound for one delay (ms)
    pub max_delay_ms: u64,
    /// Exponential multiplier
    pub multiplier: f64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::from(&SnapshotSettings::default())
    }
}

impl From<&SnapshotSettings> for WaitConfig {
    fn from(settings: &SnapshotSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_secs),
            initial_delay_ms: settings.initial_delay_ms,
            max_delay_ms: settings.max_delay_ms,
            multiplier: settings.multiplier,
        }
    }
}

impl WaitConfig {
    /// Delay before poll number `attempt + 1`
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        (delay as u64).min(self.max_delay_ms)
    }
}

/// How a wait ended
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    /// Image became active
    Ready(Image),
    /// Image reached a failed terminal status (or vanished)
    Failed(Image),
    /// Deadline passed; carries the last observed image, if any
    TimedOut(Option<Image>),
}

/// Wait until `image_id` is terminal or `config.timeout` passes
pub async fn wait_for_image(
    provider: &dyn ResourceProvider,
    image_id: &str,
    config: &WaitConfig,
) -> Result<WaitOutcome> {
    let deadline = Instant::now() + config.timeout;
    let mut last_seen: Option<Image> = None;
    let mut attempt: u32 = 0;

    loop {
        match resolve_image(provider, "wait_for_image", image_id).await? {
            Resolution::Found(image) if image.status == ImageStatus::Active => {
                tracing::debug!("Image {} active after {} polls", image_id, attempt + 1);
                return Ok(WaitOutcome::Ready(image));
            }
            Resolution::Found(image) if image.status.is_terminal() => {
                tracing::warn!("Image {} ended in {}", image_id, image.status);
                return Ok(WaitOutcome::Failed(image));
            }
            Resolution::Found(image) => {
                tracing::debug!("Image {} is {} (poll {})", image_id, image.status, attempt + 1);
                last_seen = Some(image);
            }
            // Absent and NotFound errors both mean the image was deleted
            Resolution::NotFound(_) => {
                tracing::warn!("Image {} disappeared while waiting", image_id);
                let mut image = last_seen.unwrap_or_else(|| Image {
                    id: image_id.to_string(),
                    name: String::new(),
                    status: ImageStatus::Deleted,
                });
                image.status = ImageStatus::Deleted;
                return Ok(WaitOutcome::Failed(image));
            }
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::warn!("Gave up waiting for image {} after {:?}", image_id, config.timeout);
            return Ok(WaitOutcome::TimedOut(last_seen));
        }

        let delay = Duration::from_millis(config.delay_for_attempt(attempt));
        sleep(delay.min(deadline - now)).await;
        attempt = attempt.saturating_add(1);
    }
}
