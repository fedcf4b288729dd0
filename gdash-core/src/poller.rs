//! Bounded polling for a freshly generated insight.
//!
//! After a generation request the backend produces the new insight
//! asynchronously; the client repeatedly asks for the latest one until an
//! unseen id shows up or the attempt budget runs out. There is no
//! cancellation: overlapping polls run independently and the last one to
//! observe a new id wins whatever state the caller updates.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::model::WeatherInsight;

/// Source of the single most recent insight. `None` means the backend has
/// none yet.
#[async_trait]
pub trait LatestInsight: Send + Sync {
    async fn latest_insight(&self) -> ApiResult<Option<WeatherInsight>>;
}

/// Poll `source` until it reports an insight whose id differs from
/// `previous_id`, sleeping `interval` between attempts.
///
/// Returns the new insight, or `None` once `max_attempts` fetches have all
/// come back unchanged; the caller leaves whatever it was displaying
/// untouched in that case. No sleep happens after the successful attempt nor
/// after the final failed one. Fetch errors propagate to the caller's
/// boundary like any other backend failure.
pub async fn poll_for_new_insight<S>(
    source: &S,
    previous_id: Option<i64>,
    max_attempts: u32,
    interval: Duration,
) -> ApiResult<Option<WeatherInsight>>
where
    S: LatestInsight + ?Sized,
{
    let attempts = max_attempts.max(1);

    for attempt in 1..=attempts {
        if let Some(latest) = source.latest_insight().await? {
            if Some(latest.id) != previous_id {
                info!(id = latest.id, attempt, "new insight observed");
                return Ok(Some(latest));
            }
        }

        if attempt < attempts {
            debug!(attempt, "latest insight unchanged, retrying");
            tokio::time::sleep(interval).await;
        }
    }

    debug!(attempts, "gave up waiting for a new insight");
    Ok(None)
}
