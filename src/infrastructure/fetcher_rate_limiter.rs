use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use serde_json::Value;
use tokio::{sync::Mutex, time::sleep};

use crate::{ApiFetcher, ApiRequest, StdResult};

/// A decorator that enforces a maximum call rate on an `ApiFetcher` by delaying
/// each call until the minimum inter-call interval has elapsed.
///
/// The "time of last dispatch" is shared by all callers holding the same
/// instance; the lock is held across the sleep and the timestamp update so that
/// concurrent callers cannot burst past the ceiling together.
pub struct RateLimitedFetcher {
    /// The fetcher to be rate limited.
    fetcher: Arc<dyn ApiFetcher>,

    /// The minimum interval between two dispatched calls.
    min_interval: Duration,

    /// The instant of the last dispatched call.
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimitedFetcher {
    /// Creates a new `RateLimitedFetcher` instance with the given ceiling in calls per minute.
    pub fn new(fetcher: Arc<dyn ApiFetcher>, calls_per_minute: u32) -> Self {
        Self {
            fetcher,
            min_interval: Duration::from_secs_f64(60.0 / f64::from(calls_per_minute.max(1))),
            last_dispatch: Mutex::new(None),
        }
    }

    async fn wait_for_turn(&self) {
        let mut last_dispatch = self.last_dispatch.lock().await;
        if let Some(previous) = *last_dispatch {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last_dispatch = Some(Instant::now());
    }
}

#[async_trait::async_trait]
impl ApiFetcher for RateLimitedFetcher {
    async fn get(&self, request: &ApiRequest) -> StdResult<Value> {
        self.wait_for_turn().await;
        self.fetcher.get(request).await
    }

    async fn get_bytes(&self, request: &ApiRequest) -> StdResult<Vec<u8>> {
        self.wait_for_turn().await;
        self.fetcher.get_bytes(request).await
    }

    async fn post_json(&self, request: &ApiRequest, body: &Value) -> StdResult<Value> {
        self.wait_for_turn().await;
        self.fetcher.post_json(request, body).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use crate::MockApiFetcher;

    use super::*;

    fn fetcher_answering(times: usize) -> MockApiFetcher {
        let mut fetcher = MockApiFetcher::new();
        fetcher
            .expect_get()
            .returning(|_| Ok(json!({})))
            .times(times);

        fetcher
    }

    #[tokio::test]
    async fn sequential_calls_respect_minimum_interval() {
        // 600 calls per minute, i.e. one call every 100ms
        let rate_limited = RateLimitedFetcher::new(Arc::new(fetcher_answering(3)), 600);
        let started_at = Utc::now();

        for _ in 0..3 {
            rate_limited.get(&ApiRequest::dummy()).await.unwrap();
        }

        assert!(started_at + chrono::Duration::milliseconds(200) <= Utc::now());
    }

    #[tokio::test]
    async fn concurrent_callers_cannot_burst_past_the_ceiling() {
        let rate_limited = Arc::new(RateLimitedFetcher::new(Arc::new(fetcher_answering(3)), 600));
        let started_at = Utc::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let rate_limited_clone = Arc::clone(&rate_limited);
            handles.push(tokio::spawn(async move {
                rate_limited_clone.get(&ApiRequest::dummy()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(started_at + chrono::Duration::milliseconds(200) <= Utc::now());
    }

    #[tokio::test]
    async fn first_call_is_not_delayed() {
        let rate_limited = RateLimitedFetcher::new(Arc::new(fetcher_answering(1)), 1);
        let started_at = Utc::now();

        rate_limited.get(&ApiRequest::dummy()).await.unwrap();

        assert!(started_at + chrono::Duration::seconds(1) > Utc::now());
    }
}
