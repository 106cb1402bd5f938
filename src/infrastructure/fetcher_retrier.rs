use std::{sync::Arc, time::Duration};

use log::warn;
use serde_json::Value;
use tokio::time::sleep;

use crate::{ApiFetcher, ApiRequest, StdResult, UpdateError};

/// A decorator that retries an `ApiFetcher` a bounded number of times on
/// transient failures, with exponential backoff.
pub struct FetcherRetrier {
    /// The fetcher to be retried.
    fetcher: Arc<dyn ApiFetcher>,

    /// The maximum number of attempts for a request.
    max_attempts: u32,

    /// The base delay for exponential backoff.
    base_delay: Duration,
}

impl FetcherRetrier {
    /// Creates a new `FetcherRetrier` instance with the given maximum number of attempts.
    pub fn new(fetcher: Arc<dyn ApiFetcher>, max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            fetcher,
            max_attempts,
            base_delay,
        }
    }

    fn calculate_exponential_backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * (2u32.pow(attempt.min(31)))
    }

    /// Whether the error is worth retrying: transport failures and server-side
    /// statuses. Client errors (auth, not-found) and malformed bodies are
    /// returned to the caller immediately.
    fn is_transient(error: &anyhow::Error) -> bool {
        match error.downcast_ref::<UpdateError>() {
            Some(UpdateError::Http { status, .. }) => *status >= 500 || *status == 429,
            Some(_) => false,
            None => error.downcast_ref::<reqwest::Error>().is_some(),
        }
    }

    async fn retry<T, F, Fut>(&self, request: &ApiRequest, mut call: F) -> StdResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StdResult<T>>,
    {
        let mut attempts = 0;

        loop {
            match call().await {
                Ok(res) => return Ok(res),
                Err(e) => {
                    attempts += 1;
                    if !Self::is_transient(&e) || attempts >= self.max_attempts {
                        return Err(e);
                    }
                    warn!("Fetch attempt #{attempts} failed for {request}: {e}");
                    sleep(self.calculate_exponential_backoff_delay(attempts)).await;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl ApiFetcher for FetcherRetrier {
    async fn get(&self, request: &ApiRequest) -> StdResult<Value> {
        self.retry(request, || self.fetcher.get(request)).await
    }

    async fn get_bytes(&self, request: &ApiRequest) -> StdResult<Vec<u8>> {
        self.retry(request, || self.fetcher.get_bytes(request)).await
    }

    async fn post_json(&self, request: &ApiRequest, body: &Value) -> StdResult<Value> {
        self.retry(request, || self.fetcher.post_json(request, body))
            .await
    }
}
