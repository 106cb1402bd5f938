use std::time::Duration;

use log::warn;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{ApiFetcher, ApiRequest, HttpFetcher, StdResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Fetches provider data while presenting a browser fingerprint, for endpoints
/// that answer naive HTTP clients with a challenge page instead of JSON.
///
/// Before the first real request it issues a priming request against the target
/// origin so that challenge cookies are collected into the cookie store.
pub struct BrowserFetcher {
    inner: HttpFetcher,
    client: reqwest::Client,
    primed: Mutex<bool>,
}

impl BrowserFetcher {
    /// Creates a new `BrowserFetcher` instance.
    pub fn try_new() -> StdResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Accept",
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert("Accept-Language", HeaderValue::from_static("en-US,en;q=0.5"));
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(BROWSER_USER_AGENT)
            .cookie_store(true)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: HttpFetcher::with_client(client.clone()),
            client,
            primed: Mutex::new(false),
        })
    }

    /// The `scheme://host` part of a URL, used as the priming target.
    fn origin_of(url: &str) -> &str {
        match url.find("://") {
            Some(scheme_end) => match url[scheme_end + 3..].find('/') {
                Some(path_start) => &url[..scheme_end + 3 + path_start],
                None => url,
            },
            None => url,
        }
    }

    async fn prime(&self, url: &str) {
        let mut primed = self.primed.lock().await;
        if *primed {
            return;
        }
        let origin = Self::origin_of(url);
        if let Err(e) = self.client.get(origin).send().await {
            warn!("Priming request to {origin} failed: {e}");
        }
        *primed = true;
    }
}

#[async_trait::async_trait]
impl ApiFetcher for BrowserFetcher {
    async fn get(&self, request: &ApiRequest) -> StdResult<Value> {
        self.prime(request.url()).await;
        self.inner.get(request).await
    }

    async fn get_bytes(&self, request: &ApiRequest) -> StdResult<Vec<u8>> {
        self.prime(request.url()).await;
        self.inner.get_bytes(request).await
    }

    async fn post_json(&self, request: &ApiRequest, body: &Value) -> StdResult<Value> {
        self.prime(request.url()).await;
        self.inner.post_json(request, body).await
    }
}
