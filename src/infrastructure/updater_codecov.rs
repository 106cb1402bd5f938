use std::sync::Arc;

use log::{info, warn};
use serde_json::Value;

use crate::{
    ApiFetcher, ApiRequest, CachePersister, CacheRecord, ProviderUpdater, StdResult, UpdateError,
};

/// The production base URL of the Codecov v2 API.
pub const CODECOV_API_BASE: &str = "https://codecov.io/api/v2/github";

const REPOSITORY_LIST_PAGE_SIZE: u32 = 500;
const COVERAGE_TREND_PAGE_SIZE: u32 = 100;

/// Caches per-repository coverage data and coverage trends from the Codecov API.
pub struct CodecovUpdater {
    fetcher: Arc<dyn ApiFetcher>,
    persister: Arc<dyn CachePersister>,
    api_base: String,
    token: String,
    owner: String,
}

impl CodecovUpdater {
    /// Creates a new `CodecovUpdater` instance for the given repository owner.
    pub fn new(
        fetcher: Arc<dyn ApiFetcher>,
        persister: Arc<dyn CachePersister>,
        api_base: &str,
        token: &str,
        owner: &str,
    ) -> Self {
        Self {
            fetcher,
            persister,
            api_base: api_base.to_string(),
            token: token.to_string(),
            owner: owner.to_string(),
        }
    }

    fn owner_url(&self, suffix: &str) -> String {
        format!("{}/{}{suffix}", self.api_base, self.owner)
    }

    fn authenticated(&self, url: &str) -> ApiRequest {
        ApiRequest::new(url)
            .with_header("Accept", "application/json")
            .with_bearer_token(&self.token)
    }

    /// Fetches the weekly coverage trend of one repository, page by page.
    /// A failing page stops the loop with what has been gathered so far.
    async fn fetch_coverage_trend(&self, repository: &str) -> Vec<Value> {
        let url = self.owner_url(&format!("/repos/{repository}/coverage/"));
        let mut trend = Vec::new();
        let mut page_number = 1u32;

        loop {
            let request = self
                .authenticated(&url)
                .with_query("interval", "7d")
                .with_query("page", &page_number.to_string())
                .with_query("page_size", &COVERAGE_TREND_PAGE_SIZE.to_string());
            let page = match self.fetcher.get(&request).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Error fetching coverage trend for {repository}: {e}");
                    break;
                }
            };
            let results = page.get("results").and_then(Value::as_array);
            match results {
                Some(results) if !results.is_empty() => {
                    trend.extend(results.iter().cloned());
                }
                _ => break,
            }
            if page.get("next").is_none_or(Value::is_null) {
                break;
            }
            page_number += 1;
        }

        trend
    }
}

#[async_trait::async_trait]
impl ProviderUpdater for CodecovUpdater {
    fn provider(&self) -> &'static str {
        "codecov"
    }

    async fn update(&self) -> StdResult<()> {
        let list_url = self.owner_url("/repos");
        let list_request = self
            .authenticated(&list_url)
            .with_query("page_size", &REPOSITORY_LIST_PAGE_SIZE.to_string());
        let data = self.fetcher.get(&list_request).await?;
        if !data.get("next").is_none_or(Value::is_null) {
            return Err(UpdateError::TooManyResults {
                provider: self.provider(),
                detail: format!(
                    "more than {REPOSITORY_LIST_PAGE_SIZE} repositories found, pagination of the listing is not implemented"
                ),
            }
            .into());
        }
        let repositories = data
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .ok_or(UpdateError::MalformedBody { url: list_url })?;

        for repository in &repositories {
            let Some(name) = repository.get("name").and_then(Value::as_str) else {
                warn!("Repository entry without a name, skipping: {repository}");
                continue;
            };
            let detail_request = self.authenticated(&self.owner_url(&format!("/repos/{name}")));
            match self.fetcher.get(&detail_request).await {
                Ok(detail) => {
                    self.persister
                        .persist(&CacheRecord::json("codecov", name, detail))
                        .await?;
                    info!("Updated Codecov data for {name}");
                }
                Err(e) => {
                    warn!("Failed to fetch Codecov data for {name}, skipping: {e}");
                    continue;
                }
            }

            let trend = self.fetch_coverage_trend(name).await;
            if !trend.is_empty() {
                self.persister
                    .persist(&CacheRecord::json(
                        "codecov",
                        &format!("{name}_coverage_trend"),
                        Value::Array(trend),
                    ))
                    .await?;
            }
        }

        Ok(())
    }
}
