use std::sync::Arc;

use log::{info, warn};
use serde_json::Value;

use crate::{ApiFetcher, ApiRequest, CachePersister, CacheRecord, ProviderUpdater, StdResult};

/// The production base URL of the Facebook Graph API.
pub const FACEBOOK_GRAPH_API_BASE: &str = "https://graph.facebook.com";

/// Caches group member counts and page likes from the Facebook Graph API.
pub struct FacebookUpdater {
    fetcher: Arc<dyn ApiFetcher>,
    persister: Arc<dyn CachePersister>,
    api_base: String,
    token: String,
    group_id: Option<String>,
    page_id: Option<String>,
}

impl FacebookUpdater {
    /// Creates a new `FacebookUpdater` instance. At least one of `group_id` and
    /// `page_id` is expected to be set; eligibility gating enforces this.
    pub fn new(
        fetcher: Arc<dyn ApiFetcher>,
        persister: Arc<dyn CachePersister>,
        api_base: &str,
        token: &str,
        group_id: Option<String>,
        page_id: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            persister,
            api_base: api_base.to_string(),
            token: token.to_string(),
            group_id,
            page_id,
        }
    }

    /// Fetches one Graph endpoint, strips the `paging` key (it embeds the
    /// access token) and persists the remainder.
    async fn update_endpoint(&self, stem: &'static str, request: ApiRequest) -> StdResult<()> {
        match self.fetcher.get(&request).await {
            Ok(mut data) => {
                if let Value::Object(fields) = &mut data {
                    fields.remove("paging");
                }
                self.persister
                    .persist(&CacheRecord::json("facebook", stem, data))
                    .await?;
                info!("Updated Facebook {stem} data");
            }
            Err(e) => warn!("Failed to fetch Facebook {stem} data, skipping: {e}"),
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl ProviderUpdater for FacebookUpdater {
    fn provider(&self) -> &'static str {
        "facebook"
    }

    async fn update(&self) -> StdResult<()> {
        if let Some(group_id) = &self.group_id {
            let request = ApiRequest::new(&format!("{}/{group_id}", self.api_base))
                .with_query("fields", "member_count,name,description")
                .with_query("access_token", &self.token);
            self.update_endpoint("group", request).await?;
        }
        if let Some(page_id) = &self.page_id {
            let request = ApiRequest::new(&format!("{}/{page_id}/insights", self.api_base))
                .with_query("metric", "page_fans")
                .with_query("access_token", &self.token);
            self.update_endpoint("page", request).await?;
        }

        Ok(())
    }
}
