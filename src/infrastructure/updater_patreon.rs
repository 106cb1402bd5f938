use std::sync::Arc;

use log::info;

use crate::{
    ApiFetcher, ApiRequest, CachePersister, CacheRecord, ProviderUpdater, StdResult, UpdateError,
};

/// The production base URL of the Patreon API.
pub const PATREON_API_BASE: &str = "https://www.patreon.com/api";

/// Caches the campaign attributes (patron count among them) from the Patreon
/// API. The endpoint blocks naive HTTP clients, so this updater is wired with
/// the browser-profile fetcher.
pub struct PatreonUpdater {
    fetcher: Arc<dyn ApiFetcher>,
    persister: Arc<dyn CachePersister>,
    api_base: String,
    campaign_id: String,
}

impl PatreonUpdater {
    /// Creates a new `PatreonUpdater` instance for the given campaign.
    pub fn new(
        fetcher: Arc<dyn ApiFetcher>,
        persister: Arc<dyn CachePersister>,
        api_base: &str,
        campaign_id: &str,
    ) -> Self {
        Self {
            fetcher,
            persister,
            api_base: api_base.to_string(),
            campaign_id: campaign_id.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ProviderUpdater for PatreonUpdater {
    fn provider(&self) -> &'static str {
        "patreon"
    }

    async fn update(&self) -> StdResult<()> {
        let url = format!("{}/campaigns/{}", self.api_base, self.campaign_id);
        let request = ApiRequest::new(&url);
        let data = self.fetcher.get(&request).await?;
        let attributes = data
            .pointer("/data/attributes")
            .cloned()
            .ok_or(UpdateError::MalformedBody { url })?;
        self.persister
            .persist(&CacheRecord::json("patreon", "campaign", attributes))
            .await?;
        info!("Updated Patreon campaign data");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::path::PathBuf;

    use crate::{CachePayload, MockApiFetcher, MockCachePersister};

    use super::*;

    #[tokio::test]
    async fn persists_campaign_attributes() {
        let fetcher = {
            let mut fetcher = MockApiFetcher::new();
            fetcher
                .expect_get()
                .withf(|request| request.url() == "https://www.patreon.com/api/campaigns/12345")
                .returning(|_| {
                    Ok(json!({
                        "data": {
                            "id": "12345",
                            "attributes": {"patron_count": 42, "name": "Campaign"}
                        }
                    }))
                })
                .times(1);

            fetcher
        };
        let persister = {
            let mut persister = MockCachePersister::new();
            persister
                .expect_persist()
                .withf(|record| {
                    record.path().to_string() == "patreon/campaign"
                        && record.payload()
                            == &CachePayload::Json(
                                json!({"patron_count": 42, "name": "Campaign"}),
                            )
                })
                .returning(|_| Ok(PathBuf::new()))
                .times(1);

            persister
        };
        let updater = PatreonUpdater::new(
            Arc::new(fetcher),
            Arc::new(persister),
            PATREON_API_BASE,
            "12345",
        );

        updater.update().await.unwrap();
    }

    #[tokio::test]
    async fn fails_on_response_without_attributes() {
        let fetcher = {
            let mut fetcher = MockApiFetcher::new();
            fetcher
                .expect_get()
                .returning(|_| Ok(json!({"errors": [{"code": 1}]})))
                .times(1);

            fetcher
        };
        let updater = PatreonUpdater::new(
            Arc::new(fetcher),
            Arc::new(MockCachePersister::new()),
            PATREON_API_BASE,
            "12345",
        );

        let error = updater.update().await.unwrap_err();

        assert!(matches!(
            error.downcast_ref::<UpdateError>(),
            Some(UpdateError::MalformedBody { .. })
        ));
    }
}
