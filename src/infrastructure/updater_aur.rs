use std::sync::Arc;

use log::{info, warn};

use crate::{ApiFetcher, ApiRequest, CachePersister, CacheRecord, ProviderUpdater, StdResult};

/// The production endpoint of the AUR RPC API.
pub const AUR_RPC_ENDPOINT: &str = "https://aur.archlinux.org/rpc";

/// Caches package information from the AUR RPC API, one record per package.
pub struct AurUpdater {
    fetcher: Arc<dyn ApiFetcher>,
    persister: Arc<dyn CachePersister>,
    endpoint: String,
    packages: Vec<String>,
}

impl AurUpdater {
    /// Creates a new `AurUpdater` instance for the given package list.
    pub fn new(
        fetcher: Arc<dyn ApiFetcher>,
        persister: Arc<dyn CachePersister>,
        endpoint: &str,
        packages: Vec<String>,
    ) -> Self {
        Self {
            fetcher,
            persister,
            endpoint: endpoint.to_string(),
            packages,
        }
    }
}

#[async_trait::async_trait]
impl ProviderUpdater for AurUpdater {
    fn provider(&self) -> &'static str {
        "aur"
    }

    async fn update(&self) -> StdResult<()> {
        for package in &self.packages {
            let request = ApiRequest::new(&self.endpoint)
                .with_query("v", "5")
                .with_query("type", "info")
                .with_query("arg", package);
            match self.fetcher.get(&request).await {
                Ok(data) => {
                    self.persister
                        .persist(&CacheRecord::json("aur", package, data))
                        .await?;
                    info!("Updated AUR data for {package}");
                }
                Err(e) => warn!("Failed to fetch AUR data for {package}, skipping: {e}"),
            }
        }

        Ok(())
    }
}
