use crate::StdResult;

/// A trait for updating the local cache of one external provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProviderUpdater: Sync + Send {
    /// The provider name, matching its registry entry and cache directory.
    fn provider(&self) -> &'static str;

    /// Fetches the provider data and persists it to the cache.
    async fn update(&self) -> StdResult<()>;
}
