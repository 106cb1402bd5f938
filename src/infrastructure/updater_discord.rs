use std::sync::Arc;

use log::info;

use crate::{ApiFetcher, ApiRequest, CachePersister, CacheRecord, ProviderUpdater, StdResult};

/// The production base URL of the Discord API.
pub const DISCORD_API_BASE: &str = "https://discordapp.com/api";

/// Caches the member counts of the Discord server behind an invite code.
pub struct DiscordUpdater {
    fetcher: Arc<dyn ApiFetcher>,
    persister: Arc<dyn CachePersister>,
    api_base: String,
    invite: String,
}

impl DiscordUpdater {
    /// Creates a new `DiscordUpdater` instance for the given invite code.
    pub fn new(
        fetcher: Arc<dyn ApiFetcher>,
        persister: Arc<dyn CachePersister>,
        api_base: &str,
        invite: &str,
    ) -> Self {
        Self {
            fetcher,
            persister,
            api_base: api_base.to_string(),
            invite: invite.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ProviderUpdater for DiscordUpdater {
    fn provider(&self) -> &'static str {
        "discord"
    }

    async fn update(&self) -> StdResult<()> {
        let request = ApiRequest::new(&format!("{}/invites/{}", self.api_base, self.invite))
            .with_query("with_counts", "true");
        let data = self.fetcher.get(&request).await?;
        self.persister
            .persist(&CacheRecord::json("discord", "invite", data))
            .await?;
        info!("Updated Discord invite data");

        Ok(())
    }
}
