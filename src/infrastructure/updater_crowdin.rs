use std::{sync::Arc, time::Duration};

use log::{info, warn};
use serde_json::Value;

use crate::{
    ApiFetcher, ApiRequest, CachePersister, CacheRecord, ProviderUpdater, StdResult,
    TranslationLanguageEntry, UpdateError, render_language_graph, retry_until_non_empty,
    sort_language_entries,
};

/// The production base URL of the Crowdin REST API.
pub const CROWDIN_API_BASE: &str = "https://api.crowdin.com/api/v2";

const PROJECT_LIST_LIMIT: u32 = 500;
const PROGRESS_MAX_ATTEMPTS: u32 = 10;
const PROGRESS_BASE_DELAY: Duration = Duration::from_secs(2);

/// Caches translation progress per Crowdin project and renders the
/// per-language completion graph next to each cache record.
pub struct CrowdinUpdater {
    fetcher: Arc<dyn ApiFetcher>,
    persister: Arc<dyn CachePersister>,
    api_base: String,
    token: String,
    progress_base_delay: Duration,
}

impl CrowdinUpdater {
    /// Creates a new `CrowdinUpdater` instance.
    pub fn new(
        fetcher: Arc<dyn ApiFetcher>,
        persister: Arc<dyn CachePersister>,
        api_base: &str,
        token: &str,
    ) -> Self {
        Self {
            fetcher,
            persister,
            api_base: api_base.to_string(),
            token: token.to_string(),
            progress_base_delay: PROGRESS_BASE_DELAY,
        }
    }

    #[cfg(test)]
    fn with_progress_base_delay(mut self, base_delay: Duration) -> Self {
        self.progress_base_delay = base_delay;
        self
    }

    /// Fetches the language progress of one project. The server may answer
    /// with an empty listing while progress is still being computed, so the
    /// call is retried until a non-empty payload is observed.
    async fn fetch_project_progress(&self, project_id: u64) -> StdResult<Value> {
        let url = format!("{}/projects/{project_id}/languages/progress", self.api_base);

        retry_until_non_empty(PROGRESS_MAX_ATTEMPTS, self.progress_base_delay, || async {
            let request = ApiRequest::new(&url)
                .with_bearer_token(&self.token)
                .with_query("limit", &PROJECT_LIST_LIMIT.to_string());
            let data = self.fetcher.get(&request).await?;

            Ok(data.get("data").cloned().unwrap_or(Value::Null))
        })
        .await
    }
}

#[async_trait::async_trait]
impl ProviderUpdater for CrowdinUpdater {
    fn provider(&self) -> &'static str {
        "crowdin"
    }

    async fn update(&self) -> StdResult<()> {
        let list_url = format!("{}/projects", self.api_base);
        let list_request = ApiRequest::new(&list_url)
            .with_bearer_token(&self.token)
            .with_query("limit", &PROJECT_LIST_LIMIT.to_string());
        let data = self.fetcher.get(&list_request).await?;
        let projects = data
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .ok_or(UpdateError::MalformedBody { url: list_url })?;

        for project in &projects {
            let (Some(project_id), Some(project_name)) = (
                project.pointer("/data/id").and_then(Value::as_u64),
                project.pointer("/data/name").and_then(Value::as_str),
            ) else {
                warn!("Project entry without id or name, skipping: {project}");
                continue;
            };

            let progress = self.fetch_project_progress(project_id).await?;
            self.persister
                .persist(&CacheRecord::json("crowdin", project_name, progress.clone()))
                .await?;
            info!("Updated Crowdin data for project {project_name}");

            let mut entries = progress
                .as_array()
                .map(|values| {
                    values
                        .iter()
                        .filter_map(TranslationLanguageEntry::from_progress_value)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            sort_language_entries(&mut entries);
            self.persister
                .persist(&CacheRecord::svg(
                    "crowdin",
                    &format!("{project_name}_graph"),
                    render_language_graph(&entries),
                ))
                .await?;
            info!("Generated Crowdin graph for project {project_name}");
        }

        Ok(())
    }
}
