use std::sync::Arc;

use log::{info, warn};
use serde_json::Value;

use crate::{
    ApiFetcher, ApiRequest, CachePersister, CacheRecord, ProviderUpdater, StdResult,
    follow_next_pages,
};

/// The production base URL of the ReadTheDocs site.
pub const READTHEDOCS_API_BASE: &str = "https://readthedocs.org";

/// Project links that are not cached: builds carry too much data, the others
/// are not needed by the dashboard.
const SKIPPED_PROJECT_LINKS: &[&str] = &["builds", "environmentvariables", "notifications"];

/// Caches the project listing and per-project resources from the ReadTheDocs
/// v3 API. Wired with the rate-limited fetcher; the API throttles aggressively.
pub struct ReadTheDocsUpdater {
    fetcher: Arc<dyn ApiFetcher>,
    persister: Arc<dyn CachePersister>,
    api_base: String,
    token: String,
}

impl ReadTheDocsUpdater {
    /// Creates a new `ReadTheDocsUpdater` instance.
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
        }
    }

    fn authenticated(&self, url: &str) -> ApiRequest {
        ApiRequest::new(url)
            .with_token(&self.token)
            .with_header("Accept", "application/json")
    }

    /// The repository slug of a project: the basename of its repository URL,
    /// without a trailing `.git`.
    fn repository_slug(project: &Value) -> Option<String> {
        let url = project.pointer("/repository/url")?.as_str()?;
        let basename = url.rsplit('/').next()?;

        Some(basename.strip_suffix(".git").unwrap_or(basename).to_string())
    }
}

#[async_trait::async_trait]
impl ProviderUpdater for ReadTheDocsUpdater {
    fn provider(&self) -> &'static str {
        "readthedocs"
    }

    async fn update(&self) -> StdResult<()> {
        let projects_url = format!("{}/api/v3/projects/", self.api_base);
        let projects =
            follow_next_pages(&*self.fetcher, self.authenticated(&projects_url)).await?;
        if projects.is_empty() {
            warn!("No ReadTheDocs projects found");
            return Ok(());
        }
        self.persister
            .persist(&CacheRecord::json(
                "readthedocs",
                "projects",
                Value::Array(projects.clone()),
            ))
            .await?;
        info!("Updated ReadTheDocs project listing");

        for project in &projects {
            let Some(slug) = Self::repository_slug(project) else {
                warn!("Project entry without a repository URL, skipping: {project}");
                continue;
            };
            let Some(links) = project.get("_links").and_then(Value::as_object) else {
                continue;
            };
            for (link_name, link_url) in links {
                if SKIPPED_PROJECT_LINKS.contains(&link_name.as_str()) {
                    continue;
                }
                let Some(link_url) = link_url.as_str() else {
                    continue;
                };
                let results =
                    follow_next_pages(&*self.fetcher, self.authenticated(link_url)).await?;
                if !results.is_empty() {
                    self.persister
                        .persist(&CacheRecord::json_in(
                            "readthedocs",
                            link_name,
                            &slug,
                            Value::Array(results),
                        ))
                        .await?;
                    info!("Updated ReadTheDocs {link_name} data for {slug}");
                }
            }
        }

        Ok(())
    }
}
