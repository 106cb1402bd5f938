use std::{sync::Arc, time::Duration};

use log::{info, warn};
use serde_json::{Value, json};

use crate::{
    ApiFetcher, ApiRequest, CachePersister, CacheRecord, ProviderUpdater, StdResult, UpdateError,
    fetch_numbered_pages, retry_until_non_empty,
};

/// The production base URL of the GitHub REST API.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// The GraphQL production endpoint for GitHub.
pub const GITHUB_GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

const REPOSITORY_LIST_PAGE_SIZE: u32 = 100;
const STATS_MAX_ATTEMPTS: u32 = 5;
const STATS_BASE_DELAY: Duration = Duration::from_secs(2);

/// Caches the repository listing, per-repository languages, commit activity
/// and social-preview images of one GitHub owner.
pub struct GithubUpdater {
    fetcher: Arc<dyn ApiFetcher>,
    persister: Arc<dyn CachePersister>,
    api_base: String,
    graphql_endpoint: String,
    token: String,
    owner: String,
    stats_base_delay: Duration,
}

impl GithubUpdater {
    /// Creates a new `GithubUpdater` instance for the given repository owner.
    pub fn new(
        fetcher: Arc<dyn ApiFetcher>,
        persister: Arc<dyn CachePersister>,
        api_base: &str,
        graphql_endpoint: &str,
        token: &str,
        owner: &str,
    ) -> Self {
        Self {
            fetcher,
            persister,
            api_base: api_base.to_string(),
            graphql_endpoint: graphql_endpoint.to_string(),
            token: token.to_string(),
            owner: owner.to_string(),
            stats_base_delay: STATS_BASE_DELAY,
        }
    }

    #[cfg(test)]
    fn with_stats_base_delay(mut self, base_delay: Duration) -> Self {
        self.stats_base_delay = base_delay;
        self
    }

    fn repository_request(&self, name: &str, suffix: &str) -> ApiRequest {
        ApiRequest::new(&format!(
            "{}/repos/{}/{name}{suffix}",
            self.api_base, self.owner
        ))
        .with_token(&self.token)
    }

    async fn update_languages(&self, name: &str) -> StdResult<()> {
        match self.fetcher.get(&self.repository_request(name, "/languages")).await {
            Ok(languages) => {
                self.persister
                    .persist(&CacheRecord::json_in("github", "languages", name, languages))
                    .await?;
            }
            Err(e) => warn!("Failed to fetch languages for {name}, skipping: {e}"),
        }

        Ok(())
    }

    /// Caches the last year of weekly commit activity. The statistics endpoint
    /// answers 202 with an empty body while the data is computed server-side,
    /// so the call is retried until a non-empty payload is observed.
    async fn update_commit_activity(&self, name: &str) -> StdResult<()> {
        let request = self.repository_request(name, "/stats/commit_activity");
        let activity = retry_until_non_empty(STATS_MAX_ATTEMPTS, self.stats_base_delay, || {
            self.fetcher.get(&request)
        })
        .await;
        match activity {
            Ok(activity) => {
                // an exhausted retry yields null for a never-computed repository
                let weeks = if activity.is_null() { json!([]) } else { activity };
                self.persister
                    .persist(&CacheRecord::json_in("github", "commitActivity", name, weeks))
                    .await?;
            }
            Err(e) => warn!("Failed to fetch commit activity for {name}, skipping: {e}"),
        }

        Ok(())
    }

    /// Caches the social-preview image of one repository, resolved through the
    /// GraphQL API. An answer without the expected repository shape means the
    /// token was rejected, which is fatal for the whole run.
    async fn update_open_graph_image(&self, name: &str) -> StdResult<()> {
        let query = format!(
            r#"{{ repository(owner: "{}", name: "{name}") {{ openGraphImageUrl }} }}"#,
            self.owner
        );
        let request = ApiRequest::new(&self.graphql_endpoint).with_token(&self.token);
        let response = self
            .fetcher
            .post_json(&request, &json!({"query": query}))
            .await
            .map_err(|e| match e.downcast_ref::<UpdateError>() {
                Some(UpdateError::Http { status: 401 | 403, .. }) => UpdateError::Auth {
                    provider: "github",
                    detail: format!("GraphQL endpoint rejected the token: {e}"),
                }
                .into(),
                _ => e,
            })?;
        let image_url = response
            .pointer("/data/repository/openGraphImageUrl")
            .and_then(Value::as_str)
            .ok_or_else(|| UpdateError::Auth {
                provider: "github",
                detail: format!("GITHUB_TOKEN is invalid, unexpected response shape: {response}"),
            })?;

        // default images are owner avatars, not worth caching
        if image_url.contains("avatars") {
            return Ok(());
        }
        match self.fetcher.get_bytes(&ApiRequest::new(image_url)).await {
            Ok(bytes) => {
                self.persister
                    .persist(&CacheRecord::png_in("github", "openGraphImages", name, bytes))
                    .await?;
            }
            Err(e) => warn!("Failed to fetch social-preview image for {name}, skipping: {e}"),
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl ProviderUpdater for GithubUpdater {
    fn provider(&self) -> &'static str {
        "github"
    }

    async fn update(&self) -> StdResult<()> {
        let list_request = ApiRequest::new(&format!("{}/users/{}/repos", self.api_base, self.owner))
            .with_token(&self.token);
        let repositories =
            fetch_numbered_pages(&*self.fetcher, &list_request, REPOSITORY_LIST_PAGE_SIZE).await?;
        self.persister
            .persist(&CacheRecord::json(
                "github",
                "repos",
                Value::Array(repositories.clone()),
            ))
            .await?;
        info!("Updated GitHub repository listing for {}", self.owner);

        for repository in &repositories {
            if repository.get("archived").and_then(Value::as_bool) == Some(true) {
                continue;
            }
            let Some(name) = repository.get("name").and_then(Value::as_str) else {
                warn!("Repository entry without a name, skipping: {repository}");
                continue;
            };

            self.update_languages(name).await?;
            self.update_commit_activity(name).await?;
            self.update_open_graph_image(name).await?;
            info!("Updated GitHub data for {name}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::{CachePayload, MockApiFetcher, MockCachePersister};

    use super::*;

    fn repository(name: &str, archived: bool) -> Value {
        json!({"name": name, "archived": archived, "stargazers_count": 100})
    }

    fn graphql_response(image_url: &str) -> Value {
        json!({"data": {"repository": {"openGraphImageUrl": image_url}}})
    }

    fn updater(fetcher: MockApiFetcher, persister: MockCachePersister) -> GithubUpdater {
        GithubUpdater::new(
            Arc::new(fetcher),
            Arc::new(persister),
            "https://github.example.com",
            "https://github.example.com/graphql",
            "token",
            "org-1",
        )
        .with_stats_base_delay(Duration::from_millis(1))
    }

    fn expect_repository_listing(fetcher: &mut MockApiFetcher, repositories: Vec<Value>) {
        fetcher
            .expect_get()
            .withf(|request| request.url().ends_with("/users/org-1/repos"))
            .returning(move |_| Ok(Value::Array(repositories.clone())))
            .times(1);
    }

    #[tokio::test]
    async fn persists_listing_languages_activity_and_image() {
        let fetcher = {
            let mut fetcher = MockApiFetcher::new();
            expect_repository_listing(&mut fetcher, vec![repository("repository-1", false)]);
            fetcher
                .expect_get()
                .withf(|request| request.url().ends_with("/repos/org-1/repository-1/languages"))
                .returning(|_| Ok(json!({"Rust": 12345})))
                .times(1);
            fetcher
                .expect_get()
                .withf(|request| {
                    request
                        .url()
                        .ends_with("/repos/org-1/repository-1/stats/commit_activity")
                })
                .returning(|_| Ok(json!([{"week": 1, "total": 3}])))
                .times(1);
            fetcher
                .expect_post_json()
                .withf(|request, body| {
                    request.url().ends_with("/graphql")
                        && body["query"]
                            .as_str()
                            .is_some_and(|query| query.contains(r#"name: "repository-1""#))
                })
                .returning(|_, _| {
                    Ok(graphql_response("https://repository-images.example.com/1.png"))
                })
                .times(1);
            fetcher
                .expect_get_bytes()
                .withf(|request| request.url() == "https://repository-images.example.com/1.png")
                .returning(|_| Ok(vec![0x89, 0x50]))
                .times(1);

            fetcher
        };
        let persister = {
            let mut persister = MockCachePersister::new();
            persister
                .expect_persist()
                .withf(|record| record.path().to_string() == "github/repos")
                .returning(|_| Ok(PathBuf::new()))
                .times(1);
            persister
                .expect_persist()
                .withf(|record| record.path().to_string() == "github/languages/repository-1")
                .returning(|_| Ok(PathBuf::new()))
                .times(1);
            persister
                .expect_persist()
                .withf(|record| record.path().to_string() == "github/commitActivity/repository-1")
                .returning(|_| Ok(PathBuf::new()))
                .times(1);
            persister
                .expect_persist()
                .withf(|record| {
                    record.path().to_string() == "github/openGraphImages/repository-1"
                        && record.payload() == &CachePayload::Png(vec![0x89, 0x50])
                })
                .returning(|_| Ok(PathBuf::new()))
                .times(1);

            persister
        };

        updater(fetcher, persister).update().await.unwrap();
    }

    #[tokio::test]
    async fn archived_repositories_are_skipped() {
        let fetcher = {
            let mut fetcher = MockApiFetcher::new();
            expect_repository_listing(&mut fetcher, vec![repository("repository-1", true)]);

            fetcher
        };
        let persister = {
            let mut persister = MockCachePersister::new();
            persister
                .expect_persist()
                .withf(|record| record.path().to_string() == "github/repos")
                .returning(|_| Ok(PathBuf::new()))
                .times(1);

            persister
        };

        updater(fetcher, persister).update().await.unwrap();
    }

    #[tokio::test]
    async fn commit_activity_is_retried_while_the_server_computes() {
        let fetcher = {
            let mut fetcher = MockApiFetcher::new();
            expect_repository_listing(&mut fetcher, vec![repository("repository-1", false)]);
            fetcher
                .expect_get()
                .withf(|request| request.url().ends_with("/languages"))
                .returning(|_| Ok(json!({})))
                .times(1);
            fetcher
                .expect_get()
                .withf(|request| request.url().ends_with("/stats/commit_activity"))
                .returning(|_| Ok(Value::Null))
                .times(2);
            fetcher
                .expect_get()
                .withf(|request| request.url().ends_with("/stats/commit_activity"))
                .returning(|_| Ok(json!([{"week": 1, "total": 3}])))
                .times(1);
            fetcher
                .expect_post_json()
                .returning(|_, _| {
                    Ok(graphql_response("https://avatars.example.com/u/1"))
                })
                .times(1);

            fetcher
        };
        let persister = {
            let mut persister = MockCachePersister::new();
            persister
                .expect_persist()
                .returning(|_| Ok(PathBuf::new()))
                .times(3);

            persister
        };

        updater(fetcher, persister).update().await.unwrap();
    }

    #[tokio::test]
    async fn avatar_image_urls_are_not_cached() {
        let fetcher = {
            let mut fetcher = MockApiFetcher::new();
            expect_repository_listing(&mut fetcher, vec![repository("repository-1", false)]);
            fetcher
                .expect_get()
                .withf(|request| request.url().ends_with("/languages"))
                .returning(|_| Ok(json!({})))
                .times(1);
            fetcher
                .expect_get()
                .withf(|request| request.url().ends_with("/stats/commit_activity"))
                .returning(|_| Ok(json!([{"week": 1}])))
                .times(1);
            fetcher
                .expect_post_json()
                .returning(|_, _| {
                    Ok(graphql_response("https://avatars.example.com/u/1"))
                })
                .times(1);

            fetcher
        };
        let persister = {
            let mut persister = MockCachePersister::new();
            persister
                .expect_persist()
                .returning(|_| Ok(PathBuf::new()))
                .times(3);

            persister
        };

        updater(fetcher, persister).update().await.unwrap();
    }

    #[tokio::test]
    async fn unexpected_graphql_shape_is_an_authentication_failure() {
        let fetcher = {
            let mut fetcher = MockApiFetcher::new();
            expect_repository_listing(&mut fetcher, vec![repository("repository-1", false)]);
            fetcher
                .expect_get()
                .withf(|request| request.url().ends_with("/languages"))
                .returning(|_| Ok(json!({})))
                .times(1);
            fetcher
                .expect_get()
                .withf(|request| request.url().ends_with("/stats/commit_activity"))
                .returning(|_| Ok(json!([{"week": 1}])))
                .times(1);
            fetcher
                .expect_post_json()
                .returning(|_, _| Ok(json!({"message": "Bad credentials"})))
                .times(1);

            fetcher
        };
        let persister = {
            let mut persister = MockCachePersister::new();
            persister
                .expect_persist()
                .returning(|_| Ok(PathBuf::new()))
                .times(3);

            persister
        };

        let error = updater(fetcher, persister).update().await.unwrap_err();

        assert!(matches!(
            error.downcast_ref::<UpdateError>(),
            Some(UpdateError::Auth { .. })
        ));
    }
}
