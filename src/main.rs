use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use log::{debug, info};

use dashboard_updater::{
    AUR_RPC_ENDPOINT, ApiFetcher, AurUpdater, BrowserFetcher, CODECOV_API_BASE, CROWDIN_API_BASE,
    CachePersister, CodecovUpdater, CrowdinUpdater, DISCORD_API_BASE, DiscordUpdater,
    FACEBOOK_GRAPH_API_BASE, FacebookUpdater, FetcherRetrier, GITHUB_API_BASE,
    GITHUB_GRAPHQL_ENDPOINT, GithubUpdater, HttpFetcher, JsonCachePersister, PATREON_API_BASE,
    ParallelRunner, PatreonUpdater, ProviderUpdater, READTHEDOCS_API_BASE, RateLimitedFetcher,
    ReadTheDocsUpdater, StdResult, TASK_REGISTRY, TaskRegistration, eligible_tasks,
};

/// Command line arguments for the dashboard updater
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Directory where the cache files are written
    #[arg(short, long, env = "DASHBOARD_BASE_DIR", default_value = "gh-pages")]
    base_dir: PathBuf,

    /// Abort the whole run on the first updater failure
    #[arg(short, long, env = "DASHBOARD_FAIL_FAST")]
    fail_fast: bool,

    /// Maximum attempts per HTTP request before giving up
    #[arg(short, long, default_value_t = 5)]
    retry_attempts: u32,

    /// Base delay in seconds of the exponential retry backoff
    #[arg(long, default_value_t = 1)]
    retry_base_delay: u64,

    /// Maximum requests per minute against the ReadTheDocs API
    #[arg(long, default_value_t = 50)]
    readthedocs_calls_per_minute: u32,
}

#[tokio::main]
async fn main() -> StdResult<()> {
    env_logger::init();
    info!("Starting dashboard update");
    let args = Args::parse();
    let tasks = eligible_tasks(TASK_REGISTRY, |key| env::var(key).ok());
    debug!("Eligible tasks: {tasks:?}");

    let persister = build_persister(&args);
    let updaters = build_updaters(&args, &tasks, persister)?;
    ParallelRunner::new(args.fail_fast).run(updaters).await?;
    info!("Dashboard update completed");

    Ok(())
}

fn build_persister(args: &Args) -> Arc<dyn CachePersister> {
    let is_debug_run = ["ACTIONS_RUNNER_DEBUG", "ACTIONS_STEP_DEBUG"]
        .iter()
        .any(|key| env::var(key).is_ok_and(|value| !value.is_empty()));

    Arc::new(JsonCachePersister::new(&args.base_dir, is_debug_run))
}

fn build_updaters(
    args: &Args,
    tasks: &[&TaskRegistration],
    persister: Arc<dyn CachePersister>,
) -> StdResult<Vec<Arc<dyn ProviderUpdater>>> {
    let retrying = |fetcher: Arc<dyn ApiFetcher>| -> Arc<dyn ApiFetcher> {
        Arc::new(FetcherRetrier::new(
            fetcher,
            args.retry_attempts,
            Duration::from_secs(args.retry_base_delay),
        ))
    };
    let fetcher = retrying(Arc::new(HttpFetcher::try_new()?));

    let mut updaters: Vec<Arc<dyn ProviderUpdater>> = Vec::new();
    for task in tasks {
        let updater: Arc<dyn ProviderUpdater> = match task.name {
            "aur" => {
                let packages = required_env("DASHBOARD_AUR_REPOS")?
                    .split(',')
                    .map(|package| package.trim().to_string())
                    .filter(|package| !package.is_empty())
                    .collect();
                Arc::new(AurUpdater::new(
                    fetcher.clone(),
                    persister.clone(),
                    AUR_RPC_ENDPOINT,
                    packages,
                ))
            }
            "codecov" => Arc::new(CodecovUpdater::new(
                fetcher.clone(),
                persister.clone(),
                CODECOV_API_BASE,
                &required_env("CODECOV_TOKEN")?,
                &required_env("GITHUB_REPOSITORY_OWNER")?,
            )),
            "crowdin" => Arc::new(CrowdinUpdater::new(
                fetcher.clone(),
                persister.clone(),
                CROWDIN_API_BASE,
                &required_env("CROWDIN_TOKEN")?,
            )),
            "discord" => Arc::new(DiscordUpdater::new(
                fetcher.clone(),
                persister.clone(),
                DISCORD_API_BASE,
                &required_env("DISCORD_INVITE")?,
            )),
            "facebook" => Arc::new(FacebookUpdater::new(
                fetcher.clone(),
                persister.clone(),
                FACEBOOK_GRAPH_API_BASE,
                &required_env("FACEBOOK_TOKEN")?,
                env::var("FACEBOOK_GROUP_ID").ok(),
                env::var("FACEBOOK_PAGE_ID").ok(),
            )),
            "github" => Arc::new(GithubUpdater::new(
                fetcher.clone(),
                persister.clone(),
                GITHUB_API_BASE,
                GITHUB_GRAPHQL_ENDPOINT,
                &required_env("GITHUB_TOKEN")?,
                &required_env("GITHUB_REPOSITORY_OWNER")?,
            )),
            "patreon" => Arc::new(PatreonUpdater::new(
                retrying(Arc::new(BrowserFetcher::try_new()?)),
                persister.clone(),
                PATREON_API_BASE,
                &required_env("PATREON_CAMPAIGN_ID")?,
            )),
            "readthedocs" => Arc::new(ReadTheDocsUpdater::new(
                retrying(Arc::new(RateLimitedFetcher::new(
                    Arc::new(HttpFetcher::try_new()?),
                    args.readthedocs_calls_per_minute,
                ))),
                persister.clone(),
                READTHEDOCS_API_BASE,
                &required_env("READTHEDOCS_TOKEN")?,
            )),
            other => anyhow::bail!("Unknown task registration: {other}"),
        };
        updaters.push(updater);
    }

    Ok(updaters)
}

fn required_env(key: &str) -> StdResult<String> {
    env::var(key).with_context(|| format!("Missing environment variable '{key}'"))
}
