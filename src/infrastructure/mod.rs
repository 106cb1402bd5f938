mod fetcher_browser;
mod fetcher_http;
mod fetcher_paging;
mod fetcher_rate_limiter;
mod fetcher_retrier;
mod graph_svg;
mod persister_json;
mod runner_parallel;
mod updater_aur;
mod updater_codecov;
mod updater_crowdin;
mod updater_discord;
mod updater_facebook;
mod updater_github;
mod updater_patreon;
mod updater_readthedocs;

pub use fetcher_browser::*;
pub use fetcher_http::*;
pub use fetcher_paging::*;
pub use fetcher_rate_limiter::*;
pub use fetcher_retrier::*;
pub use graph_svg::*;
pub use persister_json::*;
pub use runner_parallel::*;
pub use updater_aur::*;
pub use updater_codecov::*;
pub use updater_crowdin::*;
pub use updater_discord::*;
pub use updater_facebook::*;
pub use updater_github::*;
pub use updater_patreon::*;
pub use updater_readthedocs::*;
