mod fetcher;
mod persister;
mod updater;

pub use fetcher::*;
pub use persister::*;
pub use updater::*;
