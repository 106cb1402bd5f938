use std::path::PathBuf;

use crate::{CacheRecord, StdResult};

/// A trait for persisting cache records to a storage medium.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CachePersister: Sync + Send {
    /// Persists the record, returning the path it was written to.
    async fn persist(&self, record: &CacheRecord) -> StdResult<PathBuf>;
}
