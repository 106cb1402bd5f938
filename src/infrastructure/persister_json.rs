use std::path::{Path, PathBuf};

use anyhow::Context;
use log::debug;

use crate::{CachePayload, CachePersister, CacheRecord, StdResult};

/// A persister that writes cache records below a base directory, one file per
/// record, overwriting any prior version.
pub struct JsonCachePersister {
    /// The base directory of the cache.
    base_dir: PathBuf,

    /// Whether JSON payloads are pretty-printed instead of compact.
    pretty: bool,
}

impl JsonCachePersister {
    /// Creates a new `JsonCachePersister` instance.
    pub fn new(base_dir: &Path, pretty: bool) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            pretty,
        }
    }

    fn encode(&self, record: &CacheRecord) -> StdResult<Vec<u8>> {
        let bytes = match record.payload() {
            CachePayload::Json(value) => {
                if self.pretty {
                    serde_json::to_vec_pretty(value)?
                } else {
                    serde_json::to_vec(value)?
                }
            }
            CachePayload::Svg(document) => document.as_bytes().to_vec(),
            CachePayload::Png(bytes) => bytes.clone(),
        };

        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl CachePersister for JsonCachePersister {
    async fn persist(&self, record: &CacheRecord) -> StdResult<PathBuf> {
        let path = record.resolve(&self.base_dir);
        debug!("Writing {record} at {}", path.display());
        let directory = path
            .parent()
            .with_context(|| format!("No parent directory for {}", path.display()))?;
        tokio::fs::create_dir_all(directory)
            .await
            .with_context(|| format!("Failed to create directory {}", directory.display()))?;
        tokio::fs::write(&path, self.encode(record)?)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }
}
