use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use serde_json::Value;

/// The destination of a cache record, relative to the cache base directory.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CachePath {
    /// The provider directory (e.g. `github`, `codecov`).
    provider: &'static str,

    /// An optional sub-directory below the provider directory.
    sub_directory: Option<String>,

    /// The file stem, without extension.
    stem: String,
}

impl CachePath {
    /// Creates a new `CachePath` directly below the provider directory.
    ///
    /// Spaces in the stem are replaced with underscores so that project display
    /// names produce stable file names.
    pub fn new(provider: &'static str, stem: &str) -> Self {
        Self {
            provider,
            sub_directory: None,
            stem: stem.replace(' ', "_"),
        }
    }

    /// Creates a new `CachePath` below a sub-directory of the provider directory.
    pub fn new_in(provider: &'static str, sub_directory: &str, stem: &str) -> Self {
        Self {
            sub_directory: Some(sub_directory.to_string()),
            ..Self::new(provider, stem)
        }
    }

    /// Resolves the full path for this record below `base_dir`, with the given extension.
    pub fn resolve(&self, base_dir: &Path, extension: &str) -> PathBuf {
        let mut path = base_dir.join(self.provider);
        if let Some(sub_directory) = &self.sub_directory {
            path = path.join(sub_directory);
        }
        path.join(format!("{}.{extension}", self.stem))
    }
}

impl Display for CachePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.sub_directory {
            Some(sub_directory) => {
                write!(f, "{}/{}/{}", self.provider, sub_directory, self.stem)
            }
            None => write!(f, "{}/{}", self.provider, self.stem),
        }
    }
}

/// The payload of a cache record. The file extension is implied by the variant.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum CachePayload {
    /// A JSON document, written as `.json`.
    Json(Value),

    /// A standalone SVG document, written as `.svg`.
    Svg(String),

    /// Raw image bytes, written as `.png`.
    Png(Vec<u8>),
}

impl CachePayload {
    /// The file extension for this payload kind.
    pub fn extension(&self) -> &'static str {
        match self {
            CachePayload::Json(_) => "json",
            CachePayload::Svg(_) => "svg",
            CachePayload::Png(_) => "png",
        }
    }
}

/// A serializable value bound to a destination path in the cache.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CacheRecord {
    /// The destination path.
    pub(crate) path: CachePath,

    /// The payload to write.
    pub(crate) payload: CachePayload,
}

impl CacheRecord {
    /// Creates a JSON record directly below the provider directory.
    pub fn json(provider: &'static str, stem: &str, value: Value) -> Self {
        Self {
            path: CachePath::new(provider, stem),
            payload: CachePayload::Json(value),
        }
    }

    /// Creates a JSON record below a sub-directory of the provider directory.
    pub fn json_in(provider: &'static str, sub_directory: &str, stem: &str, value: Value) -> Self {
        Self {
            path: CachePath::new_in(provider, sub_directory, stem),
            payload: CachePayload::Json(value),
        }
    }

    /// Creates an SVG record directly below the provider directory.
    pub fn svg(provider: &'static str, stem: &str, document: String) -> Self {
        Self {
            path: CachePath::new(provider, stem),
            payload: CachePayload::Svg(document),
        }
    }

    /// Creates a PNG record below a sub-directory of the provider directory.
    pub fn png_in(provider: &'static str, sub_directory: &str, stem: &str, bytes: Vec<u8>) -> Self {
        Self {
            path: CachePath::new_in(provider, sub_directory, stem),
            payload: CachePayload::Png(bytes),
        }
    }

    /// Retrieves the destination path.
    pub fn path(&self) -> &CachePath {
        &self.path
    }

    /// Retrieves the payload.
    pub fn payload(&self) -> &CachePayload {
        &self.payload
    }

    /// Resolves the full destination path below `base_dir`.
    pub fn resolve(&self, base_dir: &Path) -> PathBuf {
        self.path.resolve(base_dir, self.payload.extension())
    }
}

impl Display for CacheRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CacheRecord: {}.{}", self.path, self.payload.extension())
    }
}
