use thiserror::Error;

/// The standard result type used throughout the application.
pub type StdResult<T> = Result<T, anyhow::Error>;

/// Errors raised while updating provider caches.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The provider rejected or silently ignored the configured credentials.
    ///
    /// Always fatal: the runner re-raises it even when fail-fast mode is off.
    #[error("Authentication failed for {provider}: {detail}")]
    Auth {
        /// The provider that rejected the credentials.
        provider: &'static str,
        /// Details about the rejection.
        detail: String,
    },

    /// The provider returned more data than the adapter is prepared to page through.
    #[error("Too many results from {provider}: {detail}")]
    TooManyResults {
        /// The provider that returned too much data.
        provider: &'static str,
        /// Details about the guard that tripped.
        detail: String,
    },

    /// The provider answered with a non-success HTTP status.
    #[error("HTTP status {status} from {url}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// The requested URL.
        url: String,
    },

    /// The provider answered with a body that could not be decoded as JSON.
    #[error("Malformed JSON body from {url}")]
    MalformedBody {
        /// The requested URL.
        url: String,
    },
}

impl UpdateError {
    /// Whether this error must terminate the whole run, regardless of fail-fast mode.
    pub fn is_fatal(&self) -> bool {
        matches!(self, UpdateError::Auth { .. })
    }
}
