use serde_json::Value;

use crate::{ApiRequest, StdResult};

/// A trait for issuing HTTP calls against external provider APIs.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ApiFetcher: Sync + Send {
    /// Issues a GET request and decodes the response body as JSON.
    async fn get(&self, request: &ApiRequest) -> StdResult<Value>;

    /// Issues a GET request and returns the raw response bytes.
    async fn get_bytes(&self, request: &ApiRequest) -> StdResult<Vec<u8>>;

    /// Issues a POST request with a JSON body and decodes the response body as JSON.
    async fn post_json(&self, request: &ApiRequest, body: &Value) -> StdResult<Value>;
}
