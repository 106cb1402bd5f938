use std::time::Duration;

use serde_json::Value;

use crate::{ApiFetcher, ApiRequest, StdResult, UpdateError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("dashboard-updater/", env!("CARGO_PKG_VERSION"));

/// Fetches provider data over plain HTTP.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a new `HttpFetcher` instance.
    pub fn try_new() -> StdResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    /// Creates a new `HttpFetcher` instance from a pre-built client.
    pub(super) fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn apply_request(
        &self,
        builder: reqwest::RequestBuilder,
        request: &ApiRequest,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder.query(request.query());
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }

        builder
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        request: &ApiRequest,
    ) -> StdResult<reqwest::Response> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::Http {
                status: status.as_u16(),
                url: request.url().to_string(),
            }
            .into());
        }

        Ok(response)
    }

    async fn decode_json(response: reqwest::Response, request: &ApiRequest) -> StdResult<Value> {
        let body = response.text().await?;
        // Some endpoints (GitHub statistics) answer 202 with an empty body
        // while the data is still being computed server-side.
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|_| {
            UpdateError::MalformedBody {
                url: request.url().to_string(),
            }
            .into()
        })
    }
}

#[async_trait::async_trait]
impl ApiFetcher for HttpFetcher {
    async fn get(&self, request: &ApiRequest) -> StdResult<Value> {
        let builder = self.apply_request(self.client.get(request.url()), request);
        let response = self.send(builder, request).await?;

        Self::decode_json(response, request).await
    }

    async fn get_bytes(&self, request: &ApiRequest) -> StdResult<Vec<u8>> {
        let builder = self.apply_request(self.client.get(request.url()), request);
        let response = self.send(builder, request).await?;

        Ok(response.bytes().await?.to_vec())
    }

    async fn post_json(&self, request: &ApiRequest, body: &Value) -> StdResult<Value> {
        let builder = self
            .apply_request(self.client.post(request.url()), request)
            .json(body);
        let response = self.send(builder, request).await?;

        Self::decode_json(response, request).await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn get_decodes_json_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/items")
                .query_param("page", "1")
                .header("Authorization", "bearer secret");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"results": [1, 2, 3]}));
        });
        let fetcher = HttpFetcher::try_new().unwrap();
        let request = ApiRequest::new(&server.url("/items"))
            .with_bearer_token("secret")
            .with_query("page", "1");

        let data = fetcher.get(&request).await.unwrap();

        mock.assert();
        assert_eq!(data, json!({"results": [1, 2, 3]}));
    }

    #[tokio::test]
    async fn get_fails_on_non_success_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/items");
            then.status(401).json_body(json!({"detail": "unauthorized"}));
        });
        let fetcher = HttpFetcher::try_new().unwrap();
        let request = ApiRequest::new(&server.url("/items"));

        let error = fetcher.get(&request).await.unwrap_err();

        match error.downcast_ref::<UpdateError>() {
            Some(UpdateError::Http { status, .. }) => assert_eq!(*status, 401),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_fails_on_malformed_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/items");
            then.status(200).body("<html>not json</html>");
        });
        let fetcher = HttpFetcher::try_new().unwrap();
        let request = ApiRequest::new(&server.url("/items"));

        let error = fetcher.get(&request).await.unwrap_err();

        assert!(matches!(
            error.downcast_ref::<UpdateError>(),
            Some(UpdateError::MalformedBody { .. })
        ));
    }

    #[tokio::test]
    async fn get_bytes_returns_raw_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/image");
            then.status(200).body(&[0x89, 0x50, 0x4e, 0x47][..]);
        });
        let fetcher = HttpFetcher::try_new().unwrap();
        let request = ApiRequest::new(&server.url("/image"));

        let bytes = fetcher.get_bytes(&request).await.unwrap();

        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
    }

    #[tokio::test]
    async fn post_json_sends_body_and_decodes_response() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("POST")
                .path("/graphql")
                .json_body(json!({"query": "{ viewer { login } }"}));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"data": {"viewer": {"login": "org-1"}}}));
        });
        let fetcher = HttpFetcher::try_new().unwrap();
        let request = ApiRequest::new(&server.url("/graphql"));

        let data = fetcher
            .post_json(&request, &json!({"query": "{ viewer { login } }"}))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(data["data"]["viewer"]["login"], "org-1");
    }
}
