use std::fmt::Display;

/// A request to an external provider API.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ApiRequest {
    /// The target URL.
    pub(crate) url: String,

    /// Headers to send with the request.
    pub(crate) headers: Vec<(String, String)>,

    /// Query string parameters to append to the URL.
    pub(crate) query: Vec<(String, String)>,
}

impl ApiRequest {
    /// Creates a new `ApiRequest` for the given URL.
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            headers: Vec::new(),
            query: Vec::new(),
        }
    }

    /// Adds a header to the request.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Adds a `Authorization: bearer <token>` header to the request.
    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with_header("Authorization", &format!("bearer {token}"))
    }

    /// Adds a `Authorization: token <token>` header to the request.
    pub fn with_token(self, token: &str) -> Self {
        self.with_header("Authorization", &format!("token {token}"))
    }

    /// Adds a query string parameter to the request.
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Retrieves the target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Retrieves the headers.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Retrieves the query string parameters.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Creates a dummy `ApiRequest` for testing purposes.
    #[cfg(test)]
    pub(crate) fn dummy() -> Self {
        Self::new("https://example.com/api")
    }
}

impl Display for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiRequest: url={}, query={:?}", self.url, self.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_with_headers_and_query() {
        let request = ApiRequest::new("https://example.com/api")
            .with_bearer_token("secret")
            .with_query("page", "1");

        assert_eq!(request.url(), "https://example.com/api");
        assert_eq!(
            request.headers(),
            &[("Authorization".to_string(), "bearer secret".to_string())]
        );
        assert_eq!(
            request.query(),
            &[("page".to_string(), "1".to_string())]
        );
    }

    #[test]
    fn token_header_uses_token_scheme() {
        let request = ApiRequest::new("https://example.com/api").with_token("secret");

        assert_eq!(
            request.headers(),
            &[("Authorization".to_string(), "token secret".to_string())]
        );
    }
}
