//! HTTP execution abstraction.
//!
//! The keys client never talks to reqwest directly; it hands an
//! [`HttpRequest`] to an [`HttpExecutor`]. Production code uses
//! [`ReqwestExecutor`], tests use the recording `MockExecutor`.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::Error;
use crate::types::{HttpRequest, HttpResponse};

/// Trait for executing HTTP requests.
///
/// Implementations must return non-2xx responses as `Ok`; only transport
/// failures (connection, timeout, malformed URL) are errors.
pub trait HttpExecutor: Send + Sync {
    /// Base URL that request paths are resolved against, if configured.
    fn base_url(&self) -> Option<&Url>;

    /// Execute an HTTP request and return the response.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error>;
}

/// Production HTTP executor using reqwest.
pub struct ReqwestExecutor {
    client: Client,
    base_url: Option<Url>,
    default_headers: HashMap<String, String>,
}

impl ReqwestExecutor {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new executor with the given timeout and no base URL.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: None,
            default_headers: HashMap::new(),
        })
    }

    /// Create an executor bound to `base_url`.
    pub fn connect(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        Self::new(timeout)?.with_base_url(base_url)
    }

    /// Set the base URL request paths are joined onto.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, Error> {
        self.base_url = Some(Url::parse(base_url)?);
        Ok(self)
    }

    /// Add a default header that will be sent with every request
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    fn build_url(&self, path: &str) -> Result<Url, Error> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }
        match &self.base_url {
            Some(base) => Ok(base.join(path)?),
            None => Ok(Url::parse(path)?),
        }
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        let url = self.build_url(&request.path)?;
        let method: http::Method = request.method.into();

        let mut headers = HeaderMap::new();
        for (name, value) in self.default_headers.iter().chain(request.headers.iter()) {
            let header_name = HeaderName::try_from(name.as_str())?;
            let header_value = HeaderValue::try_from(value.as_str())?;
            headers.insert(header_name, header_value);
        }

        let mut req_builder = self.client.request(method, url).headers(headers);

        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }

        if let Some(body) = request.encoded_form() {
            req_builder = req_builder.body(body);
        }

        let response = req_builder.send()?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string();

        let mut resp_headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                resp_headers.insert(name.to_string(), v.to_string());
            }
        }

        let body = response.bytes()?.to_vec();
        tracing::trace!(status, bytes = body.len(), "response received");

        Ok(HttpResponse {
            status,
            status_text,
            headers: resp_headers,
            body,
        })
    }
}

/// Mock HTTP executor for testing.
///
/// Returns predefined responses based on request matching.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use crate::types::Method;
    use std::sync::{Arc, Mutex};

    /// Base URL a fresh mock reports.
    pub const MOCK_BASE_URL: &str = "http://127.0.0.1:2379";

    type RouteKey = (Option<Method>, String);

    /// A mock HTTP executor that returns predefined responses.
    #[derive(Clone)]
    pub struct MockExecutor {
        base_url: Option<Url>,
        /// Responses keyed by method (or any method) and request path.
        responses: Arc<Mutex<HashMap<RouteKey, HttpResponse>>>,
        /// Default response when no match found.
        default_response: Arc<Mutex<Option<HttpResponse>>>,
        /// Recorded requests for verification.
        recorded_requests: Arc<Mutex<Vec<HttpRequest>>>,
        /// Error message to fail every request with.
        failure: Arc<Mutex<Option<String>>>,
    }

    impl Default for MockExecutor {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockExecutor {
        /// Create a new mock executor reporting [`MOCK_BASE_URL`].
        pub fn new() -> Self {
            Self {
                base_url: Url::parse(MOCK_BASE_URL).ok(),
                responses: Arc::default(),
                default_response: Arc::default(),
                recorded_requests: Arc::default(),
                failure: Arc::default(),
            }
        }

        /// Drop the base URL, as an unconfigured transport would.
        pub fn without_base_url(mut self) -> Self {
            self.base_url = None;
            self
        }

        /// Add a response for a specific path, whatever the method.
        pub fn with_response(self, path: impl Into<String>, response: HttpResponse) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert((None, path.into()), response);
            self
        }

        /// Add a response for a specific method and path.
        pub fn with_route(
            self,
            method: Method,
            path: impl Into<String>,
            response: HttpResponse,
        ) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert((Some(method), path.into()), response);
            self
        }

        /// Set a default response when no path matches.
        pub fn with_default_response(self, response: HttpResponse) -> Self {
            *self.default_response.lock().unwrap() = Some(response);
            self
        }

        /// Configure to fail all requests with an error.
        pub fn fail_with(self, message: impl Into<String>) -> Self {
            *self.failure.lock().unwrap() = Some(message.into());
            self
        }

        /// Get all recorded requests.
        pub fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.recorded_requests.lock().unwrap().clone()
        }

        /// Get the most recent request, if any.
        pub fn last_request(&self) -> Option<HttpRequest> {
            self.recorded_requests.lock().unwrap().last().cloned()
        }

        /// Clear recorded requests.
        pub fn clear_recorded(&self) {
            self.recorded_requests.lock().unwrap().clear();
        }

        /// Create a response with the given status and JSON body.
        pub fn json_response(status: u16, body: serde_json::Value) -> HttpResponse {
            HttpResponse {
                status,
                status_text: http::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown")
                    .to_string(),
                headers: HashMap::new(),
                body: body.to_string().into_bytes(),
            }
        }

        /// Create a simple success response.
        pub fn success_response(body: serde_json::Value) -> HttpResponse {
            Self::json_response(200, body)
        }

        /// Create a 404 Not Found response.
        pub fn not_found() -> HttpResponse {
            Self::json_response(404, serde_json::json!({"error": "Not Found"}))
        }
    }

    impl HttpExecutor for MockExecutor {
        fn base_url(&self) -> Option<&Url> {
            self.base_url.as_ref()
        }

        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
            self.recorded_requests.lock().unwrap().push(request.clone());

            if let Some(message) = self.failure.lock().unwrap().clone() {
                return Err(Error::Request { message });
            }

            let responses = self.responses.lock().unwrap();
            let exact = (Some(request.method), request.path.clone());
            let any = (None, request.path.clone());
            if let Some(response) = responses.get(&exact).or_else(|| responses.get(&any)) {
                return Ok(response.clone());
            }

            if let Some(ref response) = *self.default_response.lock().unwrap() {
                return Ok(response.clone());
            }

            Ok(Self::not_found())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockExecutor;
    use super::*;
    use crate::types::Method;

    #[test]
    fn mock_executor_returns_configured_response() {
        let executor = MockExecutor::new().with_response(
            "/test",
            MockExecutor::success_response(serde_json::json!({"result": "success"})),
        );

        let result = executor.execute(&HttpRequest::get("/test")).unwrap();

        assert_eq!(result.status, 200);
        assert_eq!(result.text(), r#"{"result":"success"}"#);
    }

    #[test]
    fn mock_executor_prefers_method_route() {
        let executor = MockExecutor::new()
            .with_response("/k", MockExecutor::success_response(serde_json::json!(1)))
            .with_route(
                Method::PUT,
                "/k",
                MockExecutor::success_response(serde_json::json!(2)),
            );

        assert_eq!(executor.execute(&HttpRequest::put("/k")).unwrap().text(), "2");
        assert_eq!(executor.execute(&HttpRequest::get("/k")).unwrap().text(), "1");
    }

    #[test]
    fn mock_executor_returns_404_when_no_match() {
        let executor = MockExecutor::new();
        let result = executor.execute(&HttpRequest::get("/unknown")).unwrap();

        assert_eq!(result.status, 404);
    }

    #[test]
    fn mock_executor_fails_when_configured() {
        let executor = MockExecutor::new().fail_with("Network error");
        let result = executor.execute(&HttpRequest::get("/any"));

        assert!(matches!(result, Err(Error::Request { message }) if message == "Network error"));
    }

    #[test]
    fn mock_executor_records_requests() {
        let executor = MockExecutor::new()
            .with_default_response(MockExecutor::success_response(serde_json::Value::Null));

        executor.execute(&HttpRequest::get("/first")).unwrap();
        executor.execute(&HttpRequest::post("/second")).unwrap();
        executor.execute(&HttpRequest::delete("/third")).unwrap();

        let recorded = executor.recorded_requests();
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded[0].path, "/first");
        assert_eq!(recorded[1].method, Method::POST);
        assert_eq!(recorded[2].method, Method::DELETE);

        executor.clear_recorded();
        assert!(executor.recorded_requests().is_empty());
    }

    #[test]
    fn mock_executor_base_url() {
        assert_eq!(
            MockExecutor::new().base_url().map(Url::as_str),
            Some("http://127.0.0.1:2379/")
        );
        assert!(MockExecutor::new().without_base_url().base_url().is_none());
    }

    #[test]
    fn reqwest_executor_creation() {
        let executor = ReqwestExecutor::new(ReqwestExecutor::DEFAULT_TIMEOUT).unwrap();
        assert!(executor.base_url().is_none());
    }

    #[test]
    fn reqwest_executor_joins_paths_onto_base() {
        let executor =
            ReqwestExecutor::connect("http://127.0.0.1:2379", Duration::from_secs(5)).unwrap();
        let url = executor.build_url("/v2/keys/foo").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:2379/v2/keys/foo");
    }

    #[test]
    fn reqwest_executor_rejects_bad_base_url() {
        let result = ReqwestExecutor::new(ReqwestExecutor::DEFAULT_TIMEOUT)
            .unwrap()
            .with_base_url("::not a url::");
        assert!(matches!(result, Err(Error::UrlParse(_))));
    }
}
