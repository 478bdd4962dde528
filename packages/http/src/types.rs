use std::collections::{BTreeMap, HashMap};

/// Content type for every body-bearing request the keys API accepts.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// HTTP method for requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::POST => http::Method::POST,
            Method::PUT => http::Method::PUT,
            Method::DELETE => http::Method::DELETE,
        }
    }
}

/// A transport-neutral HTTP request descriptor.
///
/// The path is relative to the executor's base URL. Query parameters and
/// form fields are kept in sorted maps so that a descriptor renders the
/// same way every time it is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, PUT, DELETE)
    pub method: Method,

    /// Absolute path on the server, e.g. `/v2/keys/foo`
    pub path: String,

    /// Query parameters
    pub query: BTreeMap<String, String>,

    /// Request headers
    pub headers: BTreeMap<String, String>,

    /// Form-encoded body fields, `None` for body-less requests
    pub form: Option<BTreeMap<String, String>>,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self {
            method: Method::PUT,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Merge a whole set of query parameters, later values winning.
    pub fn with_query_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in params {
            self.query.insert(name.into(), value.into());
        }
        self
    }

    /// Attach a form body and the matching `Content-Type` header.
    pub fn with_form(mut self, form: BTreeMap<String, String>) -> Self {
        self.form = Some(form);
        self.with_header(http::header::CONTENT_TYPE.as_str(), FORM_URLENCODED)
    }

    /// Encode the form body as `application/x-www-form-urlencoded` text.
    pub fn encoded_form(&self) -> Option<String> {
        self.form.as_ref().map(|fields| {
            url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields.iter())
                .finish()
        })
    }
}

/// HTTP response from a request
///
/// Status is carried for diagnostics only; the keys API reports failures
/// in the body, so callers inspect `body` whatever the status.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,

    /// Response headers, names lowercased
    pub headers: HashMap<String, String>,

    /// Raw body bytes
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_form_sets_content_type() {
        let mut form = BTreeMap::new();
        form.insert("value".to_string(), "bar".to_string());
        let request = HttpRequest::put("/v2/keys/foo").with_form(form);

        assert_eq!(request.method, Method::PUT);
        assert_eq!(
            request.headers.get("content-type"),
            Some(&FORM_URLENCODED.to_string())
        );
    }

    #[test]
    fn encoded_form_escapes_values() {
        let mut form = BTreeMap::new();
        form.insert("value".to_string(), "a b&c".to_string());
        form.insert("ttl".to_string(), "10".to_string());
        let request = HttpRequest::put("/x").with_form(form);

        assert_eq!(
            request.encoded_form().as_deref(),
            Some("ttl=10&value=a+b%26c")
        );
    }

    #[test]
    fn bodyless_request_has_no_encoded_form() {
        assert!(HttpRequest::get("/x").encoded_form().is_none());
    }

    #[test]
    fn query_params_merge() {
        let request = HttpRequest::get("/x")
            .with_query("recursive", "true")
            .with_query_params([("dir", "true"), ("recursive", "false")]);

        assert_eq!(request.query.len(), 2);
        assert_eq!(request.query.get("recursive"), Some(&"false".to_string()));
    }

    #[test]
    fn method_display() {
        assert_eq!(Method::DELETE.to_string(), "DELETE");
        assert_eq!(http::Method::from(Method::POST), http::Method::POST);
    }
}
