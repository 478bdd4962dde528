//! Request construction for the keys API.
//!
//! [`RequestBuilder`] turns a key operation into an [`HttpRequest`]: the
//! resolved path, the precondition query, and the form body. Nothing here
//! touches the network.

use std::collections::BTreeMap;

use etcdkv_http::HttpRequest;

use crate::error::{Error, ServiceError};
use crate::path;

/// Query flag: the key must (`true`) or must not (`false`) already exist.
pub const PREV_EXIST: &str = "prevExist";
/// Query flag: the current value must match.
pub const PREV_VALUE: &str = "prevValue";
/// Query flag: the current modified index must match.
pub const PREV_INDEX: &str = "prevIndex";
/// Query flag: recurse into directories.
pub const RECURSIVE: &str = "recursive";
/// Query and form flag: the target is a directory.
pub const DIR: &str = "dir";

const VALUE: &str = "value";
const TTL: &str = "ttl";
const TRUE: &str = "true";
const FALSE: &str = "false";

/// Extra query parameters passed through verbatim on reads.
pub type Flags = BTreeMap<String, String>;

/// Preconditions applied to a write as query parameters.
///
/// An empty condition makes the write unconditional.
///
/// ```rust
/// use etcdkv::Condition;
///
/// let condition = Condition::new().prev_value("old").prev_index(7);
/// assert_eq!(condition.get("prevValue"), Some("old"));
/// assert_eq!(condition.get("prevIndex"), Some("7"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Condition {
    params: BTreeMap<String, String>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prev_exist(self, exists: bool) -> Self {
        self.with(PREV_EXIST, if exists { TRUE } else { FALSE })
    }

    pub fn prev_value(self, value: impl Into<String>) -> Self {
        self.with(PREV_VALUE, value)
    }

    pub fn prev_index(self, index: u64) -> Self {
        self.with(PREV_INDEX, index.to_string())
    }

    /// Set an arbitrary precondition.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.params.iter()
    }

    /// Layer `self` over `base`: entries already in `self` win.
    fn overriding(self, base: Option<&Condition>) -> Self {
        let mut params = base.map(|c| c.params.clone()).unwrap_or_default();
        params.extend(self.params);
        Self { params }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Condition {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Condition::new(), |condition, (k, v)| condition.with(k, v))
    }
}

/// Render a TTL for the form body. Zero and `None` both mean "no TTL" and
/// leave the field out entirely.
fn ttl_field(ttl: Option<u64>) -> Option<String> {
    ttl.filter(|t| *t > 0).map(|t| t.to_string())
}

fn value_form(value: &str, ttl: Option<u64>) -> BTreeMap<String, String> {
    let mut form = BTreeMap::new();
    form.insert(VALUE.to_string(), value.to_string());
    if let Some(ttl) = ttl_field(ttl) {
        form.insert(TTL.to_string(), ttl);
    }
    form
}

fn dir_form(ttl: Option<u64>) -> BTreeMap<String, String> {
    let mut form = BTreeMap::new();
    form.insert(DIR.to_string(), TRUE.to_string());
    if let Some(ttl) = ttl_field(ttl) {
        form.insert(TTL.to_string(), ttl);
    }
    form
}

fn with_condition(request: HttpRequest, condition: Option<&Condition>) -> HttpRequest {
    match condition {
        Some(condition) => request.with_query_params(condition.iter()),
        None => request,
    }
}

/// Builds keys API requests relative to a root namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBuilder {
    version: String,
    root: String,
}

impl RequestBuilder {
    pub fn new(version: &str, root: &str) -> Self {
        Self {
            version: path::normalize_version(version),
            root: path::normalize_root(root),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn set_root(&mut self, root: &str) {
        self.root = path::normalize_root(root);
    }

    /// Resolve `key` to its request path.
    pub fn key_path(&self, key: &str) -> String {
        path::resolve(&self.version, &self.root, key)
    }

    /// GET a key, forwarding `flags` as query parameters.
    pub fn get(&self, key: &str, flags: Option<&Flags>) -> HttpRequest {
        let request = HttpRequest::get(self.key_path(key));
        match flags {
            Some(flags) => request.with_query_params(flags.iter()),
            None => request,
        }
    }

    /// GET a directory listing.
    pub fn list_dir(&self, key: &str, recursive: bool) -> HttpRequest {
        let request = HttpRequest::get(self.key_path(key));
        if recursive {
            request.with_query(RECURSIVE, TRUE)
        } else {
            request
        }
    }

    /// PUT a value under the caller's condition.
    pub fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<u64>,
        condition: Option<&Condition>,
    ) -> HttpRequest {
        let request = HttpRequest::put(self.key_path(key)).with_form(value_form(value, ttl));
        with_condition(request, condition)
    }

    /// PUT a value only if the key does not exist yet.
    pub fn mk(&self, key: &str, value: &str, ttl: Option<u64>) -> HttpRequest {
        self.set(key, value, ttl, Some(&Condition::new().prev_exist(false)))
    }

    /// PUT a value only if the key already exists. `prevExist` cannot be
    /// overridden by the caller's condition.
    pub fn update(
        &self,
        key: &str,
        value: &str,
        ttl: Option<u64>,
        condition: Option<&Condition>,
    ) -> HttpRequest {
        let condition = Condition::new().prev_exist(true).overriding(condition);
        self.set(key, value, ttl, Some(&condition))
    }

    /// PUT a new directory.
    pub fn mkdir(&self, key: &str, ttl: Option<u64>) -> HttpRequest {
        HttpRequest::put(self.key_path(key))
            .with_form(dir_form(ttl))
            .with_query(PREV_EXIST, FALSE)
    }

    /// PUT a fresh TTL on an existing directory.
    ///
    /// Fails without building anything when `ttl` is zero.
    pub fn update_dir(&self, key: &str, ttl: u64) -> Result<HttpRequest, Error> {
        if ttl == 0 {
            return Err(Error::Service(ServiceError::ttl_required()));
        }

        let mut form = BTreeMap::new();
        form.insert(TTL.to_string(), ttl.to_string());

        Ok(HttpRequest::put(self.key_path(key))
            .with_form(form)
            .with_query(DIR, TRUE)
            .with_query(PREV_EXIST, TRUE))
    }

    /// DELETE a key.
    pub fn rm(&self, key: &str) -> HttpRequest {
        HttpRequest::delete(self.key_path(key))
    }

    /// DELETE a directory, optionally with its contents.
    pub fn rmdir(&self, key: &str, recursive: bool) -> HttpRequest {
        let request = HttpRequest::delete(self.key_path(key)).with_query(DIR, TRUE);
        if recursive {
            request.with_query(RECURSIVE, TRUE)
        } else {
            request
        }
    }

    /// POST a new directory with a server-generated name inside `dir`.
    pub fn mkdir_with_in_order_key(&self, dir: &str, ttl: Option<u64>) -> HttpRequest {
        HttpRequest::post(self.key_path(dir)).with_form(dir_form(ttl))
    }

    /// POST a new value with a server-generated key inside `dir`.
    pub fn set_with_in_order_key(
        &self,
        dir: &str,
        value: &str,
        ttl: Option<u64>,
        condition: Option<&Condition>,
    ) -> HttpRequest {
        let request = HttpRequest::post(self.key_path(dir)).with_form(value_form(value, ttl));
        with_condition(request, condition)
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_API_VERSION, crate::config::DEFAULT_ROOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etcdkv_http::{Method, FORM_URLENCODED};

    fn builder() -> RequestBuilder {
        RequestBuilder::new("v2", "")
    }

    fn form_of(request: &HttpRequest) -> &BTreeMap<String, String> {
        request.form.as_ref().expect("request has no form body")
    }

    #[test]
    fn builder_normalizes_root_and_version() {
        let b = RequestBuilder::new("/v2/", "/app/");
        assert_eq!(b.version(), "v2");
        assert_eq!(b.root(), "app");
        assert_eq!(b.key_path("x"), "/v2/keys/app/x");
    }

    #[test]
    fn set_root_renormalizes() {
        let mut b = builder();
        b.set_root("//");
        assert_eq!(b.root(), "");
        b.set_root("/test/");
        assert_eq!(b.key_path("k"), "/v2/keys/test/k");
    }

    #[test]
    fn get_without_flags() {
        let request = builder().get("/foo", None);
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/v2/keys/foo");
        assert!(request.query.is_empty());
        assert!(request.form.is_none());
    }

    #[test]
    fn get_forwards_flags() {
        let mut flags = Flags::new();
        flags.insert("sorted".to_string(), "true".to_string());
        let request = builder().get("foo", Some(&flags));
        assert_eq!(request.query.get("sorted"), Some(&"true".to_string()));
    }

    #[test]
    fn list_dir_recursive_only_when_requested() {
        assert!(builder().list_dir("/", false).query.is_empty());
        let request = builder().list_dir("/", true);
        assert_eq!(request.query.get(RECURSIVE), Some(&"true".to_string()));
        assert_eq!(request.path, "/v2/keys/");
    }

    #[test]
    fn set_encodes_value_and_ttl() {
        let request = builder().set("k", "v", Some(30), None);
        assert_eq!(request.method, Method::PUT);
        assert_eq!(form_of(&request).get("value"), Some(&"v".to_string()));
        assert_eq!(form_of(&request).get("ttl"), Some(&"30".to_string()));
        assert_eq!(
            request.headers.get("content-type"),
            Some(&FORM_URLENCODED.to_string())
        );
        assert!(request.query.is_empty());
    }

    #[test]
    fn zero_ttl_is_omitted() {
        let request = builder().set("k", "v", Some(0), None);
        assert!(!form_of(&request).contains_key("ttl"));
        let request = builder().set("k", "v", None, None);
        assert!(!form_of(&request).contains_key("ttl"));
    }

    #[test]
    fn set_carries_condition() {
        let condition = Condition::new().prev_value("old");
        let request = builder().set("k", "v", None, Some(&condition));
        assert_eq!(request.query.get(PREV_VALUE), Some(&"old".to_string()));
    }

    #[test]
    fn mk_forces_prev_exist_false() {
        let request = builder().mk("k", "v", None);
        assert_eq!(request.query.get(PREV_EXIST), Some(&"false".to_string()));
        assert_eq!(request.query.len(), 1);
    }

    #[test]
    fn update_merges_condition_without_overriding_prev_exist() {
        let condition = Condition::new().prev_exist(false).prev_index(42);
        let request = builder().update("k", "v", Some(5), Some(&condition));
        assert_eq!(request.query.get(PREV_EXIST), Some(&"true".to_string()));
        assert_eq!(request.query.get(PREV_INDEX), Some(&"42".to_string()));
        assert_eq!(form_of(&request).get("ttl"), Some(&"5".to_string()));
    }

    #[test]
    fn mkdir_sends_dir_form() {
        let request = builder().mkdir("d", Some(10));
        assert_eq!(request.method, Method::PUT);
        assert_eq!(form_of(&request).get("dir"), Some(&"true".to_string()));
        assert_eq!(form_of(&request).get("ttl"), Some(&"10".to_string()));
        assert!(!form_of(&request).contains_key("value"));
        assert_eq!(request.query.get(PREV_EXIST), Some(&"false".to_string()));
    }

    #[test]
    fn update_dir_requires_ttl() {
        let err = builder().update_dir("d", 0).unwrap_err();
        assert!(matches!(err, Error::Service(ref e) if e.code == 204));
    }

    #[test]
    fn update_dir_sets_flags() {
        let request = builder().update_dir("d", 60).unwrap();
        assert_eq!(request.query.get(DIR), Some(&"true".to_string()));
        assert_eq!(request.query.get(PREV_EXIST), Some(&"true".to_string()));
        assert_eq!(form_of(&request).len(), 1);
        assert_eq!(form_of(&request).get("ttl"), Some(&"60".to_string()));
    }

    #[test]
    fn rm_has_no_query() {
        let request = builder().rm("k");
        assert_eq!(request.method, Method::DELETE);
        assert!(request.query.is_empty());
        assert!(request.form.is_none());
    }

    #[test]
    fn rmdir_flags() {
        let request = builder().rmdir("d", false);
        assert_eq!(request.query.get(DIR), Some(&"true".to_string()));
        assert!(!request.query.contains_key(RECURSIVE));

        let request = builder().rmdir("d", true);
        assert_eq!(request.query.get(RECURSIVE), Some(&"true".to_string()));
    }

    #[test]
    fn in_order_key_requests_post() {
        let request = builder().mkdir_with_in_order_key("queue", None);
        assert_eq!(request.method, Method::POST);
        assert_eq!(form_of(&request).get("dir"), Some(&"true".to_string()));
        assert!(request.query.is_empty());

        let condition = Condition::new().prev_exist(true);
        let request = builder().set_with_in_order_key("queue", "job", Some(3), Some(&condition));
        assert_eq!(request.method, Method::POST);
        assert_eq!(form_of(&request).get("value"), Some(&"job".to_string()));
        assert_eq!(request.query.get(PREV_EXIST), Some(&"true".to_string()));
    }

    #[test]
    fn condition_from_iter() {
        let condition: Condition = [("prevExist", "true"), ("prevValue", "x")]
            .into_iter()
            .collect();
        assert_eq!(condition.get(PREV_EXIST), Some("true"));
        assert!(!condition.is_empty());
    }
}
