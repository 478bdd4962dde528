//! The keys client.

use etcdkv_http::{HttpExecutor, HttpRequest, ReqwestExecutor};

use crate::config::{ClientConfig, DEFAULT_API_VERSION, DEFAULT_ROOT};
use crate::error::{Error, Result};
use crate::request::{Condition, Flags, RequestBuilder};
use crate::response::{self, KeyResponse, Node, Reply};
use crate::tree::{self, FlattenedTree};

/// Result of [`EtcdClient::get_keys_value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeysValue {
    /// The requested key was found among the listed leaves.
    Single(String),
    /// Every leaf under the listed directory, keyed by full path.
    All(std::collections::BTreeMap<String, String>),
}

/// A blocking client for the etcd v2 keys API.
///
/// Every key is resolved relative to the client's root namespace:
///
/// ```ignore
/// use etcdkv::{ClientConfig, EtcdClient};
///
/// let mut client = EtcdClient::connect(&ClientConfig::default())?;
/// client.set_root("/linkorb");
/// client.set("key1", "value1", None, None)?;
/// // the stored key is /linkorb/key1
/// assert_eq!(client.get("key1", None)?.as_deref(), Some("value1"));
/// ```
///
/// Each operation sends at most one request. Listing state lives only for
/// the duration of a call, so a shared `&EtcdClient` can be used from
/// several threads at once.
pub struct EtcdClient<E = ReqwestExecutor> {
    executor: E,
    requests: RequestBuilder,
}

impl EtcdClient<ReqwestExecutor> {
    /// Connect with a reqwest executor built from `config`.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let executor = config.headers.iter().fold(
            ReqwestExecutor::connect(config.server_url(), config.timeout)?,
            |executor, (name, value)| executor.with_default_header(name.clone(), value.clone()),
        );
        Self::with_options(executor, &config.version, &config.root)
    }
}

impl<E: HttpExecutor> EtcdClient<E> {
    /// Wrap `executor` with the default API version and no root.
    pub fn new(executor: E) -> Result<Self> {
        Self::with_options(executor, DEFAULT_API_VERSION, DEFAULT_ROOT)
    }

    /// Wrap `executor`, which must already have a base URL.
    pub fn with_options(executor: E, version: &str, root: &str) -> Result<Self> {
        if executor.base_url().is_none() {
            return Err(Error::MissingBaseUrl);
        }

        Ok(Self {
            executor,
            requests: RequestBuilder::new(version, root),
        })
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn version(&self) -> &str {
        self.requests.version()
    }

    pub fn root(&self) -> &str {
        self.requests.root()
    }

    /// Change the root namespace for subsequent operations.
    pub fn set_root(&mut self, root: &str) -> &mut Self {
        self.requests.set_root(root);
        self
    }

    /// GET `path` verbatim and return the body text.
    pub fn do_request(&self, path: &str) -> Result<String> {
        let request = HttpRequest::get(path);
        tracing::debug!(method = %request.method, path = %request.path, "dispatching raw request");
        Ok(self.executor.execute(&request)?.text())
    }

    fn dispatch(&self, request: &HttpRequest) -> Result<Reply> {
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            query = ?request.query,
            "dispatching request"
        );

        let response = self.executor.execute(request)?;
        let reply = response::interpret(&response.body)?;

        if let Reply::Error(e) = &reply {
            tracing::debug!(
                code = e.code,
                message = %e.message,
                status = response.status,
                "service reported error"
            );
        }

        Ok(reply)
    }

    /// Fetch the node at `key`.
    pub fn get_node(&self, key: &str, flags: Option<&Flags>) -> Result<Node> {
        let request = self.requests.get(key, flags);
        let response = self.dispatch(&request)?.into_result(Error::KeyNotFound)?;
        Ok(response.node)
    }

    /// Fetch the value at `key`; `None` when the key is a directory.
    pub fn get(&self, key: &str, flags: Option<&Flags>) -> Result<Option<String>> {
        Ok(self.get_node(key, flags)?.value)
    }

    /// Set `key` to `value`.
    ///
    /// Unlike the other writes this does not turn a service error into an
    /// `Err`: the decoded [`Reply`] is returned as-is and callers check
    /// [`Reply::is_error`] themselves. Existing callers depend on that, so
    /// it is kept.
    pub fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<u64>,
        condition: Option<&Condition>,
    ) -> Result<Reply> {
        let request = self.requests.set(key, value, ttl, condition);
        self.dispatch(&request)
    }

    /// Create `key`; fails with [`Error::KeyExists`] if it is present.
    pub fn mk(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<KeyResponse> {
        let request = self.requests.mk(key, value, ttl);
        self.dispatch(&request)?.into_result(Error::KeyExists)
    }

    /// Update an existing `key`; fails with [`Error::KeyNotFound`] if it is
    /// absent or `condition` does not hold.
    pub fn update(
        &self,
        key: &str,
        value: &str,
        ttl: Option<u64>,
        condition: Option<&Condition>,
    ) -> Result<KeyResponse> {
        let request = self.requests.update(key, value, ttl, condition);
        self.dispatch(&request)?.into_result(Error::KeyNotFound)
    }

    /// Create a directory; fails with [`Error::KeyExists`] if it is present.
    pub fn mkdir(&self, key: &str, ttl: Option<u64>) -> Result<KeyResponse> {
        let request = self.requests.mkdir(key, ttl);
        self.dispatch(&request)?.into_result(Error::KeyExists)
    }

    /// Refresh the TTL of an existing directory. A zero `ttl` is rejected
    /// before any request is sent.
    pub fn update_dir(&self, key: &str, ttl: u64) -> Result<KeyResponse> {
        let request = self.requests.update_dir(key, ttl)?;
        self.dispatch(&request)?.into_result(Error::Service)
    }

    /// Remove a key.
    pub fn rm(&self, key: &str) -> Result<KeyResponse> {
        let request = self.requests.rm(key);
        self.dispatch(&request)?.into_result(Error::Service)
    }

    /// Remove a directory, with its contents when `recursive`.
    pub fn rmdir(&self, key: &str, recursive: bool) -> Result<KeyResponse> {
        let request = self.requests.rmdir(key, recursive);
        self.dispatch(&request)?.into_result(Error::Service)
    }

    /// List a directory; fails with [`Error::KeyNotFound`] if it is absent.
    pub fn list_dir(&self, key: &str, recursive: bool) -> Result<KeyResponse> {
        let request = self.requests.list_dir(key, recursive);
        self.dispatch(&request)?.into_result(Error::KeyNotFound)
    }

    fn flatten_dir(&self, key: &str, recursive: bool) -> Result<FlattenedTree> {
        let listing = self.list_dir(key, recursive)?;
        Ok(tree::flatten(&listing.node))
    }

    /// Every key under `key`, parents before children.
    pub fn ls(&self, key: &str, recursive: bool) -> Result<Vec<String>> {
        Ok(self.flatten_dir(key, recursive)?.dirs)
    }

    /// Leaf values under `root`.
    ///
    /// Returns [`KeysValue::Single`] when `key` names one of the listed
    /// leaves, otherwise the whole map.
    pub fn get_keys_value(
        &self,
        root: &str,
        recursive: bool,
        key: Option<&str>,
    ) -> Result<KeysValue> {
        let mut values = self.flatten_dir(root, recursive)?.values;
        if let Some(value) = key.and_then(|k| values.remove(k)) {
            return Ok(KeysValue::Single(value));
        }
        Ok(KeysValue::All(values))
    }

    /// Create a directory inside `dir` with a server-generated name.
    pub fn mkdir_with_in_order_key(&self, dir: &str, ttl: Option<u64>) -> Result<KeyResponse> {
        let request = self.requests.mkdir_with_in_order_key(dir, ttl);
        self.dispatch(&request)?.into_result(Error::Service)
    }

    /// Store `value` inside `dir` under a server-generated key.
    pub fn set_with_in_order_key(
        &self,
        dir: &str,
        value: &str,
        ttl: Option<u64>,
        condition: Option<&Condition>,
    ) -> Result<KeyResponse> {
        let request = self.requests.set_with_in_order_key(dir, value, ttl, condition);
        self.dispatch(&request)?.into_result(Error::Service)
    }
}

impl<E> std::fmt::Debug for EtcdClient<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdClient")
            .field("version", &self.requests.version())
            .field("root", &self.requests.root())
            .finish_non_exhaustive()
    }
}
