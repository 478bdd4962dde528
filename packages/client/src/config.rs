//! Client configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use etcdkv_http::ReqwestExecutor;

use crate::error::{Error, Result};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:2379";
pub const DEFAULT_API_VERSION: &str = "v2";
pub const DEFAULT_ROOT: &str = "";
pub const DEFAULT_TIMEOUT: Duration = ReqwestExecutor::DEFAULT_TIMEOUT;

pub const ENV_SERVER: &str = "ETCDKV_SERVER";
pub const ENV_API_VERSION: &str = "ETCDKV_API_VERSION";
pub const ENV_ROOT: &str = "ETCDKV_ROOT";
pub const ENV_TIMEOUT_SECS: &str = "ETCDKV_TIMEOUT_SECS";

/// Settings used by [`EtcdClient::connect`](crate::EtcdClient::connect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server base address, e.g. `http://127.0.0.1:2379`.
    pub server: String,
    /// API version path segment.
    pub version: String,
    /// Root namespace every key is resolved under.
    pub root: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            version: DEFAULT_API_VERSION.to_string(),
            root: DEFAULT_ROOT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `ETCDKV_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each
    /// `ETCDKV_*` variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(server) = lookup(ENV_SERVER) {
            config.server = server;
        }
        if let Some(version) = lookup(ENV_API_VERSION) {
            config.version = version;
        }
        if let Some(root) = lookup(ENV_ROOT) {
            config.root = root;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|e| Error::InvalidConfig {
                message: format!("{} must be a whole number of seconds: {}", ENV_TIMEOUT_SECS, e),
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send `name: value` with every request, replacing an earlier value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Server address without trailing slashes; empty falls back to the
    /// default server.
    pub fn server_url(&self) -> &str {
        let trimmed = self.server.trim_end_matches('/');
        if trimmed.is_empty() {
            DEFAULT_SERVER
        } else {
            trimmed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.server, "http://127.0.0.1:2379");
        assert_eq!(config.version, "v2");
        assert_eq!(config.root, "");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.headers.is_empty());
    }

    #[test]
    fn later_header_replaces_earlier() {
        let config = ClientConfig::new()
            .with_header("Authorization", "Basic a")
            .with_header("Authorization", "Basic b");
        assert_eq!(config.headers.len(), 1);
        assert_eq!(config.headers["Authorization"], "Basic b");
    }

    #[test]
    fn lookup_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_SERVER, "http://etcd:4001"),
            (ENV_ROOT, "/app/"),
            (ENV_TIMEOUT_SECS, " 5 "),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|name| env.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.server, "http://etcd:4001");
        assert_eq!(config.version, "v2");
        assert_eq!(config.root, "/app/");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let result = ClientConfig::from_lookup(|name| {
            (name == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn server_url_trims_and_falls_back() {
        let config = ClientConfig::new().with_server("http://host:2379/");
        assert_eq!(config.server_url(), "http://host:2379");

        let config = ClientConfig::new().with_server("");
        assert_eq!(config.server_url(), DEFAULT_SERVER);
    }
}
