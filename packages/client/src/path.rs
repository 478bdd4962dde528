//! Key path resolution.
//!
//! Every key operation addresses `/<version>/keys/<root>/<key>`. Both the
//! root namespace and the key are trimmed of surrounding slashes before
//! they are joined, and any doubled slash left over is collapsed.

/// Trim leading and trailing `/` from a root namespace and collapse any
/// doubled `/` inside it.
///
/// ```rust
/// use etcdkv::path::normalize_root;
///
/// assert_eq!(normalize_root("/"), "");
/// assert_eq!(normalize_root("//"), "");
/// assert_eq!(normalize_root("/test/"), "test");
/// assert_eq!(normalize_root("/a//b/"), "a/b");
/// ```
pub fn normalize_root(root: &str) -> String {
    collapse_slashes(root.trim_matches('/'))
}

/// Trim surrounding `/` from an API version segment.
pub fn normalize_version(version: &str) -> String {
    version.trim_matches('/').to_string()
}

/// Build the request path for `key` under `root`.
///
/// An empty root places keys directly under `/<version>/keys/`, and a key
/// of `""` or `"/"` addresses the root directory itself.
///
/// ```rust
/// use etcdkv::path::resolve;
///
/// assert_eq!(resolve("v2", "app", "/db/host/"), "/v2/keys/app/db/host");
/// assert_eq!(resolve("v2", "", "foo"), "/v2/keys/foo");
/// assert_eq!(resolve("v2", "", "/"), "/v2/keys/");
/// ```
pub fn resolve(version: &str, root: &str, key: &str) -> String {
    let raw = format!(
        "/{}/keys/{}/{}",
        version.trim_matches('/'),
        root.trim_matches('/'),
        key.trim_matches('/')
    );
    collapse_slashes(&raw)
}

/// Collapse every run of `/` into a single `/`.
fn collapse_slashes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut previous_slash = false;
    for c in raw.chars() {
        if c == '/' {
            if !previous_slash {
                out.push(c);
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_root_strips_slashes() {
        assert_eq!(normalize_root("/"), "");
        assert_eq!(normalize_root("//"), "");
        assert_eq!(normalize_root("/test/"), "test");
        assert_eq!(normalize_root("a/b"), "a/b");
        assert_eq!(normalize_root(""), "");
        assert_eq!(normalize_root("/a//b/"), "a/b");
        assert_eq!(normalize_root("///a///b///"), "a/b");
    }

    #[test]
    fn resolve_with_root() {
        assert_eq!(resolve("v2", "linkorb", "key1"), "/v2/keys/linkorb/key1");
        assert_eq!(resolve("v2", "linkorb", "/a/b/"), "/v2/keys/linkorb/a/b");
    }

    #[test]
    fn resolve_without_root() {
        assert_eq!(resolve("v2", "", "key1"), "/v2/keys/key1");
        assert_eq!(resolve("v2", "", "/nested/key"), "/v2/keys/nested/key");
    }

    #[test]
    fn resolve_root_directory() {
        assert_eq!(resolve("v2", "", "/"), "/v2/keys/");
        assert_eq!(resolve("v2", "", ""), "/v2/keys/");
        assert_eq!(resolve("v2", "app", "/"), "/v2/keys/app/");
    }

    #[test]
    fn resolve_collapses_interior_slashes() {
        assert_eq!(resolve("v2", "a//b", "c///d"), "/v2/keys/a/b/c/d");
        assert!(!resolve("/v2/", "//x//", "//y//").contains("//"));
    }

    #[test]
    fn resolve_always_starts_with_keys_prefix() {
        for key in ["", "/", "a", "/a/", "a/b/c", "//", "with space"] {
            for root in ["", "/", "r", "/r/s/"] {
                let path = resolve("v2", root, key);
                assert!(path.starts_with("/v2/keys/"), "{} did not start with prefix", path);
                assert!(!path.contains("//"), "{} has a doubled slash", path);
            }
        }
    }

    #[test]
    fn resolve_is_stable_on_clean_input() {
        let path = resolve("v2", "app", "db/host");
        assert_eq!(path, resolve("v2", "app", "db/host"));
        assert_eq!(path, resolve("/v2", "/app/", "/db/host/"));
    }
}
