//! Response decoding.
//!
//! Every keys API response body is JSON. A body with a top-level
//! `errorCode` is a service error whatever the HTTP status; anything else
//! is an action response carrying the affected node.

use serde::{Deserialize, Serialize};

use crate::error::{Error, ServiceError};

/// A key or directory as reported by the service.
///
/// Leaves carry `value`; directories set `dir` and may carry `nodes` when
/// listed. The root directory of a listing has no `key`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dir: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_index: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_index: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<Node>>,
}

impl Node {
    pub fn leaf(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn directory(key: Option<&str>, nodes: Vec<Node>) -> Self {
        Self {
            key: key.map(str::to_string),
            dir: true,
            nodes: Some(nodes),
            ..Default::default()
        }
    }

    pub fn is_dir(&self) -> bool {
        self.dir || self.nodes.is_some()
    }

    /// Children of a listed directory; empty for leaves.
    pub fn children(&self) -> &[Node] {
        self.nodes.as_deref().unwrap_or_default()
    }
}

/// A successful action response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResponse {
    /// `get`, `set`, `create`, `update`, `compareAndSwap`, `delete`, ...
    pub action: String,

    pub node: Node,

    /// The node as it was before a write, when the service reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_node: Option<Node>,
}

/// A decoded response body: either an action or a service error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Error(ServiceError),
    Action(KeyResponse),
}

impl Reply {
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    pub fn error(&self) -> Option<&ServiceError> {
        match self {
            Reply::Error(e) => Some(e),
            Reply::Action(_) => None,
        }
    }

    pub fn response(&self) -> Option<&KeyResponse> {
        match self {
            Reply::Action(r) => Some(r),
            Reply::Error(_) => None,
        }
    }

    /// Convert to a `Result`, wrapping a service error with `kind`.
    pub fn into_result(self, kind: fn(ServiceError) -> Error) -> Result<KeyResponse, Error> {
        match self {
            Reply::Action(response) => Ok(response),
            Reply::Error(e) => Err(kind(e)),
        }
    }
}

/// Decode a raw response body.
pub fn interpret(body: &[u8]) -> Result<Reply, serde_json::Error> {
    serde_json::from_slice(body)
}
