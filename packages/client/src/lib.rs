//! # etcdkv
//!
//! A blocking client for the etcd v2 keys API.
//!
//! [`EtcdClient`] covers key and directory CRUD: `get`, `set`, `mk`,
//! `update`, `mkdir`, `update_dir`, `rm`, `rmdir`, recursive listing with
//! `ls` and `get_keys_value`, and in-order keys. Keys are resolved under a
//! configurable root namespace:
//!
//! ```ignore
//! use etcdkv::{ClientConfig, Condition, EtcdClient};
//!
//! let client = EtcdClient::connect(&ClientConfig::default().with_root("/app"))?;
//!
//! client.mk("db/host", "10.0.0.1", None)?;
//! client.update("db/host", "10.0.0.2", Some(60), Some(&Condition::new().prev_value("10.0.0.1")))?;
//!
//! for key in client.ls("/", true)? {
//!     println!("{}", key);
//! }
//! ```
//!
//! The transport is pluggable through [`etcdkv_http::HttpExecutor`]; see
//! [`EtcdClient::new`].

pub mod client;
pub mod config;
pub mod error;
pub mod path;
pub mod request;
pub mod response;
pub mod tree;

pub use client::{EtcdClient, KeysValue};
pub use config::ClientConfig;
pub use error::{Error, Result, ServiceError};
pub use request::{Condition, Flags, RequestBuilder};
pub use response::{KeyResponse, Node, Reply};
pub use tree::{flatten, FlattenedTree, TreeNode};

pub use etcdkv_http::{HttpExecutor, ReqwestExecutor};
