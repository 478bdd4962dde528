//! # etcdkv-http
//!
//! HTTP transport for the etcdkv keys client.
//!
//! The client builds transport-neutral [`HttpRequest`] descriptors and hands
//! them to an [`HttpExecutor`]. [`ReqwestExecutor`] is the blocking
//! production implementation:
//!
//! ```ignore
//! use etcdkv_http::{HttpExecutor, HttpRequest, ReqwestExecutor};
//!
//! let executor = ReqwestExecutor::connect("http://127.0.0.1:2379", ReqwestExecutor::DEFAULT_TIMEOUT)?;
//! let response = executor.execute(&HttpRequest::get("/v2/keys/foo"))?;
//! println!("{}", response.text());
//! ```
//!
//! Enable the `mock` feature for `executor::mock::MockExecutor`, which
//! records requests and replays canned responses.

pub mod error;
pub mod executor;
pub mod types;

pub use error::Error;
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use types::{HttpRequest, HttpResponse, Method, FORM_URLENCODED};
