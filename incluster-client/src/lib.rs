//! Crate for talking to the Kubernetes API from inside a pod
//!
//! This crate resolves the pod's mounted service account (bearer token, certificate
//! authority bundle and namespace), builds a TLS client trusting the cluster's CA on top of
//! the system roots, and performs authenticated JSON requests whose failures are classified
//! into a small [`Error`] taxonomy.
//!
//! Outside of a cluster the same code paths degrade to an unauthenticated client using the
//! system trust store and the `default` namespace.
//!
//! # Example
//!
//! ```rust,no_run
//! use incluster_client::{config::{self, ClusterContext}, LazyClient};
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Decide once whether we are scheduled by a cluster, then load everything we need.
//!     let context = ClusterContext::from_env();
//!     let startup = config::initialize(&context, "https://kubernetes.default.svc")?;
//!
//!     let client = LazyClient::new(startup.config);
//!     let endpoint = format!(
//!         "https://kubernetes.default.svc/api/v1/namespaces/{}/configmaps",
//!         startup.credentials.namespace
//!     );
//!     let list: Value = client
//!         .get()
//!         .await?
//!         .request(http::Method::GET, &endpoint, startup.credentials.token.as_ref(), None)
//!         .await?;
//!     println!("{list}");
//!     Ok(())
//! }
//! ```
//!
//! For more details, see:
//!
//! - [`config`] for in-cluster detection and credential loading
//! - [`Client`](crate::client::Client) for the request executor
#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;

#[doc(inline)]
pub use client::{Client, LazyClient};
#[doc(inline)]
pub use config::{ClusterContext, Config, Credentials};
#[doc(inline)]
pub use error::{ConfigError, Error};

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
