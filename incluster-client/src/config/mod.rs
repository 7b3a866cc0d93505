//! Cluster detection and the pod's [service account credentials](https://kubernetes.io/docs/tasks/run-application/access-api-from-pod/#directly-accessing-the-rest-api).
//!
//! # Usage
//! Decide the execution mode once with [`ClusterContext::from_env`], then hand it to
//! [`initialize`] which loads everything the process needs before it starts serving.
//! Any error returned from there is meant to abort startup.
mod incluster_config;
mod utils;

use std::{path::PathBuf, time::Duration};

use secrecy::SecretString;

use crate::error::ConfigError;
pub use incluster_config::is_in_cluster;

/// Locations of the files the orchestrator mounts for the service account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAccountPaths {
    /// Bearer token
    pub token: PathBuf,
    /// PEM bundle of the cluster certificate authority
    pub ca_bundle: PathBuf,
    /// Namespace the pod runs in
    pub namespace: PathBuf,
}

impl Default for ServiceAccountPaths {
    fn default() -> Self {
        Self {
            token: incluster_config::SERVICE_TOKENFILE.into(),
            ca_bundle: incluster_config::SERVICE_CERTFILE.into(),
            namespace: incluster_config::SERVICE_DEFAULT_NS.into(),
        }
    }
}

/// Whether the process was scheduled by a cluster, and where its credentials live.
///
/// Determined once per process and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterContext {
    in_cluster: bool,
    paths: ServiceAccountPaths,
}

impl ClusterContext {
    /// Probe the environment for the in-cluster marker, using the well-known mount paths.
    pub fn from_env() -> Self {
        let in_cluster = is_in_cluster();
        tracing::debug!(in_cluster, "probed cluster environment");
        Self {
            in_cluster,
            paths: ServiceAccountPaths::default(),
        }
    }

    /// A context for a pod whose service account is mounted at `paths`.
    pub fn in_cluster(paths: ServiceAccountPaths) -> Self {
        Self {
            in_cluster: true,
            paths,
        }
    }

    /// A context for a process running outside of any cluster.
    pub fn out_of_cluster() -> Self {
        Self {
            in_cluster: false,
            paths: ServiceAccountPaths::default(),
        }
    }

    /// Whether the process runs inside a cluster
    pub fn is_in_cluster(&self) -> bool {
        self.in_cluster
    }

    /// Load the bearer token.
    ///
    /// Outside of a cluster there is no token and nothing is read.
    pub fn load_token(&self) -> Result<Option<SecretString>, ConfigError> {
        if !self.in_cluster {
            return Ok(None);
        }
        incluster_config::load_token(&self.paths.token)
    }

    /// Load the current namespace.
    ///
    /// Outside of a cluster this is always `default` and nothing is read.
    pub fn load_namespace(&self) -> Result<String, ConfigError> {
        if !self.in_cluster {
            return Ok(incluster_config::DEFAULT_NAMESPACE.to_owned());
        }
        incluster_config::load_default_ns(&self.paths.namespace)
    }

    /// Load the DER encoded certificates of the cluster certificate authority.
    ///
    /// Outside of a cluster the system trust store is used alone, so this returns `None`.
    pub fn load_trust_anchor(&self) -> Result<Option<Vec<Vec<u8>>>, ConfigError> {
        if !self.in_cluster {
            return Ok(None);
        }
        incluster_config::load_cert(&self.paths.ca_bundle).map(Some)
    }
}

/// Identity of the process towards the API server
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Bearer token, `None` when requests should go out unauthenticated
    pub token: Option<SecretString>,
    /// The namespace the process operates in
    pub namespace: String,
}

impl Credentials {
    /// Load the token and namespace for `context`.
    pub fn load(context: &ClusterContext) -> Result<Self, ConfigError> {
        Ok(Self {
            token: context.load_token()?,
            namespace: context.load_namespace()?,
        })
    }
}

/// Configuration object for building a [`Client`][crate::Client]
///
/// Holds the cluster url and the extra certificate authorities to trust.
#[derive(Debug, Clone)]
pub struct Config {
    /// The configured cluster url
    pub cluster_url: http::Uri,
    /// Extra root certificates in DER, trusted on top of the system roots
    pub root_cert: Option<Vec<Vec<u8>>>,
    /// Timeout for establishing connections. `None` means no timeout.
    pub connect_timeout: Option<Duration>,
    /// Timeout for reading responses. `None` means no timeout.
    pub read_timeout: Option<Duration>,
    /// Timeout for writing requests. `None` means no timeout.
    pub write_timeout: Option<Duration>,
}

impl Config {
    /// Construct a new config where only the `cluster_url` is set by the user,
    /// trusting the system roots and imposing no timeouts.
    pub fn new(cluster_url: http::Uri) -> Self {
        Self {
            cluster_url,
            root_cert: None,
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
        }
    }

    /// Create configuration for `cluster_url`, trusting the cluster certificate authority
    /// when running in a cluster.
    pub fn from_context(context: &ClusterContext, cluster_url: &str) -> Result<Self, ConfigError> {
        let cluster_url = cluster_url
            .parse::<http::Uri>()
            .map_err(|source| ConfigError::ParseClusterUrl {
                url: cluster_url.to_owned(),
                source,
            })?;
        Ok(Self {
            root_cert: context.load_trust_anchor()?,
            ..Self::new(cluster_url)
        })
    }
}

/// Everything loaded before the process starts serving
#[derive(Debug)]
pub struct Startup {
    /// Client configuration
    pub config: Config,
    /// Token and namespace
    pub credentials: Credentials,
}

/// Load credentials and client configuration once, at startup.
///
/// There is no degraded mode: the caller is expected to treat an error as fatal.
pub fn initialize(context: &ClusterContext, cluster_url: &str) -> Result<Startup, ConfigError> {
    let credentials = Credentials::load(context)?;
    let config = Config::from_context(context, cluster_url)?;
    tracing::debug!(
        namespace = %credentials.namespace,
        authenticated = credentials.token.is_some(),
        extra_roots = config.root_cert.as_ref().map_or(0, Vec::len),
        "loaded cluster credentials"
    );
    Ok(Startup { config, credentials })
}
