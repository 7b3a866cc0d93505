//! Error handling in [`incluster_client`][crate]
use std::path::PathBuf;

use http::StatusCode;
use thiserror::Error;
use tower::BoxError;

pub use crate::client::RustlsTlsError;

/// Possible errors when talking to the Kubernetes API
///
/// Every variant except [`Error::Config`] and [`Error::RustlsTls`] is scoped to a single
/// request: the caller should report it and carry on serving.
#[derive(Error, Debug)]
pub enum Error {
    /// The API server answered `401 Unauthorized` or `403 Forbidden`
    ///
    /// The body is the server's explanation of the denial, kept verbatim.
    #[error("unable to perform request: the request was not authorized\n{body}")]
    Unauthorized {
        /// Raw response body
        body: String,
    },

    /// The API server answered `404 Not Found`
    #[error("resource not found")]
    NotFound,

    /// The API server answered with any other status than `200 OK`
    #[error("unexpected status code \"{status}\" received:\n{body}")]
    UnexpectedStatus {
        /// Status code and canonical reason
        status: StatusCode,
        /// Raw response body
        body: String,
    },

    /// The request never produced a response, or its body could not be read
    ///
    /// Covers DNS resolution, refused connections, TLS handshake failures and timeouts.
    #[error("unable to perform https request to {endpoint:?}: {source}")]
    Transport {
        /// Requested URL
        endpoint: String,
        /// Underlying cause
        #[source]
        source: BoxError,
    },

    /// A `200 OK` response did not decode into the requested type
    #[error("unable to decode JSON output for {endpoint:?}: {source}")]
    Decode {
        /// Requested URL
        endpoint: String,
        /// Underlying cause
        #[source]
        source: serde_json::Error,
    },

    /// Failed to construct a URI.
    #[error("unable to create https request to {endpoint:?}: {source}")]
    InvalidUri {
        /// Rejected URL
        endpoint: String,
        /// Underlying cause
        #[source]
        source: http::uri::InvalidUri,
    },

    /// Failed to build request
    #[error("failed to build request: {0}")]
    BuildRequest(#[source] http::Error),

    /// The bearer token cannot be sent as a header value
    #[error("invalid bearer token: {0}")]
    InvalidBearerToken(#[source] http::header::InvalidHeaderValue),

    /// The client service stack stopped accepting requests
    #[error("ServiceError: {0}")]
    Service(#[source] BoxError),

    /// Startup configuration error
    #[error("unable to load cluster configuration: {0}")]
    Config(#[source] ConfigError),

    /// An error with configuring TLS occured
    #[error("unable to configure tls: {0}")]
    RustlsTls(#[source] RustlsTlsError),
}

impl Error {
    /// Whether the error only concerns the request that produced it
    ///
    /// Startup errors (credentials, trust anchor, TLS setup) return `false`.
    pub fn is_request_scoped(&self) -> bool {
        !matches!(self, Error::Config(_) | Error::RustlsTls(_))
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

#[derive(Error, Debug)]
// Redundant with the error messages and machine names
#[allow(missing_docs)]
/// Possible errors when loading the service account at startup
pub enum ConfigError {
    #[error("unable to read token file {path:?}: {source}")]
    ReadToken {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to read namespace file {path:?}: {source}")]
    ReadNamespace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to read certificate bundle {path:?}: {source}")]
    ReadCertificateBundle {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse PEM-encoded certificates in {path:?}: {source}")]
    ParseCertificates {
        path: PathBuf,
        #[source]
        source: pem::PemError,
    },

    #[error("no certificates found in {path:?}")]
    NoCertificates { path: PathBuf },

    #[error("failed to parse cluster url {url:?}: {source}")]
    ParseClusterUrl {
        url: String,
        #[source]
        source: http::uri::InvalidUri,
    },
}
