use std::path::Path;

use secrecy::SecretString;

use super::utils;
use crate::error::ConfigError;

// Set by the kubelet in every container it schedules
pub(crate) const SERVICE_HOSTENV: &str = "KUBERNETES_SERVICE_HOST";

// Mounted credential files
pub(crate) const SERVICE_TOKENFILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
pub(crate) const SERVICE_CERTFILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";
pub(crate) const SERVICE_DEFAULT_NS: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Namespace used when not running in a cluster
pub(crate) const DEFAULT_NAMESPACE: &str = "default";

/// Returns whether the orchestrator injected its service host variable.
///
/// The mounted credential files are deliberately not probed: a stale mount must not
/// flip the process into in-cluster mode.
pub fn is_in_cluster() -> bool {
    in_cluster_from(std::env::var_os(SERVICE_HOSTENV))
}

pub(crate) fn in_cluster_from(hostenv: Option<std::ffi::OsString>) -> bool {
    hostenv.is_some_and(|host| !host.is_empty())
}

/// Returns the bearer token at `path`, `None` when the file is empty.
pub fn load_token(path: &Path) -> Result<Option<SecretString>, ConfigError> {
    let token = utils::read_file_to_string(path).map_err(|source| ConfigError::ReadToken {
        path: path.into(),
        source,
    })?;
    Ok((!token.is_empty()).then(|| SecretString::from(token)))
}

/// Returns the namespace at `path`, verbatim.
pub fn load_default_ns(path: &Path) -> Result<String, ConfigError> {
    utils::read_file_to_string(path).map_err(|source| ConfigError::ReadNamespace {
        path: path.into(),
        source,
    })
}

/// Returns the DER encoded certificates of the bundle at `path`.
pub fn load_cert(path: &Path) -> Result<Vec<Vec<u8>>, ConfigError> {
    let bundle = utils::read_file(path).map_err(|source| ConfigError::ReadCertificateBundle {
        path: path.into(),
        source,
    })?;
    let certs = utils::certs(&bundle).map_err(|source| ConfigError::ParseCertificates {
        path: path.into(),
        source,
    })?;
    if certs.is_empty() {
        return Err(ConfigError::NoCertificates { path: path.into() });
    }
    Ok(certs)
}
