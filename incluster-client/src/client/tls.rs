pub mod rustls_tls {
    use std::sync::Arc;

    use rustls::{pki_types::CertificateDer, ClientConfig, RootCertStore};
    use thiserror::Error;

    /// Errors from Rustls
    #[derive(Debug, Error)]
    pub enum Error {
        /// None of the cluster certificate authorities could be used as a trust anchor
        #[error("no usable certificate authority among {ignored} provided")]
        NoValidRootCertificates {
            /// Number of certificates rejected
            ignored: usize,
        },

        /// The crypto provider does not support the default protocol versions
        #[error("failed to select protocol versions: {0}")]
        ProtocolVersions(#[source] rustls::Error),
    }

    /// Create `rustls::ClientConfig` trusting the system roots plus `root_certs`.
    ///
    /// An unreadable system store leaves only the cluster certificate authorities trusted.
    pub fn rustls_client_config(root_certs: Option<&[Vec<u8>]>) -> Result<ClientConfig, Error> {
        let mut roots = system_roots();

        if let Some(ders) = root_certs {
            let (added, ignored) =
                roots.add_parsable_certificates(ders.iter().map(|der| CertificateDer::from(der.clone())));
            if added == 0 {
                return Err(Error::NoValidRootCertificates { ignored });
            }
            if ignored > 0 {
                tracing::warn!("ignored {} unparsable cluster certificate(s)", ignored);
            }
        }

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(Error::ProtocolVersions)?
            .with_root_certificates(roots)
            .with_no_client_auth();
        Ok(config)
    }

    fn system_roots() -> RootCertStore {
        let mut roots = RootCertStore::empty();
        let native = rustls_native_certs::load_native_certs();
        for err in &native.errors {
            tracing::debug!("failed to load a system certificate: {}", err);
        }
        let (added, ignored) = roots.add_parsable_certificates(native.certs);
        tracing::trace!(added, ignored, "loaded system root certificates");
        roots
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn system_roots_alone_are_enough() {
            assert!(rustls_client_config(None).is_ok());
        }

        #[test]
        fn cluster_authority_is_added_to_the_roots() {
            let ca = pem::parse(include_bytes!("testdata/ca.pem").as_slice()).unwrap().into_contents();
            assert!(rustls_client_config(Some(&[ca.clone()])).is_ok());
            // one usable authority is enough, the rest is skipped
            assert!(rustls_client_config(Some(&[b"not a certificate".to_vec(), ca])).is_ok());
        }

        #[test]
        fn unusable_cluster_authority_is_rejected() {
            let err = rustls_client_config(Some(&[b"not a certificate".to_vec()])).unwrap_err();
            assert!(matches!(err, Error::NoValidRootCertificates { ignored: 1 }));
        }
    }
}
