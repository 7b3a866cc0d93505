//! An authenticated JSON client for the Kubernetes API
//!
//! The [`Client`] performs exactly one attempt per call and classifies the outcome into
//! [`Error`](crate::Error) variants, so callers can match on the kind of failure instead of
//! parsing messages.
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{header::AUTHORIZATION, HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Full};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tower::{buffer::Buffer, util::BoxService, BoxError, Layer, Service, ServiceExt};
use tower_http::map_response_body::MapResponseBodyLayer;

use crate::{Config, Error, Result};

mod builder;
mod config_ext;
mod tls;

pub use builder::{ClientBuilder, GenericService};
pub use config_ext::ConfigExt;
pub use tls::rustls_tls::Error as RustlsTlsError;

/// Request body sent by the [`Client`]
pub type Body = Full<Bytes>;

/// Response body handed back by [`Client::send`]
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

pub(crate) fn box_body<B>(body: B) -> ResponseBody
where
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    body.map_err(Into::into).boxed_unsync()
}

/// Client for connecting with a Kubernetes cluster.
///
/// Cheap to clone; every clone shares the same connection pool. Use [`Client::try_from`]
/// with a [`Config`] for the default TLS stack, or [`LazyClient`] to build it on first use.
#[derive(Clone)]
pub struct Client {
    // - `Buffer` for cheap clone
    // - `BoxService` for dynamic response future type
    inner: Buffer<Request<Body>, BoxFuture<'static, Result<Response<ResponseBody>, BoxError>>>,
}

impl Client {
    /// Create a [`Client`] using a custom `Service` stack.
    ///
    /// To create with the default stack with a [`Config`], use
    /// [`Client::try_from`].
    pub fn new<S, B>(service: S) -> Self
    where
        S: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let service = MapResponseBodyLayer::new(box_body)
            .layer(service)
            .map_err(|e| e.into());
        Self {
            inner: Buffer::new(BoxService::new(service), 1024),
        }
    }

    /// Perform a raw HTTP request and return the raw response back.
    ///
    /// Only fails when no response was obtained.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<ResponseBody>> {
        let endpoint = request.uri().to_string();
        let mut svc = self.inner.clone();
        let res = svc
            .ready()
            .await
            .map_err(Error::Service)?
            .call(request)
            .await
            .map_err(|source| Error::Transport { endpoint, source })?;
        Ok(res)
    }

    /// Perform an HTTP request against `endpoint` and deserialize a `200 OK` response
    /// as JSON to some known type.
    ///
    /// The `Authorization` header is only set when a `token` is given. The response body is
    /// read to completion whatever the status, then classified:
    ///
    /// - `200` decodes into `T`, or fails with [`Error::Decode`]
    /// - `401` and `403` fail with [`Error::Unauthorized`]
    /// - `404` fails with [`Error::NotFound`]
    /// - anything else fails with [`Error::UnexpectedStatus`]
    pub async fn request<T>(
        &self,
        method: Method,
        endpoint: &str,
        token: Option<&SecretString>,
        body: Option<Vec<u8>>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = build_request(method, endpoint, token, body)?;
        let res = self.send(request).await?;
        let status = res.status();
        let body = res
            .into_body()
            .collect()
            .await
            .map_err(|source| Error::Transport {
                endpoint: endpoint.to_owned(),
                source,
            })?
            .to_bytes();
        let body = handle_api_errors(status, body)?;

        serde_json::from_slice(&body).map_err(|source| {
            tracing::debug!(%endpoint, body_len = body.len(), "undecodable response: {}", source);
            Error::Decode {
                endpoint: endpoint.to_owned(),
                source,
            }
        })
    }
}

fn build_request(
    method: Method,
    endpoint: &str,
    token: Option<&SecretString>,
    body: Option<Vec<u8>>,
) -> Result<Request<Body>> {
    let uri = endpoint.parse::<http::Uri>().map_err(|source| Error::InvalidUri {
        endpoint: endpoint.to_owned(),
        source,
    })?;
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token.filter(|t| !t.expose_secret().is_empty()) {
        let mut value = HeaderValue::try_from(format!("Bearer {}", token.expose_secret()))
            .map_err(Error::InvalidBearerToken)?;
        value.set_sensitive(true);
        builder = builder.header(AUTHORIZATION, value);
    }
    builder
        .body(Body::from(body.unwrap_or_default()))
        .map_err(Error::BuildRequest)
}

/// Kubernetes returned error handling
///
/// Anything but `200 OK` is a failure; the raw body is kept where it explains the failure.
fn handle_api_errors(status: StatusCode, body: Bytes) -> Result<Bytes> {
    match status {
        StatusCode::OK => Ok(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            tracing::debug!("Unauthorized: {}", status);
            Err(Error::Unauthorized {
                body: String::from_utf8_lossy(&body).into_owned(),
            })
        }
        StatusCode::NOT_FOUND => Err(Error::NotFound),
        _ => {
            tracing::debug!("Unsuccessful: {}", status);
            Err(Error::UnexpectedStatus {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            })
        }
    }
}

impl TryFrom<Config> for Client {
    type Error = Error;

    /// Builds a default [`Client`] from a [`Config`], see [`ClientBuilder`] if more customization is required
    fn try_from(config: Config) -> Result<Self> {
        Ok(ClientBuilder::try_from(config)?.build())
    }
}

/// A [`Client`] built on first use, then shared for the lifetime of the process.
///
/// Every successful [`LazyClient::get`] returns the same instance.
pub struct LazyClient {
    config: Config,
    client: OnceCell<Client>,
}

impl LazyClient {
    /// Defer building a client from `config`.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Return the shared client, building it if this is the first call.
    ///
    /// A failed build is not cached; the next call tries again.
    pub async fn get(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                tracing::debug!(cluster_url = %self.config.cluster_url, "building https client");
                Client::try_from(self.config.clone())
            })
            .await
    }
}
