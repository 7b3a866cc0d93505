use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use incluster_client::{Credentials, LazyClient};
use serde::Serialize;

use crate::{
    access_log,
    settings::Settings,
    todos::{TodoList, TodoNames},
};

const HOMEPAGE: &str = include_str!("homepage.html");

/// Everything a handler needs, loaded once at startup and read-only afterwards
pub struct AppState {
    pub settings: Settings,
    pub credentials: Credentials,
    pub client: LazyClient,
}

impl AppState {
    /// The list endpoint of the todos in the current namespace
    fn todos_endpoint(&self) -> String {
        format!(
            "{}/apis/{}/namespaces/{}/{}?limit={}",
            self.settings.api_host,
            self.settings.api_version,
            self.credentials.namespace,
            self.settings.resource_plural,
            self.settings.resource_limit,
        )
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(homepage))
        .route("/api/todos", any(list_todos))
        .fallback(not_found)
        .layer(middleware::from_fn(access_log::log_request))
        .with_state(Arc::new(state))
}

async fn homepage() -> Response {
    (
        [(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"))],
        HOMEPAGE,
    )
        .into_response()
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 not found\n").into_response()
}

async fn list_todos(State(state): State<Arc<AppState>>) -> Response {
    let endpoint = state.todos_endpoint();
    let fetched = match state.client.get().await {
        Ok(client) => {
            client
                .request::<TodoList>(Method::GET, &endpoint, state.credentials.token.as_ref(), None)
                .await
        }
        Err(err) => Err(err),
    };

    match fetched {
        Ok(list) => send_json(
            StatusCode::OK,
            &TodoNames {
                items: list.names(),
                namespace: &state.credentials.namespace,
            },
        ),
        Err(err) => {
            tracing::warn!(%endpoint, "unable to list todos: {}", err);
            send_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                &serde_json::json!({ "error": err.to_string() }),
            )
        }
    }
}

/// Serializes `data` followed by a newline
fn send_json<T: Serialize>(status: StatusCode, data: &T) -> Response {
    match serde_json::to_string(data) {
        Ok(mut body) => {
            body.push('\n');
            (
                status,
                [(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"))],
                body,
            )
                .into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("json encoding error: {}\n", err),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_json_diff::assert_json_eq;
    use axum::{body::Body, http::HeaderMap, routing::get, Json};
    use http_body_util::BodyExt;
    use incluster_client::Config;
    use secrecy::SecretString;
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    fn settings(api_host: String) -> Settings {
        Settings {
            api_host,
            api_version: "patrickdap.com/v1".into(),
            resource_plural: "todos".into(),
            resource_limit: "500".into(),
            port: 8080,
        }
    }

    fn state(api_host: String, token: Option<&str>) -> AppState {
        let config = Config::new(api_host.parse().unwrap());
        AppState {
            settings: settings(api_host),
            credentials: Credentials {
                token: token.map(|t| SecretString::from(t.to_owned())),
                namespace: "default".into(),
            },
            client: LazyClient::new(config),
        }
    }

    // Spawns a fake API server on loopback and returns its base url
    async fn fake_api_server(api: Router) -> String {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, api).await.unwrap() });
        format!("http://{}", addr)
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, HeaderMap, String) {
        let res = app
            .oneshot(http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn endpoint_targets_current_namespace() {
        let state = state("https://kubernetes.default.svc".into(), None);
        assert_eq!(
            state.todos_endpoint(),
            "https://kubernetes.default.svc/apis/patrickdap.com/v1/namespaces/default/todos?limit=500"
        );
    }

    #[tokio::test]
    async fn homepage_is_served_at_root() {
        let app = router(state("https://kubernetes.default.svc".into(), None));
        let (status, headers, body) = call(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body, HOMEPAGE);
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let app = router(state("https://kubernetes.default.svc".into(), None));
        let (status, _, body) = call(app, "/favicon.ico").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "404 not found\n");
    }

    #[tokio::test]
    async fn todos_are_projected_to_names() {
        let api = Router::new().route(
            "/apis/patrickdap.com/v1/namespaces/default/todos",
            get(|headers: HeaderMap| async move {
                assert_eq!(headers[http::header::AUTHORIZATION], "Bearer s3cr3t");
                Json(json!({
                    "kind": "TodoList",
                    "items": [
                        { "spec": { "name": "Buy milk" } },
                        { "spec": { "name": "Walk the dog" } },
                    ]
                }))
            }),
        );
        let host = fake_api_server(api).await;

        let app = router(state(host, Some("s3cr3t")));
        let (status, headers, body) = call(app, "/api/todos").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "application/json; charset=utf-8");
        assert!(body.ends_with('\n'));
        assert_json_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({ "items": ["Buy milk", "Walk the dog"], "namespace": "default" })
        );
    }

    #[tokio::test]
    async fn api_failures_become_error_payloads() {
        let api = Router::new().route(
            "/apis/patrickdap.com/v1/namespaces/default/todos",
            get(|| async { (StatusCode::FORBIDDEN, "todos is forbidden") }),
        );
        let host = fake_api_server(api).await;

        let app = router(state(host, None));
        let (status, _, body) = call(app.clone(), "/api/todos").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_json_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({ "error": "unable to perform request: the request was not authorized\ntodos is forbidden" })
        );

        // the process keeps serving after a failed request
        let (status, _, _) = call(app, "/").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_resource_is_reported_generically() {
        let host = fake_api_server(Router::new()).await;

        let app = router(state(host, None));
        let (status, _, body) = call(app, "/api/todos").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_json_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({ "error": "resource not found" })
        );
    }
}
