use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use incluster_client::{config, ClusterContext, LazyClient};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod access_log;
mod routes;
mod settings;
mod todos;

use routes::AppState;
use settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,incluster_client=debug")),
        )
        .init();

    let settings = Settings::parse().normalized();
    let context = ClusterContext::from_env();

    // No serving without a valid identity
    let startup = config::initialize(&context, &settings.api_host)
        .context("unable to retrieve service account credentials for pod")?;
    let client = LazyClient::new(startup.config);
    client.get().await.context("unable to obtain https client")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let app = routes::router(AppState {
        settings,
        credentials: startup.credentials,
        client,
    });

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("unable to start server on {}", addr))?;
    tracing::info!("Starting server. Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| format!("server on {} failed", addr))?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("unable to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("unable to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutting down");
}
