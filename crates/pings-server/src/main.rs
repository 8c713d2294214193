mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use pings_api::AppStateInner;
use pings_blob::{LocalBlobStore, UrlSigner};
use pings_db::Database;
use pings_notify::{HttpRelay, Hub, Notifier};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pings=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.auth_secret.is_none() {
        warn!("PINGS_AUTH_SECRET not set, API is open to unauthenticated callers");
    }

    let db = Arc::new(Database::open(&config.db_path)?);
    let signer = UrlSigner::new(&config.signing_secret)?;
    let blobs = Arc::new(LocalBlobStore::new(config.storage_dir.clone(), config.public_url.clone(), signer).await?);

    let notifier: Arc<dyn Notifier> = match &config.relay_url {
        Some(url) => {
            info!("Publishing notifications via relay {}", url);
            Arc::new(HttpRelay::new(url.as_str())?)
        }
        None => {
            info!("No relay configured, publishing to the in-process hub");
            Arc::new(Hub::new())
        }
    };

    match &config.family_topic {
        Some(topic) => info!("Family alerts go to topic {}", topic),
        None => info!("PINGS_FAMILY_TOPIC not set, family alerts disabled"),
    }

    let state = AppStateInner::new(db, blobs.clone(), notifier, config.api());

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let app = pings_api::router(state)
        .merge(pings_blob::routes::routes(blobs))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Pings server listening on {}", addr);
    info!("Signed URLs are issued under {} and live {}s", config.public_url, config.url_expiry.as_secs());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
            },
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
