use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::http::Method;
use relay::config::{ConfigBuilder, ConfigLoader, RelayConfig};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use relay_server::{AppState, cli::CliArgs, config::ServerConfig, create_router};

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let filter = match cli_args.log_level {
        Some(ref level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::from_default_env(),
    }
    .add_directive("surrealdb_core=warn".parse()?)
    .add_directive("surrealdb=warn".parse()?);

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Relay server v{}", relay::VERSION);

    let server_config = ServerConfig::from_cli_and_env(cli_args)?;
    let relay_config = load_relay_config(&server_config)?;

    let relay = relay::init(relay_config).await?;
    info!("Relay initialized");

    let app_state = Arc::new(AppState::new(relay, server_config.clone()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE]);

    let app = create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("API documentation available at http://{}/docs", addr);
    if !server_config.allow_signup {
        info!("User signup is disabled");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Persistent storage by default, then the config file (explicit or
/// discovered), then `RELAY_*` environment variables.
fn load_relay_config(server_config: &ServerConfig) -> Result<RelayConfig> {
    let defaults = ConfigBuilder::new().with_default_storage().build()?;
    let mut loader = ConfigLoader::from_defaults(defaults);

    match &server_config.config_file {
        Some(path) => {
            info!("Loading Relay configuration from {}", path.display());
            loader.load_file(path)?;
        }
        None => {
            loader.load_default_files();
        }
    }

    let config = loader.load_env().extract()?;
    if config.storage.surrealdb.engine == relay::storage::config::SurrealDBEngine::Memory {
        warn!("Using in-memory storage; data is lost when the server stops");
    }
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
