use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yatube_api::{
    config::{ConfigError, Env},
    server::{self, ServerState},
};
use yatube_db::{DbError, client::DbClient, memory::MemoryStore, store::Store};

#[derive(Debug, Error)]
enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Error setting up the database: {0}")]
    Database(#[from] DbError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "yatube_api=debug,\
                yatube_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn open_store(env: &Env) -> Result<Arc<dyn Store>, InitError> {
    let Some(database_url) = &env.database_url else {
        warn!("DATABASE_URL is not set, keeping all data in memory");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let client = DbClient::connect(database_url, env.database_max_connections).await?;
    client.migrate().await?;

    Ok(Arc::new(client))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Could not listen for Ctrl-C, shutting down");
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = Env::load()?;

    let store = open_store(&env).await?;
    let app = server::app(ServerState::new(store));

    let server_address = env.socket_address();
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
