//! Northwind API server. Configuration comes from the environment (and `.env`).

use northwind_api::{
    build_router, ensure_database_exists, ensure_tables, AppConfig, AppState, MemoryStore,
    PgStore, StoreFactory, StoreKind,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("northwind_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    match config.store {
        StoreKind::Postgres => {
            ensure_database_exists(&config.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.database_url)
                .await?;
            if config.migrate {
                ensure_tables(&pool, &config.schema).await?;
            }
            serve(PgStore::new(pool, config.schema.as_str()), &config).await
        }
        StoreKind::Memory => {
            tracing::warn!("using the in-memory store; data is lost on exit");
            let store = MemoryStore::with_max_sessions(config.max_connections as usize);
            serve(store, &config).await
        }
    }
}

async fn serve<F: StoreFactory>(
    store: F,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(AppState::new(store), config.body_limit);
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
