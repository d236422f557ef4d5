//! Orderdesk server: loads configuration from the environment, provisions the schema and serves HTTP.
//!
//! Run from repo root: `cargo run -p orderdesk-server`

use orderdesk::{app, from_env, provision, AppState, StoreAdapter};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("orderdesk=info,tower_http=info")),
        )
        .init();

    let config = from_env()?;
    tracing::info!(backend = config.backend.kind_name(), "connecting to store");
    let store = StoreAdapter::connect(&config.backend).await?;

    let schema = provision(&store).await;
    if let orderdesk::SchemaStatus::Failed(reason) = &schema {
        if config.schema_fail_fast {
            store.close().await;
            return Err(format!("schema provisioning failed: {}", reason).into());
        }
        tracing::warn!("continuing without a provisioned schema; /ready reports degraded");
    }

    let state = AppState::new(store.clone(), schema, &config.admin_password);
    let router = app(state, &config.static_dir);
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("orderdesk listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    store.close().await;
    Ok(())
}
