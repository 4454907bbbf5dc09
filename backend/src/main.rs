//! Food Cart API server.

use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;

use food_cart_backend::{logging, routes, AppState, Config, JwksClient, SqliteUserStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    if env::args().any(|a| a == "--version" || a == "-V") {
        println!("food-cart-backend {}", VERSION);
        return Ok(());
    }

    // Load configuration
    let config = Config::load().map_err(|e| {
        format!(
            "{}. Make sure config.toml exists or set FOOD_CART__IDENTITY__PROJECT_ID.",
            e
        )
    })?;

    logging::init_tracing(&config.logging.level);

    tracing::info!("Starting Food Cart backend {}", VERSION);

    let project_id = config.identity.resolve_project_id()?;
    let verifier = JwksClient::new(&config.identity.jwks_url, &project_id).await?;
    tracing::info!("Verifying ID tokens for issuer {}", verifier.issuer());

    let store = SqliteUserStore::new(&config.database.url)?;

    if config.admins.phone_numbers.is_empty() {
        tracing::warn!("No super admins configured; admin endpoints will refuse every caller");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, Arc::new(verifier), Arc::new(store)));
    tracing::info!(
        super_admins = state.users.admins().len(),
        "Loaded admin allow-list"
    );

    let app = routes::app(state);

    tracing::info!("Listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
