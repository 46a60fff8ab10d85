//! # Storefront RS
//!
//! Checkout backend: carts, stock-guarded orders, and pluggable payment
//! strategies.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export GATEWAY_BASE_URL=https://pay.example.test
//! export GATEWAY_CALLBACK_SECRET=dev-callback-secret-0123
//!
//! # Run the server
//! storefront
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Products loaded: {}", state.products.list().await.len());
    info!("Payment methods: {:?}", state.strategies.methods());

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("🛒 Storefront starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("🛍  Cart: POST http://{}/cart/items", addr);
        info!("💳 Checkout: POST http://{}/order", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  🛒 Storefront RS 🛒
  ━━━━━━━━━━━━━━━━━━━
  Checkout backend
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
