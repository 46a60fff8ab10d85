//! # Application State
//!
//! Shared state for the axum application: stores, services, the payment
//! strategy registry, and the session table.

use crate::auth::SessionTable;
use shop_core::{PaymentStrategyRegistry, ProductCatalog};
use shop_payments::GatewayConfig;
use shop_persist::{
    CartService, CartStore, CheckoutService, LoggingNotifier, OrderNotifier, OrderStore,
    ProductStore, WebhookNotifier,
};
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Base URL of this service
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Where order-completed events are POSTed (the mailer's inbox);
    /// unset means log-only
    pub order_webhook_url: Option<String>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            order_webhook_url: std::env::var("ORDER_WEBHOOK_URL").ok(),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Product table (seeded from config/products.toml)
    pub products: Arc<ProductStore>,
    /// Cart reconciliation
    pub carts: Arc<CartService>,
    /// Checkout orchestration
    pub checkout: Arc<CheckoutService>,
    /// Payment strategy lookup
    pub strategies: Arc<PaymentStrategyRegistry>,
    /// Bearer-token to user-id resolution
    pub sessions: Arc<SessionTable>,
}

impl AppState {
    /// Wire everything from the environment and config files
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let catalog = load_product_catalog()?;
        let sessions = load_session_table();
        let gateway = GatewayConfig::from_env()?;

        let notifier: Arc<dyn OrderNotifier> = match &config.order_webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url)),
            None => Arc::new(LoggingNotifier),
        };

        Self::build(config, catalog, sessions, gateway, notifier)
    }

    /// Assemble state from explicit parts (also the test entry point)
    pub fn build(
        config: AppConfig,
        catalog: ProductCatalog,
        sessions: SessionTable,
        gateway: GatewayConfig,
        notifier: Arc<dyn OrderNotifier>,
    ) -> anyhow::Result<Self> {
        let products = Arc::new(ProductStore::from_catalog(catalog));
        let cart_store = Arc::new(CartStore::new());
        let orders = Arc::new(OrderStore::new());
        let strategies = Arc::new(shop_payments::default_registry(&gateway)?);

        let carts = Arc::new(CartService::new(products.clone(), cart_store.clone()));
        let checkout = Arc::new(CheckoutService::new(
            products.clone(),
            cart_store,
            orders,
            strategies.clone(),
            notifier,
        ));

        Ok(Self {
            config,
            products,
            carts,
            checkout,
            strategies,
            sessions: Arc::new(sessions),
        })
    }
}

/// Load the product seed catalog from a config file
fn load_product_catalog() -> anyhow::Result<ProductCatalog> {
    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = ProductCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} products from {}", catalog.products.len(), path);
            return Ok(catalog);
        }
    }

    tracing::warn!("No product catalog found, starting with an empty store");
    Ok(ProductCatalog::new())
}

/// Load the dev session table; an absent file means every request is 401
fn load_session_table() -> SessionTable {
    let config_paths = [
        "config/sessions.toml",
        "../config/sessions.toml",
        "../../config/sessions.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            match SessionTable::from_toml(&content) {
                Ok(table) => {
                    tracing::info!("Loaded {} sessions from {}", table.len(), path);
                    return table;
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path, e);
                }
            }
        }
    }

    tracing::warn!("No session table found; all authenticated routes will reject");
    SessionTable::default()
}
