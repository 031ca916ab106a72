//! Offline unit tests for eia-db pool configuration and row types.
//! These tests do not require a live database connection.

use eia_core::{AppConfig, Environment, LlmSettings, Product};
use eia_db::{PoolConfig, ProductRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5010),
        log_level: "info".to_string(),
        cors_origin: None,
        catalog_path: PathBuf::from("./config/catalog.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        llm: LlmSettings {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            timeout_secs: 60,
            max_retries: 2,
        },
        recent_analysis_hours: 24,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`ProductRow`] maps onto the API
/// product using its public id. No database required.
#[test]
fn product_row_converts_to_product() {
    use chrono::Utc;
    use uuid::Uuid;

    let public_id = Uuid::new_v4();
    let row = ProductRow {
        id: 42_i64,
        public_id,
        name: "Recycled Paper Notebook".to_string(),
        description: "100% recycled paper notebook.".to_string(),
        category: "Home Goods".to_string(),
        materials: vec!["Recycled Paper".to_string(), "Vegetable Ink".to_string()],
        manufacturing_location: "Canada".to_string(),
        additional_details: None,
        image_url: Some("https://via.placeholder.com/300x200".to_string()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let product = Product::from(row);
    assert_eq!(product.id, public_id);
    assert_eq!(product.materials_list(), "Recycled Paper, Vegetable Ink");
    assert!(product.additional_details.is_none());
}
