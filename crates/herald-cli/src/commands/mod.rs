use std::sync::Arc;

use herald_core::{ApiClient, HeraldConfig};

pub mod config;
pub mod prefs;
pub mod reminder;
pub mod run;

pub(crate) type CliResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
}

/// Backend client from config, with an optional URL override.
pub(crate) fn api_client(config: &HeraldConfig, override_url: Option<String>) -> Arc<ApiClient> {
    let base = override_url.unwrap_or_else(|| config.api.base_url.clone());
    Arc::new(ApiClient::new(base))
}
