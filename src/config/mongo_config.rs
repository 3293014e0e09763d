use std::time::Duration;

use mongodb::{options::ClientOptions, Client};

use crate::config::app_config::AppConfig;

/// Builds the process-wide MongoDB client. The driver connects lazily, so
/// this only validates the URI; the client is cloned into each repository.
pub async fn setup_mongo(config: &AppConfig) -> mongodb::error::Result<Client> {
    let mut client_options = ClientOptions::parse(&config.mongodb_uri).await?;
    client_options.app_name = Some("smart-market-api".to_string());
    client_options.connect_timeout = Some(Duration::from_secs(10));

    Client::with_options(client_options)
}
