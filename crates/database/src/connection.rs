// database/connection.rs - client construction and the connectivity check

use crate::error::{BootstrapError, Result};
use mongodb::{bson::doc, options::ClientOptions, Client, Database};
use std::time::Duration;
use tracing::debug;

const APP_NAME: &str = "ai-agent-db-admin";

/// Builds a client for `uri`. The driver connects lazily, so this only fails on a
/// malformed URI or an unresolvable SRV record.
pub async fn connect(uri: &str, server_selection_timeout: Duration) -> Result<Client> {
    let mut options = ClientOptions::parse(uri)
        .await
        .map_err(BootstrapError::Connection)?;
    options.app_name = Some(APP_NAME.to_string());
    options.server_selection_timeout = Some(server_selection_timeout);

    Client::with_options(options).map_err(BootstrapError::Connection)
}

/// Round-trips a `ping` against `database` to prove the server is reachable and the
/// credentials in the URI are accepted.
pub async fn ping(database: &Database) -> Result<()> {
    debug!("Pinging database {}", database.name());
    database
        .run_command(doc! { "ping": 1 }, None)
        .await
        .map(|_| ())
        .map_err(BootstrapError::Connection)
}
