// database/error.rs - error type shared by the provisioning steps

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Every variant is fatal for the procedure that raised it.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to connect to database: {0}")]
    Connection(#[source] mongodb::error::Error),

    #[error("application user '{username}' already exists")]
    DuplicatePrincipal {
        username: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("failed to create application user '{username}': {source}")]
    CreatePrincipal {
        username: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("failed to read application user '{username}': {source}")]
    ReadPrincipal {
        username: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("application user '{username}' has no readWrite role on '{database}'")]
    PrincipalNotProvisioned { username: String, database: String },

    #[error("failed to create index on {collection}.{field}: {source}")]
    CreateIndex {
        collection: String,
        field: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("failed to list indexes for {collection}: {source}")]
    ListIndexes {
        collection: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("index set differs from declarations ({missing} missing, {unexpected} unexpected)")]
    IndexMismatch { missing: usize, unexpected: usize },

    #[error("failed to decode server reply: {0}")]
    Decode(#[from] mongodb::bson::de::Error),
}

/// Server error code carried by a failed command, if the failure came from the server.
pub(crate) fn command_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        mongodb::error::ErrorKind::Command(command_error) => Some(command_error.code),
        _ => None,
    }
}
