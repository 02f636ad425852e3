// database/bootstrap.rs - one-time provisioning of the target database

use crate::connection::ping;
use crate::error::{BootstrapError, Result};
use crate::indexes::{self, IndexReport, IndexSpec};
use crate::principal::{self, AppPrincipal, RoleBinding};
use mongodb::Database;
use serde::Serialize;
use tracing::info;

/// What a completed run provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSummary {
    pub database: String,
    pub username: String,
    pub index_count: usize,
}

/// Provisioned state as read back from the server.
#[derive(Debug, Serialize)]
pub struct Verification {
    pub database: String,
    pub username: String,
    pub roles: Vec<RoleBinding>,
    pub indexes: IndexReport,
}

impl Verification {
    pub fn check(&self) -> Result<()> {
        if self.indexes.is_match() {
            Ok(())
        } else {
            Err(BootstrapError::IndexMismatch {
                missing: self.indexes.missing.len(),
                unexpected: self.indexes.unexpected.len(),
            })
        }
    }
}

/// Provisions the application user and indexes on one database. Steps run in order
/// and the first failure ends the run; nothing already done is rolled back.
pub struct Bootstrap {
    database: Database,
    username: String,
    indexes: Vec<IndexSpec>,
}

impl Bootstrap {
    pub fn new(database: Database, username: &str) -> Self {
        Self {
            database,
            username: username.to_string(),
            indexes: indexes::declarations(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn index_declarations(&self) -> &[IndexSpec] {
        &self.indexes
    }

    #[tracing::instrument(skip(self), fields(database = %self.database.name()))]
    pub async fn select_database(&self) -> Result<()> {
        ping(&self.database).await?;
        info!("Connected to database {}", self.database.name());
        Ok(())
    }

    #[tracing::instrument(skip(self, password), fields(username = %self.username))]
    pub async fn create_principal(&self, password: &str) -> Result<()> {
        let principal = AppPrincipal::new(&self.username, password);
        principal::create_app_user(&self.database, &principal).await
    }

    #[tracing::instrument(skip(self), fields(count = self.indexes.len()))]
    pub async fn create_indexes(&self) -> Result<()> {
        indexes::create_indexes(&self.database, &self.indexes).await
    }

    /// Selects the database, creates the user, then creates every index.
    pub async fn run(&self, password: &str) -> Result<BootstrapSummary> {
        self.select_database().await?;
        self.create_principal(password).await?;
        self.create_indexes().await?;

        info!("Database {} initialized", self.database.name());
        Ok(self.summary())
    }

    pub fn summary(&self) -> BootstrapSummary {
        BootstrapSummary {
            database: self.database.name().to_string(),
            username: self.username.clone(),
            index_count: self.indexes.len(),
        }
    }

    /// Reads back the user's roles and the index set. A user without readWrite on
    /// the database is an error; index drift is reported and left to `Verification::check`.
    pub async fn verify(&self) -> Result<Verification> {
        self.select_database().await?;
        let roles = principal::verify_app_user(&self.database, &self.username).await?;
        let report = indexes::inspect(&self.database, &self.indexes).await?;

        Ok(Verification {
            database: self.database.name().to_string(),
            username: self.username.clone(),
            roles,
            indexes: report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::Client;

    #[tokio::test]
    async fn summary_names_database_user_and_index_count() {
        // The driver does not connect until the first operation
        let client = Client::with_uri_str("mongodb://localhost:27017")
            .await
            .unwrap();
        let bootstrap = Bootstrap::new(client.database("ai_agent_db"), "ai_agent_user");

        assert_eq!(
            bootstrap.summary(),
            BootstrapSummary {
                database: "ai_agent_db".to_string(),
                username: "ai_agent_user".to_string(),
                index_count: 8,
            }
        );
    }

    #[test]
    fn check_fails_on_missing_index() {
        let verification = Verification {
            database: "ai_agent_db".to_string(),
            username: "ai_agent_user".to_string(),
            roles: vec![RoleBinding::read_write("ai_agent_db")],
            indexes: IndexReport {
                missing: vec![IndexSpec::ascending("users", "email").unique().sparse()],
                unexpected: Vec::new(),
            },
        };

        assert!(matches!(
            verification.check(),
            Err(BootstrapError::IndexMismatch {
                missing: 1,
                unexpected: 0
            })
        ));
    }
}
