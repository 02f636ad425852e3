// database/principal.rs - the application user and its role on the target database

use crate::error::{command_code, BootstrapError, Result};
use mongodb::{
    bson::{doc, from_document, Document},
    Database,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

pub const READ_WRITE_ROLE: &str = "readWrite";

// Location51003 on current servers, DuplicateKey on servers before 4.2
const USER_ALREADY_EXISTS: i32 = 51003;
const DUPLICATE_KEY: i32 = 11000;

/// Login identity the application connects with.
#[derive(Clone)]
pub struct AppPrincipal {
    pub username: String,
    password: String,
}

impl AppPrincipal {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for AppPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppPrincipal")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub role: String,
    pub db: String,
}

impl RoleBinding {
    pub fn read_write(database: &str) -> Self {
        Self {
            role: READ_WRITE_ROLE.to_string(),
            db: database.to_string(),
        }
    }

    fn to_document(&self) -> Document {
        doc! { "role": self.role.as_str(), "db": self.db.as_str() }
    }
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    roles: Vec<RoleBinding>,
}

#[derive(Debug, Deserialize)]
struct UsersInfoReply {
    users: Vec<UserInfo>,
}

/// `createUser` command granting `principal` readWrite on `database` only.
pub fn create_user_command(principal: &AppPrincipal, database: &str) -> Document {
    doc! {
        "createUser": principal.username.as_str(),
        "pwd": principal.password(),
        "roles": [RoleBinding::read_write(database).to_document()],
    }
}

pub fn is_duplicate_user_code(code: i32) -> bool {
    code == USER_ALREADY_EXISTS || code == DUPLICATE_KEY
}

/// Creates the user in `database`, which is also its authentication database.
/// An existing user with the same name is an error; nothing is updated in place.
pub async fn create_app_user(database: &Database, principal: &AppPrincipal) -> Result<()> {
    let command = create_user_command(principal, database.name());

    match database.run_command(command, None).await {
        Ok(_) => {
            info!(
                "Created user {} with {} on {}",
                principal.username,
                READ_WRITE_ROLE,
                database.name()
            );
            Ok(())
        }
        Err(source) if command_code(&source).is_some_and(is_duplicate_user_code) => {
            warn!("User {} already exists", principal.username);
            Err(BootstrapError::DuplicatePrincipal {
                username: principal.username.clone(),
                source,
            })
        }
        Err(source) => Err(BootstrapError::CreatePrincipal {
            username: principal.username.clone(),
            source,
        }),
    }
}

/// Roles held by `username` in `database`, or `None` if no such user exists there.
pub async fn user_roles(database: &Database, username: &str) -> Result<Option<Vec<RoleBinding>>> {
    let reply = database
        .run_command(doc! { "usersInfo": username }, None)
        .await
        .map_err(|source| BootstrapError::ReadPrincipal {
            username: username.to_string(),
            source,
        })?;

    let reply: UsersInfoReply = from_document(reply)?;
    Ok(reply.users.into_iter().next().map(|user| user.roles))
}

/// Fails unless `username` exists in `database` with readWrite on it.
pub async fn verify_app_user(database: &Database, username: &str) -> Result<Vec<RoleBinding>> {
    let expected = RoleBinding::read_write(database.name());

    match user_roles(database, username).await? {
        Some(roles) if roles.contains(&expected) => Ok(roles),
        _ => Err(BootstrapError::PrincipalNotProvisioned {
            username: username.to_string(),
            database: database.name().to_string(),
        }),
    }
}
