// database/lib.rs - provisioning for the ai_agent_db database: app user and collection indexes

pub mod bootstrap;
pub mod connection;
pub mod error;
pub mod indexes;
pub mod nonces;
pub mod principal;
pub mod users;

pub use bootstrap::{Bootstrap, BootstrapSummary};
pub use error::{BootstrapError, Result};
