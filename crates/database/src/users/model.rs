// database/users/model.rs - model and indexes for the users collection

use super::USERS_COLLECTION;
use crate::indexes::IndexSpec;
use ethers::types::Address;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    #[default]
    Metamask,
    Okx,
}

// Optional fields are left out of the document entirely so the sparse indexes on
// username and email skip users that never set them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserModel {
    pub wallet_address: String,
    pub wallet_type: WalletType,
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl UserModel {
    /// New active, unverified user on Ethereum mainnet.
    pub fn new(wallet_address: Address) -> Self {
        let now = DateTime::now();
        Self {
            wallet_address: normalize_address(&wallet_address),
            wallet_type: WalletType::default(),
            chain_id: 1,
            username: None,
            email: None,
            avatar_url: None,
            is_active: true,
            is_verified: false,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }
}

/// Lower-case `0x`-prefixed hex, the form wallet addresses are stored and looked up in.
pub fn normalize_address(address: &Address) -> String {
    format!("{:#x}", address)
}

pub fn user_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::ascending(USERS_COLLECTION, "wallet_address").unique(),
        IndexSpec::ascending(USERS_COLLECTION, "username")
            .unique()
            .sparse(),
        IndexSpec::ascending(USERS_COLLECTION, "email")
            .unique()
            .sparse(),
        IndexSpec::ascending(USERS_COLLECTION, "created_at"),
    ]
}
