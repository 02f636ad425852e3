// database/nonces/model.rs - model and indexes for the wallet_nonces collection

use super::WALLET_NONCES_COLLECTION;
use crate::indexes::IndexSpec;
use crate::users::model::normalize_address;
use ethers::types::Address;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Expired nonces are cleaned up by the application, there is no TTL index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletNonceModel {
    pub wallet_address: String,
    pub nonce: String,
    pub expires_at: DateTime,
    pub used: bool,
    pub created_at: DateTime,
}

impl WalletNonceModel {
    pub fn new(wallet_address: Address, nonce: &str, valid_for: Duration) -> Self {
        let now = DateTime::now();
        let valid_for_millis = i64::try_from(valid_for.as_millis()).unwrap_or(i64::MAX);
        let expires_at =
            DateTime::from_millis(now.timestamp_millis().saturating_add(valid_for_millis));

        Self {
            wallet_address: normalize_address(&wallet_address),
            nonce: nonce.to_string(),
            expires_at,
            used: false,
            created_at: now,
        }
    }
}

pub fn wallet_nonce_indexes() -> Vec<IndexSpec> {
    vec![
        IndexSpec::ascending(WALLET_NONCES_COLLECTION, "wallet_address"),
        IndexSpec::ascending(WALLET_NONCES_COLLECTION, "nonce"),
        IndexSpec::ascending(WALLET_NONCES_COLLECTION, "expires_at"),
        IndexSpec::ascending(WALLET_NONCES_COLLECTION, "created_at"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_offset_from_creation() {
        let nonce = WalletNonceModel::new(Address::zero(), "abc123", Duration::from_secs(300));
        assert_eq!(
            nonce.expires_at.timestamp_millis() - nonce.created_at.timestamp_millis(),
            300_000
        );
        assert!(!nonce.used);
    }

    #[test]
    fn huge_validity_saturates_instead_of_overflowing() {
        let nonce = WalletNonceModel::new(Address::zero(), "abc123", Duration::MAX);
        assert_eq!(nonce.expires_at.timestamp_millis(), i64::MAX);
    }

    #[test]
    fn nonce_indexes_are_plain() {
        assert!(wallet_nonce_indexes()
            .iter()
            .all(|i| !i.unique && !i.sparse && i.collection == WALLET_NONCES_COLLECTION));
    }
}
