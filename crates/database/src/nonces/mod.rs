pub mod model;

pub const WALLET_NONCES_COLLECTION: &str = "wallet_nonces";
