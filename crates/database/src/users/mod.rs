pub mod model;

pub const USERS_COLLECTION: &str = "users";
