// database/indexes.rs - index declarations for the users and wallet_nonces collections

use crate::error::{command_code, BootstrapError, Result};
use crate::{nonces, users};
use futures::TryStreamExt;
use mongodb::{
    bson::{Bson, Document},
    options::IndexOptions,
    Database, IndexModel,
};
use serde::Serialize;
use tracing::{debug, info, warn};

// Returned by listIndexes when the collection has never been written to
const NAMESPACE_NOT_FOUND: i32 = 26;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
    // text, 2dsphere, hashed, ...
    Special(String),
}

impl Direction {
    fn to_bson(&self) -> Bson {
        match self {
            Direction::Ascending => Bson::Int32(1),
            Direction::Descending => Bson::Int32(-1),
            Direction::Special(kind) => Bson::String(kind.clone()),
        }
    }

    fn from_bson(value: &Bson) -> Self {
        let numeric = match value {
            Bson::Int32(n) => Some(f64::from(*n)),
            Bson::Int64(n) => Some(*n as f64),
            Bson::Double(n) => Some(*n),
            _ => None,
        };
        match numeric {
            Some(n) if n < 0.0 => Direction::Descending,
            Some(_) => Direction::Ascending,
            None => Direction::Special(
                value
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string()),
            ),
        }
    }
}

/// One index on one collection: ordered key fields plus the constraint options that
/// make up its identity on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub collection: String,
    pub keys: Vec<(String, Direction)>,
    pub unique: bool,
    pub sparse: bool,
}

impl IndexSpec {
    pub fn ascending(collection: &str, field: &str) -> Self {
        Self {
            collection: collection.to_string(),
            keys: vec![(field.to_string(), Direction::Ascending)],
            unique: false,
            sparse: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Documents missing the field are left out of the index, so a unique sparse
    /// index still admits any number of them.
    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }

    /// Comma-separated key fields, used in logs and errors.
    pub fn fields(&self) -> String {
        self.keys
            .iter()
            .map(|(field, _)| field.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn key_document(&self) -> Document {
        let mut keys = Document::new();
        for (field, direction) in &self.keys {
            keys.insert(field.clone(), direction.to_bson());
        }
        keys
    }

    pub fn to_model(&self) -> IndexModel {
        let mut options = IndexOptions::default();
        if self.unique {
            options.unique = Some(true);
        }
        if self.sparse {
            options.sparse = Some(true);
        }

        IndexModel::builder()
            .keys(self.key_document())
            .options(options)
            .build()
    }

    /// Reads back a server index. Returns `None` for the implicit `_id` index.
    pub fn from_model(collection: &str, model: &IndexModel) -> Option<Self> {
        let name = model.options.as_ref().and_then(|o| o.name.as_deref());
        if name == Some("_id_") {
            return None;
        }

        let keys = model
            .keys
            .iter()
            .map(|(field, value)| (field.clone(), Direction::from_bson(value)))
            .collect::<Vec<_>>();
        if keys.len() == 1 && keys[0].0 == "_id" {
            return None;
        }

        let option = |get: fn(&IndexOptions) -> Option<bool>| {
            model.options.as_ref().and_then(get).unwrap_or(false)
        };

        Some(Self {
            collection: collection.to_string(),
            keys,
            unique: option(|o| o.unique),
            sparse: option(|o| o.sparse),
        })
    }
}

/// All index declarations, in the order they are created.
pub fn declarations() -> Vec<IndexSpec> {
    let mut specs = users::model::user_indexes();
    specs.extend(nonces::model::wallet_nonce_indexes());
    specs
}

/// Names of the collections that `specs` touch, in first-seen order.
pub fn collections(specs: &[IndexSpec]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for spec in specs {
        if !names.contains(&spec.collection) {
            names.push(spec.collection.clone());
        }
    }
    names
}

pub async fn create_index(database: &Database, spec: &IndexSpec) -> Result<()> {
    debug!(
        "Creating index on {}.{} (unique: {}, sparse: {})",
        spec.collection,
        spec.fields(),
        spec.unique,
        spec.sparse
    );

    database
        .collection::<Document>(&spec.collection)
        .create_index(spec.to_model(), None)
        .await
        .map(|_| ())
        .map_err(|source| BootstrapError::CreateIndex {
            collection: spec.collection.clone(),
            field: spec.fields(),
            source,
        })
}

/// Creates each index in turn and stops at the first failure. Indexes that already
/// exist with the same keys and options are left untouched by the server.
pub async fn create_indexes(database: &Database, specs: &[IndexSpec]) -> Result<()> {
    for spec in specs {
        create_index(database, spec).await?;
    }
    info!("Created {} indexes on {}", specs.len(), database.name());
    Ok(())
}

pub async fn list_indexes(database: &Database, collection: &str) -> Result<Vec<IndexSpec>> {
    let to_error = |source: mongodb::error::Error| BootstrapError::ListIndexes {
        collection: collection.to_string(),
        source,
    };

    let cursor = match database
        .collection::<Document>(collection)
        .list_indexes(None)
        .await
    {
        Ok(cursor) => cursor,
        Err(e) if command_code(&e) == Some(NAMESPACE_NOT_FOUND) => {
            warn!("Collection {} does not exist yet", collection);
            return Ok(Vec::new());
        }
        Err(e) => return Err(to_error(e)),
    };

    let models: Vec<IndexModel> = cursor.try_collect().await.map_err(to_error)?;

    Ok(models
        .iter()
        .filter_map(|model| IndexSpec::from_model(collection, model))
        .collect())
}

/// Difference between the declared index set and what the server holds.
#[derive(Debug, Default, Serialize)]
pub struct IndexReport {
    pub missing: Vec<IndexSpec>,
    pub unexpected: Vec<IndexSpec>,
}

impl IndexReport {
    pub fn is_match(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Order-insensitive comparison of declared against observed indexes.
pub fn compare(declared: &[IndexSpec], observed: &[IndexSpec]) -> IndexReport {
    IndexReport {
        missing: declared
            .iter()
            .filter(|spec| !observed.contains(spec))
            .cloned()
            .collect(),
        unexpected: observed
            .iter()
            .filter(|spec| !declared.contains(spec))
            .cloned()
            .collect(),
    }
}

/// Lists the indexes of every declared collection and compares them to `declared`.
pub async fn inspect(database: &Database, declared: &[IndexSpec]) -> Result<IndexReport> {
    let mut observed = Vec::new();
    for collection in collections(declared) {
        observed.extend(list_indexes(database, &collection).await?);
    }
    Ok(compare(declared, &observed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    fn summary(specs: &[IndexSpec]) -> Vec<(&str, String, bool, bool)> {
        specs
            .iter()
            .map(|s| (s.collection.as_str(), s.fields(), s.unique, s.sparse))
            .collect()
    }

    #[test]
    fn declarations_are_in_creation_order() {
        let specs = declarations();
        assert_eq!(
            summary(&specs),
            vec![
                ("users", "wallet_address".to_string(), true, false),
                ("users", "username".to_string(), true, true),
                ("users", "email".to_string(), true, true),
                ("users", "created_at".to_string(), false, false),
                ("wallet_nonces", "wallet_address".to_string(), false, false),
                ("wallet_nonces", "nonce".to_string(), false, false),
                ("wallet_nonces", "expires_at".to_string(), false, false),
                ("wallet_nonces", "created_at".to_string(), false, false),
            ]
        );
        assert!(specs
            .iter()
            .all(|s| s.keys.len() == 1 && s.keys[0].1 == Direction::Ascending));
    }

    #[test]
    fn collections_keep_first_seen_order() {
        assert_eq!(collections(&declarations()), vec!["users", "wallet_nonces"]);
    }

    #[test]
    fn model_carries_keys_and_only_set_options() {
        let model = IndexSpec::ascending("users", "email")
            .unique()
            .sparse()
            .to_model();
        assert_eq!(model.keys, doc! { "email": 1 });
        let options = model.options.expect("options");
        assert_eq!(options.unique, Some(true));
        assert_eq!(options.sparse, Some(true));

        let plain = IndexSpec::ascending("wallet_nonces", "nonce").to_model();
        let options = plain.options.expect("options");
        assert_eq!(options.unique, None);
        assert_eq!(options.sparse, None);
    }

    #[test]
    fn from_model_skips_id_index() {
        let mut options = IndexOptions::default();
        options.name = Some("_id_".to_string());
        let id = IndexModel::builder()
            .keys(doc! { "_id": 1 })
            .options(options)
            .build();
        assert_eq!(IndexSpec::from_model("users", &id), None);
    }

    #[test]
    fn from_model_reads_numeric_directions_and_options() {
        let mut options = IndexOptions::default();
        options.name = Some("username_1".to_string());
        options.unique = Some(true);
        options.sparse = Some(true);
        let model = IndexModel::builder()
            .keys(doc! { "username": 1.0 })
            .options(options)
            .build();

        assert_eq!(
            IndexSpec::from_model("users", &model),
            Some(IndexSpec::ascending("users", "username").unique().sparse())
        );

        let descending = IndexModel::builder()
            .keys(doc! { "created_at": -1_i64 })
            .build();
        let spec = IndexSpec::from_model("users", &descending).expect("spec");
        assert_eq!(spec.keys[0].1, Direction::Descending);
        assert!(!spec.unique);
    }

    #[test]
    fn compare_ignores_order() {
        let declared = declarations();
        let mut observed = declared.clone();
        observed.reverse();
        assert!(compare(&declared, &observed).is_match());
    }

    #[test]
    fn compare_flags_option_drift() {
        let declared = declarations();
        let mut observed = declared.clone();
        // username without the sparse flag
        observed[1].sparse = false;
        observed.push(IndexSpec::ascending("users", "avatar_url"));

        let report = compare(&declared, &observed);
        assert!(!report.is_match());
        assert_eq!(
            report.missing,
            vec![IndexSpec::ascending("users", "username").unique().sparse()]
        );
        assert_eq!(report.unexpected.len(), 2);
    }
}
