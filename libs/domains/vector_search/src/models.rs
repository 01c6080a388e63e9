use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{VectorError, VectorResult};

/// Metadata attached to a stored vector.
///
/// Values are expected to be scalars or strings; nested structures are
/// passed through untouched but most stores reject them.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Metadata key holding the record class a vector was built from
pub const MODEL_CLASS_KEY: &str = "model_class";
/// Metadata key holding the record primary key
pub const MODEL_ID_KEY: &str = "model_id";
/// Metadata key holding the embedded text
pub const TEXT_KEY: &str = "text";

/// An embedding with identity and metadata.
///
/// Immutable once built: a changed record produces a new `Vector` that
/// overwrites the stored one by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VectorFields")]
pub struct Vector {
    id: String,
    values: Vec<f32>,
    metadata: Metadata,
}

#[derive(Deserialize)]
struct VectorFields {
    id: String,
    values: Vec<f32>,
    #[serde(default)]
    metadata: Metadata,
}

impl TryFrom<VectorFields> for Vector {
    type Error = VectorError;

    fn try_from(fields: VectorFields) -> VectorResult<Self> {
        Ok(Vector::new(fields.id, fields.values)?.with_metadata(fields.metadata))
    }
}

impl Vector {
    pub fn new(id: impl Into<String>, values: Vec<f32>) -> VectorResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(VectorError::Validation(
                "Vector id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            id,
            values,
            metadata: Metadata::new(),
        })
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }
}

/// How a store reports closeness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreKind {
    /// Higher is better
    Similarity,
    /// Lower is better
    Distance,
}

/// A single hit returned by a store query, best-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub metadata: Metadata,
    pub score: f32,
    pub score_kind: ScoreKind,
}

impl SearchResult {
    pub fn new(
        id: impl Into<String>,
        metadata: Metadata,
        score: f32,
        score_kind: ScoreKind,
    ) -> Self {
        Self {
            id: id.into(),
            metadata,
            score,
            score_kind,
        }
    }

    /// The `(model_class, model_id)` pair written by record sync, if present.
    ///
    /// Numeric ids are accepted and rendered in decimal.
    pub fn origin(&self) -> Option<(&str, String)> {
        let class = self.metadata.get(MODEL_CLASS_KEY)?.as_str()?;
        let id = match self.metadata.get(MODEL_ID_KEY)? {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some((class, id))
    }
}

/// Static configuration block for one logical driver name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverConfig {
    values: HashMap<String, String>,
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`; builder style
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Set `key` only when a value is present
    pub fn with_opt(self, key: impl Into<String>, value: Option<String>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn require(&self, key: &str) -> VectorResult<&str> {
        self.get(key)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| VectorError::Config(format!("missing required key '{}'", key)))
    }

    /// The concrete driver this block selects, when it names one
    pub fn driver(&self) -> Option<&str> {
        self.get("driver")
    }
}

impl<K, V> FromIterator<(K, V)> for DriverConfig
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vector_rejects_empty_id() {
        let err = Vector::new("", vec![0.1]).unwrap_err();
        assert!(matches!(err, VectorError::Validation(_)));
    }

    #[test]
    fn test_deserialized_vector_is_validated() {
        let vector: Vector =
            serde_json::from_value(json!({"id": "Post:1", "values": [0.5]})).unwrap();
        assert_eq!(vector.id(), "Post:1");
        assert!(vector.metadata().is_empty());

        let err =
            serde_json::from_value::<Vector>(json!({"id": "", "values": [0.5]})).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_vector_accessors() {
        let mut metadata = Metadata::new();
        metadata.insert("lang".to_string(), json!("en"));

        let vector = Vector::new("Post:1", vec![0.1, 0.2, 0.3])
            .unwrap()
            .with_metadata(metadata.clone());

        assert_eq!(vector.id(), "Post:1");
        assert_eq!(vector.dimension(), 3);
        assert_eq!(vector.metadata(), &metadata);
    }

    #[test]
    fn test_search_result_origin() {
        let mut metadata = Metadata::new();
        metadata.insert(MODEL_CLASS_KEY.to_string(), json!("Post"));
        metadata.insert(MODEL_ID_KEY.to_string(), json!(42));
        let hit = SearchResult::new("Post:42", metadata, 0.9, ScoreKind::Similarity);
        assert_eq!(hit.origin(), Some(("Post", "42".to_string())));

        let hit = SearchResult::new("x", Metadata::new(), 0.1, ScoreKind::Distance);
        assert_eq!(hit.origin(), None);
    }

    #[test]
    fn test_driver_config_require() {
        let config = DriverConfig::new()
            .with("driver", "pinecone")
            .with("api_key", "")
            .with_opt("host", None);

        assert_eq!(config.driver(), Some("pinecone"));
        assert!(config.require("api_key").is_err());
        assert!(config.require("host").is_err());
        assert_eq!(config.get_or("collection", "docs"), "docs");
    }
}
