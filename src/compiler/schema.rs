//! Schema metadata seam
//!
//! The compiler only needs one fact from the schema layer: the primary key
//! field of a model, which gets renamed to the store's identity key.

use std::collections::HashMap;

/// Schema registry trait for the compiler (read-only)
pub trait SchemaRegistry {
    /// Primary key field name for `model`, or `None` if it has none
    fn primary_key(&self, model: &str) -> Option<&str>;
}

/// In-memory registry keyed by model name
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaRegistry {
    primary_keys: HashMap<String, String>,
}

impl StaticSchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `pk` as the primary key of `model`
    pub fn with_primary_key(mut self, model: impl Into<String>, pk: impl Into<String>) -> Self {
        self.register(model, pk);
        self
    }

    pub fn register(&mut self, model: impl Into<String>, pk: impl Into<String>) {
        self.primary_keys.insert(model.into(), pk.into());
    }
}

impl FromIterator<(String, String)> for StaticSchemaRegistry {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            primary_keys: iter.into_iter().collect(),
        }
    }
}

impl SchemaRegistry for StaticSchemaRegistry {
    fn primary_key(&self, model: &str) -> Option<&str> {
        self.primary_keys.get(model).map(String::as_str)
    }
}
