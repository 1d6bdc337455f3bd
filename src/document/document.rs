//! Compiled documents
//!
//! A compiled document is either empty or an ordered list of pairs.
//! Keys keep insertion order and may repeat: two sibling predicates on the
//! same field are both kept, so a key-unique map is never used for a
//! non-empty result.

use std::fmt;

use serde::de::{Deserialize, Deserializer, Error as _};
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::value::Value;

/// Ordered association document
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Document {
    /// No constraints / select everything
    #[default]
    Empty,
    /// Non-empty, insertion ordered, duplicates allowed
    Pairs(Vec<(String, Value)>),
}

impl Document {
    /// Creates an empty document
    pub fn new() -> Self {
        Document::Empty
    }

    /// Builds a document from pairs; an empty list yields `Document::Empty`
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        if pairs.is_empty() {
            Document::Empty
        } else {
            Document::Pairs(pairs)
        }
    }

    /// Creates a single-pair document
    pub fn single(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Document::Pairs(vec![(key.into(), value.into())])
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Document::Empty)
    }

    pub fn len(&self) -> usize {
        self.pairs().len()
    }

    /// Borrow the pairs (empty slice for `Document::Empty`)
    pub fn pairs(&self) -> &[(String, Value)] {
        match self {
            Document::Empty => &[],
            Document::Pairs(pairs) => pairs,
        }
    }

    pub fn into_pairs(self) -> Vec<(String, Value)> {
        match self {
            Document::Empty => Vec::new(),
            Document::Pairs(pairs) => pairs,
        }
    }

    /// Keys in insertion order, repeats included
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pairs().iter().map(|(k, _)| k.as_str())
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.pairs().iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Every value stored under `key`, in order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.pairs()
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Appends a pair, keeping any earlier pair with the same key
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let pair = (key.into(), value.into());
        match self {
            Document::Empty => *self = Document::Pairs(vec![pair]),
            Document::Pairs(pairs) => pairs.push(pair),
        }
    }

    /// Concatenates two documents, preserving order and duplicates
    pub fn concat(self, other: Document) -> Document {
        match (self, other) {
            (Document::Empty, doc) | (doc, Document::Empty) => doc,
            (Document::Pairs(mut left), Document::Pairs(right)) => {
                left.extend(right);
                Document::Pairs(left)
            }
        }
    }

    /// Renders as JSON in insertion order
    pub fn to_json(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl From<(String, Value)> for Document {
    fn from(pair: (String, Value)) -> Self {
        Document::Pairs(vec![pair])
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Document::from_pairs(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_pairs().into_iter()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let pairs = self.pairs();
        let mut map = serializer.serialize_map(Some(pairs.len()))?;
        for (key, value) in pairs {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Document(doc) => Ok(doc),
            other => Err(D::Error::custom(format!(
                "expected a document, found {}",
                other.type_name()
            ))),
        }
    }
}

/// Builds a [`Document`] from `key => value` pairs.
///
/// ```ignore
/// let filter = doc! { "age" => doc! { "$gt" => 18 }, "age" => doc! { "$lt" => 65 } };
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::document::Document::Empty
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::document::Document::from_pairs(vec![
            $((::std::string::String::from($key), $crate::document::Value::from($value))),+
        ])
    };
}
