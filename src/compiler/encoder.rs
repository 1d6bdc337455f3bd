//! Value and document encoding
//!
//! The compiler never builds store values itself: every literal, bound
//! parameter and payload goes through an [`Encoder`]. Implementations must
//! be pure so compilations can run concurrently.

use bson::spec::BinarySubtype;
use bson::{Binary, Bson};
use chrono::DateTime;
use uuid::Uuid;

use super::errors::{EncodeError, EncodeErrorKind};
use crate::document::Value;
use crate::query::{Cast, Expr};

/// Converts AST values and payloads into store values.
///
/// Keys are checked but never renamed; mapping the primary key to the
/// identity key is the compiler's job.
pub trait Encoder {
    /// Encodes a literal, bound parameter or tagged value.
    ///
    /// # Panics
    ///
    /// May panic when a parameter index is out of range for `params`.
    fn encode_value(&self, node: &Expr, params: &[Value]) -> Result<Value, EncodeError>;

    /// Encodes pre-resolved pairs
    fn encode_values(&self, values: &[(String, Value)]) -> Result<Vec<(String, Value)>, EncodeError>;

    /// Encodes AST payload fields against `params`
    fn encode_fields(
        &self,
        fields: &[(String, Expr)],
        params: &[Value],
    ) -> Result<Vec<(String, Value)>, EncodeError> {
        let values = fields
            .iter()
            .map(|(key, node)| Ok((key.clone(), self.encode_value(node, params)?)))
            .collect::<Result<Vec<_>, EncodeError>>()?;
        self.encode_values(&values)
    }
}

/// Encoder for the store's native value set
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEncoder;

impl DefaultEncoder {
    fn check_key(key: &str) -> Result<(), EncodeError> {
        if key.is_empty() || key.starts_with('$') || key.contains('.') {
            return Err(EncodeError::new(
                Expr::Field(key.to_string()),
                EncodeErrorKind::InvalidKey,
            ));
        }
        Ok(())
    }

    /// Nested documents must satisfy the same key rules as the top level
    fn check_nested(value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::Document(doc) => doc.pairs().iter().try_for_each(|(key, inner)| {
                Self::check_key(key)?;
                Self::check_nested(inner)
            }),
            Value::Array(items) => items.iter().try_for_each(Self::check_nested),
            Value::Bson(bson) => Self::check_bson(bson),
        }
    }

    fn check_bson(bson: &Bson) -> Result<(), EncodeError> {
        match bson {
            Bson::Document(doc) => doc.iter().try_for_each(|(key, inner)| {
                Self::check_key(key)?;
                Self::check_bson(inner)
            }),
            Bson::Array(items) => items.iter().try_for_each(Self::check_bson),
            _ => Ok(()),
        }
    }
}

impl Encoder for DefaultEncoder {
    fn encode_value(&self, node: &Expr, params: &[Value]) -> Result<Value, EncodeError> {
        match node {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Param(index) => Ok(params[*index].clone()),
            Expr::Tagged { value, cast } => {
                let inner = self.encode_value(value, params)?;
                apply_cast(*cast, inner)
                    .ok_or_else(|| EncodeError::new(node.clone(), EncodeErrorKind::InvalidCast(*cast)))
            }
            _ => Err(EncodeError::new(node.clone(), EncodeErrorKind::NotAValue)),
        }
    }

    fn encode_values(&self, values: &[(String, Value)]) -> Result<Vec<(String, Value)>, EncodeError> {
        values
            .iter()
            .map(|(key, value)| {
                Self::check_key(key)?;
                Self::check_nested(value)?;
                Ok((key.clone(), value.clone()))
            })
            .collect()
    }
}

/// Applies a cast, or `None` when it does not fit the value
pub fn apply_cast(cast: Cast, value: Value) -> Option<Value> {
    let bson = match value {
        // Casts distribute over lists, e.g. `id in ^ids` with object ids
        Value::Array(items) => {
            return items
                .into_iter()
                .map(|item| apply_cast(cast, item))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array);
        }
        Value::Document(_) => return None,
        Value::Bson(bson) => bson,
    };

    let cast: Bson = match (cast, bson) {
        (Cast::ObjectId, Bson::String(hex)) => bson::oid::ObjectId::parse_str(hex).ok()?.into(),
        (Cast::ObjectId, id @ Bson::ObjectId(_)) => id,
        (Cast::Uuid, Bson::String(s)) => Bson::Binary(Binary {
            subtype: BinarySubtype::Uuid,
            bytes: Uuid::parse_str(&s).ok()?.as_bytes().to_vec(),
        }),
        (Cast::Uuid, bin @ Bson::Binary(Binary { subtype: BinarySubtype::Uuid, .. })) => bin,
        (Cast::Binary, Bson::String(s)) => Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: s.into_bytes(),
        }),
        (Cast::Binary, bin @ Bson::Binary(_)) => bin,
        (Cast::DateTime, Bson::String(s)) => {
            let dt = DateTime::parse_from_rfc3339(&s).ok()?;
            Bson::DateTime(bson::DateTime::from_millis(dt.timestamp_millis()))
        }
        (Cast::DateTime, Bson::Int64(millis)) => Bson::DateTime(bson::DateTime::from_millis(millis)),
        (Cast::DateTime, dt @ Bson::DateTime(_)) => dt,
        (Cast::Float, Bson::Int64(n)) => Bson::Double(n as f64),
        (Cast::Float, Bson::Int32(n)) => Bson::Double(f64::from(n)),
        (Cast::Float, f @ Bson::Double(_)) => f,
        _ => return None,
    };
    Some(Value::Bson(cast))
}
