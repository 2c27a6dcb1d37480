//! Field policy shared by every record of the schema layer.
//!
//! - required field malformed or missing: the record fails to decode
//! - optional field absent or null: `None`
//! - optional field malformed (wrong shape, unknown enum string, bad date): `None`
//!   plus a warning and a `decode_degraded_total` tick
//! - mapping fields (`strict`): absent is `None`, a non-object always fails

use serde_json::{Map, Value};
use tracing::warn;

use crate::{expect_id, expect_optional, DecodeError, PathSeg, Wire};

/// Read-only view over one wire object being decoded as `entity`.
pub struct RecordReader<'a> {
    entity: &'static str,
    map: &'a Map<String, Value>,
}

impl<'a> RecordReader<'a> {
    pub fn new(entity: &'static str, value: &'a Value) -> Result<Self, DecodeError> {
        match value {
            Value::Object(map) => Ok(Self { entity, map }),
            other => Err(DecodeError::shape("object", other).in_entity(entity)),
        }
    }

    pub fn entity(&self) -> &'static str { self.entity }

    /// Present and not null.
    pub fn has(&self, key: &str) -> bool { self.map.get(key).map(|v| !v.is_null()).unwrap_or(false) }

    pub fn raw(&self, key: &str) -> Option<&'a Value> { self.map.get(key).filter(|v| !v.is_null()) }

    pub fn required<T: Wire>(&self, key: &'static str) -> Result<T, DecodeError> {
        self.required_with(key, T::from_wire)
    }

    pub fn required_with<T>(&self, key: &'static str, decode: impl FnOnce(&Value) -> Result<T, DecodeError>) -> Result<T, DecodeError> {
        let v = self.raw(key).ok_or_else(|| DecodeError::missing(key).in_entity(self.entity))?;
        decode(v).map_err(|e| e.within(PathSeg::Key(key.to_string())).in_entity(self.entity))
    }

    /// Required identifier; JSON numbers are rendered as decimal strings.
    pub fn required_id(&self, key: &'static str) -> Result<String, DecodeError> {
        self.required_with(key, expect_id)
    }

    pub fn optional<T: Wire>(&self, key: &'static str) -> Option<T> {
        self.optional_with(key, T::from_wire)
    }

    pub fn optional_with<T>(&self, key: &'static str, decode: impl FnOnce(&Value) -> Result<T, DecodeError>) -> Option<T> {
        match expect_optional(self.map, key, decode) {
            Ok(v) => v,
            Err(err) => {
                self.degrade(key, &err);
                None
            }
        }
    }

    pub fn optional_id(&self, key: &'static str) -> Option<String> {
        self.optional_with(key, expect_id)
    }

    /// Optional list of identifiers (numbers or strings).
    pub fn optional_ids(&self, key: &'static str) -> Option<Vec<String>> {
        self.optional_with(key, |v| crate::expect_list(v, expect_id))
    }

    /// Optional presence, strict shape: a malformed value fails the whole record.
    pub fn strict<T: Wire>(&self, key: &'static str) -> Result<Option<T>, DecodeError> {
        expect_optional(self.map, key, T::from_wire).map_err(|e| e.in_entity(self.entity))
    }

    fn degrade(&self, key: &'static str, err: &DecodeError) {
        warn!(entity = self.entity, field = key, error = %err, "malformed optional field; decoded as None");
        metrics::counter!("decode_degraded_total", 1u64, "entity" => self.entity, "field" => key);
    }
}

/// Builds the wire object of a record. `None` values are never written.
#[derive(Debug, Default)]
pub struct RecordWriter {
    map: Map<String, Value>,
}

impl RecordWriter {
    pub fn new() -> Self { Self::default() }

    pub fn put<T: Wire>(&mut self, key: &str, value: &T) -> &mut Self {
        self.map.insert(key.to_string(), value.to_wire());
        self
    }

    /// Omits the key for `None` and for values with no JSON form (non-finite floats).
    pub fn put_opt<T: Wire>(&mut self, key: &str, value: &Option<T>) -> &mut Self {
        match crate::encode_optional(value.as_ref(), T::to_wire) {
            None | Some(Value::Null) => {}
            Some(v) => {
                self.map.insert(key.to_string(), v);
            }
        }
        self
    }

    pub fn finish(self) -> Value { Value::Object(self.map) }
}
