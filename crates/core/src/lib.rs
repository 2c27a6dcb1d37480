//! FFBB core: wire value kernel, record reader/writer and field presets.
//!
//! Wire values are plain `serde_json::Value` trees. Everything here is a pure
//! function of its input: decoders never mutate the value they read and
//! encoders always build fresh values.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};
use smallvec::SmallVec;

pub mod fields;
mod record;
mod time;

pub use record::{RecordReader, RecordWriter};
pub use time::Timestamp;

// Re-exported for `wire_enum!` expansions in downstream crates.
pub use serde_json;

pub mod prelude {
    pub use super::{
        DateOrText, DecodeError, Record, RecordReader, RecordWriter, Ref, Tally, Timestamp, Wire, WireEnum,
    };
}

// ---------------- Key paths ----------------

/// One step into a wire value: an object key or a list position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSeg {
    Key(String),
    Index(usize),
}

/// Location of a value inside a wire document, e.g. `phases[0].poules[2].id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPath(SmallVec<[PathSeg; 4]>);

impl KeyPath {
    pub fn root() -> Self { Self::default() }

    pub fn is_root(&self) -> bool { self.0.is_empty() }

    pub fn segments(&self) -> &[PathSeg] { &self.0 }

    fn prepend(&mut self, seg: PathSeg) { self.0.insert(0, seg); }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() { return f.write_str("(root)"); }
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                PathSeg::Key(k) => {
                    if i > 0 { f.write_str(".")?; }
                    f.write_str(k)?;
                }
                PathSeg::Index(n) => write!(f, "[{}]", n)?,
            }
        }
        Ok(())
    }
}

// ---------------- Errors ----------------

/// Decode failure. Carries the offending key path and the expected shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("{path}: expected {expected}, found {found}")]
    Shape { path: KeyPath, expected: &'static str, found: &'static str },
    #[error("{path}: unknown {expected} value {value:?}")]
    UnknownVariant { path: KeyPath, expected: &'static str, value: String },
    #[error("{path}: invalid {expected} {value:?}")]
    Invalid { path: KeyPath, expected: &'static str, value: String },
    #[error("{path}: no shape of {expected} matched ({})", .attempts.join("; "))]
    NoUnionMatch { path: KeyPath, expected: &'static str, attempts: Vec<String> },
    #[error("{path}: required field missing")]
    Missing { path: KeyPath },
    #[error("{entity}: {source}")]
    InEntity { entity: &'static str, source: Box<DecodeError> },
}

impl DecodeError {
    pub fn shape(expected: &'static str, found: &Value) -> Self {
        DecodeError::Shape { path: KeyPath::root(), expected, found: kind_of(found) }
    }

    pub fn invalid(expected: &'static str, value: impl Into<String>) -> Self {
        DecodeError::Invalid { path: KeyPath::root(), expected, value: value.into() }
    }

    pub fn missing(key: &str) -> Self {
        let mut path = KeyPath::root();
        path.prepend(PathSeg::Key(key.to_string()));
        DecodeError::Missing { path }
    }

    /// Path of the innermost failure.
    pub fn path(&self) -> &KeyPath {
        match self {
            DecodeError::Shape { path, .. }
            | DecodeError::UnknownVariant { path, .. }
            | DecodeError::Invalid { path, .. }
            | DecodeError::NoUnionMatch { path, .. }
            | DecodeError::Missing { path } => path,
            DecodeError::InEntity { source, .. } => source.path(),
        }
    }

    /// Outermost entity the failure was reported for, if any.
    pub fn entity(&self) -> Option<&'static str> {
        match self {
            DecodeError::InEntity { entity, .. } => Some(entity),
            _ => None,
        }
    }

    /// Prefix the error path with one more segment (used while unwinding out of containers).
    pub fn within(mut self, seg: PathSeg) -> Self {
        match &mut self {
            DecodeError::Shape { path, .. }
            | DecodeError::UnknownVariant { path, .. }
            | DecodeError::Invalid { path, .. }
            | DecodeError::NoUnionMatch { path, .. }
            | DecodeError::Missing { path } => path.prepend(seg),
            DecodeError::InEntity { source, .. } => {
                let inner = std::mem::replace(source.as_mut(), DecodeError::Missing { path: KeyPath::root() });
                **source = inner.within(seg);
            }
        }
        self
    }

    pub fn in_entity(self, entity: &'static str) -> Self {
        DecodeError::InEntity { entity, source: Box::new(self) }
    }
}

/// Short JSON kind name used in error messages.
pub fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

// ---------------- Traits ----------------

/// A type with a fixed wire shape: decodes from and encodes to a wire value.
pub trait Wire: Sized {
    /// Human readable shape, used in error messages.
    const SHAPE: &'static str;

    fn from_wire(value: &Value) -> Result<Self, DecodeError>;

    fn to_wire(&self) -> Value;
}

/// A named record (entity) of the schema layer.
pub trait Record: Wire {
    const ENTITY: &'static str;
}

/// Closed mapping between wire strings and enum variants. Declare with [`wire_enum!`].
pub trait WireEnum: Sized + Copy + 'static {
    const NAME: &'static str;
    const VARIANTS: &'static [(&'static str, Self)];

    fn wire_str(&self) -> &'static str;
}

/// Declare an enum decoded from a closed set of wire strings.
///
/// ```
/// ffbb_core::wire_enum! {
///     pub enum Side { Home => "domicile", Away => "exterieur" }
/// }
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name { $( $(#[$vmeta])* $variant ),+ }

        impl $crate::WireEnum for $name {
            const NAME: &'static str = stringify!($name);
            const VARIANTS: &'static [(&'static str, Self)] = &[ $( ($wire, $name::$variant) ),+ ];

            fn wire_str(&self) -> &'static str {
                match self { $( $name::$variant => $wire ),+ }
            }
        }

        impl $crate::Wire for $name {
            const SHAPE: &'static str = stringify!($name);

            fn from_wire(value: &$crate::serde_json::Value) -> Result<Self, $crate::DecodeError> {
                $crate::expect_enum(value)
            }

            fn to_wire(&self) -> $crate::serde_json::Value {
                $crate::serde_json::Value::String($crate::WireEnum::wire_str(self).to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::WireEnum::wire_str(self))
            }
        }
    };
}

// ---------------- Decode primitives ----------------

pub fn expect_str(value: &Value) -> Result<String, DecodeError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(DecodeError::shape("string", other)),
    }
}

/// Integer only: a float such as `3.5` is rejected, as is a numeric string.
pub fn expect_i64(value: &Value) -> Result<i64, DecodeError> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| DecodeError::shape("integer", value)),
        other => Err(DecodeError::shape("integer", other)),
    }
}

pub fn expect_u64(value: &Value) -> Result<u64, DecodeError> {
    match value {
        Value::Number(n) => n.as_u64().ok_or_else(|| DecodeError::shape("unsigned integer", value)),
        other => Err(DecodeError::shape("unsigned integer", other)),
    }
}

/// Any JSON number. JSON has a single number kind so integers are accepted.
pub fn expect_f64(value: &Value) -> Result<f64, DecodeError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| DecodeError::shape("number", value)),
        other => Err(DecodeError::shape("number", other)),
    }
}

pub fn expect_bool(value: &Value) -> Result<bool, DecodeError> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(DecodeError::shape("bool", other)),
    }
}

/// Identifier: a JSON string as-is, or a JSON integer rendered as its decimal string.
/// Only declared identifier fields go through here.
pub fn expect_id(value: &Value) -> Result<String, DecodeError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() { return Ok(i.to_string()); }
            if let Some(u) = n.as_u64() { return Ok(u.to_string()); }
            Err(DecodeError::shape("identifier", value))
        }
        other => Err(DecodeError::shape("identifier", other)),
    }
}

pub fn expect_datetime(value: &Value) -> Result<Timestamp, DecodeError> {
    let s = match value {
        Value::String(s) => s,
        other => return Err(DecodeError::shape("date-time string", other)),
    };
    Timestamp::parse(s).ok_or_else(|| DecodeError::invalid("date-time", s.as_str()))
}

pub fn expect_uuid(value: &Value) -> Result<uuid::Uuid, DecodeError> {
    let s = match value {
        Value::String(s) => s,
        other => return Err(DecodeError::shape("uuid string", other)),
    };
    uuid::Uuid::parse_str(s).map_err(|_| DecodeError::invalid("uuid", s.as_str()))
}

/// `None` when `key` is absent or null; otherwise the inner decoder's result.
pub fn expect_optional<T>(
    map: &Map<String, Value>,
    key: &str,
    decode: impl FnOnce(&Value) -> Result<T, DecodeError>,
) -> Result<Option<T>, DecodeError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => decode(v).map(Some).map_err(|e| e.within(PathSeg::Key(key.to_string()))),
    }
}

/// Decode every element; the first failing element fails the whole list.
pub fn expect_list<T>(value: &Value, item: impl Fn(&Value) -> Result<T, DecodeError>) -> Result<Vec<T>, DecodeError> {
    let arr = match value {
        Value::Array(arr) => arr,
        other => return Err(DecodeError::shape("list", other)),
    };
    let mut out = Vec::with_capacity(arr.len());
    for (i, v) in arr.iter().enumerate() {
        out.push(item(v).map_err(|e| e.within(PathSeg::Index(i)))?);
    }
    Ok(out)
}

/// Try each decoder in declaration order; first success wins.
pub fn expect_union<T>(
    value: &Value,
    expected: &'static str,
    decoders: &[&dyn Fn(&Value) -> Result<T, DecodeError>],
) -> Result<T, DecodeError> {
    let mut attempts = Vec::with_capacity(decoders.len());
    for decode in decoders {
        match decode(value) {
            Ok(v) => return Ok(v),
            Err(e) => attempts.push(e.to_string()),
        }
    }
    Err(DecodeError::NoUnionMatch { path: KeyPath::root(), expected, attempts })
}

pub fn expect_enum<E: WireEnum>(value: &Value) -> Result<E, DecodeError> {
    let s = match value {
        Value::String(s) => s,
        other => return Err(DecodeError::shape(E::NAME, other)),
    };
    E::VARIANTS
        .iter()
        .find(|(wire, _)| *wire == s.as_str())
        .map(|(_, v)| *v)
        .ok_or_else(|| DecodeError::UnknownVariant { path: KeyPath::root(), expected: E::NAME, value: s.clone() })
}

/// Assert the input is a mapping before handing it to `from_wire`. A non-object always raises.
pub fn expect_object<T>(value: &Value, from_wire: impl FnOnce(&Value) -> Result<T, DecodeError>) -> Result<T, DecodeError> {
    if !value.is_object() { return Err(DecodeError::shape("object", value)); }
    from_wire(value)
}

/// Free-form mapping with no fixed key set.
pub fn expect_map<T>(value: &Value, item: impl Fn(&Value) -> Result<T, DecodeError>) -> Result<BTreeMap<String, T>, DecodeError> {
    let map = match value {
        Value::Object(map) => map,
        other => return Err(DecodeError::shape("object", other)),
    };
    let mut out = BTreeMap::new();
    for (k, v) in map.iter() {
        out.insert(k.clone(), item(v).map_err(|e| e.within(PathSeg::Key(k.clone())))?);
    }
    Ok(out)
}

// ---------------- Encode primitives ----------------

/// `None` tells the caller to leave the key out entirely.
pub fn encode_optional<T>(value: Option<&T>, to_wire: impl FnOnce(&T) -> Value) -> Option<Value> {
    value.map(to_wire)
}

// ---------------- Scalar impls ----------------

impl Wire for String {
    const SHAPE: &'static str = "string";
    fn from_wire(value: &Value) -> Result<Self, DecodeError> { expect_str(value) }
    fn to_wire(&self) -> Value { Value::String(self.clone()) }
}

impl Wire for i64 {
    const SHAPE: &'static str = "integer";
    fn from_wire(value: &Value) -> Result<Self, DecodeError> { expect_i64(value) }
    fn to_wire(&self) -> Value { Value::from(*self) }
}

impl Wire for u64 {
    const SHAPE: &'static str = "unsigned integer";
    fn from_wire(value: &Value) -> Result<Self, DecodeError> { expect_u64(value) }
    fn to_wire(&self) -> Value { Value::from(*self) }
}

impl Wire for f64 {
    const SHAPE: &'static str = "number";
    fn from_wire(value: &Value) -> Result<Self, DecodeError> { expect_f64(value) }
    // Non-finite floats have no JSON form; they cannot come out of a decoder either.
    fn to_wire(&self) -> Value { serde_json::Number::from_f64(*self).map(Value::Number).unwrap_or(Value::Null) }
}

impl Wire for bool {
    const SHAPE: &'static str = "bool";
    fn from_wire(value: &Value) -> Result<Self, DecodeError> { expect_bool(value) }
    fn to_wire(&self) -> Value { Value::Bool(*self) }
}

impl Wire for Timestamp {
    const SHAPE: &'static str = "date-time";
    fn from_wire(value: &Value) -> Result<Self, DecodeError> { expect_datetime(value) }
    fn to_wire(&self) -> Value { Value::String(self.to_wire_string()) }
}

impl Wire for uuid::Uuid {
    const SHAPE: &'static str = "uuid";
    fn from_wire(value: &Value) -> Result<Self, DecodeError> { expect_uuid(value) }
    fn to_wire(&self) -> Value { Value::String(self.to_string()) }
}

impl<T: Wire> Wire for Box<T> {
    const SHAPE: &'static str = T::SHAPE;
    fn from_wire(value: &Value) -> Result<Self, DecodeError> { T::from_wire(value).map(Box::new) }
    fn to_wire(&self) -> Value { self.as_ref().to_wire() }
}

impl<T: Wire> Wire for Vec<T> {
    const SHAPE: &'static str = "list";
    fn from_wire(value: &Value) -> Result<Self, DecodeError> { expect_list(value, T::from_wire) }
    fn to_wire(&self) -> Value { Value::Array(self.iter().map(Wire::to_wire).collect()) }
}

// ---------------- Unions and free-form maps ----------------

/// Label → count tally with no fixed key set (facet counts and similar).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally(pub BTreeMap<String, u64>);

impl Tally {
    pub fn get(&self, label: &str) -> Option<u64> { self.0.get(label).copied() }
    pub fn total(&self) -> u64 { self.0.values().sum() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> { self.0.iter() }
}

impl Wire for Tally {
    const SHAPE: &'static str = "label/count mapping";
    fn from_wire(value: &Value) -> Result<Self, DecodeError> { expect_map(value, expect_u64).map(Tally) }
    fn to_wire(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), Value::from(*v))).collect())
    }
}

/// Either an embedded record or a bare identifier. Declared order: record first.
#[derive(Debug, Clone, PartialEq)]
pub enum Ref<T> {
    Record(T),
    Id(String),
}

impl<T> Ref<T> {
    pub fn as_record(&self) -> Option<&T> {
        match self { Ref::Record(r) => Some(r), Ref::Id(_) => None }
    }

    pub fn as_id(&self) -> Option<&str> {
        match self { Ref::Id(id) => Some(id), Ref::Record(_) => None }
    }
}

impl<T: Wire> Wire for Ref<T> {
    const SHAPE: &'static str = "record or identifier";

    fn from_wire(value: &Value) -> Result<Self, DecodeError> {
        expect_union(value, Self::SHAPE, &[
            &|v| expect_object(v, T::from_wire).map(Ref::Record),
            &|v| expect_id(v).map(Ref::Id),
        ])
    }

    fn to_wire(&self) -> Value {
        match self {
            Ref::Record(r) => r.to_wire(),
            Ref::Id(id) => Value::String(id.clone()),
        }
    }
}

/// A date-time when it parses as one, free text otherwise. Declared order: date-time first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateOrText {
    At(Timestamp),
    Text(String),
}

impl DateOrText {
    pub fn timestamp(&self) -> Option<&Timestamp> {
        match self { DateOrText::At(t) => Some(t), DateOrText::Text(_) => None }
    }
}

impl Wire for DateOrText {
    const SHAPE: &'static str = "date-time or text";

    fn from_wire(value: &Value) -> Result<Self, DecodeError> {
        expect_union(value, Self::SHAPE, &[
            &|v| expect_datetime(v).map(DateOrText::At),
            &|v| expect_str(v).map(DateOrText::Text),
        ])
    }

    fn to_wire(&self) -> Value {
        match self {
            DateOrText::At(t) => t.to_wire(),
            DateOrText::Text(s) => Value::String(s.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    wire_enum! {
        enum Side { Home => "domicile", Away => "exterieur" }
    }

    #[test]
    fn scalars_do_not_coerce_across_kinds() {
        assert_eq!(expect_str(&json!("a")).unwrap(), "a");
        assert!(expect_str(&json!(1)).is_err());
        assert!(expect_i64(&json!("1")).is_err());
        assert!(expect_i64(&json!(1.5)).is_err());
        assert!(expect_bool(&json!(0)).is_err());
        assert_eq!(expect_f64(&json!(2)).unwrap(), 2.0);
    }

    #[test]
    fn id_accepts_numbers_and_strings() {
        assert_eq!(expect_id(&json!(200000002845137u64)).unwrap(), "200000002845137");
        assert_eq!(expect_id(&json!("200000002845137")).unwrap(), "200000002845137");
        assert!(expect_id(&json!(1.5)).is_err());
        assert!(expect_id(&json!(true)).is_err());
    }

    #[test]
    fn optional_distinguishes_absent_null_and_malformed() {
        let m = json!({"a": null, "b": 3, "c": "x"});
        let map = m.as_object().unwrap();
        assert_eq!(expect_optional(map, "a", expect_i64).unwrap(), None);
        assert_eq!(expect_optional(map, "zz", expect_i64).unwrap(), None);
        assert_eq!(expect_optional(map, "b", expect_i64).unwrap(), Some(3));
        let err = expect_optional(map, "c", expect_i64).unwrap_err();
        assert_eq!(err.path().to_string(), "c");
    }

    #[test]
    fn list_fails_on_first_bad_element_with_index_path() {
        let err = expect_list(&json!([1, 2, "x", 4]), expect_i64).unwrap_err();
        assert_eq!(err.path().to_string(), "[2]");
        assert!(expect_list(&json!({"a": 1}), expect_i64).is_err());
        assert_eq!(expect_list(&json!([]), expect_i64).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn union_respects_declared_order() {
        let v = json!("2024-10-12T20:00:00");
        assert!(matches!(DateOrText::from_wire(&v).unwrap(), DateOrText::At(_)));
        let t = json!("samedi soir");
        assert_eq!(DateOrText::from_wire(&t).unwrap(), DateOrText::Text("samedi soir".into()));
        let err = DateOrText::from_wire(&json!(12)).unwrap_err();
        assert!(matches!(err, DecodeError::NoUnionMatch { ref attempts, .. } if attempts.len() == 2));
    }

    #[test]
    fn enum_rejects_unknown_strings() {
        assert_eq!(Side::from_wire(&json!("domicile")).unwrap(), Side::Home);
        assert!(matches!(Side::from_wire(&json!("neutre")), Err(DecodeError::UnknownVariant { .. })));
        assert_eq!(Side::Away.to_wire(), json!("exterieur"));
        assert_eq!(Side::Away.to_string(), "exterieur");
    }

    #[test]
    fn object_and_map_reject_non_objects() {
        assert!(expect_object(&json!([]), |_| Ok(())).is_err());
        assert!(expect_object(&json!({}), |_| Ok(())).is_ok());
        assert!(Tally::from_wire(&json!("not a dict")).is_err());
        assert!(Tally::from_wire(&json!([])).is_err());
    }

    #[test]
    fn tally_round_trips_exactly() {
        let v = json!({"Club": 10, "Coopération Territoriale Club": 2});
        let t = Tally::from_wire(&v).unwrap();
        assert_eq!(t.get("Club"), Some(10));
        assert_eq!(t.total(), 12);
        assert_eq!(t.to_wire(), v);
    }

    #[test]
    fn ref_prefers_record_then_id() {
        let r: Ref<Tally> = Ref::from_wire(&json!({"a": 1})).unwrap();
        assert!(r.as_record().is_some());
        let r: Ref<Tally> = Ref::from_wire(&json!(42)).unwrap();
        assert_eq!(r.as_id(), Some("42"));
        assert_eq!(r.to_wire(), json!("42"));
    }

    #[test]
    fn encode_optional_omits_none() {
        assert_eq!(encode_optional(None::<&i64>, |v| Value::from(*v)), None);
        assert_eq!(encode_optional(Some(&3i64), |v| Value::from(*v)), Some(json!(3)));
    }

    #[test]
    fn error_paths_nest() {
        let e = DecodeError::shape("string", &json!(1))
            .within(PathSeg::Key("id".into()))
            .within(PathSeg::Index(0))
            .within(PathSeg::Key("poules".into()))
            .in_entity("Phase")
            .within(PathSeg::Key("phases".into()));
        assert_eq!(e.path().to_string(), "phases.poules[0].id");
        assert_eq!(e.entity(), Some("Phase"));
    }
}
