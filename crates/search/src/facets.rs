//! `facetDistribution` / `facetStats` sections of a search result.
//!
//! Both are free-form mappings keyed by facet name. A non-object at either
//! level is a backend contract violation and always fails the decode; the
//! engine is known to send `[]` where `{}` is meant.

use std::collections::BTreeMap;

use ffbb_core::{expect_f64, expect_map, DecodeError, PathSeg, RecordReader, RecordWriter, Tally, Wire};
use serde_json::Value;

/// Label → count for one facet.
pub type FacetTally = Tally;

/// Facet name → tally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetDistribution(BTreeMap<String, FacetTally>);

impl FacetDistribution {
    /// `None` when the facet was not part of the response.
    pub fn get(&self, facet: &str) -> Option<&FacetTally> { self.0.get(facet) }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.0.keys().map(String::as_str) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FacetTally)> { self.0.iter() }
}

impl FromIterator<(String, FacetTally)> for FacetDistribution {
    fn from_iter<I: IntoIterator<Item = (String, FacetTally)>>(iter: I) -> Self { Self(iter.into_iter().collect()) }
}

impl Wire for FacetDistribution {
    const SHAPE: &'static str = "facet distribution";

    fn from_wire(value: &Value) -> Result<Self, DecodeError> { expect_map(value, Tally::from_wire).map(Self) }

    fn to_wire(&self) -> Value { Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.to_wire())).collect()) }
}

/// Numeric range of one facet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacetRange {
    pub min: f64,
    pub max: f64,
}

impl Wire for FacetRange {
    const SHAPE: &'static str = "facet range";

    fn from_wire(value: &Value) -> Result<Self, DecodeError> {
        let r = RecordReader::new("FacetRange", value)?;
        Ok(Self { min: r.required_with("min", expect_f64)?, max: r.required_with("max", expect_f64)? })
    }

    fn to_wire(&self) -> Value {
        let mut w = RecordWriter::new();
        w.put("min", &self.min).put("max", &self.max);
        w.finish()
    }
}

/// Facet name → `{min, max}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetStats(BTreeMap<String, FacetRange>);

impl FacetStats {
    pub fn get(&self, facet: &str) -> Option<&FacetRange> { self.0.get(facet) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl Wire for FacetStats {
    const SHAPE: &'static str = "facet stats";

    fn from_wire(value: &Value) -> Result<Self, DecodeError> {
        let map = match value {
            Value::Object(map) => map,
            other => return Err(DecodeError::shape("object", other)),
        };
        let mut out = BTreeMap::new();
        for (name, v) in map {
            let range = FacetRange::from_wire(v).map_err(|e| e.within(PathSeg::Key(name.clone())))?;
            out.insert(name.clone(), range);
        }
        Ok(Self(out))
    }

    fn to_wire(&self) -> Value { Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.to_wire())).collect()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn distribution_round_trips_exactly() {
        let v = json!({"type": {"Club": 10, "Coopération Territoriale Club": 2}, "offresPratiques": {}});
        let d = FacetDistribution::from_wire(&v).unwrap();
        assert_eq!(d.get("type").and_then(|t| t.get("Coopération Territoriale Club")), Some(2));
        assert_eq!(d.len(), 2);
        assert_eq!(d.to_wire(), v);
    }

    #[test]
    fn absent_facet_is_none_not_empty() {
        let d = FacetDistribution::from_wire(&json!({"type": {"Club": 1}})).unwrap();
        assert!(d.get("sexe").is_none());
        assert!(d.get("type").is_some());
    }

    #[test]
    fn non_object_input_raises_at_every_level() {
        assert!(FacetDistribution::from_wire(&json!("not a dict")).is_err());
        assert!(FacetDistribution::from_wire(&json!([])).is_err());
        let err = FacetDistribution::from_wire(&json!({"type": ["Club"]})).unwrap_err();
        assert_eq!(err.path().to_string(), "type");
        let err = FacetDistribution::from_wire(&json!({"type": {"Club": "dix"}})).unwrap_err();
        assert_eq!(err.path().to_string(), "type.Club");
        assert!(FacetStats::from_wire(&json!("not a dict")).is_err());
    }

    #[test]
    fn stats_decode_ranges() {
        let v = json!({"numeroJournee": {"min": 1, "max": 22.0}});
        let s = FacetStats::from_wire(&v).unwrap();
        assert_eq!(s.get("numeroJournee"), Some(&FacetRange { min: 1.0, max: 22.0 }));
        assert!(FacetStats::from_wire(&json!({"x": {"min": 1}})).is_err());
        let once = s.to_wire();
        assert_eq!(FacetStats::from_wire(&once).unwrap().to_wire(), once);
    }
}
