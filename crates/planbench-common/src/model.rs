//! Candidate queries, index specifications, and catalog entries.
//!
//! Index specifications are order-preserving: the leading field of a
//! compound index determines how the planner can use it as a prefix, so
//! `IndexSpec` keeps its fields in declaration order and serializes as a
//! JSON object with the store's native direction markers (`1`, `-1`,
//! `"hashed"`).

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{BenchError, Result};

/// Sort direction for a query or index field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub const fn as_i32(self) -> i32 {
        match self {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        }
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.as_i32())
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match i64::deserialize(deserializer)? {
            1 => Ok(Direction::Ascending),
            -1 => Ok(Direction::Descending),
            other => Err(de::Error::custom(format!(
                "invalid sort direction {other}, expected 1 or -1"
            ))),
        }
    }
}

/// One field's role in an index: an ordered direction or the hashed marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKey {
    Ascending,
    Descending,
    Hashed,
}

impl IndexKey {
    pub const fn is_hashed(self) -> bool {
        matches!(self, IndexKey::Hashed)
    }
}

impl Serialize for IndexKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            IndexKey::Ascending => serializer.serialize_i32(1),
            IndexKey::Descending => serializer.serialize_i32(-1),
            IndexKey::Hashed => serializer.serialize_str("hashed"),
        }
    }
}

impl<'de> Deserialize<'de> for IndexKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = IndexKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("1, -1, or \"hashed\"")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<IndexKey, E> {
                match v {
                    1 => Ok(IndexKey::Ascending),
                    -1 => Ok(IndexKey::Descending),
                    other => Err(E::custom(format!("invalid index direction {other}"))),
                }
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<IndexKey, E> {
                match v {
                    1 => Ok(IndexKey::Ascending),
                    other => Err(E::custom(format!("invalid index direction {other}"))),
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<IndexKey, E> {
                if v == "hashed" {
                    Ok(IndexKey::Hashed)
                } else {
                    Err(E::custom(format!("invalid index key marker {v:?}")))
                }
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Ascending => f.write_str("1"),
            IndexKey::Descending => f.write_str("-1"),
            IndexKey::Hashed => f.write_str("\"hashed\""),
        }
    }
}

/// Classification of an index specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    Simple,
    Compound,
    Hashed,
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IndexType::Simple => "simple",
            IndexType::Compound => "compound",
            IndexType::Hashed => "hashed",
        })
    }
}

/// An ordered index specification: field name -> direction-or-hashed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexSpec {
    fields: Vec<(String, IndexKey)>,
}

impl IndexSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field to the specification, preserving order.
    pub fn with(mut self, name: impl Into<String>, key: IndexKey) -> Self {
        self.fields.push((name.into(), key));
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, IndexKey)> {
        self.fields.iter().map(|(name, key)| (name.as_str(), *key))
    }

    /// The first field in the ordering; determines prefix usability.
    pub fn leading_field(&self) -> Option<&str> {
        self.fields.first().map(|(name, _)| name.as_str())
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    /// Classify the specification.
    ///
    /// Hashed-ness is only recognized in the single-field case: a
    /// multi-field spec is compound even when one of its fields carries
    /// the hashed marker.
    pub fn index_type(&self) -> IndexType {
        match self.fields.as_slice() {
            [(_, key)] if key.is_hashed() => IndexType::Hashed,
            [_] => IndexType::Simple,
            _ => IndexType::Compound,
        }
    }
}

impl Serialize for IndexSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, key) in &self.fields {
            map.serialize_entry(name, key)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IndexSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SpecVisitor;

        impl<'de> Visitor<'de> for SpecVisitor {
            type Value = IndexSpec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field name to 1, -1, or \"hashed\"")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<IndexSpec, A::Error> {
                let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(1));
                while let Some((name, key)) = access.next_entry::<String, IndexKey>()? {
                    fields.push((name, key));
                }
                Ok(IndexSpec { fields })
            }
        }

        deserializer.deserialize_map(SpecVisitor)
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, key)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {key}")?;
        }
        f.write_str("}")
    }
}

/// An ordered sort specification: field name -> direction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortSpec {
    fields: Vec<(String, Direction)>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, direction: Direction) -> Self {
        self.fields.push((name.into(), direction));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, Direction)> {
        self.fields.iter().map(|(name, dir)| (name.as_str(), *dir))
    }
}

impl Serialize for SortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, dir) in &self.fields {
            map.serialize_entry(name, dir)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SortSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SortVisitor;

        impl<'de> Visitor<'de> for SortVisitor {
            type Value = SortSpec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field name to 1 or -1")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<SortSpec, A::Error> {
                let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(1));
                while let Some((name, dir)) = access.next_entry::<String, Direction>()? {
                    fields.push((name, dir));
                }
                Ok(SortSpec { fields })
            }
        }

        deserializer.deserialize_map(SortVisitor)
    }
}

/// Which execution path a candidate exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    #[default]
    Find,
    Aggregate,
}

/// A named query specification under test.
///
/// Defined once at configuration time, immutable thereafter. For
/// `QueryKind::Find` the `query` field is a predicate object; for
/// `QueryKind::Aggregate` it is a pipeline array and a separate `sort`
/// is not allowed (sort stages belong inside the pipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateQuery {
    pub name: String,
    pub query: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Value>,
    pub index: IndexSpec,
    #[serde(default)]
    pub kind: QueryKind,
}

impl CandidateQuery {
    /// Check the configuration invariants before any database call.
    pub fn validate(&self) -> Result<()> {
        if self.index.is_empty() {
            return Err(BenchError::Config(format!(
                "candidate '{}' has an empty proposed index specification",
                self.name
            )));
        }

        match self.kind {
            QueryKind::Find => {
                if !self.query.is_object() {
                    return Err(BenchError::Config(format!(
                        "candidate '{}': find query must be a predicate object",
                        self.name
                    )));
                }
            }
            QueryKind::Aggregate => {
                if self.sort.is_some() {
                    return Err(BenchError::Config(format!(
                        "candidate '{}': sort cannot be combined with an aggregation \
                         pipeline, express the sort as a pipeline stage instead",
                        self.name
                    )));
                }
                if !self.query.is_array() {
                    return Err(BenchError::Config(format!(
                        "candidate '{}': aggregate query must be a pipeline array",
                        self.name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// One entry of a collection's index catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexModel {
    pub name: String,
    pub key: IndexSpec,
}

impl IndexModel {
    pub fn leading_field(&self) -> Option<&str> {
        self.key.leading_field()
    }
}
