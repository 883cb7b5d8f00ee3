//! Structured property values
//!
//! A property value is a scalar, a sequence of values, or a structure (an
//! ordered list of named values with an optional type tag). `Properties` keeps
//! insertion order so rendered output is deterministic.

use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Key under which a structure's type tag is emitted in JSON output
pub const TYPE_TAG_KEY: &str = "_typeTag";

/// Scalar property value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Get the string slice if this is a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::UInt(u) => serializer.serialize_u64(*u),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Str(s) => serializer.serialize_str(s),
        }
    }
}

/// Structured property value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Single scalar value
    Scalar(Scalar),

    /// Ordered sequence of values
    Sequence(Vec<PropertyValue>),

    /// Named values with an optional type tag (e.g. the captured type name)
    Structure {
        type_tag: Option<String>,
        properties: Properties,
    },
}

impl PropertyValue {
    /// Create a structure value
    pub fn structure(type_tag: Option<impl Into<String>>, properties: Properties) -> Self {
        Self::Structure {
            type_tag: type_tag.map(Into::into),
            properties,
        }
    }

    /// Null scalar
    pub const fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    /// Get the scalar if this is a scalar value
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Get the string slice if this is a string scalar
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(scalar) => scalar.serialize(serializer),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Structure {
                type_tag,
                properties,
            } => {
                let len = properties.len() + usize::from(type_tag.is_some());
                let mut map = serializer.serialize_map(Some(len))?;
                if let Some(tag) = type_tag {
                    map.serialize_entry(TYPE_TAG_KEY, tag)?;
                }
                for (name, value) in properties.iter() {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

macro_rules! impl_from_scalar {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Scalar {
                #[inline]
                fn from(value: $source) -> Self {
                    Self::$variant(<$target>::from(value))
                }
            }

            impl From<$source> for PropertyValue {
                #[inline]
                fn from(value: $source) -> Self {
                    Self::Scalar(Scalar::from(value))
                }
            }
        )+
    };
}

impl_from_scalar!(Bool as bool: bool);
impl_from_scalar!(Int as i64: i8, i16, i32, i64);
impl_from_scalar!(UInt as u64: u8, u16, u32, u64);
impl_from_scalar!(Float as f64: f32, f64);
impl_from_scalar!(Str as String: String, &str, char);

impl From<usize> for Scalar {
    #[inline]
    fn from(value: usize) -> Self {
        Self::UInt(value as u64)
    }
}

impl From<usize> for PropertyValue {
    #[inline]
    fn from(value: usize) -> Self {
        Self::Scalar(Scalar::from(value))
    }
}

impl From<isize> for Scalar {
    #[inline]
    fn from(value: isize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<isize> for PropertyValue {
    #[inline]
    fn from(value: isize) -> Self {
        Self::Scalar(Scalar::from(value))
    }
}

impl From<Scalar> for PropertyValue {
    #[inline]
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::null, Into::into)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(values: Vec<T>) -> Self {
        Self::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl From<Properties> for PropertyValue {
    fn from(properties: Properties) -> Self {
        Self::Structure {
            type_tag: None,
            properties,
        }
    }
}

// =============================================================================
// Properties
// =============================================================================

/// Ordered list of named property values
///
/// Lookups are linear; events carry a handful of properties, so a vector
/// beats a hash map here and keeps insertion order for free.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: Vec<(String, PropertyValue)>,
}

impl Properties {
    /// Create an empty property list
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create an empty property list with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a property, replacing (in place) any existing value with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a property by name
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Check whether a property exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of properties
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no properties
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over properties in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<PropertyValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (name, value) in iter {
            properties.insert(name, value);
        }
        properties
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
