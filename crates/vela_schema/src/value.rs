//! Dynamic property values
//!
//! Values are the typed, serializable representation of component data.
//! Every value knows its canonical string form, which is what cache keys
//! and host-attribute reflection are built from.

use crate::color::Color;
use crate::property::PropertyType;
use glam::{DVec2, DVec3, DVec4};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// String value
    Str(String),
    /// Floating point value
    Number(f64),
    /// Integer value
    Int(i64),
    /// Boolean value
    Bool(bool),
    /// Normalized RGB color
    Color(Color),
    /// 2D vector
    Vec2(DVec2),
    /// 3D vector
    Vec3(DVec3),
    /// 4D vector
    Vec4(DVec4),
    /// Single selector reference, None when unset
    Selector(Option<String>),
    /// Multi-selector reference list
    SelectorAll(Vec<String>),
    /// Comma-separated string array
    Array(Vec<String>),
    /// Asset reference, None when unset
    Asset(Option<String>),
    /// Nested key/value declaration
    Map(BTreeMap<String, String>),
}

impl PropertyValue {
    /// Get the property type this value belongs to
    pub fn kind(&self) -> PropertyType {
        match self {
            Self::Str(_) => PropertyType::Str,
            Self::Number(_) => PropertyType::Number,
            Self::Int(_) => PropertyType::Int,
            Self::Bool(_) => PropertyType::Boolean,
            Self::Color(_) => PropertyType::Color,
            Self::Vec2(_) => PropertyType::Vec2,
            Self::Vec3(_) => PropertyType::Vec3,
            Self::Vec4(_) => PropertyType::Vec4,
            Self::Selector(_) => PropertyType::Selector,
            Self::SelectorAll(_) => PropertyType::SelectorAll,
            Self::Array(_) => PropertyType::Array,
            Self::Asset(_) => PropertyType::Asset,
            Self::Map(_) => PropertyType::Map,
        }
    }

    /// Try to get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as color
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Try to get as vec2
    pub fn as_vec2(&self) -> Option<DVec2> {
        match self {
            Self::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as vec3
    pub fn as_vec3(&self) -> Option<DVec3> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as vec4
    pub fn as_vec4(&self) -> Option<DVec4> {
        match self {
            Self::Vec4(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get the selector reference
    pub fn as_selector(&self) -> Option<&str> {
        match self {
            Self::Selector(Some(s)) => Some(s),
            Self::Asset(Some(s)) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a string list
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::SelectorAll(items) | Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get as a nested map
    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Canonical string form, stable across parse round trips
    pub fn canonical_string(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Number(n) => format!("{}", n),
            Self::Int(i) => format!("{}", i),
            Self::Bool(b) => format!("{}", b),
            Self::Color(c) => c.to_hex(),
            Self::Vec2(v) => format!("{} {}", v.x, v.y),
            Self::Vec3(v) => format!("{} {} {}", v.x, v.y, v.z),
            Self::Vec4(v) => format!("{} {} {} {}", v.x, v.y, v.z, v.w),
            Self::Selector(s) | Self::Asset(s) => s.clone().unwrap_or_default(),
            Self::SelectorAll(items) | Self::Array(items) => items.join(", "),
            Self::Map(map) => {
                let pairs: Vec<String> =
                    map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                pairs.join("; ")
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Color> for PropertyValue {
    fn from(v: Color) -> Self {
        Self::Color(v)
    }
}

impl From<DVec2> for PropertyValue {
    fn from(v: DVec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<DVec3> for PropertyValue {
    fn from(v: DVec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<DVec4> for PropertyValue {
    fn from(v: DVec4) -> Self {
        Self::Vec4(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_number() {
        assert_eq!(PropertyValue::Number(5.0).canonical_string(), "5");
        assert_eq!(PropertyValue::Number(0.5).canonical_string(), "0.5");
    }

    #[test]
    fn test_canonical_vec3() {
        let v = PropertyValue::Vec3(DVec3::new(1.0, 2.5, -3.0));
        assert_eq!(v.canonical_string(), "1 2.5 -3");
    }

    #[test]
    fn test_canonical_map_is_sorted() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), "2".to_string());
        map.insert("a".to_string(), "1".to_string());
        assert_eq!(PropertyValue::Map(map).canonical_string(), "a: 1; b: 2");
    }

    #[test]
    fn test_serialize_untagged() {
        assert_eq!(serde_json::to_string(&PropertyValue::Bool(true)).unwrap(), "true");
        assert_eq!(
            serde_json::to_string(&PropertyValue::Str("flat".to_string())).unwrap(),
            "\"flat\""
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(PropertyValue::from(42i64).as_int(), Some(42));
        assert_eq!(PropertyValue::from(42i64).as_number(), Some(42.0));
        assert_eq!(PropertyValue::from("hi").as_str(), Some("hi"));
        assert_eq!(PropertyValue::Bool(true).as_bool(), Some(true));
    }
}
