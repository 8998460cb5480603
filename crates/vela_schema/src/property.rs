//! Property declarations
//!
//! A `PropertyDescriptor` declares one typed, defaulted property of a
//! component schema and owns the parse/stringify/equality contract for it.

use crate::color::Color;
use crate::schema::parse_style;
use crate::value::PropertyValue;
use crate::{SchemaError, SchemaResult};
use glam::{DVec2, DVec3, DVec4};
use serde::{Deserialize, Serialize};

/// The declared type of a property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    Str,
    Number,
    Int,
    Boolean,
    Color,
    Vec2,
    Vec3,
    Vec4,
    Selector,
    SelectorAll,
    Array,
    Asset,
    Map,
}

/// Declaration of a single schema property
///
/// Immutable once declared for a given schema version.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDescriptor {
    ty: PropertyType,
    default: PropertyValue,
    one_of: Option<Vec<String>>,
    min: Option<f64>,
    max: Option<f64>,
}

impl PropertyDescriptor {
    /// Declare a property with an explicit type and default
    pub fn new(ty: PropertyType, default: PropertyValue) -> Self {
        debug_assert_eq!(ty, default.kind(), "default value type mismatch");
        Self {
            ty,
            default,
            one_of: None,
            min: None,
            max: None,
        }
    }

    /// Declare a string property
    pub fn string(default: &str) -> Self {
        Self::new(PropertyType::Str, PropertyValue::Str(default.to_string()))
    }

    /// Declare a number property
    pub fn number(default: f64) -> Self {
        Self::new(PropertyType::Number, PropertyValue::Number(default))
    }

    /// Declare an integer property
    pub fn int(default: i64) -> Self {
        Self::new(PropertyType::Int, PropertyValue::Int(default))
    }

    /// Declare a boolean property
    pub fn boolean(default: bool) -> Self {
        Self::new(PropertyType::Boolean, PropertyValue::Bool(default))
    }

    /// Declare a color property
    pub fn color(default: Color) -> Self {
        Self::new(PropertyType::Color, PropertyValue::Color(default))
    }

    /// Declare a vec2 property
    pub fn vec2(default: DVec2) -> Self {
        Self::new(PropertyType::Vec2, PropertyValue::Vec2(default))
    }

    /// Declare a vec3 property
    pub fn vec3(default: DVec3) -> Self {
        Self::new(PropertyType::Vec3, PropertyValue::Vec3(default))
    }

    /// Declare a vec4 property
    pub fn vec4(default: DVec4) -> Self {
        Self::new(PropertyType::Vec4, PropertyValue::Vec4(default))
    }

    /// Declare a selector property, unset by default
    pub fn selector() -> Self {
        Self::new(PropertyType::Selector, PropertyValue::Selector(None))
    }

    /// Declare a multi-selector property, empty by default
    pub fn selector_all() -> Self {
        Self::new(PropertyType::SelectorAll, PropertyValue::SelectorAll(Vec::new()))
    }

    /// Declare a string-array property, empty by default
    pub fn array() -> Self {
        Self::new(PropertyType::Array, PropertyValue::Array(Vec::new()))
    }

    /// Declare an asset property, unset by default
    pub fn asset() -> Self {
        Self::new(PropertyType::Asset, PropertyValue::Asset(None))
    }

    /// Declare a nested map property, empty by default
    pub fn map() -> Self {
        Self::new(PropertyType::Map, PropertyValue::Map(Default::default()))
    }

    /// Restrict the property to an enumerated set of canonical values
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.one_of = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Clamp numeric values to an inclusive range
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Get the declared type
    pub fn ty(&self) -> PropertyType {
        self.ty
    }

    /// Get the default value
    pub fn default_value(&self) -> &PropertyValue {
        &self.default
    }

    /// Parse a raw string into a typed value
    ///
    /// An empty string yields the declared default. Numbers are clamped to
    /// the declared range; enumerated sets are checked against the parsed
    /// value's canonical form.
    pub fn parse(&self, raw: &str) -> SchemaResult<PropertyValue> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(self.default.clone());
        }

        let value = match self.ty {
            PropertyType::Str => PropertyValue::Str(raw.to_string()),
            PropertyType::Number => {
                let n: f64 = raw
                    .parse()
                    .map_err(|_| SchemaError::InvalidNumber(raw.to_string()))?;
                if !n.is_finite() {
                    return Err(SchemaError::InvalidNumber(raw.to_string()));
                }
                PropertyValue::Number(self.clamp(n))
            }
            PropertyType::Int => {
                let i: i64 = raw
                    .parse()
                    .map_err(|_| SchemaError::InvalidInt(raw.to_string()))?;
                PropertyValue::Int(i)
            }
            PropertyType::Boolean => match raw {
                "true" => PropertyValue::Bool(true),
                "false" => PropertyValue::Bool(false),
                _ => return Err(SchemaError::InvalidBool(raw.to_string())),
            },
            PropertyType::Color => PropertyValue::Color(
                Color::parse(raw).ok_or_else(|| SchemaError::InvalidColor(raw.to_string()))?,
            ),
            PropertyType::Vec2 => {
                let parts = parse_components(raw, 2)?;
                PropertyValue::Vec2(DVec2::new(parts[0], parts[1]))
            }
            PropertyType::Vec3 => {
                let parts = parse_components(raw, 3)?;
                PropertyValue::Vec3(DVec3::new(parts[0], parts[1], parts[2]))
            }
            PropertyType::Vec4 => {
                let parts = parse_components(raw, 4)?;
                PropertyValue::Vec4(DVec4::new(parts[0], parts[1], parts[2], parts[3]))
            }
            PropertyType::Selector => PropertyValue::Selector(Some(raw.to_string())),
            PropertyType::SelectorAll => PropertyValue::SelectorAll(parse_list(raw)),
            PropertyType::Array => PropertyValue::Array(parse_list(raw)),
            PropertyType::Asset => PropertyValue::Asset(Some(strip_url(raw).to_string())),
            PropertyType::Map => PropertyValue::Map(parse_style(raw)),
        };

        if let Some(allowed) = &self.one_of {
            let canonical = value.canonical_string();
            if !allowed.iter().any(|a| *a == canonical) {
                return Err(SchemaError::Disallowed {
                    value: canonical,
                    allowed: allowed.clone(),
                });
            }
        }

        Ok(value)
    }

    /// Canonical string form of a value, used for cache keys and reflection
    pub fn stringify(&self, value: &PropertyValue) -> String {
        value.canonical_string()
    }

    /// Type-aware equality
    ///
    /// Values produced by `parse` are already normalized (colors to their
    /// canonical triple, vectors to components), so equality is exact:
    /// no numeric tolerance is applied.
    pub fn equals(&self, a: &PropertyValue, b: &PropertyValue) -> bool {
        a == b
    }

    fn clamp(&self, n: f64) -> f64 {
        let n = match self.min {
            Some(min) if n < min => min,
            _ => n,
        };
        match self.max {
            Some(max) if n > max => max,
            _ => n,
        }
    }
}

fn parse_components(raw: &str, expected: usize) -> SchemaResult<Vec<f64>> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if parts.len() != expected {
        return Err(SchemaError::InvalidVector {
            raw: raw.to_string(),
            expected,
            found: parts.len(),
        });
    }
    let mut components = Vec::with_capacity(expected);
    for part in parts {
        let n: f64 = part
            .parse()
            .map_err(|_| SchemaError::InvalidVector {
                raw: raw.to_string(),
                expected,
                found: 0,
            })?;
        if !n.is_finite() {
            return Err(SchemaError::InvalidNumber(part.to_string()));
        }
        components.push(n);
    }
    Ok(components)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}

/// Strip a CSS-style `url(...)` wrapper from an asset reference
fn strip_url(raw: &str) -> &str {
    raw.strip_prefix("url(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map(|inner| inner.trim())
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yields_default() {
        let descriptor = PropertyDescriptor::number(1.5);
        assert_eq!(descriptor.parse("").unwrap(), PropertyValue::Number(1.5));
        assert_eq!(descriptor.parse("  ").unwrap(), PropertyValue::Number(1.5));
    }

    #[test]
    fn test_number_clamping() {
        let descriptor = PropertyDescriptor::number(0.5).range(0.0, 1.0);
        assert_eq!(descriptor.parse("2").unwrap(), PropertyValue::Number(1.0));
        assert_eq!(descriptor.parse("-3").unwrap(), PropertyValue::Number(0.0));
    }

    #[test]
    fn test_non_finite_number_rejected() {
        let descriptor = PropertyDescriptor::number(0.0);
        assert!(matches!(
            descriptor.parse("inf"),
            Err(SchemaError::InvalidNumber(_))
        ));
        assert!(matches!(
            descriptor.parse("NaN"),
            Err(SchemaError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_one_of() {
        let descriptor = PropertyDescriptor::string("front").one_of(&["front", "back", "double"]);
        assert!(descriptor.parse("back").is_ok());
        assert!(matches!(
            descriptor.parse("sideways"),
            Err(SchemaError::Disallowed { .. })
        ));
    }

    #[test]
    fn test_vector_arity() {
        let descriptor = PropertyDescriptor::vec3(DVec3::ZERO);
        assert_eq!(
            descriptor.parse("1 2 3").unwrap(),
            PropertyValue::Vec3(DVec3::new(1.0, 2.0, 3.0))
        );
        assert!(matches!(
            descriptor.parse("1 2"),
            Err(SchemaError::InvalidVector { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn test_color_synonyms_equal() {
        let descriptor = PropertyDescriptor::color(Color::WHITE);
        let named = descriptor.parse("red").unwrap();
        let hex = descriptor.parse("#ff0000").unwrap();
        assert!(descriptor.equals(&named, &hex));
    }

    #[test]
    fn test_asset_url_wrapper() {
        let descriptor = PropertyDescriptor::asset();
        assert_eq!(
            descriptor.parse("url(textures/wood.png)").unwrap(),
            PropertyValue::Asset(Some("textures/wood.png".to_string()))
        );
        assert_eq!(
            descriptor.parse("#wood").unwrap(),
            PropertyValue::Asset(Some("#wood".to_string()))
        );
    }

    #[test]
    fn test_bool_strictness() {
        let descriptor = PropertyDescriptor::boolean(false);
        assert_eq!(descriptor.parse("true").unwrap(), PropertyValue::Bool(true));
        assert!(descriptor.parse("yes").is_err());
    }
}
