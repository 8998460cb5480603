//! Component schemas
//!
//! A schema is an ordered set of property declarations. It parses raw
//! markup (either a full `name: value; ...` declaration or a partial
//! name/value map) into fully-defaulted `ParsedData`.

use crate::data::ParsedData;
use crate::property::PropertyDescriptor;
use crate::{SchemaError, SchemaResult};
use std::collections::{BTreeMap, HashMap};

/// Parse a `name: value; name2: value2` style declaration into raw pairs
///
/// Empty segments are skipped. Segments without a colon are ignored with a
/// warning rather than failing the whole declaration.
pub fn parse_style(raw: &str) -> BTreeMap<String, String> {
    let mut pairs = BTreeMap::new();
    for segment in raw.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        match segment.split_once(':') {
            Some((name, value)) => {
                pairs.insert(name.trim().to_string(), value.trim().to_string());
            }
            None => {
                log::warn!("ignoring malformed style segment `{}`", segment);
            }
        }
    }
    pairs
}

/// Ordered mapping from property name to declaration
///
/// A schema with a single property named [`Schema::SINGLE`] is a
/// single-property schema: the entire raw attribute string parses as that
/// one property.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    properties: Vec<(String, PropertyDescriptor)>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Property name used by single-property schemas
    pub const SINGLE: &'static str = "";

    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a single-property schema
    pub fn single(descriptor: PropertyDescriptor) -> Self {
        Self::new().property(Self::SINGLE, descriptor)
    }

    /// Declare a property, preserving declaration order
    pub fn property(mut self, name: &str, descriptor: PropertyDescriptor) -> Self {
        debug_assert!(
            !self.index.contains_key(name),
            "property `{}` declared twice",
            name
        );
        self.index.insert(name.to_string(), self.properties.len());
        self.properties.push((name.to_string(), descriptor));
        self
    }

    /// Get a property declaration by name
    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.index.get(name).map(|&i| &self.properties[i].1)
    }

    /// Check if a property is declared
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate over property names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate over (name, descriptor) pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyDescriptor)> {
        self.properties
            .iter()
            .map(|(name, descriptor)| (name.as_str(), descriptor))
    }

    /// Number of declared properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if no properties are declared
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Check whether this is a single-property schema
    pub fn is_single_property(&self) -> bool {
        self.properties.len() == 1 && self.properties[0].0 == Self::SINGLE
    }

    /// Build data with every property at its declared default
    pub fn default_data(&self) -> ParsedData {
        let mut data = ParsedData::new();
        for (name, descriptor) in &self.properties {
            data.set(name.clone(), descriptor.default_value().clone());
        }
        data
    }

    /// Parse a full raw declaration into fully-defaulted data
    ///
    /// For single-property schemas the whole string is the property value;
    /// otherwise the string is split into `name: value` pairs. Unknown
    /// names fail in strict mode and are ignored with a warning otherwise.
    pub fn parse(&self, raw: &str, strict: bool) -> SchemaResult<ParsedData> {
        if self.is_single_property() {
            let mut overrides = BTreeMap::new();
            overrides.insert(Self::SINGLE.to_string(), raw.to_string());
            return self.apply(&ParsedData::new(), &overrides, strict);
        }
        self.apply(&ParsedData::new(), &parse_style(raw), strict)
    }

    /// Extend this schema with another's declarations
    ///
    /// Used to compose a dynamic schema from a base schema and a variant
    /// sub-schema. Coinciding names take the other schema's declaration;
    /// new names append in the other schema's declaration order.
    pub fn extend(mut self, other: &Schema) -> Schema {
        for (name, descriptor) in other.iter() {
            if let Some(&i) = self.index.get(name) {
                self.properties[i].1 = descriptor.clone();
            } else {
                self.index.insert(name.to_string(), self.properties.len());
                self.properties.push((name.to_string(), descriptor.clone()));
            }
        }
        self
    }

    /// Merge raw overrides onto previous data, then default
    ///
    /// Every declared property ends up with a value: the override's parse
    /// result if present, else the carried-over previous value, else the
    /// declared default. Properties of `previous` no longer declared in
    /// this schema are discarded. The inputs are never mutated, so a parse
    /// failure leaves the caller's data untouched.
    pub fn apply(
        &self,
        previous: &ParsedData,
        overrides: &BTreeMap<String, String>,
        strict: bool,
    ) -> SchemaResult<ParsedData> {
        for name in overrides.keys() {
            if !self.contains(name) {
                if strict {
                    return Err(SchemaError::UnknownProperty(name.clone()));
                }
                log::warn!("ignoring unknown property `{}`", name);
            }
        }

        let mut data = ParsedData::new();
        for (name, descriptor) in &self.properties {
            let value = match overrides.get(name) {
                Some(raw) => descriptor.parse(raw)?,
                None => match previous.get(name) {
                    Some(carried) => carried.clone(),
                    None => descriptor.default_value().clone(),
                },
            };
            data.set(name.clone(), value);
        }
        Ok(data)
    }
}
