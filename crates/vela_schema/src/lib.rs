//! # vela_schema - Typed property schemas
//!
//! The schema engine underneath declarative components:
//! - Typed property declarations with defaults and constraints
//! - Parsing of raw markup strings into typed values
//! - Canonical stringification for cache keys and host reflection
//! - Type-aware equality and data diffing

pub mod color;
pub mod data;
pub mod property;
pub mod schema;
pub mod value;

pub use color::Color;
pub use data::{diff, DataDiff, ParsedData, PropertyChange};
pub use property::{PropertyDescriptor, PropertyType};
pub use schema::{parse_style, Schema};
pub use value::PropertyValue;

use thiserror::Error;

/// Errors from parsing raw values against a schema
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("unknown property `{0}`")]
    UnknownProperty(String),

    #[error("value `{value}` is not one of the allowed values {allowed:?}")]
    Disallowed { value: String, allowed: Vec<String> },

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("invalid integer `{0}`")]
    InvalidInt(String),

    #[error("invalid boolean `{0}`")]
    InvalidBool(String),

    #[error("invalid color `{0}`")]
    InvalidColor(String),

    #[error("invalid vector `{raw}`: expected {expected} components, found {found}")]
    InvalidVector {
        raw: String,
        expected: usize,
        found: usize,
    },
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
