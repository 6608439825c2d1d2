// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Configuration values: the scalars and sequences a profile may hold.

use crate::ProfileError;
use std::fmt;

/// A single profile value.
///
/// Profiles are flat: values are scalars or sequences of scalars, never
/// nested mappings. Deserialization is untagged, so YAML `4` becomes
/// [`ConfigValue::Int`], `0.5` becomes [`ConfigValue::Float`], and
/// `[1, 2]` becomes a [`ConfigValue::Seq`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Explicitly unset (`null` / `~`).
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<ConfigValue>),
}

impl ConfigValue {
    /// Parses a command-line literal using YAML scalar syntax.
    ///
    /// `"4"` → `Int(4)`, `"0.25"` → `Float(0.25)`, `"[1, 1]"` → `Seq`,
    /// `"sgd"` → `Str("sgd")`. Mappings are rejected.
    pub fn parse_literal(key: &str, literal: &str) -> Result<Self, ProfileError> {
        let trimmed = literal.trim();
        if trimmed.is_empty() {
            return Err(ProfileError::InvalidValue {
                key: key.to_string(),
                detail: "empty value".into(),
            });
        }
        serde_yaml::from_str(trimmed).map_err(|e| ProfileError::InvalidValue {
            key: key.to_string(),
            detail: format!("cannot parse '{trimmed}': {e}"),
        })
    }

    /// Returns a short name for the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Seq(_) => "sequence",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float. Integers widen losslessly enough for
    /// configuration purposes.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[ConfigValue]> {
        match self {
            Self::Seq(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for ConfigValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(v: Vec<T>) -> Self {
        Self::Seq(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_scalars() {
        assert_eq!(ConfigValue::parse_literal("k", "4").unwrap(), ConfigValue::Int(4));
        assert_eq!(
            ConfigValue::parse_literal("k", "0.25").unwrap(),
            ConfigValue::Float(0.25)
        );
        assert_eq!(
            ConfigValue::parse_literal("k", "true").unwrap(),
            ConfigValue::Bool(true)
        );
        assert_eq!(
            ConfigValue::parse_literal("k", "sgd").unwrap(),
            ConfigValue::Str("sgd".into())
        );
        assert_eq!(ConfigValue::parse_literal("k", "~").unwrap(), ConfigValue::Null);
    }

    #[test]
    fn test_parse_literal_sequence() {
        let v = ConfigValue::parse_literal("devices_per_stage", "[1, 1, 2]").unwrap();
        assert_eq!(v, ConfigValue::from(vec![1, 1, 2]));
    }

    #[test]
    fn test_parse_literal_rejects_mapping_and_empty() {
        assert!(ConfigValue::parse_literal("k", "{a: 1}").is_err());
        assert!(ConfigValue::parse_literal("k", "   ").is_err());
    }

    #[test]
    fn test_as_f64_widens_int() {
        assert_eq!(ConfigValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(ConfigValue::Str("3".into()).as_f64(), None);
    }

    #[test]
    fn test_display() {
        let v = ConfigValue::from(vec![0.3, 0.7]);
        assert_eq!(v.to_string(), "[0.3, 0.7]");
        assert_eq!(ConfigValue::Null.to_string(), "null");
    }

    #[test]
    fn test_json_shape() {
        let v = ConfigValue::from(vec![1, 2]);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[1,2]");
        let back: ConfigValue = serde_json::from_str("[1,2]").unwrap();
        assert_eq!(back, v);
    }
}
