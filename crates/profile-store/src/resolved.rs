// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The flattened result of folding a profile's layers.

use crate::{ConfigValue, KeySchema, Layer, ProfileError};
use std::collections::BTreeMap;
use std::fmt;

/// A fully merged key → value mapping for one profile.
///
/// Each key also records the layer that supplied its winning value, so
/// the precedence of any setting can be audited after the fact.
///
/// Typed accessors treat an explicit `null` the same as an absent key.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResolvedConfig {
    profile: String,
    values: BTreeMap<String, ConfigValue>,
    sources: BTreeMap<String, String>,
}

impl ResolvedConfig {
    /// Creates an empty configuration for `profile`.
    pub fn new(profile: &str) -> Self {
        Self {
            profile: profile.to_string(),
            values: BTreeMap::new(),
            sources: BTreeMap::new(),
        }
    }

    /// Folds `layer` over the current values. Later entries win.
    pub fn apply_layer(&mut self, layer: &Layer) {
        for (key, value) in &layer.entries {
            self.set(key, value.clone(), &layer.source);
        }
    }

    pub(crate) fn set(&mut self, key: &str, value: ConfigValue, source: &str) {
        self.values.insert(key.to_string(), value);
        self.sources.insert(key.to_string(), source.to_string());
    }

    /// Fails with [`ProfileError::MissingKey`] for the first required key
    /// that is absent or `null`.
    pub fn check_required(&self, schema: &KeySchema) -> Result<(), ProfileError> {
        for key in schema.required_keys() {
            if !self.has_value(key) {
                return Err(ProfileError::MissingKey {
                    profile: self.profile.clone(),
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Name of the profile this configuration was resolved from.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Returns the raw value for `key`, including an explicit `null`.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Returns the layer that supplied `key`.
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.sources.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns `true` if `key` is present with a non-null value.
    pub fn has_value(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Iterates `(key, value, source)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue, &str)> {
        self.values.iter().map(|(k, v)| {
            let source = self.sources.get(k).map(String::as_str).unwrap_or("");
            (k.as_str(), v, source)
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // ── Typed accessors ────────────────────────────────────────────

    fn value(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    fn mismatch(key: &str, expected: &'static str, found: &ConfigValue) -> ProfileError {
        ProfileError::TypeMismatch {
            key: key.to_string(),
            expected,
            found: format!("{} `{found}`", found.type_name()),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ProfileError> {
        self.value(key)
            .map(|v| v.as_bool().ok_or_else(|| Self::mismatch(key, "a bool", v)))
            .transpose()
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>, ProfileError> {
        self.value(key)
            .map(|v| v.as_i64().ok_or_else(|| Self::mismatch(key, "an integer", v)))
            .transpose()
    }

    pub fn get_float(&self, key: &str) -> Result<Option<f64>, ProfileError> {
        self.value(key)
            .map(|v| v.as_f64().ok_or_else(|| Self::mismatch(key, "a number", v)))
            .transpose()
    }

    pub fn get_str(&self, key: &str) -> Result<Option<&str>, ProfileError> {
        self.value(key)
            .map(|v| v.as_str().ok_or_else(|| Self::mismatch(key, "a string", v)))
            .transpose()
    }

    pub fn get_int_list(&self, key: &str) -> Result<Option<Vec<i64>>, ProfileError> {
        self.get_list(key, "a sequence of integers", ConfigValue::as_i64)
    }

    pub fn get_float_list(&self, key: &str) -> Result<Option<Vec<f64>>, ProfileError> {
        self.get_list(key, "a sequence of numbers", ConfigValue::as_f64)
    }

    pub fn get_str_list(&self, key: &str) -> Result<Option<Vec<String>>, ProfileError> {
        self.get_list(key, "a sequence of strings", |v| v.as_str().map(str::to_string))
    }

    fn get_list<T>(
        &self,
        key: &str,
        expected: &'static str,
        item: impl Fn(&ConfigValue) -> Option<T>,
    ) -> Result<Option<Vec<T>>, ProfileError> {
        let Some(value) = self.value(key) else {
            return Ok(None);
        };
        let items = value
            .as_seq()
            .ok_or_else(|| Self::mismatch(key, expected, value))?;
        items
            .iter()
            .map(|v| item(v).ok_or_else(|| Self::mismatch(key, expected, value)))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Like [`Self::get_int`] but fails with [`ProfileError::MissingKey`].
    pub fn require_int(&self, key: &str) -> Result<i64, ProfileError> {
        self.get_int(key)?.ok_or_else(|| self.missing(key))
    }

    /// Like [`Self::get_int_list`] but fails with [`ProfileError::MissingKey`].
    pub fn require_int_list(&self, key: &str) -> Result<Vec<i64>, ProfileError> {
        self.get_int_list(key)?.ok_or_else(|| self.missing(key))
    }

    /// Like [`Self::get_float_list`] but fails with [`ProfileError::MissingKey`].
    pub fn require_float_list(&self, key: &str) -> Result<Vec<f64>, ProfileError> {
        self.get_float_list(key)?.ok_or_else(|| self.missing(key))
    }

    /// Returns the raw non-null value or [`ProfileError::MissingKey`].
    pub fn require(&self, key: &str) -> Result<&ConfigValue, ProfileError> {
        self.value(key).ok_or_else(|| self.missing(key))
    }

    fn missing(&self, key: &str) -> ProfileError {
        ProfileError::MissingKey {
            profile: self.profile.clone(),
            key: key.to_string(),
        }
    }
}

impl fmt::Display for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ResolvedConfig '{}' ({} keys):", self.profile, self.len())?;
        for (key, value, source) in self.iter() {
            writeln!(f, "  {key:<24} = {value:<28} [{source}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResolvedConfig {
        let mut c = ResolvedConfig::new("p");
        c.apply_layer(&Layer::new(
            "defaults",
            vec![
                ("gradient_accumulation".into(), 1.into()),
                ("seed".into(), 1.into()),
            ],
        ));
        c.apply_layer(&Layer::new(
            "p",
            vec![
                ("batch_size".into(), 16.into()),
                ("seed".into(), ConfigValue::Null),
                ("devices_per_stage".into(), vec![1, 2].into()),
                ("memory_proportion".into(), vec![0.5, 1.0].into()),
                ("optimizer".into(), "sgd".into()),
            ],
        ));
        c
    }

    #[test]
    fn test_provenance() {
        let c = sample();
        assert_eq!(c.source_of("gradient_accumulation"), Some("defaults"));
        assert_eq!(c.source_of("batch_size"), Some("p"));
        assert_eq!(c.source_of("seed"), Some("p"));
        assert_eq!(c.source_of("missing"), None);
    }

    #[test]
    fn test_null_is_unset() {
        let c = sample();
        assert!(c.contains_key("seed"));
        assert!(!c.has_value("seed"));
        assert_eq!(c.get_int("seed").unwrap(), None);
    }

    #[test]
    fn test_typed_accessors() {
        let c = sample();
        assert_eq!(c.require_int("batch_size").unwrap(), 16);
        assert_eq!(c.require_int_list("devices_per_stage").unwrap(), vec![1, 2]);
        assert_eq!(c.require_float_list("memory_proportion").unwrap(), vec![0.5, 1.0]);
        assert_eq!(c.get_str("optimizer").unwrap(), Some("sgd"));
        assert_eq!(c.get_float("batch_size").unwrap(), Some(16.0));
    }

    #[test]
    fn test_type_mismatch() {
        let c = sample();
        assert!(matches!(
            c.get_int("optimizer"),
            Err(ProfileError::TypeMismatch { .. })
        ));
        assert!(matches!(
            c.get_int_list("memory_proportion"),
            Err(ProfileError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_require_missing() {
        let c = sample();
        assert!(matches!(
            c.require_int("epochs"),
            Err(ProfileError::MissingKey { ref key, .. }) if key == "epochs"
        ));
    }

    #[test]
    fn test_check_required() {
        let schema = KeySchema::standard();
        let err = sample().check_required(&schema).unwrap_err();
        assert!(matches!(err, ProfileError::MissingKey { ref key, .. } if key == "precision"));
    }

    #[test]
    fn test_display_lists_sources() {
        let s = sample().to_string();
        assert!(s.contains("ResolvedConfig 'p'"));
        assert!(s.contains("[defaults]"));
    }
}
