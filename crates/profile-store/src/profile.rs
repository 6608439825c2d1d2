// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Profile definitions and YAML parsing.
//!
//! # Format
//! ```yaml
//! defaults:            # shared layer under every profile (optional)
//!   seed: 42
//!
//! resnet50:
//!   batch_size: 16
//!   devices_per_stage: [1, 1, 1, 1]
//!
//! resnet50-pod16:
//!   base: resnet50     # single parent; chains are allowed, cycles are not
//!   replication_factor: 4
//! ```
//!
//! YAML anchors and aliases are expanded by the parser. Merge keys (`<<`)
//! are rejected: inheritance is expressed only through `base`, so the
//! precedence of every value is visible in the resolution chain.

use crate::{ConfigValue, ProfileError};
use std::collections::BTreeMap;
use std::path::Path;

/// Reserved top-level name of the shared default layer.
pub const DEFAULTS_NAME: &str = "defaults";

/// Reserved in-profile key naming the parent profile.
pub const BASE_KEY: &str = "base";

const MERGE_KEY: &str = "<<";

/// An ordered list of `(key, value)` pairs contributed by one source.
///
/// Within a layer a later entry for the same key wins, matching the fold
/// applied across layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Where the entries come from: `"defaults"`, a profile name, or
    /// `"override"`.
    pub source: String,
    pub entries: Vec<(String, ConfigValue)>,
}

impl Layer {
    pub fn new(source: &str, entries: Vec<(String, ConfigValue)>) -> Self {
        Self {
            source: source.to_string(),
            entries,
        }
    }

    /// Returns the last value set for `key` in this layer.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A named profile with an optional parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub base: Option<String>,
    pub layer: Layer,
}

impl Profile {
    /// Creates an empty profile with no parent.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base: None,
            layer: Layer::new(name, Vec::new()),
        }
    }

    /// Sets the parent profile.
    pub fn with_base(mut self, base: &str) -> Self {
        self.base = Some(base.to_string());
        self
    }

    /// Appends a key/value pair.
    pub fn set(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
        self.layer.entries.push((key.to_string(), value.into()));
        self
    }
}

/// A parsed collection of profiles plus the optional shared default layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSet {
    pub defaults: Option<Layer>,
    profiles: BTreeMap<String, Profile>,
}

impl ProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a profile set from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ProfileError> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!("loading profiles from '{}'", path.display());
        Self::from_yaml(&content)
    }

    /// Parses a profile set from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ProfileError> {
        let doc: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let top = match doc {
            serde_yaml::Value::Null => return Ok(Self::new()),
            serde_yaml::Value::Mapping(m) => m,
            other => {
                return Err(ProfileError::InvalidProfile {
                    profile: "<document>".into(),
                    detail: format!("expected a mapping of profiles, found {}", yaml_type(&other)),
                })
            }
        };

        let mut set = Self::new();
        for (name, body) in top {
            let name = match name {
                serde_yaml::Value::String(s) => s,
                other => {
                    return Err(ProfileError::InvalidProfile {
                        profile: format!("{other:?}"),
                        detail: "profile names must be strings".into(),
                    })
                }
            };
            let profile = parse_profile(&name, body)?;

            if name == DEFAULTS_NAME {
                if profile.base.is_some() {
                    return Err(ProfileError::InvalidProfile {
                        profile: name,
                        detail: format!("the default layer cannot declare a '{BASE_KEY}'"),
                    });
                }
                set.defaults = Some(profile.layer);
            } else {
                set.insert(profile);
            }
        }
        Ok(set)
    }

    /// Sets the shared default layer.
    pub fn with_defaults(mut self, entries: Vec<(String, ConfigValue)>) -> Self {
        self.defaults = Some(Layer::new(DEFAULTS_NAME, entries));
        self
    }

    /// Adds a profile, returning `self` for chaining.
    pub fn with(mut self, profile: Profile) -> Self {
        self.insert(profile);
        self
    }

    /// Adds or replaces a profile.
    pub fn insert(&mut self, profile: Profile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Profile names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn parse_profile(name: &str, body: serde_yaml::Value) -> Result<Profile, ProfileError> {
    let mapping = match body {
        serde_yaml::Value::Mapping(m) => m,
        serde_yaml::Value::Null => serde_yaml::Mapping::new(),
        other => {
            return Err(ProfileError::InvalidProfile {
                profile: name.to_string(),
                detail: format!("expected a mapping, found {}", yaml_type(&other)),
            })
        }
    };

    let mut profile = Profile::new(name);
    for (key, value) in mapping {
        let key = match key {
            serde_yaml::Value::String(s) => s,
            other => {
                return Err(ProfileError::InvalidProfile {
                    profile: name.to_string(),
                    detail: format!("keys must be strings, found {}", yaml_type(&other)),
                })
            }
        };

        if key == MERGE_KEY {
            return Err(ProfileError::InvalidProfile {
                profile: name.to_string(),
                detail: format!("merge keys are not supported; use '{BASE_KEY}: <profile>'"),
            });
        }

        if key == BASE_KEY {
            match value {
                serde_yaml::Value::String(parent) => profile.base = Some(parent),
                serde_yaml::Value::Null => {}
                other => {
                    return Err(ProfileError::InvalidProfile {
                        profile: name.to_string(),
                        detail: format!(
                            "'{BASE_KEY}' must name a profile, found {}",
                            yaml_type(&other)
                        ),
                    })
                }
            }
            continue;
        }

        let value: ConfigValue =
            serde_yaml::from_value(value).map_err(|e| ProfileError::InvalidProfile {
                profile: name.to_string(),
                detail: format!("key '{key}': nested mappings are not allowed ({e})"),
            })?;
        profile.layer.entries.push((key, value));
    }
    Ok(profile)
}

fn yaml_type(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a bool",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
defaults: &common
  precision: "16.16"
  seed: 42

resnet50:
  batch_size: 16
  devices_per_stage: [1, 1, 1, 1]
  memory_proportion: [0.3, 0.3, 0.3, 0.3]

resnet50-pod16:
  base: resnet50
  replication_factor: 4
"#;

    #[test]
    fn test_parse_profiles() {
        let set = ProfileSet::from_yaml(SAMPLE).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.names().collect::<Vec<_>>(), ["resnet50", "resnet50-pod16"]);

        let pod = set.get("resnet50-pod16").unwrap();
        assert_eq!(pod.base.as_deref(), Some("resnet50"));
        assert_eq!(pod.layer.get("replication_factor"), Some(&ConfigValue::Int(4)));
        assert!(pod.layer.get("base").is_none());
    }

    #[test]
    fn test_defaults_layer() {
        let set = ProfileSet::from_yaml(SAMPLE).unwrap();
        let defaults = set.defaults.as_ref().unwrap();
        assert_eq!(defaults.source, DEFAULTS_NAME);
        assert_eq!(defaults.get("seed"), Some(&ConfigValue::Int(42)));
    }

    #[test]
    fn test_entry_order_preserved() {
        let set = ProfileSet::from_yaml(SAMPLE).unwrap();
        let keys: Vec<_> = set
            .get("resnet50")
            .unwrap()
            .layer
            .entries
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, ["batch_size", "devices_per_stage", "memory_proportion"]);
    }

    #[test]
    fn test_aliases_expand() {
        let yaml = r#"
shared_devices: &devs [1, 2]
a:
  devices_per_stage: *devs
"#;
        // `shared_devices` is a scalar-valued profile body, which is invalid.
        assert!(ProfileSet::from_yaml(yaml).is_err());

        let yaml = r#"
a:
  devices_per_stage: &devs [1, 2]
b:
  devices_per_stage: *devs
"#;
        let set = ProfileSet::from_yaml(yaml).unwrap();
        assert_eq!(
            set.get("b").unwrap().layer.get("devices_per_stage"),
            Some(&ConfigValue::from(vec![1, 2]))
        );
    }

    #[test]
    fn test_merge_key_rejected() {
        let yaml = r#"
a: &a
  batch_size: 4
b:
  <<: *a
  seed: 1
"#;
        let err = ProfileSet::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidProfile { ref profile, .. } if profile == "b"));
    }

    #[test]
    fn test_nested_mapping_rejected() {
        let yaml = "a:\n  optimizer:\n    name: sgd\n";
        assert!(matches!(
            ProfileSet::from_yaml(yaml),
            Err(ProfileError::InvalidProfile { .. })
        ));
    }

    #[test]
    fn test_defaults_cannot_have_base() {
        let yaml = "defaults:\n  base: a\na:\n  seed: 1\n";
        assert!(ProfileSet::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_empty_document() {
        let set = ProfileSet::from_yaml("").unwrap();
        assert!(set.is_empty());
        assert!(set.defaults.is_none());
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        assert!(ProfileSet::from_yaml("- a\n- b\n").is_err());
    }

    #[test]
    fn test_builder() {
        let set = ProfileSet::new()
            .with_defaults(vec![("seed".into(), 7.into())])
            .with(Profile::new("x").set("batch_size", 4))
            .with(Profile::new("y").with_base("x"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("y").unwrap().base.as_deref(), Some("x"));
        assert_eq!(set.defaults.unwrap().get("seed"), Some(&ConfigValue::Int(7)));
    }

    #[test]
    fn test_layer_last_entry_wins() {
        let layer = Layer::new(
            "p",
            vec![("k".into(), 1.into()), ("k".into(), 2.into())],
        );
        assert_eq!(layer.get("k"), Some(&ConfigValue::Int(2)));
    }
}
