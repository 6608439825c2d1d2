// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Command-line overrides applied on top of a resolved profile.

use crate::{ConfigValue, KeySchema, ProfileError, ResolvedConfig};

/// Provenance label recorded for overridden keys.
pub const OVERRIDE_SOURCE: &str = "override";

/// Applies `(key, value)` overrides to a resolved profile.
///
/// An override key must already exist in the profile or be registered in
/// the schema. Values replace the existing value wholesale and must match
/// the schema kind when the key is registered.
pub struct OverrideMerger<'a> {
    schema: &'a KeySchema,
}

impl<'a> OverrideMerger<'a> {
    pub fn new(schema: &'a KeySchema) -> Self {
        Self { schema }
    }

    /// Returns a copy of `base` with `overrides` applied in order.
    ///
    /// `base` is never modified; an error leaves no partial result.
    pub fn apply(
        &self,
        base: &ResolvedConfig,
        overrides: &[(String, ConfigValue)],
    ) -> Result<ResolvedConfig, ProfileError> {
        let mut merged = base.clone();

        for (key, value) in overrides {
            match self.schema.get(key) {
                Some(spec) if !spec.kind.accepts(value) => {
                    return Err(ProfileError::TypeMismatch {
                        key: key.clone(),
                        expected: spec.kind.describe(),
                        found: format!("{} `{value}`", value.type_name()),
                    });
                }
                Some(_) => {}
                None if base.contains_key(key) => {}
                None => {
                    return Err(ProfileError::UnrecognizedOverrideKey {
                        key: key.clone(),
                        suggestion: self.schema.suggest(key).map(str::to_string),
                    });
                }
            }

            tracing::debug!(
                "override {key} = {value} (was {})",
                base.get(key).map_or_else(|| "unset".to_string(), |v| v.to_string())
            );
            merged.set(key, value.clone(), OVERRIDE_SOURCE);
        }

        merged.check_required(self.schema)?;
        Ok(merged)
    }
}

/// Parses a `key=value` assignment as given to `--set`.
///
/// The value uses YAML scalar syntax, see [`ConfigValue::parse_literal`].
pub fn parse_assignment(assignment: &str) -> Result<(String, ConfigValue), ProfileError> {
    let (key, literal) = assignment
        .split_once('=')
        .ok_or_else(|| ProfileError::InvalidValue {
            key: assignment.to_string(),
            detail: "expected key=value".into(),
        })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(ProfileError::InvalidValue {
            key: assignment.to_string(),
            detail: "empty key".into(),
        });
    }
    let value = ConfigValue::parse_literal(key, literal)?;
    Ok((key.to_string(), value))
}
