// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Profile resolution with a read-through cache.
//!
//! # Generations
//! The store holds one immutable *generation*: a [`ProfileSet`] plus the
//! cache of profiles resolved from it. [`ProfileStore::reload`] builds a
//! complete new generation and swaps the pointer under a short write lock.
//! A reader that already cloned the old generation finishes its lookup
//! against it, so no caller ever sees a mix of old and new profiles.
//!
//! # Thread Safety
//! `ProfileStore` is `Send + Sync` and can be shared via `Arc`. Cache
//! entries are inserted only after a profile is fully merged.

use crate::{KeySchema, Profile, ProfileError, ProfileSet, ResolvedConfig};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

struct Generation {
    profiles: ProfileSet,
    cache: RwLock<HashMap<String, Arc<ResolvedConfig>>>,
}

impl Generation {
    fn new(profiles: ProfileSet) -> Self {
        Self {
            profiles,
            cache: RwLock::new(HashMap::new()),
        }
    }
}

/// Resolves named profiles through their `base` chain.
pub struct ProfileStore {
    schema: KeySchema,
    current: RwLock<Arc<Generation>>,
}

impl ProfileStore {
    /// Creates a store over `profiles` using [`KeySchema::standard`].
    pub fn new(profiles: ProfileSet) -> Self {
        Self::with_schema(profiles, KeySchema::standard())
    }

    /// Creates a store with a custom key schema.
    pub fn with_schema(profiles: ProfileSet, schema: KeySchema) -> Self {
        tracing::debug!("profile store created with {} profiles", profiles.len());
        Self {
            schema,
            current: RwLock::new(Arc::new(Generation::new(profiles))),
        }
    }

    /// Loads a profile file and creates a store over it.
    pub fn from_file(path: &Path) -> Result<Self, ProfileError> {
        Ok(Self::new(ProfileSet::from_file(path)?))
    }

    /// The key schema used for defaults, required keys, and overrides.
    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }

    fn generation(&self) -> Arc<Generation> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Returns the resolved configuration for `name`.
    ///
    /// Repeated calls return the same cached `Arc` until the next
    /// [`reload`](Self::reload).
    ///
    /// # Errors
    /// - [`ProfileError::UnknownProfile`] if `name` or any base is absent.
    /// - [`ProfileError::CyclicInheritance`] if the base chain loops.
    /// - [`ProfileError::TypeMismatch`] if a value contradicts the schema.
    /// - [`ProfileError::MissingKey`] if a required key is unset.
    pub fn load(&self, name: &str) -> Result<Arc<ResolvedConfig>, ProfileError> {
        let generation = self.generation();

        if let Some(hit) = generation
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            tracing::trace!("profile cache hit for '{name}'");
            return Ok(Arc::clone(hit));
        }

        let resolved = Arc::new(self.resolve(&generation.profiles, name)?);

        let mut cache = generation
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // A concurrent loader may have won the race; keep the first entry.
        let entry = cache.entry(name.to_string()).or_insert(resolved);
        Ok(Arc::clone(entry))
    }

    fn resolve(&self, profiles: &ProfileSet, name: &str) -> Result<ResolvedConfig, ProfileError> {
        let chain = lineage(profiles, name)?;
        tracing::debug!(
            "resolving '{name}' via {}",
            chain
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(" <- ")
        );

        let mut config = ResolvedConfig::new(name);
        config.apply_layer(&self.schema.default_layer());
        if let Some(defaults) = &profiles.defaults {
            config.apply_layer(defaults);
        }
        for profile in chain.iter().rev() {
            config.apply_layer(&profile.layer);
        }

        for (key, value, source) in config.iter() {
            match self.schema.get(key) {
                Some(spec) if !spec.kind.accepts(value) => {
                    return Err(ProfileError::TypeMismatch {
                        key: key.to_string(),
                        expected: spec.kind.describe(),
                        found: format!("{} `{value}` from '{source}'", value.type_name()),
                    });
                }
                Some(_) => {}
                None => tracing::debug!("profile '{name}': key '{key}' is not in the schema"),
            }
        }

        config.check_required(&self.schema)?;
        Ok(config)
    }

    /// Replaces the profile set and drops every cached resolution.
    pub fn reload(&self, profiles: ProfileSet) {
        let next = Arc::new(Generation::new(profiles));
        let count = next.profiles.len();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
        tracing::info!("profile store reloaded ({count} profiles)");
    }

    /// Re-reads a profile file and swaps it in. On error the current
    /// generation stays in place.
    pub fn reload_from_file(&self, path: &Path) -> Result<(), ProfileError> {
        let profiles = ProfileSet::from_file(path)?;
        self.reload(profiles);
        Ok(())
    }

    /// Profile names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.generation()
            .profiles
            .names()
            .map(str::to_string)
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.generation().profiles.contains(name)
    }

    /// Returns the inheritance chain of `name`, starting with `name` itself
    /// and ending at its root ancestor.
    pub fn chain(&self, name: &str) -> Result<Vec<String>, ProfileError> {
        let generation = self.generation();
        let chain = lineage(&generation.profiles, name)?;
        Ok(chain.iter().map(|p| p.name.clone()).collect())
    }

    /// Number of resolved profiles cached in the current generation.
    pub fn cached_len(&self) -> usize {
        self.generation()
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Walks `base` links from `name` up to the root, child first.
fn lineage<'a>(profiles: &'a ProfileSet, name: &str) -> Result<Vec<&'a Profile>, ProfileError> {
    let mut chain: Vec<&Profile> = Vec::new();
    let mut next = Some(name);

    while let Some(current) = next {
        if chain.iter().any(|p| p.name == current) {
            let mut names: Vec<String> = chain.iter().map(|p| p.name.clone()).collect();
            names.push(current.to_string());
            return Err(ProfileError::CyclicInheritance { chain: names });
        }
        let profile = profiles
            .get(current)
            .ok_or_else(|| ProfileError::UnknownProfile(current.to_string()))?;
        chain.push(profile);
        next = profile.base.as_deref();
    }
    Ok(chain)
}
