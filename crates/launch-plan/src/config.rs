// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Planner settings loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! profiles = "training.yml"
//! total_devices = 16
//! default_total_steps = 10000
//!
//! [datasets]
//! imagenet = 1281167
//! cifar10 = 50000
//!
//! [[unsupported]]
//! precision = "16.16"
//! replication_factor = 64
//! ```
//!
//! A relative `profiles` path is resolved against the directory of the
//! settings file.

use crate::LaunchError;
use plan_validator::{CapabilityTable, UnsupportedCombination};
use profile_store::ProfileStore;
use schedule_builder::StaticCatalog;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Settings for the planning pipeline.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlannerSettings {
    /// Path to the YAML profile file.
    #[serde(default = "default_profiles")]
    pub profiles: PathBuf,
    /// Size of the device pool plans are made for.
    #[serde(default = "default_total_devices")]
    pub total_devices: u32,
    /// Step budget used when neither the caller nor the profile sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_total_steps: Option<u64>,
    /// Dataset name → training sample count.
    #[serde(default)]
    pub datasets: BTreeMap<String, u64>,
    /// Precision/replication combinations the accelerator runtime rejects.
    #[serde(default)]
    pub unsupported: Vec<UnsupportedCombination>,
}

fn default_profiles() -> PathBuf {
    PathBuf::from("configs/training.yml")
}

fn default_total_devices() -> u32 {
    16
}

impl PlannerSettings {
    /// Loads settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, LaunchError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LaunchError::ConfigError(format!("cannot read settings '{}': {e}", path.display()))
        })?;
        let mut settings = Self::from_toml(&content)?;
        if settings.profiles.is_relative() {
            if let Some(dir) = path.parent() {
                settings.profiles = dir.join(&settings.profiles);
            }
        }
        tracing::debug!(
            "settings loaded from '{}', profiles at '{}'",
            path.display(),
            settings.profiles.display()
        );
        Ok(settings)
    }

    /// Parses settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, LaunchError> {
        toml::from_str(toml_str)
            .map_err(|e| LaunchError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises settings to TOML.
    pub fn to_toml(&self) -> Result<String, LaunchError> {
        toml::to_string_pretty(self)
            .map_err(|e| LaunchError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Opens a profile store over [`Self::profiles`].
    pub fn open_store(&self) -> Result<ProfileStore, LaunchError> {
        Ok(ProfileStore::from_file(&self.profiles)?)
    }

    /// The dataset sizes as a catalog.
    pub fn catalog(&self) -> StaticCatalog {
        StaticCatalog::from(self.datasets.clone())
    }

    /// The deny list as a capability table.
    pub fn capabilities(&self) -> CapabilityTable {
        CapabilityTable::from(self.unsupported.clone())
    }
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            profiles: default_profiles(),
            total_devices: default_total_devices(),
            default_total_steps: None,
            datasets: BTreeMap::new(),
            unsupported: Vec::new(),
        }
    }
}
