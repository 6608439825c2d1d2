// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared helpers.

pub mod check;
pub mod plan;
pub mod profiles;
pub mod resolve;

use launch_plan::{LaunchError, PlannerSettings};
use profile_store::{parse_assignment, ConfigValue, ProfileError};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_SETTINGS: &str = "configs/trainplan.toml";

/// Installs the fmt subscriber on stderr. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads the settings file, falling back to built-in defaults when no
/// file is given and the default location does not exist.
pub fn load_settings(
    config: Option<&Path>,
    profiles: Option<PathBuf>,
) -> Result<PlannerSettings, LaunchError> {
    let mut settings = match config {
        Some(path) => PlannerSettings::from_file(path)?,
        None if Path::new(DEFAULT_SETTINGS).exists() => {
            PlannerSettings::from_file(Path::new(DEFAULT_SETTINGS))?
        }
        None => PlannerSettings::default(),
    };
    if let Some(path) = profiles {
        settings.profiles = path;
    }
    tracing::debug!(
        "profiles at '{}', {} devices, {} dataset(s) known",
        settings.profiles.display(),
        settings.total_devices,
        settings.datasets.len()
    );
    Ok(settings)
}

/// Parses repeated `--set key=value` arguments.
pub fn parse_overrides(raw: &[String]) -> Result<Vec<(String, ConfigValue)>, LaunchError> {
    raw.iter()
        .map(|s| parse_assignment(s).map_err(LaunchError::from))
        .collect()
}

/// Machine-readable kind for the `error[kind]` prefix.
pub fn error_kind(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<LaunchError>() {
        e.kind()
    } else if let Some(e) = err.downcast_ref::<ProfileError>() {
        e.kind()
    } else {
        "Error"
    }
}
