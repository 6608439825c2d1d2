// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for profile loading, resolution, and overrides.

/// Errors that can occur while loading or resolving profiles.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// The requested profile (or a base it names) does not exist.
    #[error("unknown profile '{0}'")]
    UnknownProfile(String),

    /// A base chain revisits a profile already on the resolution stack.
    #[error("cyclic inheritance: {}", .chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },

    /// An override names a key that neither the profile nor the schema knows.
    #[error("unrecognized override key '{key}'{}", did_you_mean(.suggestion))]
    UnrecognizedOverrideKey {
        key: String,
        suggestion: Option<String>,
    },

    /// A key required for planning is absent after resolution.
    #[error("profile '{profile}' is missing required key '{key}'")]
    MissingKey { profile: String, key: String },

    /// A value does not have the type the schema declares for its key.
    #[error("key '{key}' expects {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: String,
    },

    /// A value has the right type but cannot be interpreted.
    #[error("invalid value for '{key}': {detail}")]
    InvalidValue { key: String, detail: String },

    /// A profile definition is malformed.
    #[error("invalid profile '{profile}': {detail}")]
    InvalidProfile { profile: String, detail: String },

    /// The profile file could not be read.
    #[error("failed to read profile file: {0}")]
    Io(#[from] std::io::Error),

    /// The profile file is not valid YAML.
    #[error("failed to parse profile YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ProfileError {
    /// Returns a stable, machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownProfile(_) => "UnknownProfile",
            Self::CyclicInheritance { .. } => "CyclicInheritance",
            Self::UnrecognizedOverrideKey { .. } => "UnrecognizedOverrideKey",
            Self::MissingKey { .. } => "MissingKey",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::InvalidValue { .. } => "InvalidValue",
            Self::InvalidProfile { .. } => "InvalidProfile",
            Self::Io(_) => "ProfileIo",
            Self::Yaml(_) => "ProfileParse",
        }
    }
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => String::new(),
    }
}
