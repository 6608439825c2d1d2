// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the planning pipeline.

use plan_validator::ValidationReport;
use profile_store::ProfileError;
use schedule_builder::ScheduleError;
use topology_planner::PlannerError;

/// Errors that can occur anywhere between profile lookup and a validated
/// launch plan.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// Profile lookup, inheritance, or override failure.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// The resolved profile cannot be planned.
    #[error(transparent)]
    Planner(#[from] PlannerError),

    /// The plan cannot be scheduled.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// The assembled plan failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationReport),

    /// Neither a step count nor an epoch count is available.
    #[error("no training length for '{profile}': set 'epochs' or pass a step count")]
    NoTrainingLength { profile: String },

    /// Settings file error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// The plan could not be serialised.
    #[error("serialisation error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LaunchError {
    /// Returns a stable, machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Profile(e) => e.kind(),
            Self::Planner(e) => e.kind(),
            Self::Schedule(e) => e.kind(),
            Self::Validation(_) => "ValidationFailed",
            Self::NoTrainingLength { .. } => "InvalidScheduleParameters",
            Self::ConfigError(_) => "ConfigError",
            Self::Json(_) => "SerializationError",
        }
    }
}
