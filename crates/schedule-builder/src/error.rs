// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for schedule construction.

/// Errors that can occur while deriving a schedule.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Training length, checkpoint interval, or dataset size is unusable.
    #[error("invalid schedule parameters: {detail}")]
    InvalidScheduleParameters { detail: String },

    /// The plan names no dataset, so epochs cannot be derived.
    #[error("profile '{profile}' does not name a dataset")]
    MissingDataset { profile: String },

    /// The dataset catalog does not know the plan's dataset.
    #[error("unknown dataset '{0}'")]
    UnknownDataset(String),
}

impl ScheduleError {
    /// Returns a stable, machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidScheduleParameters { .. } => "InvalidScheduleParameters",
            Self::MissingDataset { .. } => "MissingDataset",
            Self::UnknownDataset(_) => "UnknownDataset",
        }
    }

    pub(crate) fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidScheduleParameters {
            detail: detail.into(),
        }
    }
}
