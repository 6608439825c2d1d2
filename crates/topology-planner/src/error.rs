// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the topology planner.

use profile_store::ProfileError;

/// Errors that can occur while turning a resolved profile into a plan.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// A batch factor is zero or negative.
    #[error("'{key}' must be positive, got {value}")]
    NonPositiveBatchSize { key: String, value: i64 },

    /// The stage layout itself is malformed.
    #[error("invalid partition: {detail}")]
    InvalidPartition { detail: String },

    /// The partition does not tile the device pool.
    #[error(
        "{stage_devices} devices per replica × replication factor {replication_factor} \
         does not fit a pool of {total_devices} devices: {detail}"
    )]
    DeviceOversubscription {
        stage_devices: u64,
        replication_factor: u32,
        total_devices: u32,
        detail: String,
    },

    /// Memory proportions do not match the stages or fall outside `(0, 1]`.
    #[error("invalid memory proportions: {detail}")]
    InvalidPartitionWeights { detail: String },

    /// The compute/storage precision pair is not one of the supported modes.
    #[error("unsupported precision pair '{precision}' (supported: 16.16, 16.32, 32.32)")]
    UnsupportedPrecisionPair { precision: String },

    /// A loss-scaling factor is not a positive finite number.
    #[error("invalid loss scaling for '{key}': {detail}")]
    InvalidLossScaling { key: String, detail: String },

    /// A value has the right type but is outside its allowed set or range.
    #[error("invalid value for '{key}': {detail}")]
    InvalidValue { key: String, detail: String },

    /// A key is missing or has the wrong type.
    #[error(transparent)]
    Config(#[from] ProfileError),
}

impl PlannerError {
    /// Returns a stable, machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NonPositiveBatchSize { .. } => "NonPositiveBatchSize",
            Self::InvalidPartition { .. } => "InvalidPartition",
            Self::DeviceOversubscription { .. } => "DeviceOversubscription",
            Self::InvalidPartitionWeights { .. } => "InvalidPartitionWeights",
            Self::UnsupportedPrecisionPair { .. } => "UnsupportedPrecisionPair",
            Self::InvalidLossScaling { .. } => "InvalidLossScaling",
            Self::InvalidValue { .. } => "InvalidValue",
            Self::Config(e) => e.kind(),
        }
    }

    pub(crate) fn invalid(key: &str, detail: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            detail: detail.into(),
        }
    }
}
