// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pipeline stages, their memory weights, and device placement.
//!
//! A replica of the model is split into consecutive *stages*; each stage
//! runs on `devices_per_stage[i]` devices and may use
//! `memory_proportion[i]` of each device's memory for activations. The
//! whole partition is copied `replication_factor` times for data
//! parallelism.

use crate::PlannerError;
use std::ops::Range;

/// Per-stage device counts plus the parallel memory-proportion weights.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DevicePartitionSpec {
    pub devices_per_stage: Vec<u32>,
    pub memory_proportion: Vec<f64>,
    /// Layer names where one stage ends and the next begins. Either empty
    /// or exactly one fewer than the number of stages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pipeline_splits: Vec<String>,
}

impl DevicePartitionSpec {
    /// Builds a spec, checking stage counts and weights.
    pub fn new(
        devices_per_stage: &[i64],
        memory_proportion: &[f64],
    ) -> Result<Self, PlannerError> {
        let devices_per_stage = check_stages(devices_per_stage)?;
        check_weights(memory_proportion, devices_per_stage.len())?;
        Ok(Self {
            devices_per_stage,
            memory_proportion: memory_proportion.to_vec(),
            pipeline_splits: Vec::new(),
        })
    }

    /// Attaches pipeline split points.
    pub fn with_splits(mut self, splits: Vec<String>) -> Result<Self, PlannerError> {
        check_splits(&splits, self.num_stages())?;
        self.pipeline_splits = splits;
        Ok(self)
    }

    pub fn num_stages(&self) -> usize {
        self.devices_per_stage.len()
    }

    /// Devices needed by one replica.
    pub fn devices_per_replica(&self) -> u64 {
        self.devices_per_stage.iter().map(|&d| u64::from(d)).sum()
    }

    /// Re-runs the weight checks; `None` if the weights are consistent.
    pub fn weight_issue(&self) -> Option<String> {
        match check_weights(&self.memory_proportion, self.num_stages()) {
            Ok(()) => None,
            Err(PlannerError::InvalidPartitionWeights { detail }) => Some(detail),
            Err(other) => Some(other.to_string()),
        }
    }
}

/// Rejects an empty stage list or a stage with no devices.
pub(crate) fn check_stages(devices_per_stage: &[i64]) -> Result<Vec<u32>, PlannerError> {
    if devices_per_stage.is_empty() {
        return Err(PlannerError::InvalidPartition {
            detail: "devices_per_stage is empty".into(),
        });
    }
    devices_per_stage
        .iter()
        .enumerate()
        .map(|(stage, &count)| {
            u32::try_from(count)
                .ok()
                .filter(|&c| c > 0)
                .ok_or_else(|| PlannerError::InvalidPartition {
                    detail: format!("stage {stage} has {count} devices"),
                })
        })
        .collect()
}

/// Checks that there is one weight per stage, each in `(0, 1]`.
pub(crate) fn check_weights(weights: &[f64], stages: usize) -> Result<(), PlannerError> {
    if weights.len() != stages {
        return Err(PlannerError::InvalidPartitionWeights {
            detail: format!("{} weights for {stages} stages", weights.len()),
        });
    }
    if let Some((stage, w)) = weights
        .iter()
        .enumerate()
        .find(|(_, &w)| !(w.is_finite() && w > 0.0 && w <= 1.0))
    {
        return Err(PlannerError::InvalidPartitionWeights {
            detail: format!("stage {stage} weight {w} is outside (0, 1]"),
        });
    }
    Ok(())
}

pub(crate) fn check_splits(splits: &[String], stages: usize) -> Result<(), PlannerError> {
    if !splits.is_empty() && splits.len() + 1 != stages {
        return Err(PlannerError::InvalidPartition {
            detail: format!(
                "{} pipeline splits for {stages} stages (expected {})",
                splits.len(),
                stages - 1
            ),
        });
    }
    Ok(())
}

/// The contiguous device range one stage of one replica runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StageAssignment {
    pub replica: u32,
    pub stage: u32,
    pub first_device: u32,
    pub device_count: u32,
}

impl StageAssignment {
    /// Device ids covered by this assignment. The end is widened to
    /// `u64` so a deserialized assignment near `u32::MAX` cannot overflow.
    pub fn devices(&self) -> Range<u64> {
        let start = u64::from(self.first_device);
        start..start + u64::from(self.device_count)
    }

    /// Returns `true` if every device lies in a pool of `total_devices`.
    pub fn fits_in(&self, total_devices: u32) -> bool {
        self.devices().end <= u64::from(total_devices)
    }

    /// Returns `true` if the two assignments share a device.
    pub fn overlaps(&self, other: &StageAssignment) -> bool {
        let (a, b) = (self.devices(), other.devices());
        a.start < b.end && b.start < a.end
    }
}

/// Lays replicas out back to back, stages in order within each replica.
pub(crate) fn assign_devices(
    spec: &DevicePartitionSpec,
    replication_factor: u32,
) -> Vec<StageAssignment> {
    let mut assignments = Vec::with_capacity(spec.num_stages() * replication_factor as usize);
    let mut next = 0u32;
    for replica in 0..replication_factor {
        for (stage, &count) in spec.devices_per_stage.iter().enumerate() {
            assignments.push(StageAssignment {
                replica,
                stage: stage as u32,
                first_device: next,
                device_count: count,
            });
            next += count;
        }
    }
    assignments
}
