// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Execution plan: the output of the topology planner.
//!
//! A plan fixes everything the launcher needs to start workers: how many
//! replicas to run, which devices each pipeline stage of each replica is
//! bound to, the batch arithmetic, the precision mode, and the optimizer
//! and checkpoint metadata. It is the contract between the planner and
//! the launcher and is never mutated once built.

use crate::partition::{self, DevicePartitionSpec, StageAssignment};
use crate::{Cadence, CheckpointSpec, OptimizerSpec, PlannerError, PrecisionPair};

/// The complete, validated training topology for one invocation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionPlan {
    /// Profile this plan was resolved from.
    pub profile: String,
    pub model: Option<String>,
    pub dataset: Option<String>,
    pub seed: Option<u64>,
    /// Size of the device pool the plan was made for.
    pub total_devices: u32,
    pub replication_factor: u32,
    pub gradient_accumulation: u32,
    /// Micro-batch size processed by one device group per step.
    pub per_device_batch_size: u32,
    /// Optimizer steps executed per host call.
    pub device_iterations: u32,
    /// `per_device_batch_size × gradient_accumulation × replication_factor`.
    pub effective_batch_size: u64,
    pub partition: DevicePartitionSpec,
    pub assignments: Vec<StageAssignment>,
    pub precision: PrecisionPair,
    pub loss_scaling: Option<f64>,
    pub initial_loss_scaling: Option<f64>,
    pub optimizer: OptimizerSpec,
    pub checkpoint: CheckpointSpec,
    pub cadence: Cadence,
}

impl ExecutionPlan {
    /// Devices occupied by all replicas together.
    pub fn devices_required(&self) -> u64 {
        self.partition.devices_per_replica() * u64::from(self.replication_factor)
    }

    /// Devices in the pool that no stage is bound to.
    pub fn spare_devices(&self) -> u64 {
        u64::from(self.total_devices).saturating_sub(self.devices_required())
    }

    pub fn num_stages(&self) -> usize {
        self.partition.num_stages()
    }

    /// Samples consumed per host call (`effective × device_iterations`).
    pub fn samples_per_host_call(&self) -> u64 {
        self.effective_batch_size * u64::from(self.device_iterations)
    }

    /// Assignments belonging to one replica, in stage order.
    pub fn replica(&self, replica: u32) -> impl Iterator<Item = &StageAssignment> {
        self.assignments.iter().filter(move |a| a.replica == replica)
    }

    /// Checks the plan's internal consistency.
    ///
    /// Checks:
    /// - Batch factors are positive and the effective batch is their product.
    /// - The partition fits the device pool.
    /// - Weights match the stages.
    /// - Every stage of every replica has one assignment and none overlap.
    pub fn validate(&self) -> Result<(), PlannerError> {
        for (key, value) in [
            ("batch_size", self.per_device_batch_size),
            ("gradient_accumulation", self.gradient_accumulation),
            ("replication_factor", self.replication_factor),
            ("device_iterations", self.device_iterations),
        ] {
            if value == 0 {
                return Err(PlannerError::NonPositiveBatchSize {
                    key: key.to_string(),
                    value: 0,
                });
            }
        }

        let product = u64::from(self.per_device_batch_size)
            * u64::from(self.gradient_accumulation)
            * u64::from(self.replication_factor);
        if product != self.effective_batch_size {
            return Err(PlannerError::invalid(
                "effective_batch_size",
                format!("{} != {product}", self.effective_batch_size),
            ));
        }

        if self.devices_required() > u64::from(self.total_devices) {
            return Err(PlannerError::DeviceOversubscription {
                stage_devices: self.partition.devices_per_replica(),
                replication_factor: self.replication_factor,
                total_devices: self.total_devices,
                detail: format!("{} devices required", self.devices_required()),
            });
        }

        partition::check_weights(&self.partition.memory_proportion, self.num_stages())?;

        let expected = self.num_stages() * self.replication_factor as usize;
        if self.assignments.len() != expected {
            return Err(PlannerError::InvalidPartition {
                detail: format!(
                    "{} stage assignments, expected {expected}",
                    self.assignments.len()
                ),
            });
        }
        if let Some(a) = self.assignments.iter().find(|a| !a.fits_in(self.total_devices)) {
            let devices = a.devices();
            return Err(PlannerError::InvalidPartition {
                detail: format!(
                    "replica {} stage {} uses devices {}..{} outside a pool of {}",
                    a.replica, a.stage, devices.start, devices.end, self.total_devices
                ),
            });
        }
        for (i, a) in self.assignments.iter().enumerate() {
            if let Some(b) = self.assignments[i + 1..].iter().find(|b| a.overlaps(b)) {
                return Err(PlannerError::InvalidPartition {
                    detail: format!(
                        "replica {} stage {} and replica {} stage {} share devices",
                        a.replica, a.stage, b.replica, b.stage
                    ),
                });
            }
        }

        Ok(())
    }

    /// Returns a one-line, human-readable summary of the plan.
    pub fn summary(&self) -> String {
        format!(
            "Plan '{}': {} stages {:?} × {} replicas = {}/{} devices, \
             batch {} × accum {} × replicas {} = {}, precision {}, optimizer {}",
            self.profile,
            self.num_stages(),
            self.partition.devices_per_stage,
            self.replication_factor,
            self.devices_required(),
            self.total_devices,
            self.per_device_batch_size,
            self.gradient_accumulation,
            self.replication_factor,
            self.effective_batch_size,
            self.precision,
            self.optimizer.kind,
        )
    }
}

/// Builder helper for constructing an `ExecutionPlan` from checked parts.
///
/// Used internally by [`crate::TopologyPlanner`]; derives the effective
/// batch size and the device assignments.
pub(crate) struct PlanBuilder {
    profile: String,
    total_devices: u32,
    batch: (u32, u32, u32, u32),
    partition: DevicePartitionSpec,
    precision: PrecisionPair,
    model: Option<String>,
    dataset: Option<String>,
    seed: Option<u64>,
    loss_scaling: (Option<f64>, Option<f64>),
    optimizer: OptimizerSpec,
    checkpoint: CheckpointSpec,
    cadence: Cadence,
}

impl PlanBuilder {
    pub fn new(
        profile: &str,
        total_devices: u32,
        partition: DevicePartitionSpec,
        precision: PrecisionPair,
    ) -> Self {
        Self {
            profile: profile.to_string(),
            total_devices,
            batch: (1, 1, 1, 1),
            partition,
            precision,
            model: None,
            dataset: None,
            seed: None,
            loss_scaling: (None, None),
            optimizer: OptimizerSpec::default(),
            checkpoint: CheckpointSpec::default(),
            cadence: Cadence::default(),
        }
    }

    /// Sets batch size, gradient accumulation, replication factor, and
    /// device iterations.
    pub fn batch(
        mut self,
        batch_size: u32,
        accumulation: u32,
        replicas: u32,
        iterations: u32,
    ) -> Self {
        self.batch = (batch_size, accumulation, replicas, iterations);
        self
    }

    pub fn identity(
        mut self,
        model: Option<String>,
        dataset: Option<String>,
        seed: Option<u64>,
    ) -> Self {
        self.model = model;
        self.dataset = dataset;
        self.seed = seed;
        self
    }

    pub fn loss_scaling(mut self, initial: Option<f64>, target: Option<f64>) -> Self {
        self.loss_scaling = (initial, target);
        self
    }

    pub fn options(
        mut self,
        optimizer: OptimizerSpec,
        checkpoint: CheckpointSpec,
        cadence: Cadence,
    ) -> Self {
        self.optimizer = optimizer;
        self.checkpoint = checkpoint;
        self.cadence = cadence;
        self
    }

    /// Consumes the builder and returns the finished plan.
    pub fn build(self) -> ExecutionPlan {
        let (batch_size, accumulation, replicas, iterations) = self.batch;
        let effective = u64::from(batch_size) * u64::from(accumulation) * u64::from(replicas);
        let assignments = partition::assign_devices(&self.partition, replicas);
        let (initial_loss_scaling, loss_scaling) = self.loss_scaling;

        ExecutionPlan {
            profile: self.profile,
            model: self.model,
            dataset: self.dataset,
            seed: self.seed,
            total_devices: self.total_devices,
            replication_factor: replicas,
            gradient_accumulation: accumulation,
            per_device_batch_size: batch_size,
            device_iterations: iterations,
            effective_batch_size: effective,
            partition: self.partition,
            assignments,
            precision: self.precision,
            loss_scaling,
            initial_loss_scaling,
            optimizer: self.optimizer,
            checkpoint: self.checkpoint,
            cadence: self.cadence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> ExecutionPlan {
        let partition = DevicePartitionSpec::new(&[1, 1, 1, 1], &[0.3; 4]).unwrap();
        PlanBuilder::new("resnet50", 16, partition, PrecisionPair::HALF_HALF)
            .batch(17, 128, 4, 1)
            .build()
    }

    #[test]
    fn test_effective_batch() {
        let plan = sample_plan();
        assert_eq!(plan.effective_batch_size, 8704);
        assert_eq!(plan.samples_per_host_call(), 8704);
    }

    #[test]
    fn test_validate_ok() {
        let plan = sample_plan();
        plan.validate().unwrap();
        assert_eq!(plan.devices_required(), 16);
        assert_eq!(plan.spare_devices(), 0);
        assert_eq!(plan.assignments.len(), 16);
        assert_eq!(plan.replica(3).count(), 4);
    }

    #[test]
    fn test_validate_zero_batch() {
        let mut plan = sample_plan();
        plan.per_device_batch_size = 0;
        plan.effective_batch_size = 0;
        assert_eq!(plan.validate().unwrap_err().kind(), "NonPositiveBatchSize");
    }

    #[test]
    fn test_validate_stale_effective_batch() {
        let mut plan = sample_plan();
        plan.gradient_accumulation = 64;
        assert_eq!(plan.validate().unwrap_err().kind(), "InvalidValue");
    }

    #[test]
    fn test_validate_oversubscribed() {
        let mut plan = sample_plan();
        plan.total_devices = 8;
        assert_eq!(plan.validate().unwrap_err().kind(), "DeviceOversubscription");
    }

    #[test]
    fn test_validate_overlap() {
        let mut plan = sample_plan();
        plan.assignments[1].first_device = 0;
        assert_eq!(plan.validate().unwrap_err().kind(), "InvalidPartition");
    }

    #[test]
    fn test_validate_assignment_outside_pool() {
        let mut plan = sample_plan();
        plan.assignments[15].first_device = u32::MAX;
        let err = plan.validate().unwrap_err();
        assert_eq!(err.kind(), "InvalidPartition");
        assert!(err.to_string().contains("outside a pool of 16"));
    }

    #[test]
    fn test_summary() {
        let s = sample_plan().summary();
        assert!(s.contains("Plan 'resnet50'"));
        assert!(s.contains("= 8704"));
        assert!(s.contains("16/16 devices"));
    }

    #[test]
    fn test_json_round_trip() {
        let plan = sample_plan();
        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("\"precision\":\"16.16\""));
        let back: ExecutionPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
