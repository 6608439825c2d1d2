// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Validation findings and the report that collects them.

use std::fmt;
use topology_planner::PrecisionPair;

/// One problem found in a plan/schedule pair.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("plan needs {required} devices but the pool has {available}")]
    DeviceOversubscription { required: u64, available: u32 },

    #[error("replica {replica} stage {stage} reaches device {end} but the pool has {available}")]
    AssignmentOutsidePool {
        replica: u32,
        stage: u32,
        end: u64,
        available: u32,
    },

    #[error("{found} stage assignments, expected {expected}")]
    AssignmentCountMismatch { found: usize, expected: usize },

    #[error(
        "replica {replica_a} stage {stage_a} and replica {replica_b} stage {stage_b} share devices"
    )]
    OverlappingDevices {
        replica_a: u32,
        stage_a: u32,
        replica_b: u32,
        stage_b: u32,
    },

    #[error("'{key}' must be positive, got 0")]
    NonPositiveBatchSize { key: &'static str },

    #[error("effective batch size is {declared} but its factors multiply to {expected}")]
    EffectiveBatchMismatch { declared: u64, expected: u64 },

    #[error("invalid memory proportions: {detail}")]
    InvalidPartitionWeights { detail: String },

    #[error("checkpoint schedule is empty for a run of {total_steps} steps")]
    EmptySchedule { total_steps: u64 },

    #[error("{list} step {step} is outside 1..={total_steps}")]
    StepOutOfRange {
        list: &'static str,
        step: u64,
        total_steps: u64,
    },

    #[error("{list} steps are not strictly increasing")]
    UnorderedSteps { list: &'static str },

    #[error("schedule was built for effective batch {schedule_batch}, plan has {plan_batch}")]
    StaleSchedule { schedule_batch: u64, plan_batch: u64 },

    #[error(
        "accelerator runtime does not support precision {precision} \
         with replication factor {replication_factor}"
    )]
    UnsupportedCapability {
        precision: PrecisionPair,
        replication_factor: u32,
    },
}

impl ValidationIssue {
    /// Returns a stable, machine-readable name for the issue kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DeviceOversubscription { .. } => "DeviceOversubscription",
            Self::AssignmentOutsidePool { .. } => "AssignmentOutsidePool",
            Self::AssignmentCountMismatch { .. } => "AssignmentCountMismatch",
            Self::OverlappingDevices { .. } => "OverlappingDevices",
            Self::NonPositiveBatchSize { .. } => "NonPositiveBatchSize",
            Self::EffectiveBatchMismatch { .. } => "EffectiveBatchMismatch",
            Self::InvalidPartitionWeights { .. } => "InvalidPartitionWeights",
            Self::EmptySchedule { .. } => "EmptySchedule",
            Self::StepOutOfRange { .. } => "StepOutOfRange",
            Self::UnorderedSteps { .. } => "UnorderedSteps",
            Self::StaleSchedule { .. } => "StaleSchedule",
            Self::UnsupportedCapability { .. } => "UnsupportedPrecisionPair",
        }
    }
}

/// Every issue found by one validation pass, in detection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    /// Issue kinds in detection order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.issues.iter().map(ValidationIssue::kind).collect()
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.issues.iter().any(|i| i.kind() == kind)
    }

    /// `Ok(())` when no issues were found.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  [{}] {issue}", issue.kind())?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}
