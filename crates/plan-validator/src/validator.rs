// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The aggregated pre-launch check.

use crate::{AcceleratorCapabilities, ValidationIssue, ValidationReport};
use schedule_builder::Schedule;
use topology_planner::{ExecutionPlan, StageAssignment};

/// Cross-checks a plan and its schedule before launch.
///
/// Unlike the planner, the validator never stops at the first problem:
/// every check runs and every finding lands in the report. The caller
/// decides which issues are fatal.
pub struct PlanValidator<'a> {
    capabilities: &'a dyn AcceleratorCapabilities,
}

impl<'a> PlanValidator<'a> {
    pub fn new(capabilities: &'a dyn AcceleratorCapabilities) -> Self {
        Self { capabilities }
    }

    /// Runs every check; `Err` carries all issues found.
    pub fn validate(
        &self,
        plan: &ExecutionPlan,
        schedule: &Schedule,
    ) -> Result<(), ValidationReport> {
        self.check(plan, schedule).into_result()
    }

    /// Runs every check and returns the (possibly empty) report.
    pub fn check(&self, plan: &ExecutionPlan, schedule: &Schedule) -> ValidationReport {
        let mut report = ValidationReport::new();
        check_devices(plan, &mut report);
        check_batch(plan, &mut report);
        if let Some(detail) = plan.partition.weight_issue() {
            report.push(ValidationIssue::InvalidPartitionWeights { detail });
        }
        check_schedule(plan, schedule, &mut report);

        if !self
            .capabilities
            .supports(plan.precision, plan.replication_factor)
        {
            report.push(ValidationIssue::UnsupportedCapability {
                precision: plan.precision,
                replication_factor: plan.replication_factor,
            });
        }

        for issue in report.issues() {
            tracing::debug!("plan '{}': [{}] {issue}", plan.profile, issue.kind());
        }
        report
    }
}

fn check_devices(plan: &ExecutionPlan, report: &mut ValidationReport) {
    let required = plan.devices_required();
    if required > u64::from(plan.total_devices) {
        report.push(ValidationIssue::DeviceOversubscription {
            required,
            available: plan.total_devices,
        });
    }

    let expected = plan.partition.num_stages() * plan.replication_factor as usize;
    if plan.assignments.len() != expected {
        report.push(ValidationIssue::AssignmentCountMismatch {
            found: plan.assignments.len(),
            expected,
        });
    }
    for a in plan.assignments.iter().filter(|a| !a.fits_in(plan.total_devices)) {
        report.push(ValidationIssue::AssignmentOutsidePool {
            replica: a.replica,
            stage: a.stage,
            end: a.devices().end,
            available: plan.total_devices,
        });
    }

    let mut by_start: Vec<_> = plan.assignments.iter().collect();
    by_start.sort_by_key(|a| (a.first_device, a.replica, a.stage));
    // Compare each range with the furthest-reaching one before it.
    let mut reach = None;
    for b in by_start {
        if let Some(a) = reach.filter(|a: &&StageAssignment| a.overlaps(b)) {
            report.push(ValidationIssue::OverlappingDevices {
                replica_a: a.replica,
                stage_a: a.stage,
                replica_b: b.replica,
                stage_b: b.stage,
            });
        }
        if reach.map_or(true, |a| b.devices().end > a.devices().end) {
            reach = Some(b);
        }
    }
}

fn check_batch(plan: &ExecutionPlan, report: &mut ValidationReport) {
    for (key, value) in [
        ("batch_size", plan.per_device_batch_size),
        ("gradient_accumulation", plan.gradient_accumulation),
        ("replication_factor", plan.replication_factor),
        ("device_iterations", plan.device_iterations),
    ] {
        if value == 0 {
            report.push(ValidationIssue::NonPositiveBatchSize { key });
        }
    }

    let expected = u64::from(plan.per_device_batch_size)
        * u64::from(plan.gradient_accumulation)
        * u64::from(plan.replication_factor);
    if expected != plan.effective_batch_size {
        report.push(ValidationIssue::EffectiveBatchMismatch {
            declared: plan.effective_batch_size,
            expected,
        });
    }
}

fn check_schedule(plan: &ExecutionPlan, schedule: &Schedule, report: &mut ValidationReport) {
    let total = schedule.total_steps;
    if total > 0 && schedule.checkpoint_steps.is_empty() {
        report.push(ValidationIssue::EmptySchedule { total_steps: total });
    }

    for (list, steps) in [
        ("checkpoint", &schedule.checkpoint_steps),
        ("validation", &schedule.validation_steps),
        ("logging", &schedule.logging_steps),
    ] {
        if let Some(&step) = steps.iter().find(|&&s| s == 0 || s > total) {
            report.push(ValidationIssue::StepOutOfRange {
                list,
                step,
                total_steps: total,
            });
        }
        if steps.windows(2).any(|w| w[0] >= w[1]) {
            report.push(ValidationIssue::UnorderedSteps { list });
        }
    }

    if schedule.effective_batch_size != plan.effective_batch_size {
        report.push(ValidationIssue::StaleSchedule {
            schedule_batch: schedule.effective_batch_size,
            plan_batch: plan.effective_batch_size,
        });
    }
}
