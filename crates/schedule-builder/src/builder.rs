// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Plan + training length → [`Schedule`].

use crate::{loss_scaling, DatasetCatalog, Schedule, ScheduleError};
use topology_planner::{ExecutionPlan, ValidationMode};

/// Most entries any one step list may hold. Every list is materialized,
/// so a run with one step per epoch costs one entry per step.
pub const MAX_SCHEDULED_STEPS: u64 = 10_000_000;

/// Derives schedules from execution plans.
///
/// Epoch boundaries come from the dataset size reported by the
/// [`DatasetCatalog`] and the plan's effective batch size:
///
/// ```text
/// steps_per_epoch = max(1, dataset_size / effective_batch_size)
/// ```
pub struct ScheduleBuilder<'a> {
    catalog: &'a dyn DatasetCatalog,
}

impl<'a> ScheduleBuilder<'a> {
    pub fn new(catalog: &'a dyn DatasetCatalog) -> Self {
        Self { catalog }
    }

    /// Looks up the plan's dataset in the catalog.
    pub fn dataset_size(&self, plan: &ExecutionPlan) -> Result<u64, ScheduleError> {
        let dataset = plan
            .dataset
            .as_deref()
            .ok_or_else(|| ScheduleError::MissingDataset {
                profile: plan.profile.clone(),
            })?;
        let size = self
            .catalog
            .dataset_size(dataset)
            .ok_or_else(|| ScheduleError::UnknownDataset(dataset.to_string()))?;
        if size == 0 {
            return Err(ScheduleError::invalid(format!("dataset '{dataset}' is empty")));
        }
        Ok(size)
    }

    /// Optimizer steps in one pass over the dataset.
    pub fn steps_per_epoch(&self, plan: &ExecutionPlan) -> Result<u64, ScheduleError> {
        let size = self.dataset_size(plan)?;
        if plan.effective_batch_size == 0 {
            return Err(ScheduleError::invalid("effective batch size is zero"));
        }
        Ok((size / plan.effective_batch_size).max(1))
    }

    /// Converts an epoch budget into a step budget.
    pub fn steps_for_epochs(
        &self,
        plan: &ExecutionPlan,
        epochs: u64,
    ) -> Result<u64, ScheduleError> {
        if epochs == 0 {
            return Err(ScheduleError::invalid("epoch count must be at least 1"));
        }
        self.steps_per_epoch(plan)?
            .checked_mul(epochs)
            .ok_or_else(|| ScheduleError::invalid(format!("{epochs} epochs overflow u64 steps")))
    }

    /// Builds the schedule for a run of `total_steps` steps.
    ///
    /// `checkpoint_every` of `None` or `Some(0)` checkpoints once per
    /// epoch. When `validate_every_epoch` is set, validation runs at every
    /// `validation_frequency`-th epoch boundary; a plan in
    /// [`ValidationMode::After`] also validates at the final step.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidScheduleParameters`] if `total_steps` is 0,
    /// an explicit interval exceeds it, or a step list would hold more
    /// than [`MAX_SCHEDULED_STEPS`] entries, plus the dataset errors of
    /// [`Self::dataset_size`].
    pub fn build(
        &self,
        plan: &ExecutionPlan,
        total_steps: u64,
        checkpoint_every: Option<u64>,
        validate_every_epoch: bool,
    ) -> Result<Schedule, ScheduleError> {
        if total_steps == 0 {
            return Err(ScheduleError::invalid("total_steps must be positive"));
        }
        let checkpoint_every = checkpoint_every.filter(|&n| n > 0);
        if let Some(n) = checkpoint_every {
            if n > total_steps {
                return Err(ScheduleError::invalid(format!(
                    "checkpoint interval {n} exceeds total_steps {total_steps}"
                )));
            }
        }

        let dataset_size = self.dataset_size(plan)?;
        let steps_per_epoch = self.steps_per_epoch(plan)?;
        let cadence = &plan.cadence;

        let log_interval = (steps_per_epoch / u64::from(cadence.logs_per_epoch.max(1))).max(1);
        for (list, interval) in [
            ("checkpoint", checkpoint_every.unwrap_or(steps_per_epoch)),
            ("logging", log_interval),
        ] {
            let entries = total_steps / interval;
            if entries > MAX_SCHEDULED_STEPS {
                return Err(ScheduleError::invalid(format!(
                    "{entries} {list} steps exceed the limit of {MAX_SCHEDULED_STEPS}"
                )));
            }
        }

        let checkpoint_steps = match checkpoint_every {
            Some(n) => multiples(n, total_steps),
            None => or_final(multiples(steps_per_epoch, total_steps), total_steps),
        };

        let mut validation_steps = Vec::new();
        if validate_every_epoch {
            let frequency = u64::from(cadence.validation_frequency.max(1));
            let every = steps_per_epoch.saturating_mul(frequency);
            validation_steps = or_final(multiples(every, total_steps), total_steps);
        }
        if cadence.validation_mode == ValidationMode::After
            && validation_steps.last() != Some(&total_steps)
        {
            validation_steps.push(total_steps);
        }

        let logging_steps = multiples(log_interval, total_steps);

        let loss_scale_changes = match (plan.initial_loss_scaling, plan.loss_scaling) {
            (Some(initial), Some(target)) => {
                let epochs = cadence
                    .epochs
                    .map(u64::from)
                    .unwrap_or_else(|| total_steps.div_ceil(steps_per_epoch));
                loss_scaling::ramp(initial, target, epochs, steps_per_epoch, total_steps)
            }
            (None, Some(value)) => vec![crate::LossScaleChange {
                step: 1,
                epoch: 1,
                value,
            }],
            _ => Vec::new(),
        };

        let schedule = Schedule {
            total_steps,
            steps_per_epoch,
            dataset_size,
            effective_batch_size: plan.effective_batch_size,
            checkpoint_every,
            checkpoint_steps,
            validation_steps,
            log_interval,
            logging_steps,
            loss_scale_changes,
        };
        tracing::info!("{}", schedule.summary());
        Ok(schedule)
    }
}

/// `interval, 2 × interval, …` up to and including `limit`.
fn multiples(interval: u64, limit: u64) -> Vec<u64> {
    (1..=limit / interval).map(|k| k * interval).collect()
}

fn or_final(steps: Vec<u64>, total_steps: u64) -> Vec<u64> {
    if steps.is_empty() {
        vec![total_steps]
    } else {
        steps
    }
}
