// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The step-indexed training schedule handed to the launcher.
//!
//! Steps are 1-based optimizer steps: step `k` is the `k`-th weight
//! update. Every step list is strictly increasing and lies in
//! `1..=total_steps`.

/// A loss-scaling value that takes effect at `step`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LossScaleChange {
    pub step: u64,
    /// 1-based epoch whose first step is `step`.
    pub epoch: u64,
    pub value: f64,
}

/// Checkpoint, validation, logging, and loss-scaling trigger points.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Schedule {
    pub total_steps: u64,
    pub steps_per_epoch: u64,
    pub dataset_size: u64,
    /// Effective batch size of the plan this schedule was built for.
    pub effective_batch_size: u64,
    /// Explicit checkpoint interval; `None` means once per epoch.
    pub checkpoint_every: Option<u64>,
    pub checkpoint_steps: Vec<u64>,
    pub validation_steps: Vec<u64>,
    pub log_interval: u64,
    pub logging_steps: Vec<u64>,
    pub loss_scale_changes: Vec<LossScaleChange>,
}

impl Schedule {
    /// Number of epochs the run touches, counting a partial last epoch.
    pub fn epochs(&self) -> u64 {
        self.total_steps.div_ceil(self.steps_per_epoch.max(1))
    }

    /// 1-based epoch that `step` belongs to.
    pub fn epoch_of(&self, step: u64) -> u64 {
        step.saturating_sub(1) / self.steps_per_epoch.max(1) + 1
    }

    pub fn is_checkpoint_step(&self, step: u64) -> bool {
        self.checkpoint_steps.binary_search(&step).is_ok()
    }

    pub fn is_validation_step(&self, step: u64) -> bool {
        self.validation_steps.binary_search(&step).is_ok()
    }

    pub fn is_logging_step(&self, step: u64) -> bool {
        self.logging_steps.binary_search(&step).is_ok()
    }

    /// Loss scaling in force at `step`, if the plan sets one.
    pub fn loss_scale_at(&self, step: u64) -> Option<f64> {
        self.loss_scale_changes
            .iter()
            .take_while(|c| c.step <= step)
            .last()
            .map(|c| c.value)
    }

    /// Returns a one-line, human-readable summary.
    pub fn summary(&self) -> String {
        let cadence = match self.checkpoint_every {
            Some(n) => format!("every {n} steps"),
            None => "per epoch".to_string(),
        };
        format!(
            "Schedule: {} steps ({} per epoch, {} epochs), {} checkpoints ({cadence}), \
             {} validations, log every {} steps, {} loss-scale changes",
            self.total_steps,
            self.steps_per_epoch,
            self.epochs(),
            self.checkpoint_steps.len(),
            self.validation_steps.len(),
            self.log_interval,
            self.loss_scale_changes.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schedule {
        Schedule {
            total_steps: 25,
            steps_per_epoch: 10,
            dataset_size: 1000,
            effective_batch_size: 100,
            checkpoint_every: None,
            checkpoint_steps: vec![10, 20],
            validation_steps: vec![25],
            log_interval: 5,
            logging_steps: vec![5, 10, 15, 20, 25],
            loss_scale_changes: vec![
                LossScaleChange { step: 1, epoch: 1, value: 128.0 },
                LossScaleChange { step: 11, epoch: 2, value: 256.0 },
            ],
        }
    }

    #[test]
    fn test_epochs() {
        let s = sample();
        assert_eq!(s.epochs(), 3);
        assert_eq!(s.epoch_of(1), 1);
        assert_eq!(s.epoch_of(10), 1);
        assert_eq!(s.epoch_of(11), 2);
    }

    #[test]
    fn test_membership() {
        let s = sample();
        assert!(s.is_checkpoint_step(20));
        assert!(!s.is_checkpoint_step(25));
        assert!(s.is_validation_step(25));
        assert!(s.is_logging_step(15));
    }

    #[test]
    fn test_loss_scale_at() {
        let s = sample();
        assert_eq!(s.loss_scale_at(0), None);
        assert_eq!(s.loss_scale_at(10), Some(128.0));
        assert_eq!(s.loss_scale_at(11), Some(256.0));
    }

    #[test]
    fn test_summary() {
        let text = sample().summary();
        assert!(text.contains("25 steps"));
        assert!(text.contains("2 checkpoints (per epoch)"));
    }
}
