// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The validated plan bundle handed to the launcher.

use crate::LaunchError;
use schedule_builder::Schedule;
use std::path::PathBuf;
use topology_planner::ExecutionPlan;

/// An execution plan with its schedule, ready to launch.
///
/// Only a [`PlanningSession`](crate::PlanningSession) that passed
/// validation produces one. `warnings` holds the validation issues the
/// caller chose to tolerate.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LaunchPlan {
    pub plan: ExecutionPlan,
    pub schedule: Schedule,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl LaunchPlan {
    /// Pretty-printed JSON for the launcher.
    pub fn to_json(&self) -> Result<String, LaunchError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, LaunchError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Path of the checkpoint written at `step`, or `None` if no
    /// checkpoint falls on that step.
    ///
    /// Files are named `{model}_{dataset}_{epoch}.ckpt` under the plan's
    /// checkpoint directory (the working directory when unset). With an
    /// explicit step interval several checkpoints can share an epoch, so
    /// the step is appended: `{model}_{dataset}_{epoch}-{step}.ckpt`.
    pub fn checkpoint_file(&self, step: u64) -> Option<PathBuf> {
        if !self.schedule.is_checkpoint_step(step) {
            return None;
        }
        let model = self.plan.model.as_deref().unwrap_or(&self.plan.profile);
        let dataset = self.plan.dataset.as_deref().unwrap_or("data");
        let epoch = self.schedule.epoch_of(step);
        let name = match self.schedule.checkpoint_every {
            Some(_) => format!("{model}_{dataset}_{epoch}-{step}.ckpt"),
            None => format!("{model}_{dataset}_{epoch}.ckpt"),
        };
        let dir = self.plan.checkpoint.directory.as_deref().unwrap_or(".");
        Some(PathBuf::from(dir).join(name))
    }

    /// Multi-line human-readable description.
    pub fn summary(&self) -> String {
        let mut s = format!("{}\n{}", self.plan.summary(), self.schedule.summary());
        for warning in &self.warnings {
            s.push_str(&format!("\n  warning: {warning}"));
        }
        s
    }
}
