// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # launch-plan
//!
//! Ties the planning crates into one pipeline:
//!
//! - [`profile_store`] resolves a named profile and applies overrides.
//! - [`topology_planner`] turns it into an `ExecutionPlan`.
//! - [`schedule_builder`] derives the step-indexed `Schedule`.
//! - [`plan_validator`] cross-checks both before anything launches.
//!
//! # Type-State Pipeline
//! ```text
//! PlanningSession<Idle> → <Resolved> → <Planned> → <Scheduled> → LaunchPlan
//! ```
//! Transitions are compile-time checked; a [`LaunchPlan`] only exists
//! once validation passed.
//!
//! # Settings
//! [`PlannerSettings`] is read from a TOML file and supplies the profile
//! path, device pool size, dataset sizes and the capability deny list.

mod config;
mod error;
mod launch;
mod session;

pub use config::PlannerSettings;
pub use error::LaunchError;
pub use launch::LaunchPlan;
pub use session::{Idle, Planned, PlanningSession, Resolved, Scheduled, SessionState};

use profile_store::{ConfigValue, ProfileStore};

/// Runs the whole pipeline for `profile` with the collaborators described
/// by `settings`.
///
/// `total_steps` overrides the profile's epoch count and the settings'
/// default step budget.
pub fn plan_profile(
    settings: &PlannerSettings,
    store: &ProfileStore,
    profile: &str,
    overrides: &[(String, ConfigValue)],
    total_steps: Option<u64>,
) -> Result<LaunchPlan, LaunchError> {
    let catalog = settings.catalog();
    let capabilities = settings.capabilities();
    PlanningSession::new(store, &catalog, &capabilities)
        .with_default_total_steps(settings.default_total_steps)
        .resolve(profile, overrides)?
        .plan(settings.total_devices)?
        .schedule(total_steps)?
        .validate()
}
