// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The planning pipeline with type-state–enforced ordering.
//!
//! ```text
//! PlanningSession<Idle>
//!     │  .resolve(profile, overrides)
//!     ▼
//! PlanningSession<Resolved>
//!     │  .plan(total_devices)
//!     ▼
//! PlanningSession<Planned>
//!     │  .schedule(total_steps)
//!     ▼
//! PlanningSession<Scheduled>
//!     │  .validate()
//!     ▼
//!   LaunchPlan
//! ```
//!
//! Each transition consumes the session and returns the next state, so a
//! plan cannot be scheduled before it exists and nothing reaches the
//! launcher without passing the validator.

use crate::{LaunchError, LaunchPlan};
use plan_validator::{AcceleratorCapabilities, PlanValidator, ValidationIssue, ValidationReport};
use profile_store::{ConfigValue, OverrideMerger, ProfileStore, ResolvedConfig};
use schedule_builder::{DatasetCatalog, Schedule, ScheduleBuilder};
use std::sync::Arc;
use topology_planner::{ExecutionPlan, TopologyPlanner, ValidationMode};

// ── Type-state markers ─────────────────────────────────────────

/// Nothing resolved yet.
#[derive(Debug)]
pub struct Idle;

/// A profile has been resolved and overrides applied.
#[derive(Debug)]
pub struct Resolved {
    config: Arc<ResolvedConfig>,
}

/// The resolved profile has been turned into an execution plan.
#[derive(Debug)]
pub struct Planned {
    config: Arc<ResolvedConfig>,
    plan: ExecutionPlan,
}

/// The plan has a training schedule and awaits validation.
#[derive(Debug)]
pub struct Scheduled {
    config: Arc<ResolvedConfig>,
    plan: ExecutionPlan,
    schedule: Schedule,
}

/// Sealed trait for session states.
pub trait SessionState: std::fmt::Debug {}
impl SessionState for Idle {}
impl SessionState for Resolved {}
impl SessionState for Planned {}
impl SessionState for Scheduled {}

// ── Session ────────────────────────────────────────────────────

/// One pass from profile name to validated [`LaunchPlan`].
///
/// The session borrows its collaborators and owns only the artefacts it
/// produces, so many sessions can share one [`ProfileStore`] across
/// threads.
///
/// # Example
/// ```no_run
/// use launch_plan::PlanningSession;
/// use plan_validator::AllowAll;
/// use profile_store::ProfileStore;
/// use schedule_builder::StaticCatalog;
///
/// # fn example() -> Result<(), launch_plan::LaunchError> {
/// let store = ProfileStore::from_file("configs/training.yml".as_ref())?;
/// let catalog = StaticCatalog::new().with("imagenet", 1_281_167);
/// let launch = PlanningSession::new(&store, &catalog, &AllowAll)
///     .resolve("resnet50", &[])?
///     .plan(16)?
///     .schedule(Some(5_000))?
///     .validate()?;
/// println!("{}", launch.summary());
/// # Ok(())
/// # }
/// ```
pub struct PlanningSession<'a, S: SessionState = Idle> {
    store: &'a ProfileStore,
    catalog: &'a dyn DatasetCatalog,
    capabilities: &'a dyn AcceleratorCapabilities,
    default_total_steps: Option<u64>,
    state: S,
}

impl<S: SessionState> std::fmt::Debug for PlanningSession<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanningSession")
            .field("default_total_steps", &self.default_total_steps)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a, S: SessionState> PlanningSession<'a, S> {
    fn advance<T: SessionState>(self, state: T) -> PlanningSession<'a, T> {
        PlanningSession {
            store: self.store,
            catalog: self.catalog,
            capabilities: self.capabilities,
            default_total_steps: self.default_total_steps,
            state,
        }
    }
}

// ── Idle → Resolved ────────────────────────────────────────────

impl<'a> PlanningSession<'a, Idle> {
    pub fn new(
        store: &'a ProfileStore,
        catalog: &'a dyn DatasetCatalog,
        capabilities: &'a dyn AcceleratorCapabilities,
    ) -> Self {
        Self {
            store,
            catalog,
            capabilities,
            default_total_steps: None,
            state: Idle,
        }
    }

    /// Step budget used when neither [`PlanningSession::schedule`] nor the
    /// profile's `epochs` gives a training length.
    pub fn with_default_total_steps(mut self, steps: Option<u64>) -> Self {
        self.default_total_steps = steps;
        self
    }

    /// Resolves `profile` and applies `overrides` on top.
    pub fn resolve(
        self,
        profile: &str,
        overrides: &[(String, ConfigValue)],
    ) -> Result<PlanningSession<'a, Resolved>, LaunchError> {
        let base = self.store.load(profile)?;
        let config = if overrides.is_empty() {
            base
        } else {
            let merged = OverrideMerger::new(self.store.schema()).apply(&base, overrides)?;
            tracing::debug!("applied {} override(s) to '{profile}'", overrides.len());
            Arc::new(merged)
        };
        Ok(self.advance(Resolved { config }))
    }
}

// ── Resolved → Planned ─────────────────────────────────────────

impl<'a> PlanningSession<'a, Resolved> {
    pub fn config(&self) -> &ResolvedConfig {
        &self.state.config
    }

    /// Plans the resolved profile onto a pool of `total_devices`.
    pub fn plan(self, total_devices: u32) -> Result<PlanningSession<'a, Planned>, LaunchError> {
        let plan = TopologyPlanner::new().plan(&self.state.config, total_devices)?;
        let config = Arc::clone(&self.state.config);
        Ok(self.advance(Planned { config, plan }))
    }
}

// ── Planned → Scheduled ────────────────────────────────────────

impl<'a> PlanningSession<'a, Planned> {
    pub fn config(&self) -> &ResolvedConfig {
        &self.state.config
    }

    pub fn execution_plan(&self) -> &ExecutionPlan {
        &self.state.plan
    }

    /// Builds the training schedule.
    ///
    /// The run length is `total_steps` when given, else the profile's
    /// `epochs` converted to steps, else the session default.
    pub fn schedule(
        self,
        total_steps: Option<u64>,
    ) -> Result<PlanningSession<'a, Scheduled>, LaunchError> {
        let Planned { config, plan } = self.state;
        let builder = ScheduleBuilder::new(self.catalog);

        let total_steps = match (total_steps, plan.cadence.epochs) {
            (Some(steps), _) => steps,
            (None, Some(epochs)) => builder.steps_for_epochs(&plan, u64::from(epochs))?,
            (None, None) => self
                .default_total_steps
                .ok_or_else(|| LaunchError::NoTrainingLength {
                    profile: plan.profile.clone(),
                })?,
        };

        let schedule = builder.build(
            &plan,
            total_steps,
            plan.cadence.checkpoint_every,
            plan.cadence.validation_mode == ValidationMode::During,
        )?;

        Ok(PlanningSession {
            store: self.store,
            catalog: self.catalog,
            capabilities: self.capabilities,
            default_total_steps: self.default_total_steps,
            state: Scheduled {
                config,
                plan,
                schedule,
            },
        })
    }
}

// ── Scheduled → LaunchPlan ─────────────────────────────────────

impl<'a> PlanningSession<'a, Scheduled> {
    pub fn config(&self) -> &ResolvedConfig {
        &self.state.config
    }

    pub fn execution_plan(&self) -> &ExecutionPlan {
        &self.state.plan
    }

    pub fn training_schedule(&self) -> &Schedule {
        &self.state.schedule
    }

    /// Runs the validator without consuming the session.
    pub fn report(&self) -> ValidationReport {
        PlanValidator::new(self.capabilities).check(&self.state.plan, &self.state.schedule)
    }

    /// Validates and releases the launch plan; every issue is fatal.
    pub fn validate(self) -> Result<LaunchPlan, LaunchError> {
        self.validate_with(|_| true)
    }

    /// Validates and releases the launch plan. Issues for which `fatal`
    /// returns `false` are kept as warnings on the result.
    pub fn validate_with<F>(self, fatal: F) -> Result<LaunchPlan, LaunchError>
    where
        F: Fn(&ValidationIssue) -> bool,
    {
        let (errors, tolerated): (Vec<_>, Vec<_>) =
            self.report().into_issues().into_iter().partition(|i| fatal(i));

        if !errors.is_empty() {
            let mut report = ValidationReport::new();
            for issue in errors {
                report.push(issue);
            }
            return Err(LaunchError::Validation(report));
        }

        let warnings = tolerated
            .iter()
            .map(|issue| {
                tracing::warn!("plan '{}': [{}] {issue}", self.state.plan.profile, issue.kind());
                format!("[{}] {issue}", issue.kind())
            })
            .collect();

        let Scheduled { plan, schedule, .. } = self.state;
        tracing::info!("plan '{}' validated", plan.profile);
        Ok(LaunchPlan {
            plan,
            schedule,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_validator::{AllowAll, CapabilityTable};
    use profile_store::{Profile, ProfileSet};
    use schedule_builder::StaticCatalog;
    use topology_planner::PrecisionPair;

    fn store() -> ProfileStore {
        let base = Profile::new("base")
            .set("dataset", "imagenet")
            .set("model", "resnet50")
            .set("batch_size", 16)
            .set("devices_per_stage", vec![1, 1, 1, 1])
            .set("memory_proportion", vec![0.3, 0.3, 0.3, 0.3])
            .set("precision", "16.16");
        let epochs = Profile::new("epochs")
            .with_base("base")
            .set("epochs", 3)
            .set("validation_mode", "during");
        ProfileStore::new(ProfileSet::new().with(base).with(epochs))
    }

    fn catalog() -> StaticCatalog {
        StaticCatalog::new().with("imagenet", 1600)
    }

    #[test]
    fn test_full_pipeline() {
        let store = store();
        let catalog = catalog();
        let launch = PlanningSession::new(&store, &catalog, &AllowAll)
            .resolve("base", &[])
            .unwrap()
            .plan(4)
            .unwrap()
            .schedule(Some(400))
            .unwrap()
            .validate()
            .unwrap();

        assert_eq!(launch.plan.effective_batch_size, 16);
        assert_eq!(launch.schedule.steps_per_epoch, 100);
        assert_eq!(launch.schedule.checkpoint_steps, [100, 200, 300, 400]);
        assert!(launch.warnings.is_empty());
    }

    #[test]
    fn test_overrides_reach_the_plan() {
        let store = store();
        let catalog = catalog();
        let overrides = vec![("replication_factor".to_string(), ConfigValue::from(2))];
        let session = PlanningSession::new(&store, &catalog, &AllowAll)
            .resolve("base", &overrides)
            .unwrap();
        assert_eq!(session.config().source_of("replication_factor"), Some("override"));

        let planned = session.plan(8).unwrap();
        assert_eq!(planned.execution_plan().replication_factor, 2);
        assert_eq!(planned.execution_plan().effective_batch_size, 32);
    }

    #[test]
    fn test_misspelled_override() {
        let store = store();
        let catalog = catalog();
        let overrides = vec![("bath_size".to_string(), ConfigValue::from(8))];
        let err = PlanningSession::new(&store, &catalog, &AllowAll)
            .resolve("base", &overrides)
            .unwrap_err();
        assert_eq!(err.kind(), "UnrecognizedOverrideKey");
    }

    #[test]
    fn test_epochs_set_training_length() {
        let store = store();
        let catalog = catalog();
        let session = PlanningSession::new(&store, &catalog, &AllowAll)
            .resolve("epochs", &[])
            .unwrap()
            .plan(4)
            .unwrap()
            .schedule(None)
            .unwrap();
        let schedule = session.training_schedule();
        assert_eq!(schedule.total_steps, 300);
        assert_eq!(schedule.validation_steps, [100, 200, 300]);
    }

    #[test]
    fn test_no_training_length() {
        let store = store();
        let catalog = catalog();
        let err = PlanningSession::new(&store, &catalog, &AllowAll)
            .resolve("base", &[])
            .unwrap()
            .plan(4)
            .unwrap()
            .schedule(None)
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidScheduleParameters");

        let session = PlanningSession::new(&store, &catalog, &AllowAll)
            .with_default_total_steps(Some(250))
            .resolve("base", &[])
            .unwrap()
            .plan(4)
            .unwrap()
            .schedule(None)
            .unwrap();
        assert_eq!(session.training_schedule().total_steps, 250);
    }

    #[test]
    fn test_oversubscription_stops_at_plan() {
        let store = store();
        let catalog = catalog();
        let err = PlanningSession::new(&store, &catalog, &AllowAll)
            .resolve("base", &[])
            .unwrap()
            .plan(3)
            .unwrap_err();
        assert_eq!(err.kind(), "DeviceOversubscription");
    }

    #[test]
    fn test_capability_rejection() {
        let store = store();
        let catalog = catalog();
        let deny = CapabilityTable::new().deny(PrecisionPair::HALF_HALF, None);
        let scheduled = PlanningSession::new(&store, &catalog, &deny)
            .resolve("base", &[])
            .unwrap()
            .plan(4)
            .unwrap()
            .schedule(Some(400))
            .unwrap();
        assert_eq!(scheduled.report().kinds(), ["UnsupportedPrecisionPair"]);

        let err = scheduled.validate().unwrap_err();
        assert_eq!(err.kind(), "ValidationFailed");
    }

    #[test]
    fn test_tolerated_issues_become_warnings() {
        let store = store();
        let catalog = catalog();
        let deny = CapabilityTable::new().deny(PrecisionPair::HALF_HALF, None);
        let launch = PlanningSession::new(&store, &catalog, &deny)
            .resolve("base", &[])
            .unwrap()
            .plan(4)
            .unwrap()
            .schedule(Some(400))
            .unwrap()
            .validate_with(|issue| issue.kind() != "UnsupportedPrecisionPair")
            .unwrap();
        assert_eq!(launch.warnings.len(), 1);
        assert!(launch.warnings[0].starts_with("[UnsupportedPrecisionPair]"));
    }

    #[test]
    fn test_unknown_dataset() {
        let store = store();
        let catalog = StaticCatalog::new();
        let err = PlanningSession::new(&store, &catalog, &AllowAll)
            .resolve("base", &[])
            .unwrap()
            .plan(4)
            .unwrap()
            .schedule(Some(100))
            .unwrap_err();
        assert_eq!(err.kind(), "UnknownDataset");
    }
}
