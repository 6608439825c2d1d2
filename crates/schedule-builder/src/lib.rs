// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # schedule-builder
//!
//! Derives the step-indexed [`Schedule`] a launcher follows: when to
//! checkpoint, when to validate, when to log, and when the loss scale
//! changes.
//!
//! # Epochs
//!
//! The builder has no access to data. A [`DatasetCatalog`] reports the
//! size of the plan's dataset, which together with the plan's effective
//! batch size places epoch boundaries:
//!
//! ```text
//!   dataset 1000 samples, effective batch 100 → 10 steps per epoch
//!
//!   step:    1 ........ 10 ........ 20 ........ 30 .. 35
//!   epoch:   |    1     |     2     |     3     |  4  |
//!   ckpt:              ◆           ◆           ◆          (per epoch)
//!   valid:                                             ◆  (after)
//! ```
//!
//! # Example
//! ```
//! use profile_store::{ProfileSet, ProfileStore};
//! use schedule_builder::{ScheduleBuilder, StaticCatalog};
//! use topology_planner::TopologyPlanner;
//!
//! let yaml = r#"
//! toy:
//!   dataset: toy
//!   batch_size: 100
//!   devices_per_stage: [1]
//!   memory_proportion: [0.6]
//!   precision: "32.32"
//! "#;
//! let store = ProfileStore::new(ProfileSet::from_yaml(yaml).unwrap());
//! let plan = TopologyPlanner::new().plan(&store.load("toy").unwrap(), 1).unwrap();
//!
//! let catalog = StaticCatalog::new().with("toy", 1000);
//! let schedule = ScheduleBuilder::new(&catalog).build(&plan, 5000, Some(500), false).unwrap();
//! assert_eq!(schedule.checkpoint_steps.first(), Some(&500));
//! assert_eq!(schedule.checkpoint_steps.last(), Some(&5000));
//! ```

mod builder;
mod catalog;
mod error;
pub mod loss_scaling;
mod schedule;

pub use builder::{ScheduleBuilder, MAX_SCHEDULED_STEPS};
pub use catalog::{DatasetCatalog, StaticCatalog};
pub use error::ScheduleError;
pub use schedule::{LossScaleChange, Schedule};
