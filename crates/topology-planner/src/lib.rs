// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # topology-planner
//!
//! Converts a resolved training profile into an [`ExecutionPlan`]: how the
//! model is split into pipeline stages, which devices each stage of each
//! data-parallel replica runs on, and the resulting batch arithmetic.
//!
//! # Device Layout
//!
//! ```text
//!   pool of 16 devices, devices_per_stage = [1, 1, 1, 1], replication_factor = 4
//!
//!   replica 0: [0] [1] [2] [3]      stage 0 → 1 → 2 → 3
//!   replica 1: [4] [5] [6] [7]
//!   replica 2: [8] [9] [10] [11]
//!   replica 3: [12] [13] [14] [15]
//! ```
//!
//! The pool must split evenly into replicas, and each replica's share must
//! be a whole multiple of the devices one partition needs.
//!
//! # Batch Arithmetic
//!
//! ```text
//! effective_batch_size = batch_size × gradient_accumulation × replication_factor
//! ```
//!
//! # Example
//! ```
//! use profile_store::{ProfileSet, ProfileStore};
//! use topology_planner::TopologyPlanner;
//!
//! let yaml = r#"
//! resnet50:
//!   batch_size: 17
//!   gradient_accumulation: 128
//!   replication_factor: 4
//!   devices_per_stage: [1, 1, 1, 1]
//!   memory_proportion: [0.3, 0.3, 0.3, 0.3]
//!   precision: "16.32"
//! "#;
//! let store = ProfileStore::new(ProfileSet::from_yaml(yaml).unwrap());
//! let config = store.load("resnet50").unwrap();
//! let plan = TopologyPlanner::new().plan(&config, 16).unwrap();
//! assert_eq!(plan.effective_batch_size, 8704);
//! ```

mod error;
mod options;
pub mod partition;
mod plan;
mod planner;
mod precision;

pub use error::PlannerError;
pub use options::{
    Cadence, CheckpointSpec, LrScheduleKind, OptimizerKind, OptimizerSpec, ValidationMode,
};
pub use partition::{DevicePartitionSpec, StageAssignment};
pub use plan::ExecutionPlan;
pub use planner::TopologyPlanner;
pub use precision::{Precision, PrecisionPair};
