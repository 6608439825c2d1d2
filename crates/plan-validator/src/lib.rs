// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # plan-validator
//!
//! The last gate before a plan reaches the launcher. [`PlanValidator`]
//! cross-checks an [`ExecutionPlan`](topology_planner::ExecutionPlan) and
//! its [`Schedule`](schedule_builder::Schedule) and reports *every*
//! problem in one [`ValidationReport`].
//!
//! # Checks
//!
//! | Area | Issues |
//! |---|---|
//! | Devices | oversubscription, overlapping stage assignments |
//! | Batch | zero factors, effective batch ≠ product |
//! | Partition | memory proportions |
//! | Schedule | empty checkpoint list, steps out of range or unordered, built for another plan |
//! | Capability | precision × replication rejected by [`AcceleratorCapabilities`] |

mod capability;
mod issue;
mod validator;

pub use capability::{AcceleratorCapabilities, AllowAll, CapabilityTable, UnsupportedCombination};
pub use issue::{ValidationIssue, ValidationReport};
pub use validator::PlanValidator;
