// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # profile-store
//!
//! Named training profiles with explicit, auditable inheritance.
//!
//! A profile file is a YAML mapping of profile names to flat key/value
//! mappings. A profile may name one `base` profile; the reserved top-level
//! `defaults` block is a layer shared by every profile:
//!
//! ```yaml
//! defaults:
//!   precision: "16.16"
//!   seed: 42
//!
//! resnet50:
//!   batch_size: 16
//!   devices_per_stage: [1, 1, 1, 1]
//!   memory_proportion: [0.3, 0.3, 0.3, 0.3]
//!
//! resnet50-pod16:
//!   base: resnet50
//!   replication_factor: 4
//! ```
//!
//! # Layered Merge
//!
//! Resolution folds an ordered list of layers left to right:
//!
//! ```text
//! schema defaults → file defaults → root ancestor → … → requested profile → overrides
//! ```
//!
//! Later layers replace earlier values wholesale (sequences are never
//! merged element-wise). Every key in a [`ResolvedConfig`] remembers which
//! layer supplied it.
//!
//! # Key Components
//!
//! - [`ProfileSet`]: parsed profile definitions.
//! - [`ProfileStore`]: resolves profiles through their base chain and
//!   caches the results; reloads swap a whole generation atomically.
//! - [`OverrideMerger`]: applies command-line overrides, rejecting keys
//!   that neither the profile nor the [`KeySchema`] knows.
//!
//! # Example
//! ```
//! use profile_store::{OverrideMerger, ProfileSet, ProfileStore};
//!
//! let yaml = r#"
//! base-run:
//!   batch_size: 8
//!   devices_per_stage: [1, 1]
//!   memory_proportion: [0.5, 0.5]
//!   precision: "16.16"
//! big-run:
//!   base: base-run
//!   batch_size: 32
//! "#;
//! let store = ProfileStore::new(ProfileSet::from_yaml(yaml).unwrap());
//! let resolved = store.load("big-run").unwrap();
//! assert_eq!(resolved.get_int("batch_size").unwrap(), Some(32));
//!
//! let merger = OverrideMerger::new(store.schema());
//! let tuned = merger
//!     .apply(&resolved, &[("replication_factor".into(), 4.into())])
//!     .unwrap();
//! assert_eq!(tuned.get_int("replication_factor").unwrap(), Some(4));
//! ```

mod error;
mod overrides;
mod profile;
mod resolved;
pub mod schema;
mod store;
mod value;

pub use error::ProfileError;
pub use overrides::{parse_assignment, OverrideMerger, OVERRIDE_SOURCE};
pub use profile::{Layer, Profile, ProfileSet, BASE_KEY, DEFAULTS_NAME};
pub use resolved::ResolvedConfig;
pub use schema::{KeySchema, KeySpec, ValueKind};
pub use store::ProfileStore;
pub use value::ConfigValue;
