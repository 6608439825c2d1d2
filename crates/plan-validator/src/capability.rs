// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! What the accelerator runtime can execute.

use topology_planner::PrecisionPair;

/// Capability query answered by the accelerator runtime.
///
/// The validator never hard-codes which precision modes work at which
/// replication factor; it asks an implementation of this trait.
pub trait AcceleratorCapabilities: Send + Sync {
    /// Returns `true` if `precision` can run with `replication_factor`
    /// data-parallel replicas.
    fn supports(&self, precision: PrecisionPair, replication_factor: u32) -> bool;
}

/// Accepts every combination.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AcceleratorCapabilities for AllowAll {
    fn supports(&self, _precision: PrecisionPair, _replication_factor: u32) -> bool {
        true
    }
}

/// One denied combination. A missing replication factor denies the
/// precision pair at any replication.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UnsupportedCombination {
    pub precision: PrecisionPair,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_factor: Option<u32>,
}

/// An explicit deny list; everything not listed is supported.
///
/// Deserializes from a sequence of entries, e.g. in TOML:
///
/// ```toml
/// [[unsupported]]
/// precision = "16.16"
/// replication_factor = 64
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CapabilityTable {
    unsupported: Vec<UnsupportedCombination>,
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Denies `precision` at `replication_factor` (or at any replication
    /// when `None`).
    pub fn deny(mut self, precision: PrecisionPair, replication_factor: Option<u32>) -> Self {
        self.unsupported.push(UnsupportedCombination {
            precision,
            replication_factor,
        });
        self
    }

    pub fn entries(&self) -> &[UnsupportedCombination] {
        &self.unsupported
    }

    pub fn is_empty(&self) -> bool {
        self.unsupported.is_empty()
    }
}

impl From<Vec<UnsupportedCombination>> for CapabilityTable {
    fn from(unsupported: Vec<UnsupportedCombination>) -> Self {
        Self { unsupported }
    }
}

impl AcceleratorCapabilities for CapabilityTable {
    fn supports(&self, precision: PrecisionPair, replication_factor: u32) -> bool {
        !self.unsupported.iter().any(|entry| {
            entry.precision == precision
                && entry
                    .replication_factor
                    .map_or(true, |rf| rf == replication_factor)
        })
    }
}
