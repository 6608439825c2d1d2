// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dataset sizes, supplied by the data-loading side.

use std::collections::BTreeMap;

/// Answers "how many training samples does this dataset have?".
///
/// Implemented by whatever owns the data pipeline. The schedule builder
/// only needs the size to place epoch boundaries.
pub trait DatasetCatalog: Send + Sync {
    /// Number of training samples in `dataset`, or `None` if unknown.
    fn dataset_size(&self, dataset: &str) -> Option<u64>;
}

/// A fixed name → size table.
///
/// # Example
/// ```
/// use schedule_builder::{DatasetCatalog, StaticCatalog};
///
/// let catalog = StaticCatalog::new().with("cifar10", 50_000);
/// assert_eq!(catalog.dataset_size("cifar10"), Some(50_000));
/// assert_eq!(catalog.dataset_size("imagenet"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StaticCatalog {
    sizes: BTreeMap<String, u64>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, dataset: &str, size: u64) -> Self {
        self.insert(dataset, size);
        self
    }

    pub fn insert(&mut self, dataset: &str, size: u64) {
        self.sizes.insert(dataset.to_string(), size);
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// `(dataset, size)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.sizes.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl From<BTreeMap<String, u64>> for StaticCatalog {
    fn from(sizes: BTreeMap<String, u64>) -> Self {
        Self { sizes }
    }
}

impl DatasetCatalog for StaticCatalog {
    fn dataset_size(&self, dataset: &str) -> Option<u64> {
        self.sizes.get(dataset).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let mut catalog = StaticCatalog::new().with("imagenet", 1_281_167);
        catalog.insert("cifar10", 50_000);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.dataset_size("imagenet"), Some(1_281_167));
        assert_eq!(catalog.iter().next(), Some(("cifar10", 50_000)));
    }

    #[test]
    fn test_transparent_serde() {
        let catalog: StaticCatalog = serde_json::from_str(r#"{"cifar10": 50000}"#).unwrap();
        assert_eq!(catalog.dataset_size("cifar10"), Some(50_000));
    }

    #[test]
    fn test_usable_as_trait_object() {
        let catalog: Box<dyn DatasetCatalog> = Box::new(StaticCatalog::new().with("x", 1));
        assert_eq!(catalog.dataset_size("x"), Some(1));
    }
}
