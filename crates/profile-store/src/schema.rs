// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The registry of recognised configuration keys.
//!
//! The schema serves three purposes:
//!
//! 1. It supplies the built-in default layer that sits underneath every
//!    profile.
//! 2. It declares which keys must be present after resolution.
//! 3. It lets the [`crate::OverrideMerger`] reject typos instead of
//!    silently adding unused keys.

use crate::{ConfigValue, Layer};
use std::collections::BTreeMap;

/// The expected shape of a key's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    /// A float; integer literals are accepted.
    Float,
    Text,
    IntList,
    FloatList,
    TextList,
    /// A `compute.storage` precision label such as `"16.32"`. YAML reads
    /// an unquoted `16.32` as a float, so both forms are accepted.
    Precision,
}

impl ValueKind {
    /// Returns `true` if `value` has this kind. `null` is accepted for
    /// every kind and means "unset".
    pub fn accepts(self, value: &ConfigValue) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            Self::Bool => value.as_bool().is_some(),
            Self::Int => value.as_i64().is_some(),
            Self::Float => value.as_f64().is_some(),
            Self::Text => value.as_str().is_some(),
            Self::Precision => value.as_str().is_some() || value.as_f64().is_some(),
            Self::IntList => all_items(value, |v| v.as_i64().is_some()),
            Self::FloatList => all_items(value, |v| v.as_f64().is_some()),
            Self::TextList => all_items(value, |v| v.as_str().is_some()),
        }
    }

    /// Returns a human-readable description for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Bool => "a bool",
            Self::Int => "an integer",
            Self::Float => "a number",
            Self::Text => "a string",
            Self::IntList => "a sequence of integers",
            Self::FloatList => "a sequence of numbers",
            Self::TextList => "a sequence of strings",
            Self::Precision => "a precision label such as \"16.32\"",
        }
    }
}

fn all_items(value: &ConfigValue, pred: impl Fn(&ConfigValue) -> bool) -> bool {
    value.as_seq().is_some_and(|items| items.iter().all(pred))
}

/// Metadata for one recognised key.
#[derive(Debug, Clone)]
pub struct KeySpec {
    pub name: String,
    pub kind: ValueKind,
    /// Value placed in the built-in default layer, if any.
    pub default: Option<ConfigValue>,
    /// Whether resolution fails when the key is absent.
    pub required: bool,
    pub description: String,
}

impl KeySpec {
    pub fn new(name: &str, kind: ValueKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            default: None,
            required: false,
            description: description.to_string(),
        }
    }

    pub fn with_default(mut self, value: impl Into<ConfigValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A registry of recognised keys.
#[derive(Debug, Clone, Default)]
pub struct KeySchema {
    keys: BTreeMap<String, KeySpec>,
}

impl KeySchema {
    /// Creates an empty schema.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The keys understood by the topology planner and schedule builder.
    pub fn standard() -> Self {
        use ValueKind::*;

        let mut schema = Self::empty();
        for spec in [
            KeySpec::new("model", Text, "model architecture name"),
            KeySpec::new("dataset", Text, "dataset identifier"),
            KeySpec::new("seed", Int, "randomness seed"),
            KeySpec::new("batch_size", Int, "micro-batch size per device group").required(),
            KeySpec::new("gradient_accumulation", Int, "micro-batches per optimizer step")
                .with_default(1),
            KeySpec::new("replication_factor", Int, "data-parallel replicas").with_default(1),
            KeySpec::new("device_iterations", Int, "optimizer steps per host call")
                .with_default(1),
            KeySpec::new("devices_per_stage", IntList, "device count of each pipeline stage")
                .required(),
            KeySpec::new("memory_proportion", FloatList, "memory weight of each stage")
                .required(),
            KeySpec::new("pipeline_splits", TextList, "layer names where stages split"),
            KeySpec::new("precision", Precision, "compute.storage precision pair").required(),
            KeySpec::new("loss_scaling", Float, "final static loss-scaling factor"),
            KeySpec::new("initial_loss_scaling", Float, "loss scaling at the start of a ramp"),
            KeySpec::new("optimizer", Text, "optimizer name").with_default("sgd"),
            KeySpec::new("lr", Float, "base learning rate"),
            KeySpec::new("lr_schedule", Text, "learning-rate schedule kind")
                .with_default("constant"),
            KeySpec::new("warmup_epoch", Int, "learning-rate warm-up epochs").with_default(0),
            KeySpec::new("epochs", Int, "training length in epochs"),
            KeySpec::new("checkpoint_path", Text, "checkpoint directory"),
            KeySpec::new("checkpoint_every", Int, "checkpoint interval in steps"),
            KeySpec::new("restore", Bool, "resume from a checkpoint").with_default(false),
            KeySpec::new("restore_path", Text, "checkpoint to resume from"),
            KeySpec::new("validation_mode", Text, "none, during, or after")
                .with_default("after"),
            KeySpec::new("validation_frequency", Int, "validate every N epochs")
                .with_default(1),
            KeySpec::new("logs_per_epoch", Int, "log lines per epoch").with_default(1),
        ] {
            schema.register(spec);
        }
        schema
    }

    /// Registers (or replaces) a key.
    pub fn register(&mut self, spec: KeySpec) {
        self.keys.insert(spec.name.clone(), spec);
    }

    pub fn get(&self, key: &str) -> Option<&KeySpec> {
        self.keys.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeySpec> {
        self.keys.values()
    }

    /// Keys that must be present after resolution, in sorted order.
    pub fn required_keys(&self) -> impl Iterator<Item = &str> {
        self.keys
            .values()
            .filter(|s| s.required)
            .map(|s| s.name.as_str())
    }

    /// Builds the built-in default layer from every key with a default.
    pub fn default_layer(&self) -> Layer {
        let entries = self
            .keys
            .values()
            .filter_map(|s| s.default.clone().map(|v| (s.name.clone(), v)))
            .collect();
        Layer::new(crate::DEFAULTS_NAME, entries)
    }

    /// Returns the closest known key to `key`, if one is within a small
    /// edit distance. Used to suggest fixes for mistyped overrides.
    pub fn suggest(&self, key: &str) -> Option<&str> {
        let threshold = (key.len() / 3).max(2);
        self.keys
            .keys()
            .map(|k| (edit_distance(key, k), k))
            .filter(|(d, _)| *d <= threshold)
            .min_by_key(|(d, _)| *d)
            .map(|(_, k)| k.as_str())
    }
}

/// Levenshtein distance over bytes; keys are ASCII.
fn edit_distance(a: &str, b: &str) -> usize {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
