// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Compute/storage precision modes.

use crate::PlannerError;
use std::fmt;
use std::str::FromStr;

/// A floating-point width used for compute or storage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// 16-bit IEEE 754.
    Half,
    /// 32-bit IEEE 754.
    Float,
}

impl Precision {
    /// Width in bits.
    pub fn bits(self) -> u32 {
        match self {
            Precision::Half => 16,
            Precision::Float => 32,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Half => "half",
            Precision::Float => "float",
        }
    }

    fn parse_component(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "16" | "half" | "fp16" | "f16" => Some(Precision::Half),
            "32" | "float" | "fp32" | "f32" => Some(Precision::Float),
            _ => None,
        }
    }
}

/// A `(compute, storage)` precision pair.
///
/// Written as `"<compute>.<storage>"` in bits, e.g. `"16.32"` computes in
/// half precision and keeps master weights in float. Storage is never
/// narrower than compute, so only three pairs exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PrecisionPair {
    pub compute: Precision,
    pub storage: Precision,
}

impl PrecisionPair {
    pub const HALF_HALF: Self = Self::new(Precision::Half, Precision::Half);
    pub const HALF_FLOAT: Self = Self::new(Precision::Half, Precision::Float);
    pub const FLOAT_FLOAT: Self = Self::new(Precision::Float, Precision::Float);

    /// Every supported pair.
    pub const SUPPORTED: [Self; 3] = [Self::HALF_HALF, Self::HALF_FLOAT, Self::FLOAT_FLOAT];

    pub const fn new(compute: Precision, storage: Precision) -> Self {
        Self { compute, storage }
    }

    /// Returns `true` unless storage is narrower than compute.
    pub fn is_supported(self) -> bool {
        Self::SUPPORTED.contains(&self)
    }

    /// Parses a label such as `"16.32"` or `"half.float"`.
    ///
    /// # Errors
    /// [`PlannerError::UnsupportedPrecisionPair`] for malformed labels and
    /// for well-formed pairs outside [`Self::SUPPORTED`].
    pub fn parse(label: &str) -> Result<Self, PlannerError> {
        let unsupported = || PlannerError::UnsupportedPrecisionPair {
            precision: label.to_string(),
        };
        let (compute, storage) = label.split_once('.').ok_or_else(unsupported)?;
        let pair = Self::new(
            Precision::parse_component(compute).ok_or_else(unsupported)?,
            Precision::parse_component(storage).ok_or_else(unsupported)?,
        );
        if pair.is_supported() {
            Ok(pair)
        } else {
            Err(unsupported())
        }
    }

    /// The canonical `"<bits>.<bits>"` label.
    pub fn label(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PrecisionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.compute.bits(), self.storage.bits())
    }
}

impl FromStr for PrecisionPair {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<PrecisionPair> for String {
    fn from(pair: PrecisionPair) -> Self {
        pair.label()
    }
}

impl TryFrom<String> for PrecisionPair {
    type Error = PlannerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bit_labels() {
        assert_eq!(PrecisionPair::parse("16.16").unwrap(), PrecisionPair::HALF_HALF);
        assert_eq!(PrecisionPair::parse("16.32").unwrap(), PrecisionPair::HALF_FLOAT);
        assert_eq!(PrecisionPair::parse("32.32").unwrap(), PrecisionPair::FLOAT_FLOAT);
    }

    #[test]
    fn test_parse_named_labels() {
        assert_eq!(PrecisionPair::parse("half.float").unwrap(), PrecisionPair::HALF_FLOAT);
        assert_eq!(PrecisionPair::parse("FP16.fp16").unwrap(), PrecisionPair::HALF_HALF);
    }

    #[test]
    fn test_unsupported_pairs() {
        for label in ["32.16", "float.half", "16", "8.8", "", "16.32.32"] {
            let err = PrecisionPair::parse(label).unwrap_err();
            assert_eq!(err.kind(), "UnsupportedPrecisionPair", "label {label:?}");
        }
    }

    #[test]
    fn test_label_and_display() {
        assert_eq!(PrecisionPair::HALF_FLOAT.label(), "16.32");
        assert_eq!(PrecisionPair::FLOAT_FLOAT.to_string(), "32.32");
    }

    #[test]
    fn test_serde_as_label() {
        let json = serde_json::to_string(&PrecisionPair::HALF_FLOAT).unwrap();
        assert_eq!(json, "\"16.32\"");
        let back: PrecisionPair = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PrecisionPair::HALF_FLOAT);
        assert!(serde_json::from_str::<PrecisionPair>("\"32.16\"").is_err());
    }
}
