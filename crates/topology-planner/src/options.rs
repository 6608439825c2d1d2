// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Optimizer, checkpoint, and cadence metadata carried by a plan.
//!
//! None of these values affect the device layout. They are validated here
//! so a launcher never receives an optimizer name it cannot build.

use crate::PlannerError;
use std::fmt;
use std::str::FromStr;

macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $key:literal {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $label)] $variant),+
        }

        impl $name {
            /// Every accepted spelling, in declaration order.
            pub const NAMES: &'static [&'static str] = &[$($label),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl FromStr for $name {
            type Err = PlannerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    other => Err(PlannerError::invalid(
                        $key,
                        format!("'{other}' is not one of {}", Self::NAMES.join(", ")),
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

named_enum! {
    /// Optimizer families a launcher knows how to build.
    OptimizerKind, "optimizer" {
        Sgd => "sgd",
        /// SGD with the velocity and weight update fused into one pass.
        SgdCombined => "sgd_combined",
        AdamW => "adamw",
        RmsProp => "rmsprop",
        /// RMSProp with TensorFlow's epsilon placement.
        RmsPropTf => "rmsprop_tf",
        Lamb => "lamb",
    }
}

named_enum! {
    /// Learning-rate schedule shape.
    LrScheduleKind, "lr_schedule" {
        Constant => "constant",
        Step => "step",
        Cosine => "cosine",
        Exponential => "exponential",
    }
}

named_enum! {
    /// When the launcher runs validation passes.
    ValidationMode, "validation_mode" {
        Disabled => "none",
        /// At epoch boundaries while training.
        During => "during",
        /// Once, after the final step.
        After => "after",
    }
}

/// Optimizer settings passed through to the launcher.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OptimizerSpec {
    pub kind: OptimizerKind,
    /// Base learning rate; `None` leaves the launcher's default.
    pub lr: Option<f64>,
    pub lr_schedule: LrScheduleKind,
    pub warmup_epochs: u32,
}

impl Default for OptimizerSpec {
    fn default() -> Self {
        Self {
            kind: OptimizerKind::Sgd,
            lr: None,
            lr_schedule: LrScheduleKind::Constant,
            warmup_epochs: 0,
        }
    }
}

/// Where checkpoints go and whether the run resumes from one.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CheckpointSpec {
    pub directory: Option<String>,
    pub restore: bool,
    pub restore_path: Option<String>,
}

/// Training-length and reporting hints consumed by the schedule builder.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Cadence {
    pub epochs: Option<u32>,
    /// Explicit checkpoint interval in steps; `None` means once per epoch.
    pub checkpoint_every: Option<u64>,
    pub logs_per_epoch: u32,
    pub validation_mode: ValidationMode,
    /// Validate every N epochs when validating during training.
    pub validation_frequency: u32,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            epochs: None,
            checkpoint_every: None,
            logs_per_epoch: 1,
            validation_mode: ValidationMode::After,
            validation_frequency: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optimizer() {
        assert_eq!("adamw".parse::<OptimizerKind>().unwrap(), OptimizerKind::AdamW);
        assert_eq!(
            "rmsprop_tf".parse::<OptimizerKind>().unwrap(),
            OptimizerKind::RmsPropTf
        );
        let err = "adam".parse::<OptimizerKind>().unwrap_err();
        assert_eq!(err.kind(), "InvalidValue");
        assert!(err.to_string().contains("sgd_combined"));
    }

    #[test]
    fn test_names_round_trip() {
        for name in LrScheduleKind::NAMES {
            assert_eq!(name.parse::<LrScheduleKind>().unwrap().as_str(), *name);
        }
    }

    #[test]
    fn test_validation_mode_none_spelling() {
        assert_eq!("none".parse::<ValidationMode>().unwrap(), ValidationMode::Disabled);
        assert_eq!(ValidationMode::Disabled.to_string(), "none");
        assert_eq!(
            serde_json::to_string(&ValidationMode::Disabled).unwrap(),
            "\"none\""
        );
    }
}
