// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Resolved profile + device pool → [`ExecutionPlan`].

use crate::partition::{self, DevicePartitionSpec};
use crate::plan::PlanBuilder;
use crate::{
    Cadence, CheckpointSpec, ExecutionPlan, LrScheduleKind, OptimizerKind, OptimizerSpec,
    PlannerError, PrecisionPair, ValidationMode,
};
use profile_store::{ConfigValue, ResolvedConfig};

/// Converts resolved profiles into execution plans.
///
/// The planner is stateless: the same configuration and device count
/// always give equal plans. Checks run in a fixed order and the first
/// violation is returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologyPlanner;

impl TopologyPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Plans `config` onto a pool of `total_devices` devices.
    ///
    /// # Errors
    /// In check order:
    /// 1. [`PlannerError::NonPositiveBatchSize`]: a batch factor is ≤ 0.
    /// 2. [`PlannerError::InvalidPartition`]: empty stages or a stage with
    ///    no devices.
    /// 3. [`PlannerError::DeviceOversubscription`]: the replicated
    ///    partition does not tile the pool.
    /// 4. [`PlannerError::InvalidPartitionWeights`].
    /// 5. [`PlannerError::InvalidPartition`]: wrong number of pipeline splits.
    /// 6. [`PlannerError::UnsupportedPrecisionPair`].
    /// 7. [`PlannerError::InvalidLossScaling`].
    /// 8. [`PlannerError::InvalidValue`]: optimizer, schedule, or cadence
    ///    values outside their allowed sets.
    pub fn plan(
        &self,
        config: &ResolvedConfig,
        total_devices: u32,
    ) -> Result<ExecutionPlan, PlannerError> {
        let batch_size = positive(config, "batch_size", None)?;
        let accumulation = positive(config, "gradient_accumulation", Some(1))?;
        let replicas = positive(config, "replication_factor", Some(1))?;
        let iterations = positive(config, "device_iterations", Some(1))?;

        let stages = partition::check_stages(&config.require_int_list("devices_per_stage")?)?;
        let per_replica: u64 = stages.iter().map(|&d| u64::from(d)).sum();
        check_pool(per_replica, replicas, total_devices)?;

        let weights = config.require_float_list("memory_proportion")?;
        partition::check_weights(&weights, stages.len())?;
        let splits = config.get_str_list("pipeline_splits")?.unwrap_or_default();
        partition::check_splits(&splits, stages.len())?;
        let spec = DevicePartitionSpec {
            devices_per_stage: stages,
            memory_proportion: weights,
            pipeline_splits: splits,
        };

        let precision = PrecisionPair::parse(&precision_label(config.require("precision")?))?;
        let (initial_scale, scale) = loss_scaling(config)?;

        let optimizer = optimizer(config)?;
        let checkpoint = checkpoint(config)?;
        let cadence = cadence(config)?;

        let seed = match config.get_int("seed")? {
            Some(s) => Some(u64::try_from(s).map_err(|_| {
                PlannerError::invalid("seed", format!("{s} is negative"))
            })?),
            None => None,
        };
        let model = config.get_str("model")?.map(str::to_string);
        let dataset = config.get_str("dataset")?.map(str::to_string);

        let plan = PlanBuilder::new(config.profile(), total_devices, spec, precision)
            .batch(batch_size, accumulation, replicas, iterations)
            .identity(model, dataset, seed)
            .loss_scaling(initial_scale, scale)
            .options(optimizer, checkpoint, cadence)
            .build();

        if plan.spare_devices() > 0 {
            tracing::warn!(
                "profile '{}' leaves {} of {} devices unused",
                plan.profile,
                plan.spare_devices(),
                total_devices
            );
        }
        tracing::info!("{}", plan.summary());
        Ok(plan)
    }
}

/// Reads a batch factor. Absent keys take `default`; `None` makes the key
/// required.
fn positive(config: &ResolvedConfig, key: &str, default: Option<u32>) -> Result<u32, PlannerError> {
    let value = match (config.get_int(key)?, default) {
        (Some(v), _) => v,
        (None, Some(d)) => return Ok(d),
        (None, None) => config.require_int(key)?,
    };
    if value <= 0 {
        return Err(PlannerError::NonPositiveBatchSize {
            key: key.to_string(),
            value,
        });
    }
    u32::try_from(value).map_err(|_| PlannerError::invalid(key, format!("{value} is too large")))
}

/// The per-replica share of the pool must be a whole multiple of the
/// devices one replica needs.
fn check_pool(per_replica: u64, replicas: u32, total_devices: u32) -> Result<(), PlannerError> {
    let fail = |detail: String| PlannerError::DeviceOversubscription {
        stage_devices: per_replica,
        replication_factor: replicas,
        total_devices,
        detail,
    };

    if total_devices == 0 {
        return Err(fail("the device pool is empty".into()));
    }
    if total_devices % replicas != 0 {
        return Err(fail(format!(
            "{total_devices} devices cannot be split evenly into {replicas} replicas"
        )));
    }
    let share = u64::from(total_devices / replicas);
    if share % per_replica != 0 {
        return Err(fail(format!(
            "each replica gets {share} devices, which is not a multiple of {per_replica}"
        )));
    }
    Ok(())
}

/// YAML reads an unquoted `16.32` as a float; both forms name the same pair.
fn precision_label(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

fn loss_scaling(config: &ResolvedConfig) -> Result<(Option<f64>, Option<f64>), PlannerError> {
    let check = |key: &str| -> Result<Option<f64>, PlannerError> {
        match config.get_float(key)? {
            Some(v) if !(v.is_finite() && v > 0.0) => Err(PlannerError::InvalidLossScaling {
                key: key.to_string(),
                detail: format!("{v} is not a positive finite number"),
            }),
            other => Ok(other),
        }
    };

    let scale = check("loss_scaling")?;
    let initial = check("initial_loss_scaling")?;
    match (initial, scale) {
        (Some(i), Some(s)) if i > s => Err(PlannerError::InvalidLossScaling {
            key: "initial_loss_scaling".into(),
            detail: format!("initial value {i} exceeds final value {s}"),
        }),
        (Some(i), Some(s)) if !(s / i).is_finite() => Err(PlannerError::InvalidLossScaling {
            key: "initial_loss_scaling".into(),
            detail: format!("ramp from {i} to {s} spans more than the f64 range"),
        }),
        (Some(_), None) => Err(PlannerError::InvalidLossScaling {
            key: "initial_loss_scaling".into(),
            detail: "a ramp needs a final 'loss_scaling'".into(),
        }),
        _ => Ok((initial, scale)),
    }
}

fn optimizer(config: &ResolvedConfig) -> Result<OptimizerSpec, PlannerError> {
    let defaults = OptimizerSpec::default();
    let kind = match config.get_str("optimizer")? {
        Some(name) => name.parse::<OptimizerKind>()?,
        None => defaults.kind,
    };
    let lr_schedule = match config.get_str("lr_schedule")? {
        Some(name) => name.parse::<LrScheduleKind>()?,
        None => defaults.lr_schedule,
    };
    let lr = config.get_float("lr")?;
    if let Some(lr) = lr.filter(|v| !(v.is_finite() && *v > 0.0)) {
        return Err(PlannerError::invalid("lr", format!("{lr} is not a positive finite number")));
    }
    Ok(OptimizerSpec {
        kind,
        lr,
        lr_schedule,
        warmup_epochs: non_negative(config, "warmup_epoch")?.unwrap_or(0),
    })
}

fn checkpoint(config: &ResolvedConfig) -> Result<CheckpointSpec, PlannerError> {
    let spec = CheckpointSpec {
        directory: config.get_str("checkpoint_path")?.map(str::to_string),
        restore: config.get_bool("restore")?.unwrap_or(false),
        restore_path: config.get_str("restore_path")?.map(str::to_string),
    };
    if spec.restore && spec.restore_path.is_none() {
        return Err(PlannerError::invalid(
            "restore_path",
            "required when 'restore' is true",
        ));
    }
    Ok(spec)
}

fn cadence(config: &ResolvedConfig) -> Result<Cadence, PlannerError> {
    let defaults = Cadence::default();
    let validation_mode = match config.get_str("validation_mode")? {
        Some(mode) => mode.parse::<ValidationMode>()?,
        None => defaults.validation_mode,
    };

    let epochs = non_negative(config, "epochs")?;
    if epochs == Some(0) {
        return Err(PlannerError::invalid("epochs", "must be at least 1"));
    }
    let logs_per_epoch = non_negative(config, "logs_per_epoch")?.unwrap_or(defaults.logs_per_epoch);
    if logs_per_epoch == 0 {
        return Err(PlannerError::invalid("logs_per_epoch", "must be at least 1"));
    }
    let validation_frequency =
        non_negative(config, "validation_frequency")?.unwrap_or(defaults.validation_frequency);
    if validation_frequency == 0 {
        return Err(PlannerError::invalid("validation_frequency", "must be at least 1"));
    }

    let checkpoint_every = match config.get_int("checkpoint_every")? {
        Some(n) if n < 0 => {
            return Err(PlannerError::invalid("checkpoint_every", format!("{n} is negative")))
        }
        Some(0) | None => None,
        Some(n) => Some(n as u64),
    };

    Ok(Cadence {
        epochs,
        checkpoint_every,
        logs_per_epoch,
        validation_mode,
        validation_frequency,
    })
}

fn non_negative(config: &ResolvedConfig, key: &str) -> Result<Option<u32>, PlannerError> {
    config
        .get_int(key)?
        .map(|v| {
            u32::try_from(v)
                .map_err(|_| PlannerError::invalid(key, format!("{v} is out of range")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile_store::{KeySchema, OverrideMerger, Profile, ProfileSet, ProfileStore};
    use std::sync::Arc;

    fn resolve(profile: Profile) -> Arc<ResolvedConfig> {
        let name = profile.name.clone();
        ProfileStore::new(ProfileSet::new().with(profile))
            .load(&name)
            .unwrap()
    }

    fn four_stage() -> Profile {
        Profile::new("resnet50")
            .set("model", "resnet50")
            .set("dataset", "imagenet")
            .set("batch_size", 16)
            .set("devices_per_stage", vec![1, 1, 1, 1])
            .set("memory_proportion", vec![0.3, 0.3, 0.3, 0.3])
            .set("precision", "16.16")
    }

    fn with(base: &ResolvedConfig, key: &str, value: impl Into<ConfigValue>) -> ResolvedConfig {
        let schema = KeySchema::standard();
        OverrideMerger::new(&schema)
            .apply(base, &[(key.to_string(), value.into())])
            .unwrap()
    }

    #[test]
    fn test_four_stages_on_four_devices() {
        let plan = TopologyPlanner::new().plan(&resolve(four_stage()), 4).unwrap();
        assert_eq!(plan.num_stages(), 4);
        assert_eq!(plan.devices_required(), 4);
        assert_eq!(plan.effective_batch_size, 16);
        assert_eq!(plan.precision, PrecisionPair::HALF_HALF);
        assert_eq!(plan.model.as_deref(), Some("resnet50"));
        plan.validate().unwrap();
    }

    #[test]
    fn test_four_stages_on_three_devices() {
        let err = TopologyPlanner::new().plan(&resolve(four_stage()), 3).unwrap_err();
        assert_eq!(err.kind(), "DeviceOversubscription");
    }

    #[test]
    fn test_effective_batch_8704() {
        let profile = four_stage()
            .set("batch_size", 17)
            .set("gradient_accumulation", 128)
            .set("replication_factor", 4);
        let plan = TopologyPlanner::new().plan(&resolve(profile), 16).unwrap();
        assert_eq!(plan.effective_batch_size, 8704);
        assert_eq!(plan.assignments.len(), 16);
    }

    #[test]
    fn test_weight_count_mismatch() {
        let base = resolve(four_stage());
        let config = with(&base, "memory_proportion", vec![0.3, 0.3, 0.3]);
        let err = TopologyPlanner::new().plan(&config, 4).unwrap_err();
        assert_eq!(err.kind(), "InvalidPartitionWeights");
    }

    #[test]
    fn test_non_positive_factors() {
        let base = resolve(four_stage());
        for key in [
            "batch_size",
            "gradient_accumulation",
            "replication_factor",
            "device_iterations",
        ] {
            let config = with(&base, key, 0);
            let err = TopologyPlanner::new().plan(&config, 4).unwrap_err();
            assert!(
                matches!(
                    err,
                    PlannerError::NonPositiveBatchSize { key: ref k, value: 0 } if k == key
                ),
                "{key}: {err}"
            );
        }
    }

    #[test]
    fn test_batch_checked_before_devices() {
        let base = resolve(four_stage());
        let config = with(&base, "replication_factor", -1);
        let err = TopologyPlanner::new().plan(&config, 3).unwrap_err();
        assert_eq!(err.kind(), "NonPositiveBatchSize");
    }

    #[test]
    fn test_divisor_rule() {
        let base = resolve(four_stage());
        // 8 devices, 2 replicas: each replica gets 4 = one partition.
        let two = with(&base, "replication_factor", 2);
        assert!(TopologyPlanner::new().plan(&two, 8).is_ok());
        // 8 devices, 3 replicas: uneven split.
        let three = with(&base, "replication_factor", 3);
        assert_eq!(
            TopologyPlanner::new().plan(&three, 8).unwrap_err().kind(),
            "DeviceOversubscription"
        );
        // 6 devices, 1 replica: 4 does not divide 6.
        assert_eq!(
            TopologyPlanner::new().plan(&base, 6).unwrap_err().kind(),
            "DeviceOversubscription"
        );
        // 8 devices, 1 replica: fits twice over, four devices stay spare.
        let spare = TopologyPlanner::new().plan(&base, 8).unwrap();
        assert_eq!(spare.spare_devices(), 4);
        assert_eq!(
            TopologyPlanner::new().plan(&base, 0).unwrap_err().kind(),
            "DeviceOversubscription"
        );
    }

    #[test]
    fn test_invalid_stage_counts() {
        let base = resolve(four_stage());
        let config = with(&base, "devices_per_stage", vec![1, 0, 1, 1]);
        assert_eq!(
            TopologyPlanner::new().plan(&config, 4).unwrap_err().kind(),
            "InvalidPartition"
        );
        let config = with(&base, "devices_per_stage", Vec::<i64>::new());
        assert_eq!(
            TopologyPlanner::new().plan(&config, 4).unwrap_err().kind(),
            "InvalidPartition"
        );
    }

    #[test]
    fn test_pipeline_splits() {
        let base = resolve(four_stage());
        let ok = with(&base, "pipeline_splits", vec!["layer1/2", "layer2/3", "layer3/5"]);
        let plan = TopologyPlanner::new().plan(&ok, 4).unwrap();
        assert_eq!(plan.partition.pipeline_splits.len(), 3);

        let bad = with(&base, "pipeline_splits", vec!["layer1/2"]);
        assert_eq!(
            TopologyPlanner::new().plan(&bad, 4).unwrap_err().kind(),
            "InvalidPartition"
        );
    }

    #[test]
    fn test_precision_forms() {
        let base = resolve(four_stage());
        let float_label = with(&base, "precision", 16.32);
        let plan = TopologyPlanner::new().plan(&float_label, 4).unwrap();
        assert_eq!(plan.precision, PrecisionPair::HALF_FLOAT);

        let unsupported = with(&base, "precision", "32.16");
        assert_eq!(
            TopologyPlanner::new().plan(&unsupported, 4).unwrap_err().kind(),
            "UnsupportedPrecisionPair"
        );
    }

    #[test]
    fn test_loss_scaling() {
        let base = resolve(four_stage());
        let ok = with(&base, "loss_scaling", 128);
        assert_eq!(TopologyPlanner::new().plan(&ok, 4).unwrap().loss_scaling, Some(128.0));

        for bad in [0.0, -1.0, f64::INFINITY] {
            let config = with(&base, "loss_scaling", bad);
            assert_eq!(
                TopologyPlanner::new().plan(&config, 4).unwrap_err().kind(),
                "InvalidLossScaling"
            );
        }

        let ramp = with(&ok, "initial_loss_scaling", 256);
        assert_eq!(
            TopologyPlanner::new().plan(&ramp, 4).unwrap_err().kind(),
            "InvalidLossScaling"
        );
        let ramp = with(&base, "initial_loss_scaling", 16);
        assert_eq!(
            TopologyPlanner::new().plan(&ramp, 4).unwrap_err().kind(),
            "InvalidLossScaling"
        );
    }

    #[test]
    fn test_loss_scaling_ramp_beyond_f64_range() {
        let base = resolve(four_stage());
        let target = with(&base, "loss_scaling", 1e300);
        let wide = with(&target, "initial_loss_scaling", 1e-300);
        let err = TopologyPlanner::new().plan(&wide, 4).unwrap_err();
        assert_eq!(err.kind(), "InvalidLossScaling");
        assert!(err.to_string().contains("f64 range"));

        let finite = with(&target, "initial_loss_scaling", 1.0);
        assert!(TopologyPlanner::new().plan(&finite, 4).is_ok());
    }

    #[test]
    fn test_options() {
        let base = resolve(four_stage());
        let config = with(&with(&base, "optimizer", "lamb"), "lr_schedule", "cosine");
        let plan = TopologyPlanner::new().plan(&config, 4).unwrap();
        assert_eq!(plan.optimizer.kind, OptimizerKind::Lamb);
        assert_eq!(plan.optimizer.lr_schedule, LrScheduleKind::Cosine);
        assert_eq!(plan.cadence.validation_mode, ValidationMode::After);

        for (key, value) in [
            ("optimizer", "adam"),
            ("lr_schedule", "linear"),
            ("validation_mode", "sometimes"),
        ] {
            let config = with(&base, key, value);
            let err = TopologyPlanner::new().plan(&config, 4).unwrap_err();
            assert_eq!(err.kind(), "InvalidValue", "{key}");
        }
    }

    #[test]
    fn test_restore_needs_path() {
        let base = resolve(four_stage());
        let config = with(&base, "restore", true);
        assert_eq!(
            TopologyPlanner::new().plan(&config, 4).unwrap_err().kind(),
            "InvalidValue"
        );
        let config = with(&config, "restore_path", "ckpt/resnet50_imagenet_10.ckpt");
        assert!(TopologyPlanner::new().plan(&config, 4).unwrap().checkpoint.restore);
    }

    #[test]
    fn test_checkpoint_every_zero_means_per_epoch() {
        let base = resolve(four_stage());
        let config = with(&base, "checkpoint_every", 0);
        let plan = TopologyPlanner::new().plan(&config, 4).unwrap();
        assert_eq!(plan.cadence.checkpoint_every, None);
    }

    #[test]
    fn test_deterministic() {
        let config = resolve(four_stage().set("seed", 7));
        let planner = TopologyPlanner::new();
        assert_eq!(planner.plan(&config, 4).unwrap(), planner.plan(&config, 4).unwrap());
    }
}
