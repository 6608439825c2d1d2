// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Loss-scaling ramp.
//!
//! Starting from `initial`, the scale doubles `n - 1` times where
//! `n = floor(log2(target / initial)) + 1`. Change `i` lands on the first
//! step of epoch `i × (epochs / n) + 1`. When a short run makes several
//! changes share an epoch, the last one wins.

use crate::LossScaleChange;
use std::collections::BTreeMap;

/// Longest ramp a finite `f64` ratio can produce.
pub const MAX_RAMP_LEN: u64 = 1024;

/// Number of distinct scale values on the ramp, capped at
/// [`MAX_RAMP_LEN`].
pub fn ramp_len(initial: f64, target: f64) -> u64 {
    let ratio = (target / initial).floor();
    if ratio.is_nan() || ratio < 1.0 {
        return 1;
    }
    let doublings = ratio.log2().floor().min((MAX_RAMP_LEN - 1) as f64);
    doublings as u64 + 1
}

/// Builds the change points for a run of `epochs` epochs, dropping any
/// that fall after `total_steps`.
pub fn ramp(
    initial: f64,
    target: f64,
    epochs: u64,
    steps_per_epoch: u64,
    total_steps: u64,
) -> Vec<LossScaleChange> {
    let n = ramp_len(initial, target);
    let stride = epochs / n;

    let mut by_step = BTreeMap::new();
    for i in 0..n {
        let epoch = i * stride + 1;
        let step = (epoch - 1).saturating_mul(steps_per_epoch).saturating_add(1);
        if step > total_steps {
            break;
        }
        let value = initial * 2f64.powi(i as i32);
        by_step.insert(step, LossScaleChange { step, epoch, value });
    }
    by_step.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_len() {
        assert_eq!(ramp_len(128.0, 1024.0), 4);
        assert_eq!(ramp_len(128.0, 128.0), 1);
        assert_eq!(ramp_len(128.0, 1000.0), 3);
    }

    #[test]
    fn test_ramp_len_is_bounded() {
        assert_eq!(ramp_len(1e-300, 1e300), MAX_RAMP_LEN);
        assert_eq!(ramp_len(0.0, 1.0), MAX_RAMP_LEN);
        assert_eq!(ramp_len(f64::NAN, 1.0), 1);
        assert_eq!(ramp_len(1.0, f64::MAX), MAX_RAMP_LEN);
    }

    #[test]
    fn test_unbounded_ratio_ramp_stays_in_range() {
        let changes = ramp(1e-300, 1e300, 30, 10, 300);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].step, 1);
        assert!(changes[0].value.is_finite());
    }

    #[test]
    fn test_even_ramp() {
        let changes = ramp(128.0, 1024.0, 9, 10, 90);
        let points: Vec<_> = changes.iter().map(|c| (c.epoch, c.step, c.value)).collect();
        assert_eq!(
            points,
            vec![(1, 1, 128.0), (3, 21, 256.0), (5, 41, 512.0), (7, 61, 1024.0)]
        );
    }

    #[test]
    fn test_short_run_collapses_to_last_value() {
        let changes = ramp(128.0, 1024.0, 2, 10, 20);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].step, 1);
        assert_eq!(changes[0].value, 1024.0);
    }

    #[test]
    fn test_changes_past_end_are_dropped() {
        let changes = ramp(1.0, 8.0, 8, 10, 30);
        let steps: Vec<_> = changes.iter().map(|c| c.step).collect();
        assert_eq!(steps, vec![1, 21]);
    }
}
