// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `trainplan check` command: plan every profile and report all failures.

use launch_plan::{plan_profile, PlannerSettings};
use std::process::ExitCode;

pub fn execute(
    settings: &PlannerSettings,
    devices: Option<u32>,
    steps: Option<u64>,
) -> anyhow::Result<ExitCode> {
    let store = settings.open_store()?;
    let mut settings = settings.clone();
    if let Some(devices) = devices {
        settings.total_devices = devices;
    }

    let names = store.names();
    let mut failures = 0usize;
    for name in &names {
        match plan_profile(&settings, &store, name, &[], steps) {
            Ok(launch) => {
                let plan = &launch.plan;
                println!(
                    "  ok    {name}: {}/{} devices, effective batch {}, {} steps",
                    plan.devices_required(),
                    plan.total_devices,
                    plan.effective_batch_size,
                    launch.schedule.total_steps
                );
            }
            Err(e) => {
                failures += 1;
                println!("  FAIL  {name}: error[{}]: {e}", e.kind());
            }
        }
    }

    println!();
    println!(
        "{} of {} profiles planned on {} devices",
        names.len() - failures,
        names.len(),
        settings.total_devices
    );
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
