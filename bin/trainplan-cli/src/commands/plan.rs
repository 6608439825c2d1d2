// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `trainplan plan` command: run the full pipeline for one profile.
//!
//! ```text
//! PlanningSession<Idle> → resolve → plan → schedule → validate → LaunchPlan
//! ```

use launch_plan::{LaunchPlan, PlannerSettings, PlanningSession};
use std::process::ExitCode;

pub fn execute(
    settings: &PlannerSettings,
    profile: &str,
    raw: &[String],
    devices: Option<u32>,
    steps: Option<u64>,
    tolerate: &[String],
    json: bool,
) -> anyhow::Result<ExitCode> {
    let store = settings.open_store()?;
    let overrides = super::parse_overrides(raw)?;
    let catalog = settings.catalog();
    let capabilities = settings.capabilities();
    let total_devices = devices.unwrap_or(settings.total_devices);

    let launch = PlanningSession::new(&store, &catalog, &capabilities)
        .with_default_total_steps(settings.default_total_steps)
        .resolve(profile, &overrides)?
        .plan(total_devices)?
        .schedule(steps)?
        .validate_with(|issue| !tolerate.iter().any(|kind| kind == issue.kind()))?;

    if json {
        println!("{}", launch.to_json()?);
    } else {
        print_launch(&launch);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_launch(launch: &LaunchPlan) {
    let plan = &launch.plan;
    let schedule = &launch.schedule;

    println!("{}", launch.summary());
    println!();

    // ── Device layout ──────────────────────────────────────────
    println!("  Devices:");
    for replica in 0..plan.replication_factor {
        let ranges: Vec<String> = plan
            .replica(replica)
            .map(|a| {
                let devices = a.devices();
                format!("s{}:[{}..{})", a.stage, devices.start, devices.end)
            })
            .collect();
        println!("   replica {replica:>3}  {}", ranges.join(" "));
    }
    if plan.spare_devices() > 0 {
        println!("   ({} spare)", plan.spare_devices());
    }
    println!();

    // ── Schedule ───────────────────────────────────────────────
    println!("  Checkpoints: {}", preview(&schedule.checkpoint_steps));
    if let Some(first) = schedule.checkpoint_steps.first() {
        if let Some(path) = launch.checkpoint_file(*first) {
            println!("   first file: {}", path.display());
        }
    }
    println!("  Validation:  {}", preview(&schedule.validation_steps));
    for change in &schedule.loss_scale_changes {
        println!(
            "  Loss scale:  {} from step {} (epoch {})",
            change.value, change.step, change.epoch
        );
    }
}

/// First and last few steps of a long list.
fn preview(steps: &[u64]) -> String {
    const EDGE: usize = 3;
    let fmt = |s: &[u64]| {
        s.iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    match steps.len() {
        0 => "none".to_string(),
        n if n <= 2 * EDGE => fmt(steps),
        n => format!("{}, …, {} ({n} total)", fmt(&steps[..EDGE]), fmt(&steps[n - EDGE..])),
    }
}
