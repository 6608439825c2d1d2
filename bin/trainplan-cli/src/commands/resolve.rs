// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `trainplan resolve` command: print a merged profile with provenance.

use launch_plan::{LaunchError, PlannerSettings};
use profile_store::OverrideMerger;
use std::process::ExitCode;

pub fn execute(
    settings: &PlannerSettings,
    profile: &str,
    raw: &[String],
) -> anyhow::Result<ExitCode> {
    let store = settings.open_store()?;
    let overrides = super::parse_overrides(raw)?;

    let resolved = store.load(profile).map_err(LaunchError::from)?;
    let chain = store.chain(profile).map_err(LaunchError::from)?;
    println!("Inheritance: {}", chain.join(" → "));

    if overrides.is_empty() {
        println!("{resolved}");
    } else {
        let merged = OverrideMerger::new(store.schema())
            .apply(&resolved, &overrides)
            .map_err(LaunchError::from)?;
        println!("{merged}");
    }
    Ok(ExitCode::SUCCESS)
}
