// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `trainplan profiles` command: list profiles and their inheritance chains.

use launch_plan::PlannerSettings;
use std::process::ExitCode;

pub fn execute(settings: &PlannerSettings) -> anyhow::Result<ExitCode> {
    let store = settings.open_store()?;
    let names = store.names();
    let width = names.iter().map(String::len).max().unwrap_or(0);

    println!("Profiles in {} ({}):", settings.profiles.display(), names.len());
    for name in &names {
        match store.chain(name) {
            Ok(chain) if chain.len() > 1 => {
                println!("  {name:<width$}  ← {}", chain[1..].join(" ← "));
            }
            Ok(_) => println!("  {name}"),
            Err(e) => println!("  {name:<width$}  ! {e}"),
        }
    }
    Ok(ExitCode::SUCCESS)
}
