// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # trainplan
//!
//! Command-line interface for the trainplan planner.
//!
//! ## Usage
//! ```bash
//! # List profiles and their inheritance chains
//! trainplan profiles
//!
//! # Show the merged configuration and where each value came from
//! trainplan resolve resnet50-pod16 --set batch_size=8
//!
//! # Plan, schedule and validate a profile; emit JSON for the launcher
//! trainplan plan resnet50-pod64 --devices 64 --json
//!
//! # Plan every profile and report all failures
//! trainplan check
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "trainplan",
    about = "Profile resolution and topology planning for distributed training",
    version,
    author
)]
struct Cli {
    /// Path to a TOML settings file (default: configs/trainplan.toml if present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the YAML profile file (overrides the settings file).
    #[arg(short, long, global = true)]
    profiles: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List profiles with their inheritance chains.
    Profiles,

    /// Print the merged configuration of a profile with provenance.
    Resolve {
        /// Profile name.
        profile: String,

        /// Override a key, e.g. `--set batch_size=8` (repeatable).
        #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
    },

    /// Plan, schedule and validate a profile.
    Plan {
        /// Profile name.
        profile: String,

        /// Override a key, e.g. `--set replication_factor=4` (repeatable).
        #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,

        /// Size of the device pool (default: from settings).
        #[arg(short, long)]
        devices: Option<u32>,

        /// Training length in optimizer steps (default: the profile's epochs).
        #[arg(long)]
        steps: Option<u64>,

        /// Report these validation issue kinds as warnings instead of failing (repeatable).
        #[arg(long, value_name = "KIND")]
        tolerate: Vec<String>,

        /// Emit the launch plan as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Plan every profile and report all failures.
    Check {
        /// Size of the device pool (default: from settings).
        #[arg(short, long)]
        devices: Option<u32>,

        /// Training length used for profiles without epochs.
        #[arg(long)]
        steps: Option<u64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    let result = commands::load_settings(cli.config.as_deref(), cli.profiles)
        .map_err(anyhow::Error::from)
        .and_then(|settings| match cli.command {
            Commands::Profiles => commands::profiles::execute(&settings),
            Commands::Resolve { profile, overrides } => {
                commands::resolve::execute(&settings, &profile, &overrides)
            }
            Commands::Plan {
                profile,
                overrides,
                devices,
                steps,
                tolerate,
                json,
            } => commands::plan::execute(
                &settings,
                &profile,
                &overrides,
                devices,
                steps,
                &tolerate,
                json,
            ),
            Commands::Check { devices, steps } => {
                commands::check::execute(&settings, devices, steps)
            }
        });

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error[{}]: {e:#}", commands::error_kind(&e));
            ExitCode::FAILURE
        }
    }
}
