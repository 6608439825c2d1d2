// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the resolve → plan → schedule → validate pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use launch_plan::{PlannerSettings, PlanningSession};
use profile_store::{parse_assignment, ProfileStore};
use std::path::Path;

const SETTINGS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../configs/trainplan.toml");

fn fixtures() -> (PlannerSettings, ProfileStore) {
    let settings = PlannerSettings::from_file(Path::new(SETTINGS)).expect("settings must load");
    let store = settings.open_store().expect("profiles must load");
    (settings, store)
}

fn bench_cached_resolve(c: &mut Criterion) {
    let (_, store) = fixtures();
    c.bench_function("resolve_cached_pod64", |b| {
        b.iter(|| black_box(store.load("resnet50-pod64").expect("profile must resolve")));
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let (settings, store) = fixtures();
    let catalog = settings.catalog();
    let capabilities = settings.capabilities();
    c.bench_function("pipeline_efficientnet_350_epochs", |b| {
        b.iter(|| {
            let launch = PlanningSession::new(&store, &catalog, &capabilities)
                .resolve("efficientnet-b0", &[])
                .and_then(|s| s.plan(16))
                .and_then(|s| s.schedule(None))
                .and_then(|s| s.validate())
                .expect("pipeline must succeed");
            black_box(launch)
        });
    });
}

fn bench_pipeline_with_overrides(c: &mut Criterion) {
    let (settings, store) = fixtures();
    let catalog = settings.catalog();
    let capabilities = settings.capabilities();
    let overrides = vec![
        parse_assignment("batch_size=8").expect("valid assignment"),
        parse_assignment("replication_factor=2").expect("valid assignment"),
    ];
    c.bench_function("pipeline_resnet50_overrides", |b| {
        b.iter(|| {
            let launch = PlanningSession::new(&store, &catalog, &capabilities)
                .resolve("resnet50", &overrides)
                .and_then(|s| s.plan(16))
                .and_then(|s| s.schedule(Some(50_000)))
                .and_then(|s| s.validate())
                .expect("pipeline must succeed");
            black_box(launch)
        });
    });
}

criterion_group!(
    benches,
    bench_cached_resolve,
    bench_full_pipeline,
    bench_pipeline_with_overrides
);
criterion_main!(benches);
