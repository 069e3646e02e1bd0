//! Benchmarks the Choquet fusion hot path: one calibration `fuse` call per
//! method invocation, across the full method catalog for a single chunk.

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdm_rs::calibration::choquet::CalibrationEngine;
use pdm_rs::calibration::{CalibrationContext, MethodCalibration, LAYER_COUNT};

fn sample_calibration() -> MethodCalibration {
    let mut interaction_weights = BTreeMap::new();
    interaction_weights.insert("0,1".to_string(), 0.02);
    interaction_weights.insert("2,3".to_string(), 0.01);

    MethodCalibration {
        method_id: "D3Q7.keyword_match".to_string(),
        version: 1,
        linear_weights: [0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1],
        interaction_weights,
        min_evidence_threshold: 1,
        confidence_floor: 0.0,
        confidence_ceiling: 1.0,
        provenance_hash: "bench".to_string(),
    }
}

fn sample_context() -> CalibrationContext {
    CalibrationContext {
        question_id: "D3-Q07".to_string(),
        dimension_id: 3,
        policy_area_id: 7,
        unit_of_analysis: "chunk".to_string(),
        method_position: 1,
        total_methods: 4,
    }
}

fn bench_fuse(c: &mut Criterion) {
    let engine = CalibrationEngine::new();
    let calibration = sample_calibration();
    let context = sample_context();
    let layer_signals: [f64; LAYER_COUNT] = [0.6, 0.4, 0.8, 0.2, 0.5, 0.3, 0.7, 0.1];

    c.bench_function("choquet_fuse_single", |b| {
        b.iter(|| engine.fuse(black_box(&calibration), black_box(&layer_signals), black_box(&context)).unwrap());
    });

    c.bench_function("choquet_fuse_60_cells", |b| {
        b.iter(|| {
            for _ in 0..60 {
                engine.fuse(black_box(&calibration), black_box(&layer_signals), black_box(&context)).unwrap();
            }
        });
    });
}

criterion_group!(benches, bench_fuse);
criterion_main!(benches);
