use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use squad_core::{optimize, Candidate, CandidatePool, OptimizerConfig, Position, SearchBudget, SquadSearch};

/// Deterministic synthetic league: `per_position` candidates per position, 20 groups.
fn synthetic_pool(per_position: u32) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = || {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        (state >> 33) as f64 / (1u64 << 31) as f64
    };

    let mut id = 0;
    for pos in Position::ALL {
        for _ in 0..per_position {
            id += 1;
            let price = 4.0 + (next() * 9.0 * 10.0).round() / 10.0;
            let score = price * (0.4 + next() * 0.6) + next() * 2.0;
            candidates.push(Candidate::new(id, score, price, pos).with_group(format!("G{}", id % 20)));
        }
    }
    candidates
}

fn bench_search(c: &mut Criterion) {
    let candidates = synthetic_pool(60);
    let pool = CandidatePool::new(candidates).unwrap();
    let mut group = c.benchmark_group("beam_search");
    group.sample_size(10);

    for beam_width in [100usize, 500, 1000] {
        let config = OptimizerConfig { beam_width, ..Default::default() };
        group.bench_with_input(BenchmarkId::from_parameter(beam_width), &config, |b, config| {
            b.iter(|| {
                let outcome = SquadSearch::from_config(&pool, config).unwrap().run(&mut SearchBudget::unlimited());
                black_box(outcome.squads.len())
            })
        });
    }
    group.finish();
}

fn bench_optimize(c: &mut Criterion) {
    let candidates = synthetic_pool(60);
    let config = OptimizerConfig { beam_width: 300, diversity_runs: 3, ..Default::default() };

    c.bench_function("optimize_end_to_end", |b| {
        b.iter(|| {
            let report = optimize(black_box(candidates.clone()), &config).unwrap();
            black_box(report.results.len())
        })
    });
}

criterion_group!(benches, bench_search, bench_optimize);
criterion_main!(benches);
