use chrono::Utc;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dota_arena::tournament::{Participant, bracket::pair_round, standings::rank};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

/// Helper to create a field of N participants with varied records
fn setup_participants(n: i64) -> Vec<Participant> {
    (1..=n)
        .map(|id| Participant {
            id,
            tournament_id: 1,
            user_id: id,
            account_id: None,
            display_name: format!("player{id}"),
            wins: (id % 5) as u32,
            losses: (id % 3) as u32,
            points: (id % 5) as u32 * 10,
            joined_at: Utc::now(),
        })
        .collect()
}

/// Benchmark shuffling and pairing a round
fn bench_pair_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_round");

    for size in [8i64, 64, 512] {
        let entrants: Vec<i64> = (1..=size).collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{size}_entrants")),
            &entrants,
            |b, entrants| {
                let mut rng = StdRng::seed_from_u64(7);
                b.iter(|| pair_round(black_box(entrants), &mut rng));
            },
        );
    }

    group.finish();
}

/// Benchmark building the standings table
fn bench_standings(c: &mut Criterion) {
    let mut group = c.benchmark_group("standings");

    for size in [8i64, 64, 512] {
        let participants = setup_participants(size);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{size}_participants")),
            &participants,
            |b, participants| {
                b.iter(|| rank(black_box(participants)));
            },
        );
    }

    group.finish();
}

criterion_group!(tournament_operations, bench_pair_round, bench_standings);
criterion_main!(tournament_operations);
