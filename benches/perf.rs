use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use opening_stats::aggregate::aggregate_by_opening;
use opening_stats::classify::{Side, TimeClass, UnknownOpening, normalize_games};
use opening_stats::games_fetch::GameRecord;
use opening_stats::openings::OpeningTable;

const CODES: &[&str] = &["B20", "C50", "D02", "A45", "E60", "C00", "B10", "A10"];
const RESULTS: &[&str] = &["win", "resigned", "agreed", "timeout", "checkmated", "repetition"];

fn sample_games(n: usize) -> Vec<GameRecord> {
    (0..n)
        .map(|i| {
            let code = CODES[i % CODES.len()];
            let user_white = i % 2 == 0;
            let (white, black) = if user_white {
                ("alice", "opponent")
            } else {
                ("opponent", "alice")
            };
            GameRecord {
                url: format!("https://www.test/game/live/{i}"),
                pgn: format!(
                    "[Event \"Live Chess\"]\n[Site \"Test\"]\n[White \"{white}\"]\n[Black \"{black}\"]\n[ECO \"{code}\"]\n\n1. e4 e5 2. Nf3 Nc6"
                ),
                time_control: "180".to_string(),
                end_time: Some(1_700_000_000 + i as i64),
                rated: i % 17 != 0,
                rules: "chess".to_string(),
                time_class: if i % 3 == 0 { "rapid" } else { "blitz" }.to_string(),
                white_username: white.to_string(),
                white_rating: 1400 + (i % 200) as u32,
                white_result: RESULTS[i % RESULTS.len()].to_string(),
                black_username: black.to_string(),
                black_rating: 1450 + (i % 150) as u32,
                black_result: "win".to_string(),
            }
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let table = OpeningTable::bundled().expect("bundled table");
    let games = sample_games(5_000);
    c.bench_function("normalize_5k", |b| {
        b.iter(|| {
            let out = normalize_games(
                black_box(&games),
                "alice",
                Side::White,
                TimeClass::All,
                &table,
                UnknownOpening::Fail,
            )
            .unwrap();
            black_box(out.len());
        })
    });
}

fn bench_aggregate(c: &mut Criterion) {
    let table = OpeningTable::bundled().expect("bundled table");
    let games = sample_games(5_000);
    let normalized = normalize_games(
        &games,
        "alice",
        Side::Black,
        TimeClass::Blitz,
        &table,
        UnknownOpening::Fail,
    )
    .expect("sample games classify");
    c.bench_function("aggregate_by_opening", |b| {
        b.iter(|| {
            let rows = aggregate_by_opening(black_box(&normalized));
            black_box(rows.len());
        })
    });
}

criterion_group!(benches, bench_normalize, bench_aggregate);
criterion_main!(benches);
