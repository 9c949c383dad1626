use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sim_core::SimConfig;
use sim_runtime::GameSession;

fn seeded_market(bots: u32) -> GameSession {
    let mut session = GameSession::new(SimConfig::default()).expect("default config is valid");
    session.populate_bots(Some(bots));
    session
}

fn bench_quarters(c: &mut Criterion) {
    let s0 = seeded_market(25);
    c.bench_function("25 bots x 20 quarters", |b| {
        b.iter(|| {
            let mut s = s0.clone();
            for _ in 0..20 {
                black_box(s.advance_quarter());
            }
        })
    });
}

criterion_group!(benches, bench_quarters);
criterion_main!(benches);
