use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use capkey::{generate_secret, Action, ApiKey, Caveat, Operation, RevocationSet};

fn benchmark_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("check");

    let secret = generate_secret().unwrap();
    let action = Action::now(Operation::Read).with_bucket("bench");
    let none = RevocationSet::new();

    for depth in [0usize, 4, 16] {
        let mut key = ApiKey::new(&secret);
        for _ in 0..depth {
            key = key
                .restrict(&Caveat::disallow(Operation::Delete).with_buckets(["bench"]))
                .unwrap();
        }
        let revoked: RevocationSet = [vec![0u8; 32]].into_iter().collect();

        group.bench_with_input(BenchmarkId::new("no_revocations", depth), &key, |b, key| {
            b.iter(|| key.check(black_box(&secret), black_box(&action), &none).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("with_revocations", depth), &key, |b, key| {
            b.iter(|| key.check(black_box(&secret), black_box(&action), &revoked).unwrap());
        });
    }
    group.finish();
}

fn benchmark_restrict_and_parse(c: &mut Criterion) {
    let secret = generate_secret().unwrap();
    let caveat = Caveat::disallow(Operation::Write).with_buckets(["bench"]);

    // Restricting a deep key costs one node and one HMAC, not a copy.
    let mut deep = ApiKey::new(&secret);
    for _ in 0..256 {
        deep = deep.restrict(&caveat).unwrap();
    }
    c.bench_function("restrict_deep_key", |b| {
        b.iter(|| black_box(&deep).restrict(black_box(&caveat)).unwrap());
    });

    let text = ApiKey::new(&secret).restrict(&caveat).unwrap().serialize();
    c.bench_function("parse", |b| {
        b.iter(|| ApiKey::parse(black_box(&text)).unwrap());
    });
}

criterion_group!(benches, benchmark_check, benchmark_restrict_and_parse);
criterion_main!(benches);
