use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;
use strtable::{StrTable, TableFlags};

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn growing(capacity: usize) -> StrTable<'static, u64> {
    StrTable::builder(capacity)
        .flags(TableFlags::AUTO_REHASH)
        .build()
        .unwrap()
}

fn filled(seed: u64, n: usize) -> (StrTable<'static, u64>, Vec<String>) {
    let mut t = growing(1024);
    let keys: Vec<String> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        t.insert(k.clone(), i as u64).unwrap();
    }
    (t, keys)
}

fn pick(keys: &[String], count: usize) -> Vec<String> {
    let n = keys.len();
    let mut s = 0x9e3779b97f4a7c15u64;
    (0..count)
        .map(|_| {
            s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
            keys[(s as usize) % n].clone()
        })
        .collect()
}

fn bench_insert_100k(c: &mut Criterion) {
    c.bench_function("str_table::insert_growing_100k", |b| {
        b.iter_batched(
            || growing(16),
            |mut t| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    t.insert(key(x), i as u64).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("str_table::insert_presized_100k", |b| {
        b.iter_batched(
            || StrTable::<u64>::builder(100_000).node_capacity(100_000).build().unwrap(),
            |mut t| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    t.insert(key(x), i as u64).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });

    // Fixed size with no growth: chains get long.
    c.bench_function("str_table::insert_fixed_1k_buckets_20k", |b| {
        b.iter_batched(
            || StrTable::<u64>::new(1024).unwrap(),
            |mut t| {
                for (i, x) in lcg(2).take(20_000).enumerate() {
                    t.insert(key(x), i as u64).unwrap();
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_remove_random_10k(c: &mut Criterion) {
    c.bench_function("str_table::remove_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let (t, keys) = filled(5, 110_000);
                let mut seen = std::collections::HashSet::with_capacity(10_000);
                let to_remove: Vec<String> = pick(&keys, 40_000)
                    .into_iter()
                    .filter(|k| seen.insert(k.clone()))
                    .take(10_000)
                    .collect();
                (t, to_remove)
            },
            |(mut t, to_remove)| {
                for k in &to_remove {
                    black_box(t.remove(k));
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get(c: &mut Criterion) {
    c.bench_function("str_table::get_hit_10k_on_100k", |b| {
        let (t, keys) = filled(7, 100_000);
        let queries = pick(&keys, 10_000);
        b.iter(|| {
            for k in &queries {
                black_box(t.get(k));
            }
        })
    });

    c.bench_function("str_table::get_miss_10k_on_100k", |b| {
        let (t, _) = filled(11, 100_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for _ in 0..10_000 {
                let k = key(miss.next().unwrap());
                black_box(t.get(&k));
            }
        })
    });

    // Lookup-then-insert with the digest computed once.
    c.bench_function("str_table::prehashed_get_or_insert_10k", |b| {
        b.iter_batched(
            || {
                let (t, keys) = filled(13, 50_000);
                let mut queries = pick(&keys, 5_000);
                queries.extend(lcg(17).take(5_000).map(key));
                (t, queries)
            },
            |(mut t, queries)| {
                for k in queries {
                    let pre = t.prehash(&k);
                    if !t.contains_prehashed(&k, pre) {
                        t.insert_prehashed(k, pre, 0).unwrap();
                    }
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_enumerate(c: &mut Criterion) {
    c.bench_function("str_table::for_each_100k", |b| {
        let (t, _) = filled(999, 100_000);
        b.iter(|| {
            let mut sum = 0u64;
            t.for_each(|_, v| sum = sum.wrapping_add(*v));
            black_box(sum)
        })
    });

    c.bench_function("str_table::duplicate_100k", |b| {
        let (t, _) = filled(1001, 100_000);
        b.iter(|| black_box(t.duplicate(|v| *v).unwrap()))
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_remove_random_10k,
              bench_get,
              bench_enumerate
}
criterion_main!(benches_insert, benches_ops);
