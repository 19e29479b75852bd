use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use setassoc::config::CacheConfig;
use setassoc::simulator::{Access, Simulator};

const KINDS: [&str; 5] = ["direct", "2way", "4way", "8way", "full"];
const POLICIES: [&str; 2] = ["lru", "counter_scan_lru"];

/// A repeatable mix of reads and writes over a 64KiB window
fn access_stream(len: usize) -> Vec<Access> {
    let mut state: u32 = 0x2545_F491;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let address = state >> 16;
            if state & 0x0000_8000 == 0 {
                Access::Read { address }
            } else {
                Access::Write { address, value: state }
            }
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Replay");
    let accesses = access_stream(100_000);

    for policy in POLICIES {
        for kind in KINDS {
            let json = format!(
                r#"{{"name": "{kind}-{policy}", "size": 8192, "line_size": 64, "kind": "{kind}", "replacement_policy": "{policy}"}}"#
            );
            let config = CacheConfig::from_json(&json).unwrap();
            group.bench_with_input(BenchmarkId::new(policy, kind), &config, |bench, conf| {
                bench.iter(|| {
                    Simulator::new(conf).unwrap().simulate(accesses.iter().copied()).unwrap().stats
                });
            });
        }
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
);
criterion_main!(benches);
