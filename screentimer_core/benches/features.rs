use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use screentimer_core::{Sample, analyze_sample, extract, preprocess};

// Synthetic light step with jittered timestamps and noise
fn synth_sample(n: usize, onset: usize, seed: u32) -> Sample {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    let mut t = 0.0f64;
    let points: Vec<(f64, i64)> = (0..n)
        .map(|i| {
            t += 1500.0 + f64::from(next() % 200);
            let level = if i < onset { 40 } else { 600 };
            (t, level + i64::from(next() % 7))
        })
        .collect();
    Sample::from_points(12, points)
}

pub fn bench_features(c: &mut Criterion) {
    let mut g = c.benchmark_group("features");
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 cargo bench -p screentimer_core --bench features
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE")
        && let Ok(n) = ss.parse::<usize>()
    {
        g.sample_size(n.max(1));
    }

    for &n in &[400usize, 4_000, 40_000] {
        let sample = synth_sample(n, n / 2, 0xC0FFEE);
        g.bench_function(format!("preprocess_{n}"), |b| {
            b.iter(|| black_box(preprocess(black_box(&sample))))
        });

        let trace = match preprocess(&sample) {
            Ok(trace) => trace,
            Err(e) => panic!("synthetic trace rejected: {e}"),
        };
        g.bench_function(format!("extract_{n}"), |b| {
            b.iter_batched(
                || trace.clone(),
                |t| black_box(extract(black_box(&t))),
                BatchSize::SmallInput,
            )
        });

        g.bench_function(format!("analyze_sample_{n}"), |b| {
            b.iter(|| black_box(analyze_sample(0, black_box(&sample))))
        });
    }
    g.finish();
}

criterion_group!(features, bench_features);
criterion_main!(features);
