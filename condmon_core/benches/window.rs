use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use condmon_core::mocks::square_burst;
use condmon_core::{StatsWindow, WindowCfg};

// Noisy sine burst, xorshift noise
fn synth_channel(n: usize, peak: f64, noise_amp: f64, seed: u32) -> Vec<f64> {
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    };
    (0..n)
        .map(|i| {
            let phase = i as f64 * 2.0 * std::f64::consts::PI / 48.8;
            peak * phase.sin() + (next() * 2.0 - 1.0) * noise_amp
        })
        .collect()
}

fn sample_size(g: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>) {
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p condmon_core --bench window
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE")
        && let Ok(n) = ss.parse::<usize>()
    {
        g.sample_size(n.max(1));
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }
}

pub fn bench_add_sample(c: &mut Criterion) {
    let mut g = c.benchmark_group("window_add_sample");
    sample_size(&mut g);

    // One acquisition burst at the default 2000 samples.
    let a = synth_channel(2000, 707.0, 5.0, 0xC0FFEE);
    let b = synth_channel(2000, 420.0, 5.0, 0xBEEF);
    for &capacity in &[10usize, 100, 1000] {
        g.bench_function(format!("capacity_{capacity}"), |bench| {
            bench.iter_batched(
                || {
                    let mut w = StatsWindow::new(WindowCfg {
                        capacity,
                        ..WindowCfg::default()
                    })
                    .expect("window");
                    let fill = square_burst(500.0, 300.0, 8, 20_480.0);
                    for _ in 0..capacity {
                        w.add_sample(&fill.channel_a, &fill.channel_b);
                    }
                    w
                },
                |mut w| {
                    w.add_sample(black_box(&a), black_box(&b));
                    black_box(w.stats());
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

criterion_group!(benches, bench_add_sample);
criterion_main!(benches);
