use std::sync::Arc;
use std::time::Duration;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use fenestra::{LockedStorage, ManualClock, SlidingWindow, WindowLimit};

const CAPACITIES: [u32; 3] = [16, 1_024, 65_536];

type Window = SlidingWindow<LockedStorage, Arc<ManualClock>>;

/// Fills a window to capacity, one admission per microsecond.
fn saturated(capacity: u32) -> (Arc<ManualClock>, Window) {
    let clock = Arc::new(ManualClock::default());
    let limit = WindowLimit::new(capacity, Duration::from_secs(1)).unwrap();
    let window = Window::from_parts(limit, Arc::clone(&clock));
    while window.try_acquire() {
        clock.advance(Duration::from_micros(1));
    }
    (clock, window)
}

fn inspect(c: &mut Criterion) {
    let mut group = c.benchmark_group("inspect");
    for capacity in CAPACITIES {
        group.bench_with_input(BenchmarkId::new("available", capacity), &capacity, |b, &capacity| {
            let (clock, window) = saturated(capacity);
            // half of the entries are past expiry but not evicted
            clock.set(Duration::from_secs(1) + Duration::from_micros(u64::from(capacity / 2)));
            b.iter(|| std::hint::black_box(window.available()));
        });
        group.bench_with_input(BenchmarkId::new("retry-after", capacity), &capacity, |b, &capacity| {
            let (_clock, window) = saturated(capacity);
            b.iter(|| std::hint::black_box(window.try_acquire_or_retry_after().is_err()));
        });
    }
    group.finish();
}

fn evict(c: &mut Criterion) {
    let mut group = c.benchmark_group("evict");
    for capacity in CAPACITIES {
        group.bench_with_input(BenchmarkId::new("full-window", capacity), &capacity, |b, &capacity| {
            b.iter_batched(
                || {
                    let (clock, window) = saturated(capacity);
                    clock.advance(Duration::from_secs(2));
                    window
                },
                |window| std::hint::black_box(window.evict_expired()),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(window_benches, inspect, evict);
criterion_main!(window_benches);
