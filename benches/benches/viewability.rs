// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_viewability::{RectMap, ViewabilityCoordinator, geometry::is_viewable};

const ROOT: u32 = u32::MAX;
const ITEM_HEIGHT: f64 = 100.0;

fn populated(len: u32) -> ViewabilityCoordinator<u32, RectMap<u32>> {
    let mut rects = RectMap::new();
    rects.set_xywh(ROOT, 0.0, 0.0, 400.0, 800.0);
    for item in 0..len {
        rects.set_xywh(item, 0.0, f64::from(item) * ITEM_HEIGHT, 400.0, ITEM_HEIGHT);
    }
    let mut coordinator = ViewabilityCoordinator::new(rects);
    coordinator.register_root(ROOT);
    for item in 0..len {
        coordinator.register_view(item, |visible| {
            black_box(visible);
        });
    }
    coordinator
}

fn bench_update_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewability/update_root");

    // Hypothesis: a broadcast is linear in tracked views; most checks are
    // no-ops because only a screenful of items flips per scroll step.
    for len in [16_u32, 128, 1_024, 8_192] {
        group.throughput(Throughput::Elements(u64::from(len)));
        group.bench_with_input(BenchmarkId::new("scroll_step", len), &len, |b, &len| {
            let mut coordinator = populated(len);
            let mut direction = 1.0;
            b.iter(|| {
                for item in 0..len {
                    coordinator.provider_mut().offset_y(item, 37.0 * direction);
                }
                direction = -direction;
                coordinator.update_root();
            });
        });
        group.bench_with_input(BenchmarkId::new("unchanged", len), &len, |b, &len| {
            let mut coordinator = populated(len);
            b.iter(|| coordinator.update_root());
        });
    }

    group.finish();
}

fn bench_is_viewable(c: &mut Criterion) {
    c.bench_function("viewability/is_viewable", |b| {
        b.iter(|| {
            let mut visible = 0_u32;
            for top in -200..1_000 {
                let top = f64::from(top);
                if is_viewable(50.0, black_box(top), top + ITEM_HEIGHT, 800.0, ITEM_HEIGHT) {
                    visible += 1;
                }
            }
            black_box(visible)
        });
    });
}

criterion_group!(benches, bench_update_root, bench_is_viewable);
criterion_main!(benches);
