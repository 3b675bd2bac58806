#![allow(missing_docs)]
//! Benchmarks for the tracking index.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::{hint::black_box, sync::Arc};

use beacon_core::{
    BucketKind, ChunkTracker, EntityTracking, InterestUpdate, TrackedEntity,
};
use beacon_utils::{ChunkPos, differing_chunks, math::Vector3};

#[derive(Debug)]
struct BenchEntity {
    id: i32,
    position: Vector3<f64>,
    view_distance: Option<u8>,
}

impl TrackedEntity for BenchEntity {
    fn entity_id(&self) -> i32 {
        self.id
    }

    fn position(&self) -> Vector3<f64> {
        self.position
    }

    fn view_distance(&self) -> Option<u8> {
        self.view_distance
    }
}

/// Counts reports without storing them.
#[derive(Default)]
struct Counter(usize);

impl<E> InterestUpdate<E> for Counter {
    fn on_entered(&mut self, _entity: &E) {
        self.0 += 1;
    }

    fn on_exited(&mut self, _entity: &E) {
        self.0 += 1;
    }
}

/// A tracker with `count` entities spread over a 64x64 chunk area.
fn populated(kind: BucketKind, count: i32) -> ChunkTracker<Arc<BenchEntity>> {
    let mut tracker = ChunkTracker::with_bucket_kind(kind);
    for id in 0..count {
        // cheap scatter, deterministic across runs
        let x = f64::from((id * 7919) % 1024 - 512);
        let z = f64::from((id * 104_729) % 1024 - 512);
        let entity = Arc::new(BenchEntity {
            id,
            position: Vector3::new(x, 64.0, z),
            view_distance: None,
        });
        tracker.register(entity, Vector3::new(x, 64.0, z), None);
    }
    tracker
}

fn bench_cross_chunk_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_chunk_move");

    for kind in [BucketKind::Plain, BucketKind::CopyOnWrite] {
        group.bench_with_input(
            BenchmarkId::new("view_10", format!("{kind:?}")),
            &kind,
            |b, &kind| {
                let mut tracker = populated(kind, 10_000);
                let observer = Arc::new(BenchEntity {
                    id: -1,
                    position: Vector3::new(8.0, 64.0, 8.0),
                    view_distance: Some(10),
                });
                tracker.register(observer.clone(), observer.position, None);

                let a = Vector3::new(8.0, 64.0, 8.0);
                let b_pos = Vector3::new(24.0, 64.0, 8.0);
                let mut forward = true;
                b.iter(|| {
                    let (from, to) = if forward { (a, b_pos) } else { (b_pos, a) };
                    forward = !forward;
                    let mut counter = Counter::default();
                    tracker.move_entity(&observer, from, to, Some(&mut counter));
                    black_box(counter.0);
                });
            },
        );
    }

    group.finish();
}

fn bench_nearby(c: &mut Criterion) {
    let tracker = populated(BucketKind::Plain, 10_000);
    let mut group = c.benchmark_group("nearby_entities");

    for range in [4.0, 32.0, 128.0] {
        group.bench_with_input(BenchmarkId::new("range", range), &range, |b, &range| {
            b.iter(|| {
                let mut found = 0;
                tracker.nearby_entities(black_box(Vector3::new(0.0, 64.0, 0.0)), range, |_| {
                    found += 1;
                });
                black_box(found);
            });
        });
    }

    group.finish();
}

fn bench_differing_chunks(c: &mut Criterion) {
    c.bench_function("differing_chunks_r32", |b| {
        b.iter(|| {
            black_box(differing_chunks(
                black_box(ChunkPos::new(0, 0)),
                black_box(ChunkPos::new(1, 1)),
                32,
            ))
        });
    });
}

criterion_group!(
    benches,
    bench_cross_chunk_move,
    bench_nearby,
    bench_differing_chunks
);
criterion_main!(benches);
