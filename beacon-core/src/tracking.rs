//! Entity tracking
//!
//! Stores every registered entity in the bucket of the chunk it is in and
//! answers "who is here" queries. Register, unregister and cross-chunk moves
//! optionally report which entities entered or left an interest window, so
//! visibility can be maintained incrementally instead of being recomputed
//! every tick.

use std::sync::Arc;

use beacon_utils::math::Vector3;
use beacon_utils::{ChunkPos, ChunkWindow};
use rustc_hash::FxHashMap;

use crate::bucket::{BucketKind, ChunkBuckets};
use crate::config::TrackingConfig;
use crate::entity::TrackedEntity;
use crate::update::InterestUpdate;

/// Operations of an entity tracking index.
///
/// Mutations take `&mut self`. [`Synchronized`](crate::Synchronized)
/// implements this trait for shared references, so one locked index can be
/// driven from many threads.
pub trait EntityTracking<E> {
    /// Starts tracking `entity` at `point`.
    ///
    /// With an `update` and an observer entity, every other tracked entity in
    /// the observer's view window is reported as entered. Registering an entity
    /// that is already tracked does nothing.
    fn register(
        &mut self,
        entity: E,
        point: Vector3<f64>,
        update: Option<&mut dyn InterestUpdate<E>>,
    );

    /// Stops tracking `entity`.
    ///
    /// With an `update` and an observer entity, every other tracked entity in
    /// the observer's view window is reported as exited. Unknown entities are
    /// ignored.
    fn unregister(
        &mut self,
        entity: &E,
        point: Vector3<f64>,
        update: Option<&mut dyn InterestUpdate<E>>,
    );

    /// Records that `entity` moved from `old_point` to `new_point`.
    ///
    /// Moves inside one chunk do nothing. Otherwise the entity changes bucket
    /// and, with an `update`, the entities of chunks that entered or left its
    /// window are reported.
    fn move_entity(
        &mut self,
        entity: &E,
        old_point: Vector3<f64>,
        new_point: Vector3<f64>,
        update: Option<&mut dyn InterestUpdate<E>>,
    );

    /// Reports the entities of chunks that are in the `radius` window around
    /// `to` but not `from` as entered, and the reverse as exited.
    fn difference(
        &self,
        from: Vector3<f64>,
        to: Vector3<f64>,
        radius: u8,
        update: &mut dyn InterestUpdate<E>,
    );

    /// Calls `query` for each entity in `chunk`.
    fn chunk_entities<F: FnMut(&E)>(&self, chunk: ChunkPos, query: F);

    /// Calls `query` for each entity within `radius` chunks (Chebyshev) of `center`.
    fn chunk_range_entities<F: FnMut(&E)>(&self, center: ChunkPos, radius: u8, query: F);

    /// Calls `query` for each entity strictly closer than `range` to `point`.
    fn nearby_entities<F: FnMut(&E)>(&self, point: Vector3<f64>, range: f64, query: F);

    /// Every tracked entity.
    fn entities(&self) -> Vec<E>;

    /// Every tracked observer.
    fn observers(&self) -> Vec<E>;

    /// Number of tracked entities.
    fn entity_count(&self) -> usize;

    /// The chunk bucket an entity currently sits in, if it is tracked.
    fn tracked_chunk(&self, entity_id: i32) -> Option<ChunkPos>;

    /// An owned view of `chunk`'s entities.
    fn chunk_snapshot(&self, chunk: ChunkPos) -> Arc<[E]>;

    /// Number of chunks holding at least one entity.
    fn populated_chunks(&self) -> usize;
}

struct TrackedSlot<E> {
    handle: E,
    chunk: ChunkPos,
}

/// Tracking index storing entities per chunk.
///
/// Not synchronized; wrap it in [`Synchronized`](crate::Synchronized) to share
/// it between threads.
pub struct ChunkTracker<E> {
    /// Entity id to handle and current bucket
    entities: FxHashMap<i32, TrackedSlot<E>>,

    /// Chunk key to entities in that chunk
    buckets: ChunkBuckets<E>,

    /// Window radius for moves of non-observer entities
    entity_view_distance: u8,
}

impl<E: TrackedEntity + Clone> ChunkTracker<E> {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            entities: FxHashMap::default(),
            buckets: ChunkBuckets::new(config.bucket_kind),
            entity_view_distance: config.entity_view_distance,
        }
    }

    /// Creates an empty tracker with default settings and the given bucket kind.
    #[must_use]
    pub fn with_bucket_kind(kind: BucketKind) -> Self {
        Self::new(&TrackingConfig {
            bucket_kind: kind,
            ..TrackingConfig::default()
        })
    }

    /// The bucket store, for inspection.
    #[must_use]
    pub fn buckets(&self) -> &ChunkBuckets<E> {
        &self.buckets
    }

    /// Radius used when a non-observer entity crosses a chunk border.
    #[must_use]
    pub fn entity_view_distance(&self) -> u8 {
        self.entity_view_distance
    }

    /// Whether an entity with this id is tracked.
    #[must_use]
    pub fn is_tracked(&self, entity_id: i32) -> bool {
        self.entities.contains_key(&entity_id)
    }

    /// Drops every entity and bucket without reporting anything.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.buckets.clear();
    }

    /// Visits every entity whose bucket lies in `window`.
    ///
    /// Walks whichever is smaller: the window's chunks or the populated chunks.
    fn for_each_in_window(&self, window: &ChunkWindow, mut f: impl FnMut(&E)) {
        if window.len() > self.buckets.len() {
            for (chunk, entities) in self.buckets.iter() {
                if window.contains(chunk) {
                    entities.iter().for_each(&mut f);
                }
            }
        } else {
            window.for_each(|chunk| self.buckets.peek(chunk).iter().for_each(&mut f));
        }
    }

    /// Reports every entity but `viewer` in the window around `center`.
    fn report_window(&self, center: ChunkPos, radius: u8, viewer: i32, mut report: impl FnMut(&E)) {
        let window = ChunkWindow::around(center, u32::from(radius));
        self.for_each_in_window(&window, |e| {
            if e.entity_id() != viewer {
                report(e);
            }
        });
    }

    /// Core of [`EntityTracking::difference`]; skips `viewer` if given.
    fn difference_chunks(
        &self,
        from: ChunkPos,
        to: ChunkPos,
        radius: u8,
        viewer: Option<i32>,
        update: &mut dyn InterestUpdate<E>,
    ) {
        if from == to {
            return;
        }
        let old_window = ChunkWindow::around(from, u32::from(radius));
        let new_window = ChunkWindow::around(to, u32::from(radius));
        let skip = |e: &E| viewer == Some(e.entity_id());

        new_window.for_each_outside(&old_window, |chunk| {
            for e in self.buckets.peek(chunk) {
                if !skip(e) {
                    update.on_entered(e);
                }
            }
        });
        old_window.for_each_outside(&new_window, |chunk| {
            for e in self.buckets.peek(chunk) {
                if !skip(e) {
                    update.on_exited(e);
                }
            }
        });
    }
}

impl<E: TrackedEntity + Clone> EntityTracking<E> for ChunkTracker<E> {
    fn register(
        &mut self,
        entity: E,
        point: Vector3<f64>,
        update: Option<&mut dyn InterestUpdate<E>>,
    ) {
        debug_assert!(point.is_finite(), "register at non-finite position {point:?}");
        let entity_id = entity.entity_id();
        if self.entities.contains_key(&entity_id) {
            log::trace!("Entity {entity_id} is already tracked, ignoring register");
            return;
        }

        let chunk = ChunkPos::from_position(&point);
        self.buckets.insert(chunk, entity.clone());
        let view_distance = entity.view_distance();
        self.entities.insert(
            entity_id,
            TrackedSlot {
                handle: entity,
                chunk,
            },
        );
        log::trace!("Tracking entity {entity_id} in chunk {chunk}");

        if let (Some(update), Some(radius)) = (update, view_distance) {
            self.report_window(chunk, radius, entity_id, |e| update.on_entered(e));
        }
    }

    fn unregister(
        &mut self,
        entity: &E,
        point: Vector3<f64>,
        update: Option<&mut dyn InterestUpdate<E>>,
    ) {
        let entity_id = entity.entity_id();
        let Some(slot) = self.entities.remove(&entity_id) else {
            log::trace!("Entity {entity_id} is not tracked, ignoring unregister");
            return;
        };

        let chunk = ChunkPos::from_position(&point);
        if chunk != slot.chunk {
            log::warn!(
                "Entity {entity_id} unregistered at {chunk} but tracked in {}",
                slot.chunk
            );
        }
        self.buckets.remove(slot.chunk, entity_id);
        log::trace!("Stopped tracking entity {entity_id} in chunk {}", slot.chunk);

        // torn down around the chunk the entity was tracked in, which is the
        // window its observers were last told about
        if let (Some(update), Some(radius)) = (update, slot.handle.view_distance()) {
            self.report_window(slot.chunk, radius, entity_id, |e| update.on_exited(e));
        }
    }

    fn move_entity(
        &mut self,
        entity: &E,
        old_point: Vector3<f64>,
        new_point: Vector3<f64>,
        update: Option<&mut dyn InterestUpdate<E>>,
    ) {
        let old_chunk = ChunkPos::from_position(&old_point);
        let new_chunk = ChunkPos::from_position(&new_point);
        if old_chunk == new_chunk {
            return;
        }
        debug_assert!(new_point.is_finite(), "move to non-finite position {new_point:?}");

        let entity_id = entity.entity_id();
        let Some(slot) = self.entities.get_mut(&entity_id) else {
            log::trace!("Entity {entity_id} is not tracked, ignoring move");
            return;
        };

        let from = slot.chunk;
        if from != old_chunk {
            log::warn!("Entity {entity_id} moved from {old_chunk} but tracked in {from}");
        }
        if from == new_chunk {
            return;
        }

        self.buckets.remove(from, entity_id);
        self.buckets.insert(new_chunk, slot.handle.clone());
        slot.chunk = new_chunk;

        if let Some(update) = update {
            let radius = entity
                .view_distance()
                .unwrap_or(self.entity_view_distance);
            self.difference_chunks(from, new_chunk, radius, Some(entity_id), update);
        }
    }

    fn difference(
        &self,
        from: Vector3<f64>,
        to: Vector3<f64>,
        radius: u8,
        update: &mut dyn InterestUpdate<E>,
    ) {
        self.difference_chunks(
            ChunkPos::from_position(&from),
            ChunkPos::from_position(&to),
            radius,
            None,
            update,
        );
    }

    fn chunk_entities<F: FnMut(&E)>(&self, chunk: ChunkPos, query: F) {
        self.buckets.peek(chunk).iter().for_each(query);
    }

    fn chunk_range_entities<F: FnMut(&E)>(&self, center: ChunkPos, radius: u8, query: F) {
        let window = ChunkWindow::around(center, u32::from(radius));
        self.for_each_in_window(&window, query);
    }

    fn nearby_entities<F: FnMut(&E)>(&self, point: Vector3<f64>, range: f64, mut query: F) {
        if range.is_nan() || range <= 0.0 || !point.is_finite() {
            return;
        }

        // every chunk whose footprint can overlap the disc around `point`
        let min = ChunkPos::new(
            ChunkPos::section_coord(point.x - range),
            ChunkPos::section_coord(point.z - range),
        );
        let max = ChunkPos::new(
            ChunkPos::section_coord(point.x + range),
            ChunkPos::section_coord(point.z + range),
        );
        let range_squared = range * range;

        self.for_each_in_window(&ChunkWindow::from_bounds(min, max), |e| {
            if e.position().distance_squared(&point) < range_squared {
                query(e);
            }
        });
    }

    fn entities(&self) -> Vec<E> {
        self.entities.values().map(|slot| slot.handle.clone()).collect()
    }

    fn observers(&self) -> Vec<E> {
        self.entities
            .values()
            .filter(|slot| slot.handle.is_observer())
            .map(|slot| slot.handle.clone())
            .collect()
    }

    fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn tracked_chunk(&self, entity_id: i32) -> Option<ChunkPos> {
        self.entities.get(&entity_id).map(|slot| slot.chunk)
    }

    fn chunk_snapshot(&self, chunk: ChunkPos) -> Arc<[E]> {
        self.buckets.snapshot(chunk)
    }

    fn populated_chunks(&self) -> usize {
        self.buckets.len()
    }
}

impl<E: TrackedEntity + Clone> Default for ChunkTracker<E> {
    fn default() -> Self {
        Self::new(&TrackingConfig::default())
    }
}
