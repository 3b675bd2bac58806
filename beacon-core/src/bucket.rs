//! Per-chunk entity buckets.
//!
//! Maps packed chunk keys to the entities currently inside that chunk.
//! Buckets are created on first insert and dropped as soon as they become
//! empty, so the number of live buckets equals the number of populated chunks.

use std::sync::Arc;

use beacon_utils::ChunkPos;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::entity::TrackedEntity;

/// Entities stored inline before a plain bucket spills to the heap.
const INLINE_ENTITIES: usize = 4;

/// Storage strategy for chunk buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    /// Inline vector. O(1) insert and swap-remove, snapshots copy the bucket.
    #[default]
    Plain,
    /// Immutable shared slice, replaced on every mutation.
    ///
    /// Insert and remove are O(bucket size), but a snapshot is a reference
    /// count bump and stays valid while the index keeps changing.
    CopyOnWrite,
}

/// The entities of a single chunk, in no particular order.
#[derive(Debug, Clone)]
pub enum ChunkBucket<E> {
    /// See [`BucketKind::Plain`].
    Plain(SmallVec<[E; INLINE_ENTITIES]>),
    /// See [`BucketKind::CopyOnWrite`].
    CopyOnWrite(Arc<[E]>),
}

impl<E: TrackedEntity + Clone> ChunkBucket<E> {
    /// Creates an empty bucket of the given kind.
    #[must_use]
    pub fn new(kind: BucketKind) -> Self {
        match kind {
            BucketKind::Plain => Self::Plain(SmallVec::new()),
            BucketKind::CopyOnWrite => Self::CopyOnWrite(Arc::from(Vec::new())),
        }
    }

    /// The bucket's entities.
    #[must_use]
    pub fn as_slice(&self) -> &[E] {
        match self {
            Self::Plain(entities) => entities.as_slice(),
            Self::CopyOnWrite(entities) => &entities[..],
        }
    }

    /// Number of entities in the bucket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns true if the bucket holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Whether an entity with this id is in the bucket.
    #[must_use]
    pub fn contains(&self, entity_id: i32) -> bool {
        self.position_of(entity_id).is_some()
    }

    /// Adds an entity. The caller guarantees it is not already present.
    pub fn insert(&mut self, entity: E) {
        match self {
            Self::Plain(entities) => entities.push(entity),
            Self::CopyOnWrite(entities) => {
                let mut next = Vec::with_capacity(entities.len() + 1);
                next.extend_from_slice(&entities[..]);
                next.push(entity);
                *entities = Arc::from(next);
            }
        }
    }

    /// Removes the entity with this id. Returns false if it was not present.
    pub fn remove(&mut self, entity_id: i32) -> bool {
        let Some(index) = self.position_of(entity_id) else {
            return false;
        };
        match self {
            Self::Plain(entities) => {
                entities.swap_remove(index);
            }
            Self::CopyOnWrite(entities) => {
                let next: Vec<E> = entities
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != index)
                    .map(|(_, e)| e.clone())
                    .collect();
                *entities = Arc::from(next);
            }
        }
        true
    }

    /// An owned view of the bucket that outlives later mutation.
    #[must_use]
    pub fn snapshot(&self) -> Arc<[E]> {
        match self {
            Self::Plain(entities) => Arc::from(entities.as_slice()),
            Self::CopyOnWrite(entities) => Arc::clone(entities),
        }
    }

    fn position_of(&self, entity_id: i32) -> Option<usize> {
        self.as_slice()
            .iter()
            .position(|e| e.entity_id() == entity_id)
    }
}

/// Chunk key to bucket store.
///
/// Uses packed i64 chunk coordinates as keys, like the rest of the chunk
/// bookkeeping.
#[derive(Debug, Clone)]
pub struct ChunkBuckets<E> {
    kind: BucketKind,
    buckets: FxHashMap<i64, ChunkBucket<E>>,
}

impl<E: TrackedEntity + Clone> ChunkBuckets<E> {
    /// Creates an empty store whose buckets use `kind`.
    #[must_use]
    pub fn new(kind: BucketKind) -> Self {
        Self {
            kind,
            buckets: FxHashMap::default(),
        }
    }

    /// The storage strategy of this store's buckets.
    #[must_use]
    pub fn kind(&self) -> BucketKind {
        self.kind
    }

    /// The bucket of `chunk`, created if absent.
    pub fn bucket_for(&mut self, chunk: ChunkPos) -> &mut ChunkBucket<E> {
        let kind = self.kind;
        self.buckets
            .entry(chunk.as_i64())
            .or_insert_with(|| ChunkBucket::new(kind))
    }

    /// The entities of `chunk`; empty if the chunk has no bucket. Never allocates.
    #[must_use]
    pub fn peek(&self, chunk: ChunkPos) -> &[E] {
        self.buckets
            .get(&chunk.as_i64())
            .map_or(&[][..], ChunkBucket::as_slice)
    }

    /// An owned copy of `chunk`'s entities. See [`ChunkBucket::snapshot`].
    #[must_use]
    pub fn snapshot(&self, chunk: ChunkPos) -> Arc<[E]> {
        self.buckets
            .get(&chunk.as_i64())
            .map_or_else(|| Arc::from(Vec::new()), ChunkBucket::snapshot)
    }

    /// Adds `entity` to `chunk`'s bucket.
    pub fn insert(&mut self, chunk: ChunkPos, entity: E) {
        self.bucket_for(chunk).insert(entity);
    }

    /// Removes an entity from `chunk`'s bucket and prunes the bucket if it
    /// became empty. Returns false if the entity was not there.
    pub fn remove(&mut self, chunk: ChunkPos, entity_id: i32) -> bool {
        let removed = self
            .buckets
            .get_mut(&chunk.as_i64())
            .is_some_and(|bucket| bucket.remove(entity_id));
        if removed {
            self.remove_if_empty(chunk);
        }
        removed
    }

    /// Drops `chunk`'s bucket if it holds no entities.
    pub fn remove_if_empty(&mut self, chunk: ChunkPos) -> bool {
        let key = chunk.as_i64();
        if self.buckets.get(&key).is_some_and(ChunkBucket::is_empty) {
            self.buckets.remove(&key);
            return true;
        }
        false
    }

    /// Whether `chunk` currently has a bucket.
    #[must_use]
    pub fn contains_chunk(&self, chunk: ChunkPos) -> bool {
        self.buckets.contains_key(&chunk.as_i64())
    }

    /// Number of entities in `chunk`.
    #[must_use]
    pub fn bucket_len(&self, chunk: ChunkPos) -> usize {
        self.peek(chunk).len()
    }

    /// Number of live buckets, which is the number of populated chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true if no chunk is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The populated chunks.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.buckets.keys().map(|&key| ChunkPos::from_i64(key))
    }

    /// Every populated chunk with its entities.
    pub fn iter(&self) -> impl Iterator<Item = (ChunkPos, &[E])> + '_ {
        self.buckets
            .iter()
            .map(|(&key, bucket)| (ChunkPos::from_i64(key), bucket.as_slice()))
    }

    /// Drops every bucket.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use beacon_utils::math::Vector3;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Marker(i32);

    impl TrackedEntity for Marker {
        fn entity_id(&self) -> i32 {
            self.0
        }

        fn position(&self) -> Vector3<f64> {
            Vector3::default()
        }
    }

    const KINDS: [BucketKind; 2] = [BucketKind::Plain, BucketKind::CopyOnWrite];

    #[test]
    fn test_insert_and_peek() {
        for kind in KINDS {
            let mut store = ChunkBuckets::new(kind);
            let chunk = ChunkPos::new(2, -3);

            store.insert(chunk, Marker(1));
            store.insert(chunk, Marker(2));

            assert_eq!(store.bucket_len(chunk), 2);
            assert_eq!(store.len(), 1);
            assert!(store.bucket_for(chunk).contains(1));
            assert!(store.peek(ChunkPos::new(0, 0)).is_empty());
        }
    }

    #[test]
    fn test_peek_does_not_allocate_bucket() {
        let store: ChunkBuckets<Marker> = ChunkBuckets::new(BucketKind::Plain);
        assert!(store.peek(ChunkPos::new(5, 5)).is_empty());
        assert!(store.snapshot(ChunkPos::new(5, 5)).is_empty());
        assert!(store.is_empty());
        assert!(!store.contains_chunk(ChunkPos::new(5, 5)));
    }

    #[test]
    fn test_remove_prunes_empty_bucket() {
        for kind in KINDS {
            let mut store = ChunkBuckets::new(kind);
            let chunk = ChunkPos::new(0, 0);
            store.insert(chunk, Marker(1));
            store.insert(chunk, Marker(2));

            assert!(store.remove(chunk, 1));
            assert!(store.contains_chunk(chunk));
            assert!(store.remove(chunk, 2));
            assert!(!store.contains_chunk(chunk));
            assert_eq!(store.chunks().count(), 0);
        }
    }

    #[test]
    fn test_remove_missing_is_noop() {
        for kind in KINDS {
            let mut store = ChunkBuckets::new(kind);
            let chunk = ChunkPos::new(0, 0);
            store.insert(chunk, Marker(1));

            assert!(!store.remove(chunk, 7));
            assert!(!store.remove(ChunkPos::new(9, 9), 1));
            assert_eq!(store.bucket_len(chunk), 1);
            assert_eq!(store.len(), 1);
        }
    }

    #[test]
    fn test_bucket_for_creates_once() {
        let mut store: ChunkBuckets<Marker> = ChunkBuckets::new(BucketKind::Plain);
        let chunk = ChunkPos::new(1, 1);
        assert!(store.bucket_for(chunk).is_empty());
        assert!(store.contains_chunk(chunk));
        // an explicitly created empty bucket is still pruned on request
        assert!(store.remove_if_empty(chunk));
        assert!(store.is_empty());
    }

    #[test]
    fn test_copy_on_write_snapshot_is_stable() {
        let mut store = ChunkBuckets::new(BucketKind::CopyOnWrite);
        let chunk = ChunkPos::new(0, 0);
        store.insert(chunk, Marker(1));
        store.insert(chunk, Marker(2));

        let before = store.snapshot(chunk);
        let again = store.snapshot(chunk);
        assert!(Arc::ptr_eq(&before, &again));

        store.insert(chunk, Marker(3));
        store.remove(chunk, 1);

        assert_eq!(&*before, &[Marker(1), Marker(2)]);
        let mut now: Vec<i32> = store.peek(chunk).iter().map(|m| m.0).collect();
        now.sort_unstable();
        assert_eq!(now, vec![2, 3]);
    }

    #[test]
    fn test_plain_snapshot_is_a_copy() {
        let mut store = ChunkBuckets::new(BucketKind::Plain);
        let chunk = ChunkPos::new(0, 0);
        store.insert(chunk, Marker(1));

        let snapshot = store.snapshot(chunk);
        store.remove(chunk, 1);

        assert_eq!(&*snapshot, &[Marker(1)]);
        assert!(store.peek(chunk).is_empty());
    }

    #[test]
    fn test_spills_past_inline_capacity() {
        let mut store = ChunkBuckets::new(BucketKind::Plain);
        let chunk = ChunkPos::new(0, 0);
        for id in 0..32 {
            store.insert(chunk, Marker(id));
        }
        assert_eq!(store.bucket_len(chunk), 32);
        for id in (0..32).step_by(2) {
            assert!(store.remove(chunk, id));
        }
        assert_eq!(store.bucket_len(chunk), 16);
        assert!(store.peek(chunk).iter().all(|m| m.0 % 2 == 1));
    }
}
