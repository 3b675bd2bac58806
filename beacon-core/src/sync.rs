//! Lock-serialized tracking.
//!
//! [`Synchronized`] puts a tracking index behind one mutex and holds it for
//! the whole of every call, callbacks included. The raw mutex is a type
//! parameter, so tests can swap in an instrumented lock without touching the
//! index.
//!
//! Callbacks run with the lock held. An [`InterestUpdate`] or query closure
//! that calls back into the same `Synchronized` deadlocks.

use std::sync::Arc;

use beacon_utils::ChunkPos;
use beacon_utils::locks::SyncRawMutex;
use beacon_utils::math::Vector3;
use parking_lot::lock_api::{Mutex, MutexGuard, RawMutex};

use crate::tracking::EntityTracking;
use crate::update::InterestUpdate;

/// A tracking index whose operations are serialized through one lock.
pub struct Synchronized<T, R = SyncRawMutex> {
    inner: Mutex<R, T>,
}

impl<T, R: RawMutex> Synchronized<T, R> {
    /// Wraps `tracking`, guarding it with a fresh `R`.
    pub fn new(tracking: T) -> Self {
        Self {
            inner: Mutex::new(tracking),
        }
    }

    /// Unwraps the index.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }

    /// Direct access through an exclusive borrow; nothing else can hold the lock.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    fn lock(&self) -> MutexGuard<'_, R, T> {
        self.inner.lock()
    }

    /// See [`EntityTracking::register`].
    pub fn register<E>(
        &self,
        entity: E,
        point: Vector3<f64>,
        update: Option<&mut dyn InterestUpdate<E>>,
    ) where
        T: EntityTracking<E>,
    {
        self.lock().register(entity, point, update);
    }

    /// See [`EntityTracking::unregister`].
    pub fn unregister<E>(
        &self,
        entity: &E,
        point: Vector3<f64>,
        update: Option<&mut dyn InterestUpdate<E>>,
    ) where
        T: EntityTracking<E>,
    {
        self.lock().unregister(entity, point, update);
    }

    /// See [`EntityTracking::move_entity`].
    pub fn move_entity<E>(
        &self,
        entity: &E,
        old_point: Vector3<f64>,
        new_point: Vector3<f64>,
        update: Option<&mut dyn InterestUpdate<E>>,
    ) where
        T: EntityTracking<E>,
    {
        self.lock().move_entity(entity, old_point, new_point, update);
    }

    /// See [`EntityTracking::difference`].
    pub fn difference<E>(
        &self,
        from: Vector3<f64>,
        to: Vector3<f64>,
        radius: u8,
        update: &mut dyn InterestUpdate<E>,
    ) where
        T: EntityTracking<E>,
    {
        self.lock().difference(from, to, radius, update);
    }

    /// See [`EntityTracking::chunk_entities`].
    pub fn chunk_entities<E, F: FnMut(&E)>(&self, chunk: ChunkPos, query: F)
    where
        T: EntityTracking<E>,
    {
        self.lock().chunk_entities(chunk, query);
    }

    /// See [`EntityTracking::chunk_range_entities`].
    pub fn chunk_range_entities<E, F: FnMut(&E)>(&self, center: ChunkPos, radius: u8, query: F)
    where
        T: EntityTracking<E>,
    {
        self.lock().chunk_range_entities(center, radius, query);
    }

    /// See [`EntityTracking::nearby_entities`].
    pub fn nearby_entities<E, F: FnMut(&E)>(&self, point: Vector3<f64>, range: f64, query: F)
    where
        T: EntityTracking<E>,
    {
        self.lock().nearby_entities(point, range, query);
    }

    /// See [`EntityTracking::entities`].
    pub fn entities<E>(&self) -> Vec<E>
    where
        T: EntityTracking<E>,
    {
        self.lock().entities()
    }

    /// See [`EntityTracking::observers`].
    pub fn observers<E>(&self) -> Vec<E>
    where
        T: EntityTracking<E>,
    {
        self.lock().observers()
    }

    /// See [`EntityTracking::entity_count`].
    pub fn entity_count<E>(&self) -> usize
    where
        T: EntityTracking<E>,
    {
        self.lock().entity_count()
    }

    /// See [`EntityTracking::tracked_chunk`].
    pub fn tracked_chunk<E>(&self, entity_id: i32) -> Option<ChunkPos>
    where
        T: EntityTracking<E>,
    {
        self.lock().tracked_chunk(entity_id)
    }

    /// See [`EntityTracking::chunk_snapshot`].
    pub fn chunk_snapshot<E>(&self, chunk: ChunkPos) -> Arc<[E]>
    where
        T: EntityTracking<E>,
    {
        self.lock().chunk_snapshot(chunk)
    }

    /// See [`EntityTracking::populated_chunks`].
    pub fn populated_chunks<E>(&self) -> usize
    where
        T: EntityTracking<E>,
    {
        self.lock().populated_chunks()
    }
}

impl<T: Default, R: RawMutex> Default for Synchronized<T, R> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Forwards every operation of `$ty` to the inherent, locking methods.
macro_rules! forward_tracking {
    ($($ty:ty),*) => {$(
        impl<E, T: EntityTracking<E>, R: RawMutex> EntityTracking<E> for $ty {
            fn register(
                &mut self,
                entity: E,
                point: Vector3<f64>,
                update: Option<&mut dyn InterestUpdate<E>>,
            ) {
                Synchronized::register(self, entity, point, update);
            }

            fn unregister(
                &mut self,
                entity: &E,
                point: Vector3<f64>,
                update: Option<&mut dyn InterestUpdate<E>>,
            ) {
                Synchronized::unregister(self, entity, point, update);
            }

            fn move_entity(
                &mut self,
                entity: &E,
                old_point: Vector3<f64>,
                new_point: Vector3<f64>,
                update: Option<&mut dyn InterestUpdate<E>>,
            ) {
                Synchronized::move_entity(self, entity, old_point, new_point, update);
            }

            fn difference(
                &self,
                from: Vector3<f64>,
                to: Vector3<f64>,
                radius: u8,
                update: &mut dyn InterestUpdate<E>,
            ) {
                Synchronized::difference(self, from, to, radius, update);
            }

            fn chunk_entities<F: FnMut(&E)>(&self, chunk: ChunkPos, query: F) {
                Synchronized::chunk_entities(self, chunk, query);
            }

            fn chunk_range_entities<F: FnMut(&E)>(&self, center: ChunkPos, radius: u8, query: F) {
                Synchronized::chunk_range_entities(self, center, radius, query);
            }

            fn nearby_entities<F: FnMut(&E)>(&self, point: Vector3<f64>, range: f64, query: F) {
                Synchronized::nearby_entities(self, point, range, query);
            }

            fn entities(&self) -> Vec<E> {
                Synchronized::entities::<E>(self)
            }

            fn observers(&self) -> Vec<E> {
                Synchronized::observers::<E>(self)
            }

            fn entity_count(&self) -> usize {
                Synchronized::entity_count::<E>(self)
            }

            fn tracked_chunk(&self, entity_id: i32) -> Option<ChunkPos> {
                Synchronized::tracked_chunk::<E>(self, entity_id)
            }

            fn chunk_snapshot(&self, chunk: ChunkPos) -> Arc<[E]> {
                Synchronized::chunk_snapshot::<E>(self, chunk)
            }

            fn populated_chunks(&self) -> usize {
                Synchronized::populated_chunks::<E>(self)
            }
        }
    )*};
}

forward_tracking!(Synchronized<T, R>, &Synchronized<T, R>);
