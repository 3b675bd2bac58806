//! The view of an entity the tracking index needs.
//!
//! The index is handed cheap handles (usually `Arc<T>`), never entities by
//! value. A handle leaves the index only through `unregister`; entity
//! lifetime is owned by whoever spawned it.

use std::sync::Arc;

use beacon_utils::ChunkPos;
use beacon_utils::math::Vector3;

/// Core entity trait the tracking index works with
pub trait TrackedEntity {
    /// Stable identity. Two handles with the same id are the same entity.
    fn entity_id(&self) -> i32;

    /// Current world position
    fn position(&self) -> Vector3<f64>;

    /// View radius in chunks, `Some` only for observers (e.g. players).
    ///
    /// Read on every tracking call so a changed view distance applies from the
    /// next call on.
    fn view_distance(&self) -> Option<u8> {
        None
    }

    /// Whether this entity drives interest management.
    fn is_observer(&self) -> bool {
        self.view_distance().is_some()
    }

    /// Chunk of the current position.
    fn chunk_pos(&self) -> ChunkPos {
        ChunkPos::from_position(&self.position())
    }
}

impl<T: TrackedEntity + ?Sized> TrackedEntity for Arc<T> {
    fn entity_id(&self) -> i32 {
        (**self).entity_id()
    }

    fn position(&self) -> Vector3<f64> {
        (**self).position()
    }

    fn view_distance(&self) -> Option<u8> {
        (**self).view_distance()
    }
}
