// Wrapper types making it harder to accidentally use the wrong underlying type.

use std::fmt::{self, Display};

use crate::math::{Vector2, Vector3};

/// Width of a chunk in world units, along both horizontal axes.
pub const CHUNK_WIDTH: i32 = 16;

/// log2 of [`CHUNK_WIDTH`].
pub const CHUNK_SHIFT: u32 = 4;

/// A chunk position. `0.y` is the chunk z coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkPos(pub Vector2<i32>);

impl ChunkPos {
    /// Creates a chunk position from chunk coordinates.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self(Vector2::new(x, z))
    }

    /// The chunk x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The chunk z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.y
    }

    /// Returns the chunk containing a world position.
    ///
    /// Uses floor division so `-0.5` lands in chunk `-1`, not `0`.
    #[must_use]
    pub fn from_position(pos: &Vector3<f64>) -> Self {
        Self::new(
            Self::section_coord(pos.x),
            Self::section_coord(pos.z),
        )
    }

    /// Converts a single world coordinate to a chunk coordinate.
    #[must_use]
    pub fn section_coord(coord: f64) -> i32 {
        (coord.floor() as i32) >> CHUNK_SHIFT
    }

    /// Packs the position into a single key. High 32 bits hold x, low 32 bits hold z.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        ((self.0.x as i64) << 32) | (self.0.y as u32 as i64)
    }

    /// Exact inverse of [`ChunkPos::as_i64`].
    #[must_use]
    pub const fn from_i64(key: i64) -> Self {
        Self::new((key >> 32) as i32, key as i32)
    }

    /// Chebyshev distance in chunks, the metric view distances are measured in.
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.0.x.abs_diff(other.0.x);
        let dz = self.0.y.abs_diff(other.0.y);
        dx.max(dz)
    }

    /// Whether `other` lies in the square window of `radius` chunks around `self`.
    #[must_use]
    pub fn is_within(self, other: Self, radius: u32) -> bool {
        self.chebyshev_distance(other) <= radius
    }
}

impl Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.0.x, self.0.y)
    }
}

impl From<i64> for ChunkPos {
    fn from(key: i64) -> Self {
        Self::from_i64(key)
    }
}

impl From<ChunkPos> for i64 {
    fn from(pos: ChunkPos) -> Self {
        pos.as_i64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip_extremes() {
        for (x, z) in [
            (0, 0),
            (-1, -1),
            (1, -1),
            (-1, 1),
            (i32::MIN, i32::MAX),
            (i32::MAX, i32::MIN),
            (i32::MIN, i32::MIN),
            (i32::MAX, i32::MAX),
        ] {
            let pos = ChunkPos::new(x, z);
            assert_eq!(ChunkPos::from_i64(pos.as_i64()), pos, "round trip of {pos}");
        }
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(ChunkPos::new(1, 0).as_i64(), 1 << 32);
        assert_eq!(ChunkPos::new(0, 1).as_i64(), 1);
        // negative z must not bleed into the x half
        assert_eq!(ChunkPos::new(0, -1).as_i64(), 0xFFFF_FFFF);
        assert_ne!(ChunkPos::new(0, -1).as_i64(), ChunkPos::new(-1, -1).as_i64());
    }

    #[test]
    fn test_from_position_floors() {
        assert_eq!(
            ChunkPos::from_position(&Vector3::new(0.0, 64.0, 15.99)),
            ChunkPos::new(0, 0)
        );
        assert_eq!(
            ChunkPos::from_position(&Vector3::new(16.0, 0.0, -0.5)),
            ChunkPos::new(1, -1)
        );
        assert_eq!(
            ChunkPos::from_position(&Vector3::new(-16.0, 0.0, -16.01)),
            ChunkPos::new(-1, -2)
        );
    }

    #[test]
    fn test_chebyshev_distance() {
        let origin = ChunkPos::new(0, 0);
        assert_eq!(origin.chebyshev_distance(ChunkPos::new(3, -2)), 3);
        assert_eq!(origin.chebyshev_distance(ChunkPos::new(-1, 4)), 4);
        assert!(origin.is_within(ChunkPos::new(2, 2), 2));
        assert!(!origin.is_within(ChunkPos::new(3, 0), 2));
    }
}
