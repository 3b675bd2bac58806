//! Enumeration of chunk windows.
//!
//! A window is the square of chunks within a Chebyshev radius of a center
//! chunk, which is how view distances are measured. The differencing helpers
//! only visit chunks that belong to exactly one of the two windows, so moving
//! an observer by one chunk costs `O(radius)` instead of `O(radius²)`.

use crate::ChunkPos;

/// An inclusive, axis aligned square of chunks.
///
/// Bounds are kept as `i64` so windows around chunks near the `i32` limits
/// can be built without overflow; they are clamped to the valid chunk range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    min_x: i64,
    max_x: i64,
    min_z: i64,
    max_z: i64,
}

impl ChunkWindow {
    /// The window of `radius` chunks around `center`.
    #[must_use]
    pub fn around(center: ChunkPos, radius: u32) -> Self {
        let r = i64::from(radius);
        let clamp = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
        Self {
            min_x: clamp(i64::from(center.x()) - r),
            max_x: clamp(i64::from(center.x()) + r),
            min_z: clamp(i64::from(center.z()) - r),
            max_z: clamp(i64::from(center.z()) + r),
        }
    }

    /// A window spanning the given inclusive chunk bounds.
    #[must_use]
    pub fn from_bounds(min: ChunkPos, max: ChunkPos) -> Self {
        Self {
            min_x: i64::from(min.x()),
            max_x: i64::from(max.x()),
            min_z: i64::from(min.z()),
            max_z: i64::from(max.z()),
        }
    }

    /// Whether `pos` is inside the window.
    #[must_use]
    pub fn contains(&self, pos: ChunkPos) -> bool {
        let (x, z) = (i64::from(pos.x()), i64::from(pos.z()));
        (self.min_x..=self.max_x).contains(&x) && (self.min_z..=self.max_z).contains(&z)
    }

    /// Whether the two windows share at least one chunk.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_z <= other.max_z
            && other.min_z <= self.max_z
    }

    /// Number of chunks in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        let width = (self.max_x - self.min_x + 1).max(0) as u64;
        let depth = (self.max_z - self.min_z + 1).max(0) as u64;
        usize::try_from(width.saturating_mul(depth)).unwrap_or(usize::MAX)
    }

    /// Whether the window holds no chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls `f` for every chunk of the window, x major.
    pub fn for_each(&self, mut f: impl FnMut(ChunkPos)) {
        for x in self.min_x..=self.max_x {
            for z in self.min_z..=self.max_z {
                f(ChunkPos::new(x as i32, z as i32));
            }
        }
    }

    /// Calls `f` for every chunk in `self` that is not in `other`.
    ///
    /// Columns outside `other`'s x span are emitted whole. Columns inside it
    /// only emit the z ranges below and above `other`, so the intersection is
    /// never visited.
    pub fn for_each_outside(&self, other: &Self, mut f: impl FnMut(ChunkPos)) {
        if !self.intersects(other) {
            self.for_each(f);
            return;
        }

        for x in self.min_x..=self.max_x {
            if x < other.min_x || x > other.max_x {
                for z in self.min_z..=self.max_z {
                    f(ChunkPos::new(x as i32, z as i32));
                }
                continue;
            }
            for z in self.min_z..=self.max_z.min(other.min_z - 1) {
                f(ChunkPos::new(x as i32, z as i32));
            }
            for z in self.min_z.max(other.max_z + 1)..=self.max_z {
                f(ChunkPos::new(x as i32, z as i32));
            }
        }
    }
}

/// Chunks that entered and left a view window when its center moved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkDiff {
    /// Chunks in the new window but not the old one.
    pub entered: Vec<ChunkPos>,
    /// Chunks in the old window but not the new one.
    pub exited: Vec<ChunkPos>,
}

impl ChunkDiff {
    /// Packed keys of the entered chunks.
    #[must_use]
    pub fn entered_keys(&self) -> Vec<i64> {
        self.entered.iter().map(|c| c.as_i64()).collect()
    }

    /// Packed keys of the exited chunks.
    #[must_use]
    pub fn exited_keys(&self) -> Vec<i64> {
        self.exited.iter().map(|c| c.as_i64()).collect()
    }

    /// True when the two windows were identical.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

/// All chunks within `radius` (Chebyshev) of `center`, `(2r + 1)²` of them.
pub fn chunks_in_radius(center: ChunkPos, radius: u32) -> impl Iterator<Item = ChunkPos> {
    let window = ChunkWindow::around(center, radius);
    (window.min_x..=window.max_x).flat_map(move |x| {
        (window.min_z..=window.max_z).map(move |z| ChunkPos::new(x as i32, z as i32))
    })
}

/// Callback form of [`chunks_in_radius`].
pub fn for_chunks_in_range(center: ChunkPos, radius: u32, f: impl FnMut(ChunkPos)) {
    ChunkWindow::around(center, radius).for_each(f);
}

/// Reports the chunks that entered (`to` window minus `from` window) and the
/// chunks that exited (`from` minus `to`).
pub fn for_differing_chunks_in_range(
    to: ChunkPos,
    from: ChunkPos,
    radius: u32,
    on_entered: impl FnMut(ChunkPos),
    on_exited: impl FnMut(ChunkPos),
) {
    if to == from {
        return;
    }
    let new_window = ChunkWindow::around(to, radius);
    let old_window = ChunkWindow::around(from, radius);
    new_window.for_each_outside(&old_window, on_entered);
    old_window.for_each_outside(&new_window, on_exited);
}

/// Collecting form of [`for_differing_chunks_in_range`].
#[must_use]
pub fn differing_chunks(from: ChunkPos, to: ChunkPos, radius: u32) -> ChunkDiff {
    let mut diff = ChunkDiff::default();
    for_differing_chunks_in_range(
        to,
        from,
        radius,
        |c| diff.entered.push(c),
        |c| diff.exited.push(c),
    );
    diff
}
