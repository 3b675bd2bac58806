//! # Beacon utils
//!
//! Coordinate types and chunk window helpers shared by the tracking index.

pub mod chunk_range;
pub mod locks;
pub mod math;
mod types;

pub use chunk_range::{
    ChunkDiff, ChunkWindow, chunks_in_radius, differing_chunks, for_chunks_in_range,
    for_differing_chunks_in_range,
};
pub use types::{CHUNK_SHIFT, CHUNK_WIDTH, ChunkPos};
