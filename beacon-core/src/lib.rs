//! # Beacon core
//!
//! The chunk-bucketed entity tracking index: which entities are in a chunk or
//! near a point, and which entities an observer starts or stops seeing as
//! things move between chunks.
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    missing_docs,
    clippy::unwrap_used
)]
#![allow(
    clippy::single_call_fn,
    clippy::multiple_inherent_impl,
    clippy::shadow_unrelated,
    clippy::missing_errors_doc,
    clippy::needless_pass_by_value,
    clippy::cargo_common_metadata
)]

pub mod bucket;
pub mod config;
pub mod entity;
pub mod sync;
pub mod tracking;
pub mod update;

pub use bucket::{BucketKind, ChunkBucket, ChunkBuckets};
pub use config::{ConfigError, TrackingConfig};
pub use entity::TrackedEntity;
pub use sync::Synchronized;
pub use tracking::{ChunkTracker, EntityTracking};
pub use update::{InterestUpdate, VisibilityChanges};
