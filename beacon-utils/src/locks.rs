//! Lock aliases used across the workspace.
//!
//! Everything synchronous goes through `parking_lot`; the aliases keep call
//! sites independent of the concrete lock crate.

/// A synchronous mutex.
pub type SyncMutex<T> = parking_lot::Mutex<T>;

/// The raw mutex [`SyncMutex`] is built on. Default lock of the tracking wrapper.
pub type SyncRawMutex = parking_lot::RawMutex;
