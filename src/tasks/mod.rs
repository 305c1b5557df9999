//! Background Tasks Module
//!
//! Contains background tasks owned by a store handle.
//!
//! # Tasks
//! - TTL Cleanup: Sweeps expired in-memory entries at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
