//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache.
//!
//! # Tasks
//! - Disk sweep: removes expired files from a disk cache folder on a fixed period

mod cleanup;

pub use cleanup::spawn_sweep_task;
