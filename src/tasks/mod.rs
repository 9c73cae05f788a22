//! Background Tasks Module
//!
//! Maintenance tasks that run alongside the data layer.

mod cleanup;

pub use cleanup::spawn_cleanup_task;
