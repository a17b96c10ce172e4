//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Purge: Removes expired entry files at configured intervals

mod purge;

pub use purge::spawn_purge_task;
