// src/queue/mod.rs

//! The command queue: immutable descriptors of what to run, and the
//! partitioning of an ordered queue into sequential/concurrent groups.

pub mod descriptor;
pub mod partition;

pub use descriptor::{CommandDescriptor, CommandMode};
pub use partition::{partition, Group};
