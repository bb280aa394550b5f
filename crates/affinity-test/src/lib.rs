//! AFFINITY Test Harness - Workload simulation and pipeline validation
//!
//! This crate provides:
//! - Seeded access workloads with planted communities
//! - End-to-end scenarios scoring found groups against the planted ones

pub mod scenario;
pub mod workload;

pub use scenario::*;
pub use workload::*;
