//! AFFINITY Cluster - Community detection over folded identity graphs
//!
//! This crate turns a folded graph into affinity groups:
//! - Label propagation with a seedable random source
//! - Run statistics (elapsed time, iterations, modularity)
//! - Partition quality metrics (modularity, Jaccard similarity)

pub mod label;
pub mod metrics;
pub mod propagation;

pub use label::*;
pub use metrics::*;
pub use propagation::*;
