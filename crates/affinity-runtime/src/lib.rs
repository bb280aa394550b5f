//! AFFINITY Runtime - Affinity graph orchestration
//!
//! This crate wires the pipeline together for embedding systems:
//! - Configuration with validation and presets
//! - The `AffinityGraphBuilder` facade (record, fold, cluster, query)
//! - Background window rotation on a tokio task
//! - Monitoring hooks and tracing bootstrap

pub mod builder;
pub mod config;
pub mod monitor;
pub mod observability;
pub mod worker;

pub use builder::*;
pub use config::*;
pub use monitor::*;
pub use observability::*;
pub use worker::*;
