//! AFFINITY Core - Fundamental types shared by the affinity pipeline
//!
//! This crate defines the types every other layer builds on:
//! - Opaque tokens (Identity, ObjectId, NodeId)
//! - Weighted edges
//! - Affinity groups (the clustering output)
//! - The shared error type

pub mod edge;
pub mod error;
pub mod group;
pub mod id;

pub use edge::*;
pub use error::*;
pub use group::*;
pub use id::*;
