//! AFFINITY Graph - Access graph, windowed aging and folding
//!
//! This crate implements the data side of the affinity pipeline:
//! - Bipartite identity/object graph (arena with stable keys)
//! - Access recording under a single mutation lock
//! - Sliding-window period bookkeeping and pruning
//! - Cross-node conflict tracking
//! - Folding into an identity-only graph

pub mod bipartite;
pub mod conflict;
pub mod fold;
pub mod folded;
pub mod prune;
pub mod stats;
pub mod store;
pub mod window;

pub use bipartite::*;
pub use conflict::*;
pub use fold::*;
pub use folded::*;
pub use prune::*;
pub use stats::*;
pub use store::*;
pub use window::*;
