//! Network storage for the diffnet diffusion engine.
//!
//! This crate models the social network a cascade runs over: a fixed arena
//! of vertices with one weighted adjacency snapshot per time slice. It also
//! ships the structural pieces the engine treats as pluggable: random graph
//! generators, between-step rewiring, and structural-equivalence cohorts.
//!
//! # Modules
//!
//! - [`adjacency`] -- [`Adjacency`], a sparse weighted directed snapshot.
//! - [`error`] -- Error types for graph construction and mutation.
//! - [`generator`] -- The [`NetworkGenerator`] seam and the built-in
//!   ring, small-world, Bernoulli, and scale-free variants.
//! - [`rewire`] -- The [`Rewirer`] seam and the built-in rewiring strategies.
//! - [`store`] -- [`GraphStore`], the per-slice sequence of snapshots.
//! - [`structural`] -- Structural-equivalence distances and k-medoid cohorts.

pub mod adjacency;
pub mod error;
pub mod generator;
pub mod rewire;
pub mod store;
pub mod structural;

// Re-export primary types at crate root.
pub use adjacency::Adjacency;
pub use error::GraphError;
pub use generator::{GeneratorKind, NetworkGenerator};
pub use rewire::{RewireStrategy, Rewirer};
pub use store::GraphStore;
pub use structural::{Cohorts, DistanceMatrix, structural_cohorts, structural_distance};
