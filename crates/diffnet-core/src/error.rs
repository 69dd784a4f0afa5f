//! Error types for the `diffnet-core` crate.
//!
//! Configuration and shape problems surface before the first step runs.
//! Errors raised inside a replication batch carry the run index so the
//! failing case can be replayed from the same base seed.

use diffnet_graph::GraphError;
use diffnet_types::NodeId;

/// Errors that can occur while setting up, running, or analyzing a cascade.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The network failed validation or a graph operation failed.
    #[error("invalid graph: {source}")]
    InvalidGraph {
        /// The underlying graph error.
        #[from]
        source: GraphError,
    },

    /// The seed request is malformed.
    #[error("invalid seed request: {reason}")]
    InvalidSeed {
        /// What was wrong with the request.
        reason: String,
    },

    /// A sampled or supplied threshold is outside the valid domain.
    #[error("invalid threshold {value} for node {node}")]
    InvalidThreshold {
        /// Node that received the value.
        node: NodeId,
        /// The rejected value.
        value: f64,
    },

    /// The threshold vector does not cover the vertex set.
    #[error("threshold vector has {actual} entries, expected {expected}")]
    ThresholdCount {
        /// Vertex count `N`.
        expected: usize,
        /// Length of the supplied vector.
        actual: usize,
    },

    /// A named attribute is missing or has the wrong shape.
    #[error("attribute {name}: {reason}")]
    InvalidAttribute {
        /// Attribute name.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A cohort is empty or has no adopter to lead it.
    #[error("cohort {cohort} cannot supply a leader: {reason}")]
    InsufficientCohort {
        /// Cohort label.
        cohort: usize,
        /// Why no leader could be chosen.
        reason: String,
    },

    /// A replication statistic failed or returned an inconsistent shape.
    #[error("statistic failed on run {run}: {reason}")]
    Statistic {
        /// Run index.
        run: usize,
        /// Failure description.
        reason: String,
    },

    /// A replicated run failed while building or simulating.
    #[error("run {run} failed: {source}")]
    Worker {
        /// Run index.
        run: usize,
        /// The error raised inside the run.
        source: Box<SimError>,
    },

    /// A run panicked inside a worker.
    #[error("run panicked: {reason}")]
    Panicked {
        /// Panic payload, when it was a string.
        reason: String,
    },

    /// Rewiring between steps failed.
    #[error("rewiring after step {time} failed: {source}")]
    Rewire {
        /// Step after which rewiring ran.
        time: u32,
        /// The underlying graph error.
        source: GraphError,
    },

    /// A node was written twice in the adoption state.
    #[error("node {node} already adopted at time {time}")]
    AlreadyAdopted {
        /// The node.
        node: NodeId,
        /// Its recorded adoption time.
        time: u32,
    },

    /// A simulator operation was called in the wrong phase.
    #[error("simulator is {found}, operation requires {expected}")]
    InvalidPhase {
        /// Phase the operation requires.
        expected: &'static str,
        /// Phase the simulator was in.
        found: String,
    },
}
