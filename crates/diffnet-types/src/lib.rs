//! Shared type definitions for the diffnet diffusion engine.
//!
//! Every crate in the workspace speaks in terms of the vertex identifier and
//! the small configuration enums defined here.
//!
//! # Modules
//!
//! - [`ids`] -- The [`NodeId`] vertex index.
//! - [`enums`] -- Exposure direction, mentor tie-break rule, and replication
//!   failure policy.

pub mod enums;
pub mod ids;

pub use enums::{ExposureDirection, FailurePolicy, TieBreak};
pub use ids::NodeId;
