//! Configuration enums shared across the engine.

use serde::{Deserialize, Serialize};

/// Which ties count toward a node's exposure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureDirection {
    /// The node's own ties to others (row of the adjacency matrix).
    #[default]
    Outgoing,
    /// Other nodes' ties to the node (column of the adjacency matrix).
    Incoming,
    /// Union of outgoing and incoming ties.
    Both,
}

/// How mentor matching picks a leader among nodes tied for earliest adoption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Uniform draw from the caller's random stream.
    Random,
    /// Lowest node id wins.
    #[default]
    FirstId,
    /// Highest total degree on the first slice wins, then lowest id.
    HighestDegree,
}

/// What the replication runner does when a run fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop claiming new runs and surface the failure with the lowest run index.
    #[default]
    Abort,
    /// Finish every run and return a partial batch with per-run failure markers.
    Continue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_documented_choices() {
        assert_eq!(ExposureDirection::default(), ExposureDirection::Outgoing);
        assert_eq!(TieBreak::default(), TieBreak::FirstId);
        assert_eq!(FailurePolicy::default(), FailurePolicy::Abort);
    }

    #[test]
    fn enums_use_snake_case_tags() {
        let json = serde_json::to_string(&TieBreak::HighestDegree).unwrap_or_default();
        assert_eq!(json, "\"highest_degree\"");
        let parsed: FailurePolicy = serde_json::from_str("\"continue\"").unwrap_or_default();
        assert_eq!(parsed, FailurePolicy::Continue);
    }
}
