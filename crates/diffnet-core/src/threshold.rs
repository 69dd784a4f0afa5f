//! Adoption thresholds.
//!
//! A [`ThresholdDist`] draws one value per node. The realized values are
//! frozen into a [`ThresholdVector`] before the first step and never change
//! during a run. Dependent runs copy the vector instead of resampling.
//!
//! Thresholds are non-negative and finite. Values above one are allowed and
//! simply mean the node can never adopt under normalized exposure.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use diffnet_types::NodeId;
use diffnet_types::ids::all_nodes;

use crate::attributes::AttributeTable;
use crate::error::SimError;

/// A per-node threshold distribution.
pub trait ThresholdDist {
    /// Draw the threshold for `node`.
    fn draw(&self, node: NodeId, rng: &mut dyn RngCore) -> f64;

    /// Validate the distribution's parameters before any draw.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidThreshold`] for parameters that cannot
    /// produce a valid threshold.
    fn check(&self) -> Result<(), SimError> {
        Ok(())
    }
}

impl<F> ThresholdDist for F
where
    F: Fn(NodeId, &mut dyn RngCore) -> f64,
{
    fn draw(&self, node: NodeId, rng: &mut dyn RngCore) -> f64 {
        self(node, rng)
    }
}

/// Built-in threshold samplers, selected by the `kind` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThresholdSampler {
    /// Every node gets the same value.
    Constant {
        /// The shared threshold.
        value: f64,
    },
    /// Uniform draw from `[low, high]`.
    Uniform {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },
    /// Explicit per-node values.
    PerNode {
        /// Value for node `i` at index `i`.
        values: Vec<f64>,
    },
}

impl Default for ThresholdSampler {
    fn default() -> Self {
        Self::Uniform { low: 0.0, high: 1.0 }
    }
}

impl ThresholdDist for ThresholdSampler {
    fn draw(&self, node: NodeId, rng: &mut dyn RngCore) -> f64 {
        match self {
            Self::Constant { value } => *value,
            Self::Uniform { low, high } => {
                if high > low {
                    rng.random_range(*low..=*high)
                } else {
                    *low
                }
            }
            Self::PerNode { values } => values.get(node.index()).copied().unwrap_or(f64::NAN),
        }
    }

    fn check(&self) -> Result<(), SimError> {
        let bad = |value: f64| SimError::InvalidThreshold {
            node: NodeId(0),
            value,
        };
        match *self {
            Self::Constant { value } if !valid(value) => Err(bad(value)),
            Self::Uniform { low, .. } if !valid(low) => Err(bad(low)),
            Self::Uniform { low, high } if !valid(high) || high < low => Err(bad(high)),
            _ => Ok(()),
        }
    }
}

fn valid(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Realized thresholds, one per node, immutable for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdVector {
    values: Vec<f64>,
}

impl ThresholdVector {
    /// Draw a threshold for each of `n` nodes from `dist`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidThreshold`] for the first node whose draw
    /// is negative, infinite, or NaN.
    pub fn sample<D>(n: usize, dist: &D, rng: &mut dyn RngCore) -> Result<Self, SimError>
    where
        D: ThresholdDist + ?Sized,
    {
        dist.check()?;
        let values = all_nodes(n).map(|node| dist.draw(node, rng)).collect();
        Self::from_values(values)
    }

    /// Wrap explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidThreshold`] for the first invalid value.
    pub fn from_values(values: Vec<f64>) -> Result<Self, SimError> {
        if let Some((idx, &value)) = values.iter().enumerate().find(|(_, v)| !valid(**v)) {
            return Err(SimError::InvalidThreshold {
                node: NodeId::from_index(idx).unwrap_or(NodeId(u32::MAX)),
                value,
            });
        }
        Ok(Self { values })
    }

    /// Read thresholds from a static attribute.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidAttribute`] if the attribute is missing,
    /// or [`SimError::InvalidThreshold`] for an invalid value.
    pub fn from_attribute(attributes: &AttributeTable, name: &str) -> Result<Self, SimError> {
        let values = attributes
            .get_static(name)
            .ok_or_else(|| SimError::InvalidAttribute {
                name: name.to_owned(),
                reason: "no such static attribute".to_owned(),
            })?;
        Self::from_values(values.to_vec())
    }

    /// Threshold of `node`.
    pub fn get(&self, node: NodeId) -> Option<f64> {
        self.values.get(node.index()).copied()
    }

    /// Number of nodes covered.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values indexed by node.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
