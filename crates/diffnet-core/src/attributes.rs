//! Node covariates.
//!
//! Static attributes hold one value per node. Dynamic attributes hold one
//! column of per-node values for every time slice. Seed selection by
//! attribute and threshold vectors built from an attribute both read here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use diffnet_types::NodeId;

use crate::error::SimError;

/// Named per-node attributes, static and time-varying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeTable {
    /// Vertex count `N`.
    node_count: usize,
    /// Horizon `T`.
    horizon: u32,
    /// `name -> values[node]`.
    static_attrs: BTreeMap<String, Vec<f64>>,
    /// `name -> columns[t - 1][node]`.
    dynamic_attrs: BTreeMap<String, Vec<Vec<f64>>>,
}

impl AttributeTable {
    /// Empty table for `n` nodes over `horizon` slices.
    pub const fn new(n: usize, horizon: u32) -> Self {
        Self {
            node_count: n,
            horizon,
            static_attrs: BTreeMap::new(),
            dynamic_attrs: BTreeMap::new(),
        }
    }

    /// Vertex count the table was built for.
    pub const fn node_count(&self) -> usize {
        self.node_count
    }

    /// Insert or replace a static attribute.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidAttribute`] if `values` is not length `N`.
    pub fn set_static(&mut self, name: &str, values: Vec<f64>) -> Result<(), SimError> {
        if values.len() != self.node_count {
            return Err(SimError::InvalidAttribute {
                name: name.to_owned(),
                reason: format!("has {} values, expected {}", values.len(), self.node_count),
            });
        }
        self.static_attrs.insert(name.to_owned(), values);
        Ok(())
    }

    /// Insert or replace a dynamic attribute given as one column per slice.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidAttribute`] unless there are exactly `T`
    /// columns of length `N`.
    pub fn set_dynamic(&mut self, name: &str, columns: Vec<Vec<f64>>) -> Result<(), SimError> {
        let expected = usize::try_from(self.horizon).unwrap_or(usize::MAX);
        if columns.len() != expected {
            return Err(SimError::InvalidAttribute {
                name: name.to_owned(),
                reason: format!("has {} columns, expected {expected}", columns.len()),
            });
        }
        if let Some((idx, column)) = columns
            .iter()
            .enumerate()
            .find(|(_, column)| column.len() != self.node_count)
        {
            return Err(SimError::InvalidAttribute {
                name: name.to_owned(),
                reason: format!(
                    "column {} has {} values, expected {}",
                    idx.saturating_add(1),
                    column.len(),
                    self.node_count
                ),
            });
        }
        self.dynamic_attrs.insert(name.to_owned(), columns);
        Ok(())
    }

    /// Values of a static attribute.
    pub fn get_static(&self, name: &str) -> Option<&[f64]> {
        self.static_attrs.get(name).map(Vec::as_slice)
    }

    /// Value of a dynamic attribute for `node` at slice `t`.
    pub fn get_dynamic(&self, name: &str, node: NodeId, t: u32) -> Option<f64> {
        let slot = usize::try_from(t).ok()?.checked_sub(1)?;
        self.dynamic_attrs
            .get(name)?
            .get(slot)?
            .get(node.index())
            .copied()
    }

    /// Names of all static attributes.
    pub fn static_names(&self) -> impl Iterator<Item = &str> {
        self.static_attrs.keys().map(String::as_str)
    }

    /// Names of all dynamic attributes.
    pub fn dynamic_names(&self) -> impl Iterator<Item = &str> {
        self.dynamic_attrs.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_attribute_round_trip() {
        let mut table = AttributeTable::new(3, 2);
        assert!(table.set_static("age", vec![30.0, 41.0, 25.0]).is_ok());
        assert_eq!(table.get_static("age"), Some(&[30.0, 41.0, 25.0][..]));
        assert_eq!(table.get_static("income"), None);
        assert_eq!(table.static_names().collect::<Vec<_>>(), vec!["age"]);
    }

    #[test]
    fn static_attribute_length_is_checked() {
        let mut table = AttributeTable::new(3, 2);
        let err = table.set_static("age", vec![1.0]);
        assert!(matches!(err, Err(SimError::InvalidAttribute { .. })));
    }

    #[test]
    fn dynamic_attribute_is_addressed_by_time() {
        let mut table = AttributeTable::new(2, 3);
        let columns = vec![vec![0.0, 1.0], vec![2.0, 3.0], vec![4.0, 5.0]];
        assert!(table.set_dynamic("score", columns).is_ok());
        assert_eq!(table.get_dynamic("score", NodeId(1), 2), Some(3.0));
        assert_eq!(table.get_dynamic("score", NodeId(0), 3), Some(4.0));
        assert_eq!(table.get_dynamic("score", NodeId(0), 0), None);
        assert_eq!(table.get_dynamic("score", NodeId(0), 4), None);
    }

    #[test]
    fn dynamic_attribute_shape_is_checked() {
        let mut table = AttributeTable::new(2, 2);
        assert!(table.set_dynamic("score", vec![vec![0.0, 1.0]]).is_err());
        assert!(
            table
                .set_dynamic("score", vec![vec![0.0, 1.0], vec![2.0]])
                .is_err()
        );
    }
}
