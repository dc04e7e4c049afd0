//! GML 3.3 additions (OGC 10-129r1).
//!
//! GML 3.3 reuses the 3.2 types under its own namespaces (those aliases are registered by
//! [`crate::profile::GML33`]) and adds referenceable grids, of which only
//! `ReferenceableGridByArray` is supported.

use ndarray::{ArrayD, IxDyn, ShapeBuilder, Slice};
use std::collections::BTreeMap;

use crate::decode::{Decode, Decoder};
use crate::error::{GmlError, Result};
use crate::gml32::{Grid, PosList, SequenceRule};
use crate::profile::Profile;
use crate::xml::Element;

// 10.4 ReferenceableGridByArray
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceableGridByArray {
    pub grid: Grid,
    pub pos_list: PosList,
    pub sequence_rule: SequenceRule,
}

impl Decode for ReferenceableGridByArray {
    const DECODER: Decoder = Decoder::ReferenceableGridByArray;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        Ok(Self {
            grid: Grid::decode_as(Self::DECODER, element, profiles)?,
            pos_list: PosList::decode_one(element, profiles)?,
            sequence_rule: SequenceRule::decode_one(element, profiles)?,
        })
    }
}

impl ReferenceableGridByArray {
    /// Splits the position list into one array per axis.
    ///
    /// Arrays are indexed with the axes reversed (`[y, x]` for axes `x y`). Each axis keeps
    /// its full extent along its own dimension only; every other dimension has length 1.
    /// Values fill the grid shape column-major. The axis order is validated but does not
    /// change the layout.
    pub fn axis_arrays(&self) -> Result<BTreeMap<String, ArrayD<f64>>> {
        if self.sequence_rule.rule != "Linear" {
            return Err(GmlError::UnsupportedSequenceRule(
                self.sequence_rule.rule.clone(),
            ));
        }

        let axes = &self.grid.axes;
        let axis_count = axes.len();
        let values = &self.pos_list.values;
        if axis_count == 0 || values.len() % axis_count != 0 {
            return Err(GmlError::Construction {
                entity: Self::DECODER.name(),
                fields: format!("axes: {:?}, posList length: {}", axes, values.len()),
                reason: "posList length must be a multiple of the axis count".to_string(),
            });
        }
        if values.is_empty() {
            return Err(GmlError::GridShape("posList holds no positions".to_string()));
        }
        parse_axis_order(&self.sequence_rule.axis_order, axis_count)?;

        let per_axis: Vec<Vec<f64>> = (0..axis_count)
            .map(|i| values.iter().skip(i).step_by(axis_count).copied().collect())
            .collect();
        let shape = self.grid_shape(&per_axis)?;

        let mut arrays = BTreeMap::new();
        for (i, (axis, data)) in axes.iter().zip(per_axis).enumerate() {
            let full = ArrayD::from_shape_vec(IxDyn(&shape).f(), data)
                .map_err(|e| GmlError::GridShape(e.to_string()))?;

            let keep = axis_count - 1 - i;
            let reduced = full
                .slice_each_axis(|desc| {
                    if desc.axis.index() == keep {
                        Slice::new(0, None, 1)
                    } else {
                        Slice::new(0, Some(1), 1)
                    }
                })
                .to_owned();
            arrays.insert(axis.clone(), reduced);
        }
        Ok(arrays)
    }

    /// Grid shape from the GridEnvelope highs, or from distinct axis values when the
    /// envelope does not describe the number of points.
    ///
    /// In the fallback, dimension `n-1-i` takes the distinct-value count of axis `i`, the
    /// dimension that axis keeps in [`Self::axis_arrays`].
    fn grid_shape(&self, per_axis: &[Vec<f64>]) -> Result<Vec<usize>> {
        let count = per_axis.first().map(Vec::len).unwrap_or(0);

        let highs: Option<Vec<usize>> = self
            .grid
            .limits
            .highs
            .iter()
            .map(|&high| usize::try_from(high).ok())
            .collect();
        if let Some(highs) = highs {
            if highs.len() == per_axis.len() && checked_product(&highs) == Some(count) {
                return Ok(highs);
            }
        }

        tracing::warn!(
            "GridEnvelope highs {:?} do not describe {} points, inferring the shape from axis values",
            self.grid.limits.highs,
            count
        );
        let axis_count = per_axis.len();
        let mut shape = vec![0; axis_count];
        for (i, data) in per_axis.iter().enumerate() {
            shape[axis_count - 1 - i] = distinct_count(data);
        }
        if checked_product(&shape) != Some(count) {
            return Err(GmlError::GridShape(format!(
                "the GridEnvelope should describe the number of points ({count}), \
                 but neither its highs {:?} nor the distinct axis values {:?} do",
                self.grid.limits.highs, shape
            )));
        }
        Ok(shape)
    }
}

fn checked_product(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Parses an axis order such as `+2 +1 +3` into zero-based dimensions.
fn parse_axis_order(axis_order: &str, axis_count: usize) -> Result<Vec<usize>> {
    let unsupported = || GmlError::UnsupportedSequenceRule(format!("axisOrder {axis_order}"));

    let mut order = Vec::with_capacity(axis_count);
    for token in axis_order.split_whitespace() {
        let dim = token
            .strip_prefix('+')
            .and_then(|dim| dim.parse::<usize>().ok())
            .filter(|dim| (1..=axis_count).contains(dim))
            .ok_or_else(unsupported)?;
        if order.contains(&(dim - 1)) {
            return Err(unsupported());
        }
        order.push(dim - 1);
    }
    if order.len() != axis_count {
        return Err(unsupported());
    }
    Ok(order)
}

fn distinct_count(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_axis_order() {
        assert_eq!(parse_axis_order("+1 +2", 2).unwrap(), vec![0, 1]);
        assert_eq!(parse_axis_order("+2 +1 +3", 3).unwrap(), vec![1, 0, 2]);
    }

    #[test]
    fn test_parse_axis_order_rejects_malformed() {
        for order in ["+1", "+1 +1", "+1 +3", "-1 +2", "1 2", "+x +y"] {
            assert!(
                matches!(
                    parse_axis_order(order, 2),
                    Err(GmlError::UnsupportedSequenceRule(_))
                ),
                "{order}"
            );
        }
    }

    #[test]
    fn test_checked_product_overflow() {
        assert_eq!(checked_product(&[3, 4, 2]), Some(24));
        assert_eq!(checked_product(&[]), Some(1));
        assert_eq!(checked_product(&[usize::MAX, 2]), None);
    }

    #[test]
    fn test_distinct_count() {
        assert_eq!(distinct_count(&[1.0, 2.0, 1.0, 3.0, 2.0]), 3);
        assert_eq!(distinct_count(&[]), 0);
    }
}
