//! Spreads the stops of a route evenly over the pixels of the strip.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Coordinate;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("no stops to lay out")]
    EmptyStopSet,
    #[error("output width must be positive, got {0}")]
    InvalidOutputWidth(usize),
}

/// A stop on the route, in the order the agency returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
    /// Position in the agency's list, assumed to be travel order.
    pub source_order: usize,
    /// Pixel assigned by [`assign_locations`].
    pub assigned_index: usize,
}

impl Stop {
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinate: Coordinate, source_order: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinate,
            source_order,
            assigned_index: 0,
        }
    }
}

/// Assign every stop a pixel, `floor(width / stops)` apart, starting at 0.
///
/// Stops are ordered by `source_order` first, so any previous assignment is
/// ignored. Indices are not clamped. With more stops than pixels the spacing
/// floors to zero and every stop shares pixel 0.
pub fn assign_locations(mut stops: Vec<Stop>, output_width: usize) -> Result<Vec<Stop>, LayoutError> {
    if output_width == 0 {
        return Err(LayoutError::InvalidOutputWidth(output_width));
    }
    if stops.is_empty() {
        return Err(LayoutError::EmptyStopSet);
    }

    stops.sort_by_key(|stop| stop.source_order);
    let spacing = output_width / stops.len();
    log::debug!("Laying out {} stops {} pixels apart", stops.len(), spacing);

    for (n, stop) in stops.iter_mut().enumerate() {
        stop.assigned_index = n * spacing;
    }
    Ok(stops)
}
