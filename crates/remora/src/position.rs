//! Coordinate assignment.
//!
//! Placement works in flow coordinates: `along` runs in the layout direction (layer after
//! layer) and `across` runs within a layer. [`Frame`] maps flow coordinates to `x`/`y`.

use crate::graph::{Direction, Point, Rect};
use crate::order::LayerGraph;

#[derive(Debug, Clone)]
pub(crate) struct Placement {
    pub along: Vec<f64>,
    pub across: Vec<f64>,
    pub layer_start: Vec<f64>,
    pub layer_end: Vec<f64>,
    pub total_along: f64,
    pub total_across: f64,
}

impl Placement {
    /// Middle of the gap that follows `layer`.
    pub fn gap_mid(&self, layer: usize) -> f64 {
        match (self.layer_end.get(layer), self.layer_start.get(layer + 1)) {
            (Some(end), Some(start)) => (end + start) / 2.0,
            (Some(end), None) => *end,
            _ => 0.0,
        }
    }
}

/// Places layers one after another, separated by `gaps[i]` after layer `i`. Within a layer,
/// vertices are stacked `spacing` apart and the stack is centered on the widest layer.
/// Vertices are centered in their layer's column.
pub(crate) fn place(
    lg: &LayerGraph,
    extents: &[(f64, f64)],
    gaps: &[f64],
    spacing: f64,
) -> Placement {
    let count = extents.len();
    let mut along = vec![0.0; count];
    let mut across = vec![0.0; count];

    let stack_len = |layer: &[usize]| -> f64 {
        let sum: f64 = layer.iter().map(|v| extents[*v].1).sum();
        sum + spacing * layer.len().saturating_sub(1) as f64
    };
    let total_across = lg
        .layers
        .iter()
        .map(|l| stack_len(l))
        .fold(0.0_f64, f64::max);

    let mut layer_start = Vec::with_capacity(lg.layers.len());
    let mut layer_end = Vec::with_capacity(lg.layers.len());
    let mut cursor = 0.0;
    for (i, layer) in lg.layers.iter().enumerate() {
        if i > 0 {
            cursor += gaps.get(i - 1).copied().unwrap_or(0.0);
        }
        let depth = layer.iter().map(|v| extents[*v].0).fold(0.0_f64, f64::max);
        let mut offset = (total_across - stack_len(layer)) / 2.0;
        for &v in layer {
            along[v] = cursor + (depth - extents[v].0) / 2.0;
            across[v] = offset;
            offset += extents[v].1 + spacing;
        }
        layer_start.push(cursor);
        cursor += depth;
        layer_end.push(cursor);
    }

    Placement {
        along,
        across,
        layer_start,
        layer_end,
        total_along: cursor,
        total_across,
    }
}

/// Maps flow coordinates to `x`/`y`, shifted by `offset`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    direction: Direction,
    total_along: f64,
    offset: Point,
}

impl Frame {
    pub fn new(direction: Direction, total_along: f64, offset: Point) -> Self {
        Self {
            direction,
            total_along,
            offset,
        }
    }

    pub fn point(&self, along: f64, across: f64) -> Point {
        let (x, y) = match self.direction {
            Direction::Right => (along, across),
            Direction::Left => (self.total_along - along, across),
            Direction::Down => (across, along),
            Direction::Up => (across, self.total_along - along),
        };
        Point::new(x + self.offset.x, y + self.offset.y)
    }

    pub fn rect(&self, along: f64, across: f64, len_along: f64, len_across: f64) -> Rect {
        let (x, y, width, height) = match self.direction {
            Direction::Right => (along, across, len_along, len_across),
            Direction::Left => (
                self.total_along - along - len_along,
                across,
                len_along,
                len_across,
            ),
            Direction::Down => (across, along, len_across, len_along),
            Direction::Up => (
                across,
                self.total_along - along - len_along,
                len_across,
                len_along,
            ),
        };
        Rect {
            x: x + self.offset.x,
            y: y + self.offset.y,
            width,
            height,
        }
    }

    /// Inverse of [`Frame::point`].
    pub fn to_flow(&self, p: Point) -> (f64, f64) {
        let x = p.x - self.offset.x;
        let y = p.y - self.offset.y;
        match self.direction {
            Direction::Right => (x, y),
            Direction::Left => (self.total_along - x, y),
            Direction::Down => (y, x),
            Direction::Up => (self.total_along - y, x),
        }
    }

    /// Flow extents of an `x`/`y` size: `(along, across)`.
    pub fn flow_size(&self, width: f64, height: f64) -> (f64, f64) {
        if self.direction.is_horizontal() {
            (width, height)
        } else {
            (height, width)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trips_points_in_every_direction() {
        for direction in [
            Direction::Right,
            Direction::Left,
            Direction::Down,
            Direction::Up,
        ] {
            let frame = Frame::new(direction, 100.0, Point::new(12.0, 12.0));
            let p = frame.point(30.0, 7.0);
            assert_eq!(frame.to_flow(p), (30.0, 7.0), "{direction:?}");
        }
    }

    #[test]
    fn layers_are_centered_across() {
        let lg = LayerGraph::new(vec![0, 0, 1], &[(0, 2), (1, 2)]);
        let extents = [(10.0, 10.0), (10.0, 10.0), (20.0, 10.0)];
        let p = place(&lg, &extents, &[20.0], 20.0);
        assert_eq!(p.total_across, 40.0);
        assert_eq!(p.across[2], 15.0);
        assert_eq!(p.along[2], 30.0);
        assert_eq!(p.total_along, 50.0);
        assert_eq!(p.gap_mid(0), 20.0);
    }
}
