//! Routes for edges no single level could route: cross-hierarchy edges, edges touching the
//! level's own node, and edges contained elsewhere than their endpoints' parent.
//!
//! Everything here works in root coordinates; callers translate into the edge container.

use crate::geometry::Geometry;
use crate::labels::LABEL_SPACING;
use narwhal_core::geom::{Point, Rect, Size, point};
use narwhal_core::{Graph, ShapeRef};
use remora::{Direction, PortSide, SELF_LOOP_SIZE};

/// Where an edge attaches to `shape`: the outer middle of a port, or the middle of the node side
/// the flow leaves (`outgoing`) or enters through.
pub(crate) fn anchor(
    graph: &Graph,
    geo: &Geometry,
    sides: &[PortSide],
    shape: ShapeRef,
    direction: Direction,
    outgoing: bool,
) -> Option<Point> {
    let r = geo.absolute_shape(graph, shape)?;
    let side = match shape {
        ShapeRef::Port(p) => sides.get(p.index()).copied().unwrap_or(PortSide::West),
        ShapeRef::Node(_) => PortSide::for_flow(direction, outgoing),
    };
    Some(side_midpoint(&r, side))
}

pub(crate) fn side_midpoint(r: &Rect, side: PortSide) -> Point {
    let c = r.center();
    match side {
        PortSide::North => point(c.x, r.min_y()),
        PortSide::South => point(c.x, r.max_y()),
        PortSide::West => point(r.min_x(), c.y),
        PortSide::East => point(r.max_x(), c.y),
    }
}

/// Start, bends and end of an orthogonal route with a single dogleg halfway along the flow.
pub(crate) fn orthogonal(start: Point, end: Point, direction: Direction) -> Vec<Point> {
    let mut out = vec![start];
    if direction.is_horizontal() {
        if start.y != end.y {
            let mid = (start.x + end.x) / 2.0;
            out.push(point(mid, start.y));
            out.push(point(mid, end.y));
        }
    } else if start.x != end.x {
        let mid = (start.y + end.y) / 2.0;
        out.push(point(start.x, mid));
        out.push(point(end.x, mid));
    }
    out.push(end);
    out
}

/// A loop leaving `node` on the east and coming back from the north.
pub(crate) fn self_loop(node: &Rect, start: Option<Point>, end: Option<Point>) -> Vec<Point> {
    let c = node.center();
    let start = start.unwrap_or(point(node.max_x(), c.y));
    let end = end.unwrap_or(point(c.x, node.min_y()));
    let right = node.max_x() + SELF_LOOP_SIZE;
    let top = node.min_y() - SELF_LOOP_SIZE;
    vec![
        start,
        point(right, start.y),
        point(right, top),
        point(end.x, top),
        end,
    ]
}

/// The point halfway along a polyline.
pub(crate) fn halfway(points: &[Point]) -> Option<Point> {
    let first = *points.first()?;
    let length: f64 = points.windows(2).map(|w| (w[1] - w[0]).length()).sum();
    let mut left = length / 2.0;
    for w in points.windows(2) {
        let segment = (w[1] - w[0]).length();
        if segment >= left && segment > 0.0 {
            return Some(w[0].lerp(w[1], left / segment));
        }
        left -= segment;
    }
    Some(first)
}

/// Top-left corners for labels stacked upwards, centred above `at`.
pub(crate) fn stacked_label_origins(at: Point, sizes: &[Size]) -> Vec<Point> {
    let mut bottom = at.y - LABEL_SPACING;
    sizes
        .iter()
        .map(|s| {
            let origin = point(at.x - s.width / 2.0, bottom - s.height);
            bottom -= s.height + LABEL_SPACING;
            origin
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use narwhal_core::geom::{rect, size};

    #[test]
    fn orthogonal_routes_dogleg_halfway() {
        let pts = orthogonal(point(0.0, 0.0), point(40.0, 20.0), Direction::Right);
        assert_eq!(
            pts,
            vec![
                point(0.0, 0.0),
                point(20.0, 0.0),
                point(20.0, 20.0),
                point(40.0, 20.0)
            ]
        );
        let straight = orthogonal(point(0.0, 5.0), point(40.0, 5.0), Direction::Right);
        assert_eq!(straight.len(), 2);
    }

    #[test]
    fn halfway_follows_the_polyline() {
        let pts = [point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0)];
        assert_eq!(halfway(&pts), Some(point(10.0, 0.0)));
        assert_eq!(halfway(&[]), None);
    }

    #[test]
    fn self_loops_leave_the_node() {
        let node = rect(0.0, 0.0, 20.0, 20.0);
        let pts = self_loop(&node, None, None);
        assert_eq!(pts[0], point(20.0, 10.0));
        assert_eq!(pts[2], point(30.0, -10.0));
        assert_eq!(pts[4], point(10.0, 0.0));
    }

    #[test]
    fn labels_stack_upwards() {
        let origins = stacked_label_origins(point(50.0, 50.0), &[size(10.0, 10.0), size(20.0, 4.0)]);
        assert_eq!(origins, vec![point(45.0, 35.0), point(40.0, 26.0)]);
    }
}
