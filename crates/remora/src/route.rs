//! Orthogonal edge routing.

use crate::graph::{Point, PortSide, Rect};

/// Bend points of an orthogonal route from `start` through `through` to `end`, all in flow
/// coordinates. Hop `k` changes lanes at `mids[k]`, the middle of the gap it crosses.
///
/// Straight hops add no bends, so a route between vertices on the same lane has none.
pub(crate) fn orthogonal_bends(
    start: (f64, f64),
    through: &[(f64, f64)],
    end: (f64, f64),
    mids: &[f64],
) -> Vec<(f64, f64)> {
    let mut bends = Vec::new();
    let mut current = start;
    for (hop, next) in through.iter().copied().chain(std::iter::once(end)).enumerate() {
        if (current.1 - next.1).abs() > f64::EPSILON {
            let mid = mids.get(hop).copied().unwrap_or((current.0 + next.0) / 2.0);
            bends.push((mid, current.1));
            bends.push((mid, next.1));
        }
        current = next;
    }
    bends
}

/// Bends of a loop leaving `start`, passing the node's upper right corner and entering `end`
/// from above.
pub(crate) fn self_loop(start: Point, end: Point, node: &Rect, size: f64) -> Vec<Point> {
    let right = start.x.max(node.x + node.width) + size;
    let top = end.y.min(node.y) - size;
    vec![
        Point::new(right, start.y),
        Point::new(right, top),
        Point::new(end.x, top),
    ]
}

pub(crate) fn side_midpoint(r: &Rect, side: PortSide) -> Point {
    match side {
        PortSide::North => Point::new(r.x + r.width / 2.0, r.y),
        PortSide::South => Point::new(r.x + r.width / 2.0, r.y + r.height),
        PortSide::West => Point::new(r.x, r.y + r.height / 2.0),
        PortSide::East => Point::new(r.x + r.width, r.y + r.height / 2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::orthogonal_bends;

    #[test]
    fn lane_changes_happen_mid_gap() {
        let bends = orthogonal_bends((10.0, 5.0), &[(40.0, 5.0)], (70.0, 25.0), &[25.0, 55.0]);
        assert_eq!(bends, vec![(55.0, 5.0), (55.0, 25.0)]);
    }

    #[test]
    fn aligned_endpoints_need_no_bends() {
        assert!(orthogonal_bends((0.0, 3.0), &[], (10.0, 3.0), &[5.0]).is_empty());
    }
}
