//! Port distribution along node sides.
//!
//! Ports sit outside the node border: a west port ends where the node begins, an east port
//! starts at the node's right edge, and so on. Ports sharing a side are spread evenly.

use crate::graph::{Node, Point, Port, PortSide};

pub const SIDES: [PortSide; 4] = [
    PortSide::North,
    PortSide::East,
    PortSide::South,
    PortSide::West,
];

/// How far ports stick out of a node on each side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

pub fn margins(node: &Node) -> Margins {
    let mut out = Margins::default();
    for port in &node.ports {
        match port.side {
            PortSide::North => out.top = out.top.max(port.height),
            PortSide::South => out.bottom = out.bottom.max(port.height),
            PortSide::West => out.left = out.left.max(port.width),
            PortSide::East => out.right = out.right.max(port.width),
        }
    }
    out
}

/// Top-left corner of every port, relative to the node's top-left corner.
pub fn distribute(node: &Node) -> Vec<Point> {
    let mut out = vec![Point::default(); node.ports.len()];
    for side in SIDES {
        let members: Vec<usize> = node
            .ports
            .iter()
            .enumerate()
            .filter(|(_, p)| p.side == side)
            .map(|(i, _)| i)
            .collect();
        let slots = members.len() as f64 + 1.0;
        for (i, &index) in members.iter().enumerate() {
            let port = &node.ports[index];
            let t = (i as f64 + 1.0) / slots;
            out[index] = match side {
                PortSide::North => Point::new(node.width * t - port.width / 2.0, -port.height),
                PortSide::South => Point::new(node.width * t - port.width / 2.0, node.height),
                PortSide::West => Point::new(-port.width, node.height * t - port.height / 2.0),
                PortSide::East => Point::new(node.width, node.height * t - port.height / 2.0),
            };
        }
    }
    out
}

/// Where an edge attaches to a port placed at `at`: the middle of its outer edge.
pub fn anchor(port: &Port, at: Point) -> Point {
    match port.side {
        PortSide::North => Point::new(at.x + port.width / 2.0, at.y),
        PortSide::South => Point::new(at.x + port.width / 2.0, at.y + port.height),
        PortSide::West => Point::new(at.x, at.y + port.height / 2.0),
        PortSide::East => Point::new(at.x + port.width, at.y + port.height / 2.0),
    }
}

/// Side length needed to fit `count` ports of extent `port_extent` with `spacing` around each.
pub fn required_side_length(count: usize, port_extent: f64, spacing: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    count as f64 * port_extent + (count as f64 + 1.0) * spacing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(side: PortSide) -> Port {
        Port {
            id: "p".to_string(),
            width: 10.0,
            height: 10.0,
            side,
        }
    }

    #[test]
    fn ports_spread_evenly_outside_the_border() {
        let mut node = Node::new("n", 40.0, 60.0);
        node.ports = vec![
            port(PortSide::West),
            port(PortSide::East),
            port(PortSide::West),
        ];
        let at = distribute(&node);
        assert_eq!(at[0], Point::new(-10.0, 15.0));
        assert_eq!(at[2], Point::new(-10.0, 35.0));
        assert_eq!(at[1], Point::new(40.0, 25.0));
        assert_eq!(anchor(&node.ports[1], at[1]), Point::new(50.0, 30.0));
        assert_eq!(
            margins(&node),
            Margins {
                left: 10.0,
                right: 10.0,
                ..Margins::default()
            }
        );
    }

    #[test]
    fn required_side_length_counts_gaps() {
        assert_eq!(required_side_length(0, 10.0, 10.0), 0.0);
        assert_eq!(required_side_length(2, 10.0, 10.0), 50.0);
    }
}
