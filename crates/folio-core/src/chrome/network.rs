//! Decorative animated network behind the hero section.
//!
//! Node positions are percentages of the container. Connections are chosen
//! once at construction and their geometry follows the nodes as they move.

use rand::Rng;

const NODE_COUNT: usize = 25;
const MAX_SPEED: f64 = 0.25;
const CONNECTION_DISTANCE: f64 = 30.0;
const CONNECTION_PROBABILITY: f64 = 0.3;

/// A node, in percent of the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Horizontal position, `0..=100`.
    pub x: f64,
    /// Vertical position, `0..=100`.
    pub y: f64,
    /// Horizontal velocity per frame.
    pub vx: f64,
    /// Vertical velocity per frame.
    pub vy: f64,
}

impl Node {
    fn distance_to(&self, other: &Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    fn step(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        if self.x <= 0.0 || self.x >= 100.0 {
            self.vx = -self.vx;
        }
        if self.y <= 0.0 || self.y >= 100.0 {
            self.vy = -self.vy;
        }
        self.x = self.x.clamp(0.0, 100.0);
        self.y = self.y.clamp(0.0, 100.0);
    }
}

/// A line between two nodes, by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    /// First endpoint.
    pub from: usize,
    /// Second endpoint.
    pub to: usize,
}

/// Placement of a connection line in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionGeometry {
    /// Line length.
    pub length: f64,
    /// Left offset of the line's origin.
    pub left: f64,
    /// Top offset of the line's origin.
    pub top: f64,
    /// Rotation in degrees.
    pub angle: f64,
    /// Fades with distance, never below 0.1.
    pub opacity: f64,
}

/// The node field and its connections.
#[derive(Debug, Clone)]
pub struct NetworkAnimation {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
}

impl NetworkAnimation {
    /// Builds the default 25-node field.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_nodes(rng, NODE_COUNT)
    }

    /// Builds a field of `count` random nodes.
    pub fn with_nodes<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Self {
        let nodes: Vec<Node> = (0..count)
            .map(|_| Node {
                x: rng.gen_range(0.0..100.0),
                y: rng.gen_range(0.0..100.0),
                vx: rng.gen_range(-MAX_SPEED..MAX_SPEED),
                vy: rng.gen_range(-MAX_SPEED..MAX_SPEED),
            })
            .collect();

        let mut connections = Vec::new();
        for (i, a) in nodes.iter().enumerate() {
            for (j, b) in nodes.iter().enumerate().skip(i + 1) {
                if a.distance_to(b) < CONNECTION_DISTANCE && rng.gen_bool(CONNECTION_PROBABILITY) {
                    connections.push(Connection { from: i, to: j });
                }
            }
        }
        tracing::trace!(
            nodes = nodes.len(),
            connections = connections.len(),
            "network built"
        );
        Self { nodes, connections }
    }

    /// The nodes.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The connections.
    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Advances one animation frame. Nodes bounce off the edges.
    pub fn step(&mut self) {
        for node in &mut self.nodes {
            node.step();
        }
    }

    /// Geometry of `connection` inside a `width` x `height` container.
    #[must_use]
    pub fn geometry(&self, connection: Connection, width: f64, height: f64) -> Option<ConnectionGeometry> {
        let a = self.nodes.get(connection.from)?;
        let b = self.nodes.get(connection.to)?;
        let distance = a.distance_to(b);
        Some(ConnectionGeometry {
            length: distance * width / 100.0,
            left: a.x * width / 100.0,
            top: a.y * height / 100.0,
            angle: (b.y - a.y).atan2(b.x - a.x).to_degrees(),
            opacity: (0.5 * (1.0 - distance / CONNECTION_DISTANCE)).max(0.1),
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn node(x: f64, y: f64, vx: f64, vy: f64) -> Node {
        Node { x, y, vx, vy }
    }

    #[test]
    fn test_initial_field() {
        let mut rng = StdRng::seed_from_u64(42);
        let network = NetworkAnimation::new(&mut rng);
        assert_eq!(network.nodes().len(), 25);
        for n in network.nodes() {
            assert!((0.0..=100.0).contains(&n.x));
            assert!((0.0..=100.0).contains(&n.y));
            assert!(n.vx.abs() <= MAX_SPEED);
            assert!(n.vy.abs() <= MAX_SPEED);
        }
        for c in network.connections() {
            assert!(c.from < c.to);
            let a = network.nodes()[c.from];
            let b = network.nodes()[c.to];
            assert!(a.distance_to(&b) < CONNECTION_DISTANCE);
        }
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = NetworkAnimation::new(&mut StdRng::seed_from_u64(1));
        let b = NetworkAnimation::new(&mut StdRng::seed_from_u64(1));
        assert_eq!(a.nodes(), b.nodes());
        assert_eq!(a.connections(), b.connections());
    }

    #[test]
    fn test_bounce_and_clamp() {
        let mut n = node(99.9, 0.1, 0.25, -0.25);
        n.step();
        assert!((n.x - 100.0).abs() < f64::EPSILON);
        assert!(n.y.abs() < f64::EPSILON);
        assert!(n.vx < 0.0);
        assert!(n.vy > 0.0);
    }

    #[test]
    fn test_stays_in_bounds_over_many_frames() {
        let mut network = NetworkAnimation::new(&mut StdRng::seed_from_u64(9));
        for _ in 0..2_000 {
            network.step();
        }
        assert!(network.nodes().iter().all(|n| {
            (0.0..=100.0).contains(&n.x) && (0.0..=100.0).contains(&n.y)
        }));
    }

    #[test]
    fn test_geometry() {
        let network = NetworkAnimation {
            nodes: vec![node(10.0, 10.0, 0.0, 0.0), node(10.0, 25.0, 0.0, 0.0)],
            connections: vec![Connection { from: 0, to: 1 }],
        };
        let g = network
            .geometry(network.connections()[0], 1000.0, 500.0)
            .unwrap();
        assert!((g.length - 150.0).abs() < 1e-9);
        assert!((g.left - 100.0).abs() < 1e-9);
        assert!((g.top - 50.0).abs() < 1e-9);
        assert!((g.angle - 90.0).abs() < 1e-9);
        // 0.5 * (1 - 15/30)
        assert!((g.opacity - 0.25).abs() < 1e-9);

        assert!(network.geometry(Connection { from: 0, to: 7 }, 1.0, 1.0).is_none());
    }

    #[test]
    fn test_opacity_floor() {
        let network = NetworkAnimation {
            nodes: vec![node(0.0, 0.0, 0.0, 0.0), node(29.0, 0.0, 0.0, 0.0)],
            connections: vec![],
        };
        let g = network.geometry(Connection { from: 0, to: 1 }, 100.0, 100.0).unwrap();
        assert!((g.opacity - 0.1).abs() < f64::EPSILON);
    }
}
