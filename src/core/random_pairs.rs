use crate::domain::model::{Coordinate, PointPair};
use crate::utils::error::{EtlError, Result};
use rand::Rng;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct NodeRecord {
    x: f64,
    y: f64,
}

/// Reads a node list with `x` (lon) and `y` (lat) columns; other columns are ignored.
pub fn read_nodes(bytes: &[u8]) -> Result<Vec<Coordinate>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut nodes = Vec::new();
    for record in reader.deserialize::<NodeRecord>() {
        let node = record?;
        nodes.push(Coordinate::new(node.x, node.y));
    }
    Ok(nodes)
}

/// Draws `count` pairs uniformly with replacement; a pair never joins a node to a
/// node at the same coordinates.
pub fn draw_node_pairs<R: Rng>(rng: &mut R, nodes: &[Coordinate], count: usize) -> Result<Vec<PointPair>> {
    let first = nodes
        .first()
        .ok_or_else(|| EtlError::processing("node list is empty"))?;
    if nodes.iter().all(|n| n == first) {
        return Err(EtlError::processing(
            "node list needs at least two distinct coordinates to draw pairs",
        ));
    }

    let mut pairs = Vec::with_capacity(count);
    for _ in 0..count {
        let a = nodes[rng.random_range(0..nodes.len())];
        let mut b = nodes[rng.random_range(0..nodes.len())];
        while b == a {
            b = nodes[rng.random_range(0..nodes.len())];
        }
        pairs.push(PointPair::new(a, b));
    }
    Ok(pairs)
}
