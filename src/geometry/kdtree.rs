use std::collections::BTreeSet;

use super::model::{axis_delta, validate_radius, NeighborGraph, Position};
use crate::error::Result;

// ---------------------------------------------------------------------------
// KdTree – static 2-d tree over channel positions
// ---------------------------------------------------------------------------

/// Balanced 2-d tree stored implicitly: every sub-range of `order` is a
/// subtree whose median element is the split node, alternating x / y by
/// depth.
#[derive(Debug, Clone)]
pub struct KdTree<'a> {
    points: &'a [Position],
    order: Vec<usize>,
}

impl<'a> KdTree<'a> {
    pub fn build(points: &'a [Position]) -> Self {
        let mut order: Vec<usize> = (0..points.len()).collect();
        split(points, &mut order, 0);
        KdTree { points, order }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All point indices at Euclidean distance `<= radius` from `query`,
    /// in no particular order.
    pub fn within_radius(&self, query: &Position, radius: f64) -> Vec<usize> {
        let mut hits = Vec::new();
        self.visit(0, self.order.len(), 0, query, radius, &mut hits);
        hits
    }

    fn visit(
        &self,
        lo: usize,
        hi: usize,
        depth: usize,
        q: &Position,
        radius: f64,
        hits: &mut Vec<usize>,
    ) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let idx = self.order[mid];
        let p = &self.points[idx];
        if q.within(p, radius) {
            hits.push(idx);
        }
        let r2 = radius * radius;

        let axis = depth % 2;
        let delta = axis_delta(coord(q, axis), coord(p, axis));
        // left subtree holds coordinates <= split, right holds >= split
        if delta <= 0.0 || delta * delta <= r2 {
            self.visit(lo, mid, depth + 1, q, radius, hits);
        }
        if delta >= 0.0 || delta * delta <= r2 {
            self.visit(mid + 1, hi, depth + 1, q, radius, hits);
        }
    }
}

fn coord(p: &Position, axis: usize) -> i64 {
    if axis == 0 {
        p.x
    } else {
        p.y
    }
}

fn split(points: &[Position], order: &mut [usize], depth: usize) {
    if order.len() <= 1 {
        return;
    }
    let axis = depth % 2;
    order.sort_unstable_by_key(|&i| (coord(&points[i], axis), i));
    let mid = order.len() / 2;
    let (left, right) = order.split_at_mut(mid);
    split(points, left, depth + 1);
    split(points, &mut right[1..], depth + 1);
}

// ---------------------------------------------------------------------------
// Radius neighbor graph
// ---------------------------------------------------------------------------

/// Neighbor graph where each channel's set holds every channel within
/// `radius`, itself included.
pub fn compute_neighbors(positions: &[Position], radius: f64) -> Result<NeighborGraph> {
    validate_radius(radius)?;
    let tree = KdTree::build(positions);
    let sets = positions
        .iter()
        .map(|p| tree.within_radius(p, radius).into_iter().collect::<BTreeSet<_>>())
        .collect();
    Ok(NeighborGraph::from_sets(sets))
}
