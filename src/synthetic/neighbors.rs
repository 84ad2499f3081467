//! k-d tree for exact Euclidean k-nearest-neighbor queries

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;

use crate::error::{Result, XrayError};

/// Distance/index pair, ordered by distance then index
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0).then(self.1.cmp(&other.1))
    }
}

#[derive(Debug)]
struct Node {
    point: usize,
    split_dim: usize,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

/// Exact k-d tree over the rows of a feature matrix
#[derive(Debug)]
pub struct KdTree {
    points: Array2<f64>,
    root: Option<Box<Node>>,
}

impl KdTree {
    /// Build a tree over every row of `points`.
    pub fn build(points: Array2<f64>) -> Result<Self> {
        if points.nrows() == 0 {
            return Err(XrayError::ValidationError("cannot build a k-d tree over zero points".to_string()));
        }
        if points.ncols() == 0 {
            return Err(XrayError::ValidationError(
                "cannot build a k-d tree over zero-dimensional points".to_string(),
            ));
        }

        let mut order: Vec<usize> = (0..points.nrows()).collect();
        let root = Self::build_recursive(&points, &mut order, 0);
        Ok(Self { points, root })
    }

    fn build_recursive(points: &Array2<f64>, slice: &mut [usize], depth: usize) -> Option<Box<Node>> {
        if slice.is_empty() {
            return None;
        }

        let split_dim = depth % points.ncols();
        slice.sort_by(|&a, &b| points[[a, split_dim]].total_cmp(&points[[b, split_dim]]));
        let median = slice.len() / 2;
        let point = slice[median];

        let (left, rest) = slice.split_at_mut(median);
        Some(Box::new(Node {
            point,
            split_dim,
            left: Self::build_recursive(points, left, depth + 1),
            right: Self::build_recursive(points, &mut rest[1..], depth + 1),
        }))
    }

    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    pub fn dim(&self) -> usize {
        self.points.ncols()
    }

    fn distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(ai, bi)| (ai - bi).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Indices of the `k` rows closest to `query`, nearest first.
    ///
    /// Equal distances are ordered by row index.
    pub fn query(&self, query: ArrayView1<'_, f64>, k: usize) -> Result<Vec<usize>> {
        if query.len() != self.dim() {
            return Err(XrayError::DataError(format!(
                "query has {} features, tree has {}",
                query.len(),
                self.dim()
            )));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);
        self.search(&self.root, query, k, &mut heap);
        Ok(heap.into_sorted_vec().into_iter().map(|DistIdx(_, i)| i).collect())
    }

    fn search(&self, node: &Option<Box<Node>>, query: ArrayView1<'_, f64>, k: usize, heap: &mut BinaryHeap<DistIdx>) {
        let node = match node {
            Some(n) => n,
            None => return,
        };

        let candidate = DistIdx(Self::distance(query, self.points.row(node.point)), node.point);
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().map_or(false, |worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }

        let diff = query[node.split_dim] - self.points[[node.point, node.split_dim]];
        let (near, far) = if diff < 0.0 { (&node.left, &node.right) } else { (&node.right, &node.left) };

        self.search(near, query, k, heap);

        // `<=` keeps equal-distance points on the far side eligible for the index tie-break
        if heap.len() < k || heap.peek().map_or(true, |worst| diff.abs() <= worst.0) {
            self.search(far, query, k, heap);
        }
    }

    /// k nearest rows of every row of the tree itself, one output row per point.
    ///
    /// Column 0 normally holds the point itself. Queries run in parallel.
    pub fn kneighbors(&self, k: usize) -> Result<Array2<usize>> {
        if k > self.len() {
            return Err(XrayError::ValidationError(format!(
                "requested {} neighbors but only {} points are indexed",
                k,
                self.len()
            )));
        }

        let rows: Vec<Vec<usize>> = (0..self.len())
            .into_par_iter()
            .map(|i| self.query(self.points.row(i), k))
            .collect::<Result<_>>()?;

        let flat: Vec<usize> = rows.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((self.len(), k), flat)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn brute_force(points: &Array2<f64>, q: usize, k: usize) -> Vec<usize> {
        let mut all: Vec<DistIdx> = (0..points.nrows())
            .map(|i| DistIdx(KdTree::distance(points.row(q), points.row(i)), i))
            .collect();
        all.sort();
        all.into_iter().take(k).map(|DistIdx(_, i)| i).collect()
    }

    #[test]
    fn test_query_nearest_first() {
        let points = array![[0.0, 0.0], [1.0, 0.0], [5.0, 5.0], [0.0, 2.0]];
        let tree = KdTree::build(points).unwrap();
        let nn = tree.query(array![0.1, 0.1].view(), 3).unwrap();
        assert_eq!(nn, vec![0, 1, 3]);
    }

    #[test]
    fn test_kneighbors_self_first() {
        let points = array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [10.0, 10.0], [11.0, 11.0]];
        let tree = KdTree::build(points).unwrap();
        let idx = tree.kneighbors(2).unwrap();
        assert_eq!(idx.dim(), (5, 2));
        for i in 0..5 {
            assert_eq!(idx[[i, 0]], i);
        }
        assert_eq!(idx[[3, 1]], 4);
        assert_eq!(idx[[4, 1]], 3);
    }

    #[test]
    fn test_matches_brute_force() {
        let points = Array2::from_shape_fn((40, 3), |(i, j)| ((i * 7 + j * 13) % 17) as f64 * 0.5 + j as f64);
        let tree = KdTree::build(points.clone()).unwrap();
        let idx = tree.kneighbors(5).unwrap();
        for q in 0..points.nrows() {
            assert_eq!(idx.row(q).to_vec(), brute_force(&points, q, 5));
        }
    }

    #[test]
    fn test_duplicate_points_tie_break_by_index() {
        let points = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
        let tree = KdTree::build(points).unwrap();
        let idx = tree.kneighbors(3).unwrap();
        for i in 0..3 {
            assert_eq!(idx.row(i).to_vec(), vec![0, 1, 2]);
        }
    }

    #[test]
    fn test_tree_size() {
        let tree = KdTree::build(array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]]).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.dim(), 3);
        assert!(!tree.is_empty());
        assert!(tree.query(array![0.0, 1.0].view(), 1).is_err());
    }

    #[test]
    fn test_too_many_neighbors() {
        let tree = KdTree::build(array![[0.0], [1.0]]).unwrap();
        assert!(tree.kneighbors(3).is_err());
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(KdTree::build(Array2::zeros((0, 2))).is_err());
        assert!(KdTree::build(Array2::zeros((3, 0))).is_err());
    }
}
