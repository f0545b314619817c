//! The VPT k-NN engine (C4): recursive best-first descent with
//! triangle-inequality and cached-bounds pruning.

use crate::heap::BoundedHeap;
use crate::metric::Metric;
use crate::storage::PointStorage;
use crate::vptree::node::{NodeId, VpNode};
use crate::{Error, ItemId, Result};

pub struct VpSearch<'a, M: Metric> {
    arena: &'a [VpNode<M>],
    storage: &'a PointStorage<M::Elem>,
}

impl<'a, M: Metric> VpSearch<'a, M> {
    pub fn new(arena: &'a [VpNode<M>], storage: &'a PointStorage<M::Elem>) -> Self {
        VpSearch { arena, storage }
    }

    /// The full k-NN query. Fails with [`Error::InvalidArgument`] if
    /// `k == 0`; otherwise returns an empty vector for an empty index,
    /// or at most `min(k, storage.len())` pairs sorted ascending.
    pub fn search_knn(&self, root: Option<NodeId>, query: &[M::Elem], k: usize) -> Result<Vec<(ItemId, f64)>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        let Some(root) = root else {
            return Ok(Vec::new());
        };
        self.storage.check_query_dim(query)?;

        let mut heap: BoundedHeap<M::Dist> = BoundedHeap::new(k);
        self.visit(root, query, &mut heap);
        Ok(heap
            .into_sorted_ascending()
            .into_iter()
            .map(|(id, d)| (id, M::dist_to_f64(d)))
            .collect())
    }

    /// The k=1 specialization: a single best `(id, distance)` pair.
    /// Fails with [`Error::EmptyIndex`] rather than returning an empty
    /// result, matching the 1-NN/k-NN asymmetry in the external contract.
    pub fn search_1nn(&self, root: Option<NodeId>, query: &[M::Elem]) -> Result<(ItemId, f64)> {
        let Some(root) = root else {
            return Err(Error::EmptyIndex);
        };
        self.storage.check_query_dim(query)?;
        let mut heap: BoundedHeap<M::Dist> = BoundedHeap::new(1);
        self.visit(root, query, &mut heap);
        let (id, d) = heap
            .into_sorted_ascending()
            .into_iter()
            .next()
            .expect("non-empty root must yield at least one candidate");
        Ok((id, M::dist_to_f64(d)))
    }

    /// Queries every row independently. With the `parallel` feature,
    /// rows fan out across a rayon thread pool; each row's result is
    /// computed from its own local heap, so the output is identical to
    /// the serial path regardless of thread scheduling.
    #[cfg(not(feature = "parallel"))]
    pub fn search_knn_batch(
        &self,
        root: Option<NodeId>,
        queries: &[&[M::Elem]],
        k: usize,
    ) -> Result<Vec<Vec<(ItemId, f64)>>> {
        queries.iter().map(|q| self.search_knn(root, q, k)).collect()
    }

    #[cfg(feature = "parallel")]
    pub fn search_knn_batch(
        &self,
        root: Option<NodeId>,
        queries: &[&[M::Elem]],
        k: usize,
    ) -> Result<Vec<Vec<(ItemId, f64)>>>
    where
        M::Elem: Sync,
        M::Dist: Sync,
    {
        use rayon::prelude::*;
        queries.par_iter().map(|q| self.search_knn(root, q, k)).collect()
    }

    fn visit(&self, node: NodeId, query: &[M::Elem], heap: &mut BoundedHeap<M::Dist>) {
        match &self.arena[node as usize] {
            VpNode::Leaf { ids } => {
                for &id in ids {
                    let d = M::distance(query, self.storage.row(id));
                    heap.consider(d, id);
                }
            }
            VpNode::Internal { pivot_id, mu, left, right, left_bounds, right_bounds } => {
                let x = M::distance(query, self.storage.row(*pivot_id));
                heap.consider(x, *pivot_id);

                let (near, near_bounds, far) = if x < *mu {
                    (*left, left_bounds, *right)
                } else {
                    (*right, right_bounds, *left)
                };

                // Near side: only worth pruning once the heap is full
                // (tau is finite). The closest any point in the region
                // could possibly be to q is 0 if x falls inside the
                // region's observed [min, max] distance-to-pivot range,
                // else the gap to whichever endpoint x is outside of.
                let lower_bound = if x < near_bounds.min {
                    M::dist_abs_diff(near_bounds.min, x)
                } else if x > near_bounds.max {
                    M::dist_abs_diff(x, near_bounds.max)
                } else {
                    M::ZERO_DIST
                };
                let near_prunable =
                    heap.is_full() && heap.worst().map(|tau| lower_bound > tau).unwrap_or(false);
                if !near_prunable {
                    self.visit(near, query, heap);
                }

                let far_prunable = heap.is_full()
                    && heap.worst().map(|tau| M::dist_abs_diff(x, *mu) > tau).unwrap_or(false);
                if !far_prunable {
                    self.visit(far, query, heap);
                }
            }
        }
    }
}
