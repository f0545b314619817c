//! The VPT builder (C3): recursive median-split construction of a
//! [`VpNode`] arena from a working set of point ids.

use crate::metric::Metric;
use crate::storage::PointStorage;
use crate::vptree::node::{Bounds, NodeId, VpNode};
use crate::ItemId;

/// Below this many points, a working set becomes a leaf rather than
/// being split again. Arbitrary but reproducible; not exposed, so
/// changing it doesn't affect the serialization format (the tree shape
/// it produces does change, which only matters for byte-identical
/// round-trips of a single build, not across crate versions).
const LEAF_THRESHOLD: usize = 16;

pub struct Builder<'a, M: Metric> {
    storage: &'a PointStorage<M::Elem>,
    arena: Vec<VpNode<M>>,
}

impl<'a, M: Metric> Builder<'a, M> {
    pub fn build(storage: &'a PointStorage<M::Elem>) -> (Vec<VpNode<M>>, Option<NodeId>) {
        let _span = tracing::info_span!("vptree_build", metric = %M::KIND, n = storage.len()).entered();
        if storage.is_empty() {
            return (Vec::new(), None);
        }
        let ids: Vec<ItemId> = (0..storage.len() as ItemId).collect();
        let mut builder = Builder { storage, arena: Vec::new() };
        let root = builder.build_subtree(ids);
        tracing::debug!(nodes = builder.arena.len(), "vptree build finished");
        (builder.arena, Some(root))
    }

    fn push(&mut self, node: VpNode<M>) -> NodeId {
        let id = self.arena.len() as NodeId;
        self.arena.push(node);
        id
    }

    fn build_subtree(&mut self, ids: Vec<ItemId>) -> NodeId {
        if ids.len() <= LEAF_THRESHOLD {
            return self.push(VpNode::Leaf { ids });
        }

        // Last-element-as-pivot: deterministic and reproducible for a
        // fixed input order, and leaves the remaining slice contiguous
        // for the in-place quickselect below.
        let mut ids = ids;
        let pivot_id = ids.pop().expect("checked non-empty above");
        let pivot_row = self.storage.row(pivot_id);

        let mut dists: Vec<(M::Dist, ItemId)> = ids
            .iter()
            .map(|&id| (M::distance(pivot_row, self.storage.row(id)), id))
            .collect();

        let mid = dists.len() / 2;
        dists.select_nth_unstable_by(mid, |a, b| a.0.cmp(&b.0));
        let mu = dists[mid].0;

        let mut left_ids = Vec::new();
        let mut right_ids = Vec::new();
        let mut left_bounds: Option<(M::Dist, M::Dist)> = None;
        let mut right_bounds: Option<(M::Dist, M::Dist)> = None;

        for (d, id) in dists {
            if d < mu {
                left_ids.push(id);
                left_bounds = Some(match left_bounds {
                    None => (d, d),
                    Some((min, max)) => (min.min(d), max.max(d)),
                });
            } else {
                right_ids.push(id);
                right_bounds = Some(match right_bounds {
                    None => (d, d),
                    Some((min, max)) => (min.min(d), max.max(d)),
                });
            }
        }

        // An empty side still needs a bound that can never match a
        // near-side pruning check; using `mu` for both endpoints makes
        // the bound as tight as the parent split already guarantees.
        let left_bounds = left_bounds.unwrap_or((mu, mu));
        let right_bounds = right_bounds.unwrap_or((mu, mu));

        let left = self.build_subtree(left_ids);
        let right = self.build_subtree(right_ids);

        self.push(VpNode::Internal {
            pivot_id,
            mu,
            left,
            right,
            left_bounds: Bounds { min: left_bounds.0, max: left_bounds.1 },
            right_bounds: Bounds { min: right_bounds.0, max: right_bounds.1 },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::L2;

    fn storage_2d(rows: &[[f32; 2]]) -> PointStorage<f32> {
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        PointStorage::from_flat(flat, 2).unwrap()
    }

    #[test]
    fn empty_storage_has_no_root() {
        let storage = PointStorage::<f32>::empty();
        let (arena, root) = Builder::<L2>::build(&storage);
        assert!(arena.is_empty());
        assert!(root.is_none());
    }

    #[test]
    fn small_set_is_a_single_leaf() {
        let storage = storage_2d(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let (arena, root) = Builder::<L2>::build(&storage);
        assert_eq!(arena.len(), 1);
        match &arena[root.unwrap() as usize] {
            VpNode::Leaf { ids } => {
                let mut ids = ids.clone();
                ids.sort_unstable();
                assert_eq!(ids, vec![0, 1, 2]);
            }
            VpNode::Internal { .. } => panic!("expected a leaf"),
        }
    }

    #[test]
    fn large_set_splits_into_internal_node() {
        let rows: Vec<[f32; 2]> = (0..64).map(|i| [i as f32, 0.0]).collect();
        let storage = storage_2d(&rows);
        let (arena, root) = Builder::<L2>::build(&storage);
        assert!(matches!(arena[root.unwrap() as usize], VpNode::Internal { .. }));

        let mut seen = std::collections::HashSet::new();
        collect_ids(&arena, root.unwrap(), &mut seen);
        assert_eq!(seen.len(), 64);
    }

    fn collect_ids(arena: &[VpNode<L2>], node: NodeId, seen: &mut std::collections::HashSet<ItemId>) {
        match &arena[node as usize] {
            VpNode::Leaf { ids } => seen.extend(ids.iter().copied()),
            VpNode::Internal { pivot_id, left, right, .. } => {
                seen.insert(*pivot_id);
                collect_ids(arena, *left, seen);
                collect_ids(arena, *right, seen);
            }
        }
    }
}
