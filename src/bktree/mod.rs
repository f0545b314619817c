//! The Burkhard-Keller Tree: threshold search over fixed-width byte
//! vectors under Hamming distance, built by incremental insertion (C5)
//! and queried with edge-range pruning (C6).

pub mod builder;
pub mod node;
pub mod threshold;

use crate::storage::PointStorage;
use crate::{ItemId, Result};

use builder::Builder;
use node::{BkNode, NodeId};
use threshold::{BkSearch, Match};

#[derive(Debug, Clone)]
pub struct BkTree {
    storage: PointStorage<u8>,
    arena: Vec<BkNode>,
    root: Option<NodeId>,
}

impl BkTree {
    pub fn empty() -> Self {
        BkTree { storage: PointStorage::empty(), arena: Vec::new(), root: None }
    }

    pub fn build(storage: PointStorage<u8>) -> Self {
        let (arena, root) = Builder::build(&storage);
        BkTree { storage, arena, root }
    }

    pub fn from_parts(storage: PointStorage<u8>, arena: Vec<BkNode>, root: Option<NodeId>) -> Self {
        BkTree { storage, arena, root }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Count of unique stored points: one per distinct byte-vector, not
    /// per external id (exact duplicates share a node).
    pub fn size(&self) -> usize {
        self.arena.len()
    }

    pub fn dimensions(&self) -> usize {
        self.storage.dimensions()
    }

    pub fn storage(&self) -> &PointStorage<u8> {
        &self.storage
    }

    pub fn arena(&self) -> &[BkNode] {
        &self.arena
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Every unique stored byte-vector, in arena order (deterministic
    /// for a given tree, not necessarily insertion order; duplicates of
    /// an existing value are not repeated).
    pub fn values(&self) -> Vec<&[u8]> {
        self.arena.iter().map(|n| self.storage.row(n.id)).collect()
    }

    fn search(&self) -> BkSearch<'_> {
        BkSearch::new(&self.arena, &self.storage)
    }

    pub fn find_threshold(&self, query: &[u8], threshold: u32) -> Result<Vec<Match<'_>>> {
        self.search().find_threshold(self.root, query, threshold)
    }

    pub fn find_threshold_batch(&self, queries: &[&[u8]], threshold: u32) -> Result<Vec<Vec<Match<'_>>>> {
        self.search().find_threshold_batch(self.root, queries, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(rows: &[[u8; 8]]) -> PointStorage<u8> {
        let flat: Vec<u8> = rows.iter().flatten().copied().collect();
        PointStorage::from_flat(flat, 8).unwrap()
    }

    #[test]
    fn empty_tree_has_no_matches_and_is_empty() {
        let tree = BkTree::build(PointStorage::<u8>::empty());
        assert!(tree.is_empty());
        assert_eq!(tree.find_threshold(&[], 3).unwrap(), Vec::new());
    }

    #[test]
    fn empty_tree_ignores_query_dimension_entirely() {
        // Storage dimension is coerced to 0 for an empty tree; a query
        // of ordinary nonzero width must still short-circuit to an
        // empty result instead of failing dimension validation.
        let tree = BkTree::build(PointStorage::<u8>::empty());
        let query = [0u8; 8];
        assert_eq!(tree.find_threshold(&query, 3).unwrap(), Vec::new());
    }

    #[test]
    fn threshold_matches_brute_force() {
        let rows: Vec<[u8; 8]> =
            vec![[0; 8], [0xff; 8], [0x0f; 8], [0xf0; 8], [1, 0, 0, 0, 0, 0, 0, 0], [3, 0, 0, 0, 0, 0, 0, 0]];
        let storage = storage(&rows);
        let tree = BkTree::build(storage);

        let query = [0u8; 8];
        let threshold = 2;
        let mut got: Vec<ItemId> =
            tree.find_threshold(&query, threshold).unwrap().into_iter().map(|(id, _, _)| id).collect();
        got.sort_unstable();

        let mut want: Vec<ItemId> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().zip(query.iter()).map(|(a, b)| (a ^ b).count_ones()).sum::<u32>() <= threshold)
            .map(|(i, _)| i as ItemId)
            .collect();
        want.sort_unstable();

        assert_eq!(got, want);
    }

    #[test]
    fn duplicates_share_a_node_but_all_ids_are_returned() {
        let rows = vec![[1u8; 8], [1u8; 8], [2u8; 8]];
        let storage = storage(&rows);
        let tree = BkTree::build(storage);
        let mut got: Vec<ItemId> =
            tree.find_threshold(&[1u8; 8], 0).unwrap().into_iter().map(|(id, _, _)| id).collect();
        got.sort_unstable();
        assert_eq!(got, vec![0, 1]);
    }
}
