//! The Vantage-Point Tree: exact k-NN over L2/L1/Chebyshev/Hamming
//! vectors, built by median splits (C3) and queried with
//! triangle-inequality pruning (C4).

pub mod builder;
pub mod knn;
pub mod node;

use crate::metric::Metric;
use crate::storage::PointStorage;
use crate::{ItemId, Result};

use builder::Builder;
use knn::VpSearch;
use node::{NodeId, VpNode};

/// A built Vantage-Point Tree: an arena of [`VpNode`]s plus the flat
/// point storage the tree's ids index into.
#[derive(Debug, Clone)]
pub struct VpTree<M: Metric> {
    storage: PointStorage<M::Elem>,
    arena: Vec<VpNode<M>>,
    root: Option<NodeId>,
}

impl<M: Metric> VpTree<M> {
    pub fn empty() -> Self {
        VpTree { storage: PointStorage::empty(), arena: Vec::new(), root: None }
    }

    pub fn build(storage: PointStorage<M::Elem>) -> Self {
        let (arena, root) = Builder::<M>::build(&storage);
        VpTree { storage, arena, root }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.storage.dimensions()
    }

    pub fn storage(&self) -> &PointStorage<M::Elem> {
        &self.storage
    }

    pub fn arena(&self) -> &[VpNode<M>] {
        &self.arena
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    fn search(&self) -> VpSearch<'_, M> {
        VpSearch::new(&self.arena, &self.storage)
    }

    pub fn search_knn(&self, query: &[M::Elem], k: usize) -> Result<Vec<(ItemId, f64)>> {
        self.search().search_knn(self.root, query, k)
    }

    pub fn search_1nn(&self, query: &[M::Elem]) -> Result<(ItemId, f64)> {
        self.search().search_1nn(self.root, query)
    }

    #[cfg(not(feature = "parallel"))]
    pub fn search_knn_batch(&self, queries: &[&[M::Elem]], k: usize) -> Result<Vec<Vec<(ItemId, f64)>>> {
        self.search().search_knn_batch(self.root, queries, k)
    }

    #[cfg(feature = "parallel")]
    pub fn search_knn_batch(&self, queries: &[&[M::Elem]], k: usize) -> Result<Vec<Vec<(ItemId, f64)>>>
    where
        M::Elem: Sync,
        M::Dist: Sync,
    {
        self.search().search_knn_batch(self.root, queries, k)
    }

    pub fn from_parts(storage: PointStorage<M::Elem>, arena: Vec<VpNode<M>>, root: Option<NodeId>) -> Self {
        VpTree { storage, arena, root }
    }
}
