//! The index facade (C8): one public type per metric, wrapping the VPT
//! or BKT engine with the `set`/`search_*`/`to_bytes`/`from_bytes`
//! surface described in the external interface contract.

use crate::bktree::BkTree;
use crate::metric::{Chebyshev, Hamming, Metric, L1, L2};
use crate::serialize;
use crate::storage::PointStorage;
use crate::vptree::VpTree;
use crate::{Error, ItemId, Result};

/// A Vantage-Point Tree index over a single metric `M`.
///
/// Created empty via [`VptIndex::new`]; [`VptIndex::set`] populates it,
/// and may be called again on an already-populated index to rebuild it
/// — the prior state is replaced atomically, never observed half-built.
#[derive(Debug, Clone)]
pub struct VptIndex<M: Metric> {
    tree: VpTree<M>,
}

impl<M: Metric> Default for VptIndex<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Metric> VptIndex<M> {
    pub fn new() -> Self {
        VptIndex { tree: VpTree::empty() }
    }

    /// Builds the index from a flat, row-major matrix of `dimensions`
    /// columns. A zero-length `flat` produces an empty index regardless
    /// of `dimensions`. Fails with [`Error::ShapeError`] if `flat`'s
    /// length isn't a multiple of `dimensions`.
    pub fn set(&mut self, flat: Vec<M::Elem>, dimensions: usize) -> Result<()> {
        let storage = PointStorage::from_flat(flat, dimensions)?;
        self.tree = VpTree::build(storage);
        Ok(())
    }

    pub fn empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn size(&self) -> usize {
        self.tree.len()
    }

    pub fn dimensions(&self) -> usize {
        self.tree.dimensions()
    }

    pub fn search_knn(&self, query: &[M::Elem], k: usize) -> Result<(Vec<ItemId>, Vec<f64>)> {
        let pairs = self.tree.search_knn(query, k)?;
        Ok(pairs.into_iter().unzip())
    }

    #[cfg(not(feature = "parallel"))]
    pub fn search_knn_batch(&self, queries: &[&[M::Elem]], k: usize) -> Result<(Vec<Vec<ItemId>>, Vec<Vec<f64>>)> {
        let rows = self.tree.search_knn_batch(queries, k)?;
        Ok(rows.into_iter().map(|r| r.into_iter().unzip()).unzip())
    }

    #[cfg(feature = "parallel")]
    pub fn search_knn_batch(&self, queries: &[&[M::Elem]], k: usize) -> Result<(Vec<Vec<ItemId>>, Vec<Vec<f64>>)>
    where
        M::Elem: Sync,
        M::Dist: Sync,
    {
        let rows = self.tree.search_knn_batch(queries, k)?;
        Ok(rows.into_iter().map(|r| r.into_iter().unzip()).unzip())
    }

    pub fn search_1nn(&self, query: &[M::Elem]) -> Result<(ItemId, f64)> {
        self.tree.search_1nn(query)
    }

    pub fn to_bytes(&self) -> Vec<u8>
    where
        M::Elem: bytemuck::Pod,
    {
        serialize::write_vptree(&self.tree)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self>
    where
        M::Elem: bytemuck::Pod,
    {
        Ok(VptIndex { tree: serialize::read_vptree(bytes)? })
    }
}

pub type VptL2 = VptIndex<L2>;
pub type VptL1 = VptIndex<L1>;
pub type VptChebyshev = VptIndex<Chebyshev>;
pub type VptHamming = VptIndex<Hamming>;

/// A fixed-width specialization of a Hamming-domain index: `set` takes
/// a flat buffer without a `dimensions` argument, since the width `W`
/// is fixed by the type, and rejects any buffer whose length isn't a
/// multiple of `W`.
pub trait FixedWidth {
    const WIDTH: usize;
}

macro_rules! fixed_width_hamming {
    ($name:ident, $width:expr) => {
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            inner: VptIndex<Hamming>,
        }

        impl FixedWidth for $name {
            const WIDTH: usize = $width;
        }

        impl $name {
            pub fn new() -> Self {
                $name { inner: VptIndex::new() }
            }

            pub fn set(&mut self, flat: Vec<u8>) -> Result<()> {
                self.inner.set(flat, $width)
            }

            pub fn empty(&self) -> bool {
                self.inner.empty()
            }

            pub fn size(&self) -> usize {
                self.inner.size()
            }

            pub fn search_knn(&self, query: &[u8], k: usize) -> Result<(Vec<ItemId>, Vec<f64>)> {
                self.inner.search_knn(query, k)
            }

            pub fn search_1nn(&self, query: &[u8]) -> Result<(ItemId, f64)> {
                self.inner.search_1nn(query)
            }

            #[cfg(not(feature = "parallel"))]
            pub fn search_knn_batch(&self, queries: &[&[u8]], k: usize) -> Result<(Vec<Vec<ItemId>>, Vec<Vec<f64>>)> {
                self.inner.search_knn_batch(queries, k)
            }

            #[cfg(feature = "parallel")]
            pub fn search_knn_batch(&self, queries: &[&[u8]], k: usize) -> Result<(Vec<Vec<ItemId>>, Vec<Vec<f64>>)> {
                self.inner.search_knn_batch(queries, k)
            }

            pub fn to_bytes(&self) -> Vec<u8> {
                self.inner.to_bytes()
            }

            pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
                Ok($name { inner: VptIndex::from_bytes(bytes)? })
            }
        }
    };
}

fixed_width_hamming!(VptHamming8, 8);
fixed_width_hamming!(VptHamming16, 16);
fixed_width_hamming!(VptHamming32, 32);
fixed_width_hamming!(VptHamming64, 64);

/// A Burkhard-Keller Tree index: threshold search over Hamming-domain
/// byte vectors.
#[derive(Debug, Clone)]
pub struct BkTreeIndex {
    tree: BkTree,
}

impl Default for BkTreeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl BkTreeIndex {
    pub fn new() -> Self {
        BkTreeIndex { tree: BkTree::empty() }
    }

    pub fn set(&mut self, flat: Vec<u8>, dimensions: usize) -> Result<()> {
        let storage = PointStorage::from_flat(flat, dimensions)?;
        self.tree = BkTree::build(storage);
        Ok(())
    }

    pub fn empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn size(&self) -> usize {
        self.tree.size()
    }

    pub fn dimensions(&self) -> usize {
        self.tree.dimensions()
    }

    pub fn values(&self) -> Vec<&[u8]> {
        self.tree.values()
    }

    pub fn find_threshold(&self, query: &[u8], threshold: u32) -> Result<(Vec<ItemId>, Vec<u32>, Vec<&[u8]>)> {
        let matches = self.tree.find_threshold(query, threshold)?;
        let mut ids = Vec::with_capacity(matches.len());
        let mut dists = Vec::with_capacity(matches.len());
        let mut values = Vec::with_capacity(matches.len());
        for (id, d, v) in matches {
            ids.push(id);
            dists.push(d);
            values.push(v);
        }
        Ok((ids, dists, values))
    }

    pub fn find_threshold_batch(
        &self,
        queries: &[&[u8]],
        threshold: u32,
    ) -> Result<Vec<(Vec<ItemId>, Vec<u32>, Vec<&[u8]>)>> {
        queries.iter().map(|q| self.find_threshold(q, threshold)).collect()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serialize::write_bktree(&self.tree)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(BkTreeIndex { tree: serialize::read_bktree(bytes)? })
    }
}

macro_rules! fixed_width_bktree {
    ($name:ident, $width:expr) => {
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            inner: BkTreeIndex,
        }

        impl FixedWidth for $name {
            const WIDTH: usize = $width;
        }

        impl $name {
            pub fn new() -> Self {
                $name { inner: BkTreeIndex::new() }
            }

            pub fn set(&mut self, flat: Vec<u8>) -> Result<()> {
                self.inner.set(flat, $width)
            }

            pub fn empty(&self) -> bool {
                self.inner.empty()
            }

            pub fn size(&self) -> usize {
                self.inner.size()
            }

            pub fn values(&self) -> Vec<&[u8]> {
                self.inner.values()
            }

            pub fn find_threshold(&self, query: &[u8], threshold: u32) -> Result<(Vec<ItemId>, Vec<u32>, Vec<&[u8]>)> {
                self.inner.find_threshold(query, threshold)
            }

            pub fn find_threshold_batch(
                &self,
                queries: &[&[u8]],
                threshold: u32,
            ) -> Result<Vec<(Vec<ItemId>, Vec<u32>, Vec<&[u8]>)>> {
                self.inner.find_threshold_batch(queries, threshold)
            }

            pub fn to_bytes(&self) -> Vec<u8> {
                self.inner.to_bytes()
            }

            pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
                Ok($name { inner: BkTreeIndex::from_bytes(bytes)? })
            }
        }
    };
}

fixed_width_bktree!(BkTreeHamming8, 8);
fixed_width_bktree!(BkTreeHamming16, 16);
fixed_width_bktree!(BkTreeHamming32, 32);
fixed_width_bktree!(BkTreeHamming64, 64);
