//! Exact nearest-neighbor indexes over fixed-dimension vectors.
//!
//! Two engines share one crate: a Vantage-Point Tree ([`vptree`]) for
//! k-NN under L2, L1, Chebyshev, or Hamming distance, and a
//! Burkhard-Keller Tree ([`bktree`]) for threshold search under
//! Hamming distance. Both build a main-memory arena from a flat input
//! matrix and answer queries against it; neither performs I/O of its
//! own — [`facade::VptIndex::to_bytes`]/[`facade::VptIndex::from_bytes`]
//! hand a byte buffer to the caller, who owns the filesystem.
//!
//! Most callers only need the [`facade`] module's per-metric index
//! types (`VptL2`, `VptHamming8`, `BkTreeIndex`, ...); [`metric`],
//! [`vptree`], and [`bktree`] are the engines underneath them.

mod bktree;
mod dataset;
mod error;
mod facade;
mod heap;
mod metric;
mod serialize;
mod spaces;
mod storage;
mod vptree;

pub use bktree::BkTree;
pub use dataset::Dataset;
pub use error::Error;
pub use facade::{
    BkTreeHamming16, BkTreeHamming32, BkTreeHamming64, BkTreeHamming8, BkTreeIndex, FixedWidth, VptChebyshev,
    VptHamming, VptHamming16, VptHamming32, VptHamming64, VptHamming8, VptIndex, VptL1, VptL2,
};
pub use metric::{distance, Chebyshev, Element, Hamming, Metric, MetricKind, L1, L2};
pub use vptree::VpTree;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An external item id: the row index a point occupied in the matrix
/// passed to `set`, stable for the lifetime of the built index.
pub type ItemId = u32;
