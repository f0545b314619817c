use crate::metric::Metric;
use crate::ItemId;

pub type NodeId = u32;

/// A cached `[min, max]` bound over the distances-to-pivot observed in a
/// child subtree, used to prune a near-side descent when the subtree
/// provably can't contain anything closer than the current τ.
#[derive(Debug, Clone, Copy)]
pub struct Bounds<D> {
    pub min: D,
    pub max: D,
}

#[derive(Debug, Clone)]
pub enum VpNode<M: Metric> {
    Leaf { ids: Vec<ItemId> },
    Internal {
        pivot_id: ItemId,
        mu: M::Dist,
        left: NodeId,
        right: NodeId,
        left_bounds: Bounds<M::Dist>,
        right_bounds: Bounds<M::Dist>,
    },
}
