//! BKT arena node type: each node owns one representative byte-vector's
//! id plus the ids of any exact duplicates, and a sparse map from exact
//! edge-distance to child node.

use nohash::IntMap;

use crate::ItemId;

pub type NodeId = u32;

#[derive(Debug, Clone)]
pub struct BkNode {
    /// The id this node was first created for.
    pub id: ItemId,
    /// Ids of every other indexed point with the same byte-vector.
    pub duplicates: Vec<ItemId>,
    /// Edge label (exact Hamming distance to this node) -> child node.
    pub children: IntMap<u32, NodeId>,
}

impl BkNode {
    pub fn new(id: ItemId) -> Self {
        BkNode { id, duplicates: Vec::new(), children: IntMap::default() }
    }
}
