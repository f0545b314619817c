//! The BKT builder (C5): insert rows one at a time, keyed by exact
//! Hamming distance to each node visited on the way down.

use crate::bktree::node::{BkNode, NodeId};
use crate::spaces::hamming::hamming_distance;
use crate::storage::PointStorage;
use crate::ItemId;

pub struct Builder {
    arena: Vec<BkNode>,
}

impl Builder {
    pub fn build(storage: &PointStorage<u8>) -> (Vec<BkNode>, Option<NodeId>) {
        let _span = tracing::info_span!("bktree_build", n = storage.len()).entered();
        if storage.is_empty() {
            return (Vec::new(), None);
        }
        let mut builder = Builder { arena: Vec::new() };
        let root = builder.push(BkNode::new(0));

        for (i, row) in storage.iter_rows().enumerate().skip(1) {
            builder.insert(root, storage, i as ItemId, row);
        }

        tracing::debug!(unique_nodes = builder.arena.len(), "bktree build finished");
        (builder.arena, Some(root))
    }

    fn push(&mut self, node: BkNode) -> NodeId {
        let id = self.arena.len() as NodeId;
        self.arena.push(node);
        id
    }

    fn insert(&mut self, root: NodeId, storage: &PointStorage<u8>, id: ItemId, row: &[u8]) {
        let mut current = root;
        loop {
            let current_row = storage.row(self.arena[current as usize].id);
            let d = hamming_distance(current_row, row);
            if d == 0 {
                self.arena[current as usize].duplicates.push(id);
                return;
            }
            if let Some(&child) = self.arena[current as usize].children.get(&d) {
                current = child;
            } else {
                let new_node = self.push(BkNode::new(id));
                self.arena[current as usize].children.insert(d, new_node);
                return;
            }
        }
    }
}
