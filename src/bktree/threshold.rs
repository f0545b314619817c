//! The BKT threshold engine (C6): recursive radius walk pruned by the
//! edge-label range `[max(0, d - T), d + T]`.

use crate::bktree::node::{BkNode, NodeId};
use crate::spaces::hamming::hamming_distance;
use crate::storage::PointStorage;
use crate::{ItemId, Result};

pub struct BkSearch<'a> {
    arena: &'a [BkNode],
    storage: &'a PointStorage<u8>,
}

/// One match: the indexed point's id, its distance to the query, and a
/// reference to its stored byte-vector.
pub type Match<'a> = (ItemId, u32, &'a [u8]);

impl<'a> BkSearch<'a> {
    pub fn new(arena: &'a [BkNode], storage: &'a PointStorage<u8>) -> Self {
        BkSearch { arena, storage }
    }

    pub fn find_threshold(&self, root: Option<NodeId>, query: &[u8], threshold: u32) -> Result<Vec<Match<'a>>> {
        let Some(root) = root else {
            return Ok(Vec::new());
        };
        self.storage.check_query_dim(query)?;
        let mut out = Vec::new();
        self.visit(root, query, threshold, &mut out);
        Ok(out)
    }

    #[cfg(not(feature = "parallel"))]
    pub fn find_threshold_batch(
        &self,
        root: Option<NodeId>,
        queries: &[&[u8]],
        threshold: u32,
    ) -> Result<Vec<Vec<Match<'a>>>> {
        queries.iter().map(|q| self.find_threshold(root, q, threshold)).collect()
    }

    #[cfg(feature = "parallel")]
    pub fn find_threshold_batch(
        &self,
        root: Option<NodeId>,
        queries: &[&[u8]],
        threshold: u32,
    ) -> Result<Vec<Vec<Match<'a>>>> {
        use rayon::prelude::*;
        queries.par_iter().map(|q| self.find_threshold(root, q, threshold)).collect()
    }

    fn visit(&self, node: NodeId, query: &[u8], threshold: u32, out: &mut Vec<Match<'a>>) {
        let n = &self.arena[node as usize];
        let value = self.storage.row(n.id);
        let d = hamming_distance(query, value);

        if d <= threshold {
            out.push((n.id, d, value));
            for &dup in &n.duplicates {
                out.push((dup, d, value));
            }
        }

        let lo = d.saturating_sub(threshold);
        let hi = d + threshold;
        for (&label, &child) in &n.children {
            if label >= lo && label <= hi {
                self.visit(child, query, threshold, out);
            }
        }
    }
}
