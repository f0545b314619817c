//! Binary serialization (C7): a length-prefixed, little-endian,
//! versioned format with a trailing CRC32, shared by the VPT and BKT
//! facades.
//!
//! Layout: `MAGIC | VERSION | KIND | METRIC | ELEMENT_TYPE | D | N |
//! point storage | tree body | CRC32`. The CRC32 covers every byte
//! that precedes it. `dump -> load -> dump` is byte-identical for any
//! index state, including the empty index — every variable-order
//! collection (a BKT node's children) is written in a canonical sort
//! order rather than hash-map iteration order.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::bktree::node::{BkNode, NodeId as BkNodeId};
use crate::bktree::BkTree;
use crate::metric::{ElementType, Metric, MetricKind};
use crate::storage::PointStorage;
use crate::vptree::node::{Bounds, NodeId as VpNodeId, VpNode};
use crate::vptree::VpTree;
use crate::{Error, ItemId, Result};

const MAGIC: [u8; 4] = *b"VPKT";
const VERSION: u32 = 1;

const KIND_VPT: u8 = 1;
const KIND_BKT: u8 = 2;

const VP_TAG_LEAF: u8 = 0;
const VP_TAG_INTERNAL: u8 = 1;

/// A cursor over a byte slice that turns short reads into
/// [`Error::CorruptInput`] instead of panicking.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| Error::CorruptInput("unexpected end of input".to_string()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.take(1).map(|b| b[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.take(4).map(|mut b| b.read_u32::<LittleEndian>().expect("exactly 4 bytes"))
    }

    fn read_u64(&mut self) -> Result<u64> {
        self.take(8).map(|mut b| b.read_u64::<LittleEndian>().expect("exactly 8 bytes"))
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.take(8).map(|mut b| b.read_f64::<LittleEndian>().expect("exactly 8 bytes"))
    }

    fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }
}

fn write_header(out: &mut Vec<u8>, kind: u8, metric: MetricKind, element_type: ElementType, d: usize, n: usize) {
    out.extend_from_slice(&MAGIC);
    out.write_u32::<LittleEndian>(VERSION).unwrap();
    out.write_u8(kind).unwrap();
    out.write_u8(metric.as_tag()).unwrap();
    out.write_u8(element_type.as_tag()).unwrap();
    out.write_u32::<LittleEndian>(d as u32).unwrap();
    out.write_u64::<LittleEndian>(n as u64).unwrap();
}

struct Header {
    kind: u8,
    metric: MetricKind,
    element_type: ElementType,
    d: usize,
    n: usize,
}

fn read_header(r: &mut Reader<'_>) -> Result<Header> {
    let magic = r.take(4)?;
    if magic != MAGIC {
        return Err(Error::CorruptInput("bad magic".to_string()));
    }
    let version = r.read_u32()?;
    if version != VERSION {
        return Err(Error::CorruptInput(format!("unsupported version {version}")));
    }
    let kind = r.read_u8()?;
    let metric_tag = r.read_u8()?;
    let element_tag = r.read_u8()?;
    let metric = MetricKind::from_tag(metric_tag)
        .ok_or_else(|| Error::CorruptInput(format!("unknown metric tag {metric_tag}")))?;
    let element_type = ElementType::from_tag(element_tag)
        .ok_or_else(|| Error::CorruptInput(format!("unknown element type tag {element_tag}")))?;
    let d = r.read_u32()? as usize;
    let n = r.read_u64()? as usize;
    Ok(Header { kind, metric, element_type, d, n })
}

fn finish_with_crc(mut out: Vec<u8>) -> Vec<u8> {
    let crc = crc32fast::hash(&out);
    out.write_u32::<LittleEndian>(crc).unwrap();
    out
}

fn verify_crc(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < 4 {
        return Err(Error::CorruptInput("input too short to contain a CRC32 trailer".to_string()));
    }
    let (body, trailer) = bytes.split_at(bytes.len() - 4);
    let stored = (&trailer[..]).read_u32::<LittleEndian>().expect("exactly 4 bytes");
    let computed = crc32fast::hash(body);
    if stored != computed {
        return Err(Error::CorruptInput("CRC32 mismatch".to_string()));
    }
    Ok(body)
}

// --- VPT -------------------------------------------------------------

pub fn write_vptree<M: Metric>(tree: &VpTree<M>) -> Vec<u8>
where
    M::Elem: bytemuck::Pod,
{
    let mut out = Vec::new();
    write_header(&mut out, KIND_VPT, M::KIND, M::ELEMENT_TYPE, tree.dimensions(), tree.len());
    out.extend_from_slice(bytemuck::cast_slice(tree.storage().as_flat()));

    match tree.root() {
        None => out.write_u8(0).unwrap(),
        Some(root) => {
            out.write_u8(1).unwrap();
            write_vp_node(root, tree.arena(), &mut out);
        }
    }

    finish_with_crc(out)
}

fn write_vp_node<M: Metric>(node: VpNodeId, arena: &[VpNode<M>], out: &mut Vec<u8>) {
    match &arena[node as usize] {
        VpNode::Leaf { ids } => {
            out.write_u8(VP_TAG_LEAF).unwrap();
            out.write_u32::<LittleEndian>(ids.len() as u32).unwrap();
            for &id in ids {
                out.write_u32::<LittleEndian>(id).unwrap();
            }
        }
        VpNode::Internal { pivot_id, mu, left, right, left_bounds, right_bounds } => {
            out.write_u8(VP_TAG_INTERNAL).unwrap();
            out.write_u32::<LittleEndian>(*pivot_id).unwrap();
            out.write_f64::<LittleEndian>(M::dist_to_f64(*mu)).unwrap();
            out.write_f64::<LittleEndian>(M::dist_to_f64(left_bounds.min)).unwrap();
            out.write_f64::<LittleEndian>(M::dist_to_f64(left_bounds.max)).unwrap();
            out.write_f64::<LittleEndian>(M::dist_to_f64(right_bounds.min)).unwrap();
            out.write_f64::<LittleEndian>(M::dist_to_f64(right_bounds.max)).unwrap();
            write_vp_node(*left, arena, out);
            write_vp_node(*right, arena, out);
        }
    }
}

pub fn read_vptree<M: Metric>(bytes: &[u8]) -> Result<VpTree<M>>
where
    M::Elem: bytemuck::Pod,
{
    tracing::debug!(bytes = bytes.len(), "loading vptree");
    let body = verify_crc(bytes)?;
    let mut r = Reader::new(body);
    let header = read_header(&mut r)?;
    if header.kind != KIND_VPT {
        return Err(Error::CorruptInput("expected a VPT body".to_string()));
    }
    if header.metric != M::KIND || header.element_type != M::ELEMENT_TYPE {
        return Err(Error::TypeMismatch);
    }

    let elem_size = std::mem::size_of::<M::Elem>();
    let flat_bytes = r.take(header.n * header.d * elem_size)?;
    let flat: Vec<M::Elem> = bytemuck::cast_slice(flat_bytes).to_vec();
    let storage = PointStorage::from_flat(flat, header.d)?;

    let has_root = r.read_u8()?;
    let mut arena = Vec::new();
    let root = match has_root {
        0 => None,
        1 => Some(read_vp_node::<M>(&mut r, &mut arena)?),
        other => return Err(Error::CorruptInput(format!("unknown root marker {other}"))),
    };

    if !r.remaining().is_empty() {
        return Err(Error::CorruptInput("trailing bytes after tree body".to_string()));
    }

    Ok(VpTree::from_parts(storage, arena, root))
}

fn read_vp_node<M: Metric>(r: &mut Reader<'_>, arena: &mut Vec<VpNode<M>>) -> Result<VpNodeId> {
    let tag = r.read_u8()?;
    let node = match tag {
        VP_TAG_LEAF => {
            let count = r.read_u32()? as usize;
            let mut ids = Vec::with_capacity(count);
            for _ in 0..count {
                ids.push(r.read_u32()?);
            }
            VpNode::Leaf { ids }
        }
        VP_TAG_INTERNAL => {
            let pivot_id = r.read_u32()?;
            let mu = M::dist_from_f64(r.read_f64()?);
            let left_bounds =
                Bounds { min: M::dist_from_f64(r.read_f64()?), max: M::dist_from_f64(r.read_f64()?) };
            let right_bounds =
                Bounds { min: M::dist_from_f64(r.read_f64()?), max: M::dist_from_f64(r.read_f64()?) };
            let left = read_vp_node::<M>(r, arena)?;
            let right = read_vp_node::<M>(r, arena)?;
            VpNode::Internal { pivot_id, mu, left, right, left_bounds, right_bounds }
        }
        other => return Err(Error::CorruptInput(format!("unknown VPT node tag {other}"))),
    };
    let id = arena.len() as VpNodeId;
    arena.push(node);
    Ok(id)
}

// --- BKT ---------------------------------------------------------------

pub fn write_bktree(tree: &BkTree) -> Vec<u8> {
    let mut out = Vec::new();
    write_header(&mut out, KIND_BKT, MetricKind::Hamming, ElementType::U8, tree.dimensions(), tree.storage().len());
    out.extend_from_slice(tree.storage().as_flat());

    match tree.root() {
        None => out.write_u8(0).unwrap(),
        Some(root) => {
            out.write_u8(1).unwrap();
            write_bk_node(root, tree.arena(), &mut out);
        }
    }

    finish_with_crc(out)
}

fn write_bk_node(node: BkNodeId, arena: &[BkNode], out: &mut Vec<u8>) {
    let n = &arena[node as usize];
    out.write_u32::<LittleEndian>(n.id).unwrap();
    out.write_u32::<LittleEndian>(n.duplicates.len() as u32).unwrap();
    for &dup in &n.duplicates {
        out.write_u32::<LittleEndian>(dup).unwrap();
    }

    let mut children: Vec<(u32, BkNodeId)> = n.children.iter().map(|(&label, &child)| (label, child)).collect();
    children.sort_unstable_by_key(|&(label, _)| label);

    out.write_u32::<LittleEndian>(children.len() as u32).unwrap();
    for (label, child) in children {
        out.write_u32::<LittleEndian>(label).unwrap();
        write_bk_node(child, arena, out);
    }
}

pub fn read_bktree(bytes: &[u8]) -> Result<BkTree> {
    tracing::debug!(bytes = bytes.len(), "loading bktree");
    let body = verify_crc(bytes)?;
    let mut r = Reader::new(body);
    let header = read_header(&mut r)?;
    if header.kind != KIND_BKT {
        return Err(Error::CorruptInput("expected a BKT body".to_string()));
    }
    if header.metric != MetricKind::Hamming || header.element_type != ElementType::U8 {
        return Err(Error::TypeMismatch);
    }

    let flat = r.take(header.n * header.d)?.to_vec();
    let storage = PointStorage::from_flat(flat, header.d)?;

    let has_root = r.read_u8()?;
    let mut arena = Vec::new();
    let root = match has_root {
        0 => None,
        1 => Some(read_bk_node(&mut r, &mut arena)?),
        other => return Err(Error::CorruptInput(format!("unknown root marker {other}"))),
    };

    if !r.remaining().is_empty() {
        return Err(Error::CorruptInput("trailing bytes after tree body".to_string()));
    }

    Ok(BkTree::from_parts(storage, arena, root))
}

fn read_bk_node(r: &mut Reader<'_>, arena: &mut Vec<BkNode>) -> Result<BkNodeId> {
    let id: ItemId = r.read_u32()?;
    let dup_count = r.read_u32()? as usize;
    let mut duplicates = Vec::with_capacity(dup_count);
    for _ in 0..dup_count {
        duplicates.push(r.read_u32()?);
    }

    let mut node = BkNode::new(id);
    node.duplicates = duplicates;

    let child_count = r.read_u32()? as usize;
    let mut children = Vec::with_capacity(child_count);
    for _ in 0..child_count {
        let label = r.read_u32()?;
        let child = read_bk_node(r, arena)?;
        children.push((label, child));
    }
    for (label, child) in children {
        node.children.insert(label, child);
    }

    let node_id = arena.len() as BkNodeId;
    arena.push(node);
    Ok(node_id)
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
    fn vptree_round_trips() {
        let rows: Vec<[f32; 2]> = (0..40).map(|i| [i as f32, (i * 2) as f32]).collect();
        let tree = VpTree::<L2>::build(storage_2d(&rows));
        let bytes = write_vptree(&tree);
        let loaded = read_vptree::<L2>(&bytes).unwrap();
        assert_eq!(loaded.len(), tree.len());

        let query = [5.0, 10.0];
        assert_eq!(loaded.search_knn(&query, 3).unwrap(), tree.search_knn(&query, 3).unwrap());

        let bytes_again = write_vptree(&loaded);
        assert_eq!(bytes, bytes_again);
    }

    #[test]
    fn empty_vptree_round_trips() {
        let tree = VpTree::<L2>::build(PointStorage::<f32>::empty());
        let bytes = write_vptree(&tree);
        let loaded = read_vptree::<L2>(&bytes).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(bytes, write_vptree(&loaded));
    }

    #[test]
    fn bktree_round_trips() {
        let rows: Vec<[u8; 8]> = (0..20u8).map(|i| [i, i.wrapping_mul(3), 0, 0, 0, 0, 0, 0]).collect();
        let flat: Vec<u8> = rows.iter().flatten().copied().collect();
        let tree = BkTree::build(PointStorage::from_flat(flat, 8).unwrap());
        let bytes = write_bktree(&tree);
        let loaded = read_bktree(&bytes).unwrap();
        assert_eq!(loaded.size(), tree.size());

        let query = [3u8, 9, 0, 0, 0, 0, 0, 0];
        let got: Vec<ItemId> = loaded.find_threshold(&query, 4).unwrap().into_iter().map(|(id, _, _)| id).collect();
        let want: Vec<ItemId> = tree.find_threshold(&query, 4).unwrap().into_iter().map(|(id, _, _)| id).collect();
        assert_eq!(got, want);

        assert_eq!(bytes, write_bktree(&loaded));
    }

    #[test]
    fn rejects_bad_magic() {
        let tree = VpTree::<L2>::build(storage_2d(&[[0.0, 0.0]]));
        let mut bytes = write_vptree(&tree);
        bytes[0] ^= 0xff;
        let err = read_vptree::<L2>(&bytes).unwrap_err();
        assert!(matches!(err, Error::CorruptInput(_)));
    }

    #[test]
    fn rejects_corrupted_crc() {
        let tree = VpTree::<L2>::build(storage_2d(&[[0.0, 0.0]]));
        let mut bytes = write_vptree(&tree);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let err = read_vptree::<L2>(&bytes).unwrap_err();
        assert!(matches!(err, Error::CorruptInput(_)));
    }

    #[test]
    fn rejects_truncated_input() {
        let tree = VpTree::<L2>::build(storage_2d(&[[0.0, 0.0]]));
        let bytes = write_vptree(&tree);
        let err = read_vptree::<L2>(&bytes[..bytes.len() - 10]).unwrap_err();
        assert!(matches!(err, Error::CorruptInput(_)));
    }
}
