//! The named, attributed dataset container: an external collaborator's
//! on-disk vector blob, round-tripping independently of whichever index
//! later consumes it.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{Error, Result};

const MAGIC: [u8; 4] = *b"VPDS";
const VERSION: u32 = 1;

/// A named float32 matrix plus free-text metadata, serialized
/// independently of any index (compare the teacher's `Metadata`
/// record, which carries the same kind of side-channel attributes
/// alongside the tree data it describes).
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub description: String,
    pub dimensions: usize,
    pub rows: Vec<f32>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, rows: Vec<f32>, dimensions: usize) -> Result<Self> {
        if !rows.is_empty() && dimensions == 0 {
            return Err(Error::ShapeError("non-empty dataset must have at least one column".to_string()));
        }
        if dimensions != 0 && rows.len() % dimensions != 0 {
            return Err(Error::ShapeError(format!(
                "flat buffer of length {} is not a multiple of {} dimensions",
                rows.len(),
                dimensions
            )));
        }
        Ok(Dataset { name: name.into(), description: description.into(), dimensions, rows })
    }

    pub fn len(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.rows.len() / self.dimensions
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC);
        out.write_u32::<LittleEndian>(VERSION).unwrap();
        write_string(&mut out, &self.name);
        write_string(&mut out, &self.description);
        out.write_u32::<LittleEndian>(self.dimensions as u32).unwrap();
        out.write_u64::<LittleEndian>(self.rows.len() as u64).unwrap();
        out.extend_from_slice(bytemuck::cast_slice(&self.rows));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut pos = 0usize;
        let magic = take(bytes, &mut pos, 4)?;
        if magic != MAGIC {
            return Err(Error::CorruptInput("bad magic".to_string()));
        }
        let version = (&take(bytes, &mut pos, 4)?[..]).read_u32::<LittleEndian>().unwrap();
        if version != VERSION {
            return Err(Error::CorruptInput(format!("unsupported version {version}")));
        }
        let name = read_string(bytes, &mut pos)?;
        let description = read_string(bytes, &mut pos)?;
        let dimensions = (&take(bytes, &mut pos, 4)?[..]).read_u32::<LittleEndian>().unwrap() as usize;
        let count = (&take(bytes, &mut pos, 8)?[..]).read_u64::<LittleEndian>().unwrap() as usize;
        let raw = take(bytes, &mut pos, count * std::mem::size_of::<f32>())?;
        let rows: Vec<f32> = bytemuck::cast_slice(raw).to_vec();
        if pos != bytes.len() {
            return Err(Error::CorruptInput("trailing bytes after dataset body".to_string()));
        }
        Dataset::new(name, description, rows, dimensions)
    }
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.write_u32::<LittleEndian>(s.len() as u32).unwrap();
    out.extend_from_slice(s.as_bytes());
}

fn read_string(bytes: &[u8], pos: &mut usize) -> Result<String> {
    let len = (&take(bytes, pos, 4)?[..]).read_u32::<LittleEndian>().unwrap() as usize;
    let raw = take(bytes, pos, len)?;
    String::from_utf8(raw.to_vec()).map_err(|_| Error::CorruptInput("invalid UTF-8 in dataset string".to_string()))
}

fn take<'a>(bytes: &'a [u8], pos: &mut usize, n: usize) -> Result<&'a [u8]> {
    let end = pos.checked_add(n).filter(|&end| end <= bytes.len()).ok_or_else(|| {
        Error::CorruptInput("unexpected end of input".to_string())
    })?;
    let slice = &bytes[*pos..end];
    *pos = end;
    Ok(slice)
}
