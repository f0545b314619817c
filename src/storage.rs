//! Point storage: the flat, row-major buffer an index owns after `set`.
//!
//! Mirrors the teacher's flat `Cow<[f32]>` / `UnalignedVector` vectors
//! rather than a `Vec<Vec<_>>` of per-row allocations — one contiguous
//! allocation, indexed by `id * dimensions`.

use crate::{Error, ItemId, Result};

/// A 2-D matrix of `D`-dimensional rows, stored flat and row-major.
///
/// `set` on a facade index takes ownership of its input this way: the
/// row at external id `i` lives at `data[i * dimensions..(i + 1) * dimensions]`,
/// and that id is the stable external handle returned by every query.
#[derive(Debug, Clone)]
pub struct PointStorage<T> {
    data: Vec<T>,
    dimensions: usize,
}

impl<T: Copy> PointStorage<T> {
    /// Builds storage from a flat, row-major buffer. Fails with
    /// [`Error::ShapeError`] unless `flat.len()` is an exact multiple of
    /// `dimensions` (or `dimensions == 0` is only allowed for zero rows).
    pub fn from_flat(flat: Vec<T>, dimensions: usize) -> Result<Self> {
        if flat.is_empty() {
            return Ok(PointStorage { data: flat, dimensions: 0 });
        }
        if dimensions == 0 {
            return Err(Error::ShapeError(
                "non-empty matrix must have at least one column".to_string(),
            ));
        }
        if flat.len() % dimensions != 0 {
            return Err(Error::ShapeError(format!(
                "flat buffer of length {} is not a multiple of {} dimensions",
                flat.len(),
                dimensions
            )));
        }
        Ok(PointStorage { data: flat, dimensions })
    }

    pub fn empty() -> Self {
        PointStorage { data: Vec::new(), dimensions: 0 }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.data.len() / self.dimensions
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, id: ItemId) -> &[T] {
        let start = id as usize * self.dimensions;
        &self.data[start..start + self.dimensions]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks_exact(self.dimensions.max(1)).take(self.len())
    }

    pub fn as_flat(&self) -> &[T] {
        &self.data
    }

    pub fn into_flat(self) -> Vec<T> {
        self.data
    }

    /// Validates a query row against this storage's built dimension.
    pub fn check_query_dim(&self, query: &[T]) -> Result<()> {
        if query.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                received: query.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_flat_buffer() {
        let err = PointStorage::<f32>::from_flat(vec![1.0, 2.0, 3.0], 2).unwrap_err();
        assert!(matches!(err, Error::ShapeError(_)));
    }

    #[test]
    fn empty_matrix_has_zero_dimension() {
        let storage = PointStorage::<f32>::from_flat(Vec::new(), 8).unwrap();
        assert_eq!(storage.dimensions(), 0);
        assert_eq!(storage.len(), 0);
    }

    #[test]
    fn row_indexing() {
        let storage = PointStorage::from_flat(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2).unwrap();
        assert_eq!(storage.row(0), &[1.0, 2.0]);
        assert_eq!(storage.row(2), &[5.0, 6.0]);
        assert_eq!(storage.len(), 3);
    }
}
