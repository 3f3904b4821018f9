use crate::error::{Error, Result};
use crate::selection::SelectionVector;
use crate::vector::{UnifiedVectorFormat, Vector};
use value::ComplexLogicalType;

/// Default chunk capacity, mirroring the vectorized-execution constant
/// every operator batches rows against.
pub const DEFAULT_VECTOR_CAPACITY: usize = 2048;

/// DataChunk is the in-flight unit of work between operators: a fixed
/// capacity set of aligned columns sharing one cardinality.
#[derive(Debug, Clone)]
pub struct DataChunk {
    columns: Vec<Vector>,
    cardinality: usize,
    capacity: usize,
}

impl DataChunk {
    pub fn new(types: &[ComplexLogicalType], capacity: usize) -> Self {
        DataChunk {
            columns: types.iter().map(|t| Vector::new_flat(t.clone(), capacity)).collect(),
            cardinality: 0,
            capacity,
        }
    }

    pub fn with_default_capacity(types: &[ComplexLogicalType]) -> Self {
        Self::new(types, DEFAULT_VECTOR_CAPACITY)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_cardinality(&mut self, c: usize) {
        debug_assert!(c <= self.capacity);
        self.cardinality = c;
    }

    pub fn column(&self, i: usize) -> &Vector {
        &self.columns[i]
    }

    pub fn column_mut(&mut self, i: usize) -> &mut Vector {
        &mut self.columns[i]
    }

    pub fn columns(&self) -> &[Vector] {
        &self.columns
    }

    pub fn types(&self) -> Vec<ComplexLogicalType> {
        self.columns.iter().map(|c| c.type_().clone()).collect()
    }

    pub fn value(&self, col: usize, row: usize) -> value::Value {
        self.columns[col].get_or_null(row)
    }

    pub fn set_value(&mut self, col: usize, row: usize, v: value::Value) {
        self.columns[col].set_value(row, v);
    }

    /// column_index resolves a requested alias to a column position,
    /// tolerating a leading `/` the way the columnar GROUP BY and update
    /// paths resolve their key and aggregate aliases.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| {
            let alias = c.type_().alias();
            alias == name || format!("/{}", alias) == name || alias == format!("/{}", name)
        })
    }

    /// Appends `other`'s rows onto the end of this chunk. Doubles capacity
    /// when `resize` is set and the combined cardinality overflows; errors
    /// otherwise, matching the source's `append(..., resize)` contract.
    pub fn append(&mut self, other: &DataChunk, resize: bool) -> Result<()> {
        if other.cardinality == 0 {
            return Ok(());
        }
        if self.column_count() != other.column_count() {
            return Err(Error::ColumnCountMismatch {
                left: self.column_count(),
                right: other.column_count(),
            });
        }
        let new_size = self.cardinality + other.cardinality;
        if new_size > self.capacity {
            if resize {
                self.resize(next_power_of_two(new_size));
            } else {
                return Err(Error::CapacityExceeded {
                    extra: other.cardinality,
                    capacity: self.capacity,
                });
            }
        }
        for i in 0..self.column_count() {
            other.columns[i].copy(&mut self.columns[i], None, other.cardinality, 0, self.cardinality)?;
        }
        self.cardinality = new_size;
        Ok(())
    }

    /// Narrows this chunk in place to the rows named by `selection`,
    /// turning every column into a dictionary over `selection`.
    pub fn slice(&mut self, selection: &SelectionVector, count: usize) {
        for col in &mut self.columns {
            *col = col.slice(selection, count);
        }
        self.cardinality = count;
    }

    /// reference makes this chunk a zero-copy alias of `other`.
    pub fn reference(&mut self, other: &DataChunk) {
        self.capacity = other.capacity;
        self.cardinality = other.cardinality;
        self.columns = other.columns.clone();
    }

    /// Splits off every column from `at` onward into a new chunk.
    pub fn split(&mut self, at: usize) -> DataChunk {
        let tail = self.columns.split_off(at);
        DataChunk {
            columns: tail,
            cardinality: self.cardinality,
            capacity: self.capacity,
        }
    }

    /// Appends `other`'s columns (not rows) onto this chunk's column list —
    /// used to fuse a join's left and right output side by side.
    pub fn fuse(&mut self, mut other: DataChunk) {
        debug_assert_eq!(self.cardinality, other.cardinality);
        self.columns.append(&mut other.columns);
    }

    pub fn flatten(&mut self) {
        let card = self.cardinality;
        for col in &mut self.columns {
            col.flatten(card);
        }
    }

    pub fn to_unified_format(&self) -> Vec<UnifiedVectorFormat> {
        self.columns.iter().map(|c| c.to_unified_format(self.cardinality)).collect()
    }

    /// Hashes every row across all columns into one combined hash vector —
    /// the multi-key GROUP BY/hash-join hashing path.
    pub fn hash(&self) -> Vec<u64> {
        self.hash_columns(&(0..self.column_count()).collect::<Vec<_>>())
    }

    pub fn hash_columns(&self, column_ids: &[usize]) -> Vec<u64> {
        assert!(!column_ids.is_empty());
        let mut result = self.columns[column_ids[0]].hash(self.cardinality);
        for &col in &column_ids[1..] {
            self.columns[col].combine_hash(&mut result, self.cardinality);
        }
        result
    }

    /// Doubles (or grows to the requested size if larger) every column's
    /// backing buffer; never shrinks cardinality below the new capacity.
    pub fn resize(&mut self, new_capacity: usize) {
        let new_capacity = if new_capacity > self.capacity {
            if is_power_of_two(new_capacity) {
                new_capacity
            } else {
                next_power_of_two(new_capacity)
            }
        } else {
            new_capacity
        };
        if new_capacity > self.capacity {
            tracing::debug!(from = self.capacity, to = new_capacity, "growing data-chunk capacity");
        }
        for col in &mut self.columns {
            col.resize(self.capacity, new_capacity);
        }
        self.capacity = new_capacity;
        if self.cardinality > new_capacity {
            self.cardinality = new_capacity;
        }
    }

    pub fn reset(&mut self) {
        self.cardinality = 0;
    }
}

fn is_power_of_two(n: usize) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

fn next_power_of_two(n: usize) -> usize {
    n.next_power_of_two()
}

#[cfg(test)]
mod test {
    use super::*;
    use value::{LogicalType, Value};

    fn int_types(n: usize) -> Vec<ComplexLogicalType> {
        vec![ComplexLogicalType::new(LogicalType::Integer); n]
    }

    #[test]
    fn cardinality_never_exceeds_capacity() {
        let chunk = DataChunk::new(&int_types(2), 8);
        assert!(chunk.cardinality() <= chunk.capacity());
    }

    #[test]
    fn all_columns_share_capacity() {
        let chunk = DataChunk::new(&int_types(3), 16);
        for c in chunk.columns() {
            assert_eq!(c.len(), 16);
        }
    }

    #[test]
    fn append_resizes_when_allowed() {
        let mut chunk = DataChunk::new(&int_types(1), 2);
        chunk.set_cardinality(2);
        chunk.set_value(0, 0, Value::from_i32(1));
        chunk.set_value(0, 1, Value::from_i32(2));

        let mut other = DataChunk::new(&int_types(1), 2);
        other.set_cardinality(2);
        other.set_value(0, 0, Value::from_i32(3));
        other.set_value(0, 1, Value::from_i32(4));

        chunk.append(&other, true).unwrap();
        assert_eq!(chunk.cardinality(), 4);
        assert_eq!(chunk.value(0, 3).as_i64(), Some(4));
    }

    #[test]
    fn append_without_resize_fails_on_overflow() {
        let mut chunk = DataChunk::new(&int_types(1), 1);
        chunk.set_cardinality(1);
        let mut other = DataChunk::new(&int_types(1), 1);
        other.set_cardinality(1);
        assert!(matches!(chunk.append(&other, false), Err(Error::CapacityExceeded { .. })));
    }

    #[test]
    fn column_index_tolerates_leading_slash() {
        let mut chunk = DataChunk::new(&[ComplexLogicalType::new(LogicalType::Integer).with_alias("amount")], 4);
        chunk.set_cardinality(1);
        assert_eq!(chunk.column_index("amount"), Some(0));
        assert_eq!(chunk.column_index("/amount"), Some(0));
    }

    #[test]
    fn hash_is_stable_for_equal_rows() {
        let mut chunk = DataChunk::new(&int_types(1), 2);
        chunk.set_cardinality(2);
        chunk.set_value(0, 0, Value::from_i32(5));
        chunk.set_value(0, 1, Value::from_i32(5));
        let hashes = chunk.hash();
        assert_eq!(hashes[0], hashes[1]);
    }
}
