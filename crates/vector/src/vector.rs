use crate::bitmap::ValidityBitmap;
use crate::error::{Error, Result};
use crate::selection::SelectionVector;
use value::{ComplexLogicalType, Value};

/// VectorType tags how a vector's values are actually stored:
/// a flat per-row buffer, a single value broadcast over the whole batch, a
/// referenced buffer indirected through a selection, or a cheap arithmetic
/// sequence (used by row-id columns). The filter/predicate layer must treat
/// all four uniformly through `value`/`to_unified_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorType {
    Flat,
    Constant,
    Dictionary,
    Sequence,
}

#[derive(Debug, Clone)]
enum Storage {
    Flat(Vec<Value>),
    Constant(Box<Value>),
    Dictionary {
        buffer: Box<Vector>,
        selection: SelectionVector,
    },
    Sequence {
        start: i64,
        increment: i64,
    },
}

/// Vector is a single column buffer: a logical type, a validity bitmap, and
/// one of the storage representations above.
#[derive(Debug, Clone)]
pub struct Vector {
    ty: ComplexLogicalType,
    vector_type: VectorType,
    validity: ValidityBitmap,
    storage: Storage,
}

impl Vector {
    pub fn new_flat(ty: ComplexLogicalType, capacity: usize) -> Self {
        let default = Value::default_for(&ty);
        Vector {
            validity: ValidityBitmap::new_all_valid(capacity),
            storage: Storage::Flat(vec![default; capacity]),
            ty,
            vector_type: VectorType::Flat,
        }
    }

    pub fn new_constant(ty: ComplexLogicalType, value: Value, len: usize) -> Self {
        Vector {
            validity: ValidityBitmap::new_all_valid(len),
            storage: Storage::Constant(Box::new(value)),
            ty,
            vector_type: VectorType::Constant,
        }
    }

    pub fn new_sequence(ty: ComplexLogicalType, start: i64, increment: i64, len: usize) -> Self {
        Vector {
            validity: ValidityBitmap::new_all_valid(len),
            storage: Storage::Sequence { start, increment },
            ty,
            vector_type: VectorType::Sequence,
        }
    }

    pub fn type_(&self) -> &ComplexLogicalType {
        &self.ty
    }

    pub fn vector_type(&self) -> VectorType {
        self.vector_type
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Flat(v) => v.len(),
            Storage::Constant(_) | Storage::Sequence { .. } => self.validity.len(),
            Storage::Dictionary { selection, .. } => selection.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resolve(&self, i: usize) -> (usize, &Vector) {
        match &self.storage {
            Storage::Dictionary { buffer, selection } => {
                let (j, v) = buffer.resolve(selection.get(i));
                (j, v)
            }
            _ => (i, self),
        }
    }

    pub fn is_null(&self, i: usize) -> bool {
        let (j, base) = self.resolve(i);
        match &base.storage {
            Storage::Dictionary { .. } => unreachable!("resolve() never returns a dictionary base"),
            _ => base.validity.is_null(j),
        }
    }

    pub fn value(&self, i: usize) -> Value {
        let (j, base) = self.resolve(i);
        if base.validity.is_null(j) {
            return Value::default_for(&base.ty);
        }
        match &base.storage {
            Storage::Flat(v) => v[j].clone(),
            Storage::Constant(v) => (**v).clone(),
            Storage::Sequence { start, increment } => {
                let raw = Value::from_i64(start + (j as i64) * increment);
                raw.cast_as(&base.ty).unwrap_or(raw)
            }
            Storage::Dictionary { .. } => unreachable!(),
        }
    }

    /// Materializes this vector's value at `i`, returning `Value::null()`
    /// when the slot is marked invalid — distinct from `value()`, which
    /// returns a typed-but-null default so callers can still inspect `ty`.
    pub fn get_or_null(&self, i: usize) -> Value {
        if self.is_null(i) {
            Value::null()
        } else {
            self.value(i)
        }
    }

    pub fn set_value(&mut self, i: usize, v: Value) {
        self.ensure_flat_for_write();
        if let Storage::Flat(data) = &mut self.storage {
            self.validity.set_valid(i, !v.is_null());
            data[i] = v;
        }
    }

    pub fn set_null(&mut self, i: usize, is_null: bool) {
        self.ensure_flat_for_write();
        self.validity.set_valid(i, !is_null);
    }

    fn ensure_flat_for_write(&mut self) {
        if !matches!(self.storage, Storage::Flat(_)) {
            let len = self.len();
            self.flatten(len);
        }
    }

    /// Materializes a dictionary/constant/sequence vector into a flat
    /// per-row buffer — the dictionary-compaction step every operator that
    /// writes in place (Filter's child output, Update's target row) needs
    /// before it can mutate individual cells.
    pub fn flatten(&mut self, count: usize) {
        if self.vector_type == VectorType::Flat {
            return;
        }
        let mut data = Vec::with_capacity(count);
        let mut validity = ValidityBitmap::new_all_valid(count);
        for i in 0..count {
            if self.is_null(i) {
                validity.set_valid(i, false);
                data.push(Value::default_for(&self.ty));
            } else {
                data.push(self.value(i));
            }
        }
        self.storage = Storage::Flat(data);
        self.validity = validity;
        self.vector_type = VectorType::Flat;
    }

    /// Wraps this vector in a dictionary indirection over `selection`,
    /// without copying the underlying buffer — the scan/filter fast path.
    pub fn slice(&self, selection: &SelectionVector, count: usize) -> Vector {
        let sel = if let Storage::Dictionary {
            buffer,
            selection: inner,
        } = &self.storage
        {
            return Vector {
                ty: self.ty.clone(),
                vector_type: VectorType::Dictionary,
                validity: ValidityBitmap::new_all_valid(count),
                storage: Storage::Dictionary {
                    buffer: buffer.clone(),
                    selection: inner.merge(selection, count),
                },
            };
        } else {
            selection.clone()
        };
        Vector {
            ty: self.ty.clone(),
            vector_type: VectorType::Dictionary,
            validity: ValidityBitmap::new_all_valid(count),
            storage: Storage::Dictionary {
                buffer: Box::new(self.clone()),
                selection: sel,
            },
        }
    }

    /// Copies `count` values from `self[src_off..]` into `target[tgt_off..]`,
    /// optionally following `selection` for the source indices.
    pub fn copy(
        &self,
        target: &mut Vector,
        selection: Option<&SelectionVector>,
        count: usize,
        src_off: usize,
        tgt_off: usize,
    ) -> Result<()> {
        target.ensure_flat_for_write();
        for i in 0..count {
            let src_idx = match selection {
                Some(sel) => sel.get(src_off + i),
                None => src_off + i,
            };
            if src_idx >= self.len() {
                return Err(Error::OutOfBounds {
                    index: src_idx,
                    cardinality: self.len(),
                });
            }
            let v = self.get_or_null(src_idx);
            target.set_value(tgt_off + i, v);
        }
        Ok(())
    }

    /// Reference makes `self` an alias of `other` (zero-copy): used by
    /// `DataChunk::reference` when one chunk should observe another's data.
    pub fn reference(&mut self, other: &Vector) {
        *self = other.clone();
    }

    pub fn resize(&mut self, old_capacity: usize, new_capacity: usize) {
        let _ = old_capacity;
        self.ensure_flat_for_write();
        if let Storage::Flat(data) = &mut self.storage {
            data.resize(new_capacity, Value::default_for(&self.ty));
        }
        self.validity.resize(new_capacity);
    }

    /// A canonical view used by predicate/hash code: a selection vector plus
    /// a validity mask, decoupling "how is this vector physically stored"
    /// from "what do I read at logical row i".
    pub fn to_unified_format(&self, count: usize) -> UnifiedVectorFormat {
        let mut validity = ValidityBitmap::new_all_valid(count);
        for i in 0..count {
            validity.set_valid(i, !self.is_null(i));
        }
        UnifiedVectorFormat {
            selection: SelectionVector::identity(count),
            validity,
        }
    }

    pub fn hash_row(&self, i: usize) -> u64 {
        fxhash::hash64(self.get_or_null(i).to_group_key().as_bytes())
    }

    pub fn hash(&self, count: usize) -> Vec<u64> {
        (0..count).map(|i| self.hash_row(i)).collect()
    }

    /// Folds this vector's per-row hash into an already-computed hash
    /// vector, the way multi-column GROUP BY/hash-join keys are built.
    pub fn combine_hash(&self, running: &mut [u64], count: usize) {
        for i in 0..count {
            let h = self.hash_row(i);
            running[i] = running[i].rotate_left(5) ^ h;
        }
    }
}

/// UnifiedVectorFormat is the canonical read-only view handed to predicate
/// evaluation: a selection (identity here since callers already resolved
/// dictionary indirection through `value`/`is_null`) and a validity mask.
#[derive(Debug, Clone)]
pub struct UnifiedVectorFormat {
    pub selection: SelectionVector,
    pub validity: ValidityBitmap,
}
