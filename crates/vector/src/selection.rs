/// SelectionVector is an indirection layer: index `i` names the source row
/// that logical position `i` reads from. An identity selection is the
/// no-op case used whenever a vector hasn't been sliced.
#[derive(Debug, Clone)]
pub struct SelectionVector {
    indices: Vec<u32>,
}

impl SelectionVector {
    pub fn identity(count: usize) -> Self {
        SelectionVector {
            indices: (0..count as u32).collect(),
        }
    }

    pub fn from_indices(indices: Vec<u32>) -> Self {
        SelectionVector { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn get(&self, i: usize) -> usize {
        self.indices[i] as usize
    }

    pub fn set_index(&mut self, i: usize, source_row: usize) {
        self.indices[i] = source_row as u32;
    }

    /// Composes `self` with a further `inner` selection: logical position
    /// `i` resolves through `inner` first, then through `self` — used when
    /// slicing an already-sliced (dictionary) vector.
    pub fn merge(&self, inner: &SelectionVector, count: usize) -> SelectionVector {
        let mut out = Vec::with_capacity(count);
        for i in 0..count {
            out.push(self.indices[inner.get(i)]);
        }
        SelectionVector::from_indices(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identity_maps_each_row_to_itself() {
        let sel = SelectionVector::identity(3);
        assert_eq!(sel.get(0), 0);
        assert_eq!(sel.get(2), 2);
    }

    #[test]
    fn merge_composes_through_inner_first() {
        let outer = SelectionVector::from_indices(vec![10, 11, 12]);
        let inner = SelectionVector::from_indices(vec![2, 0]);
        let merged = outer.merge(&inner, 2);
        assert_eq!(merged.get(0), 12);
        assert_eq!(merged.get(1), 10);
    }
}
