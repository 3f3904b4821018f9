/// ValidityBitmap runs parallel to a vector/column's value buffer: bit `i`
/// clear means row `i` is null. A bitmap with no clear bits at all collapses
/// to "all valid" and is represented without allocating words, mirroring the
/// common fast path where no row in a segment is ever null.
#[derive(Debug, Clone)]
pub struct ValidityBitmap {
    words: Vec<u64>,
    len: usize,
    all_valid: bool,
}

const BITS: usize = 64;

impl ValidityBitmap {
    pub fn new_all_valid(len: usize) -> Self {
        ValidityBitmap {
            words: Vec::new(),
            len,
            all_valid: true,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn ensure_words(&mut self) {
        if self.all_valid {
            self.words = vec![u64::MAX; (self.len + BITS - 1) / BITS.max(1)];
            self.all_valid = false;
        }
    }

    pub fn is_valid(&self, i: usize) -> bool {
        debug_assert!(i < self.len);
        if self.all_valid {
            return true;
        }
        (self.words[i / BITS] >> (i % BITS)) & 1 == 1
    }

    pub fn is_null(&self, i: usize) -> bool {
        !self.is_valid(i)
    }

    pub fn set_valid(&mut self, i: usize, valid: bool) {
        debug_assert!(i < self.len);
        if valid && self.all_valid {
            return;
        }
        self.ensure_words();
        let word = &mut self.words[i / BITS];
        if valid {
            *word |= 1 << (i % BITS);
        } else {
            *word &= !(1 << (i % BITS));
        }
    }

    pub fn resize(&mut self, new_len: usize) {
        if !self.all_valid {
            self.words.resize((new_len + BITS - 1) / BITS.max(1), u64::MAX);
        }
        self.len = new_len;
    }

    pub fn all_valid(&self) -> bool {
        self.all_valid
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fresh_bitmap_is_all_valid() {
        let bm = ValidityBitmap::new_all_valid(4);
        assert!(bm.is_valid(0));
        assert!(bm.is_valid(3));
    }

    #[test]
    fn clearing_a_bit_marks_it_null() {
        let mut bm = ValidityBitmap::new_all_valid(4);
        bm.set_valid(2, false);
        assert!(bm.is_null(2));
        assert!(bm.is_valid(0));
        assert!(bm.is_valid(1));
        assert!(bm.is_valid(3));
    }

    #[test]
    fn resize_preserves_existing_bits() {
        let mut bm = ValidityBitmap::new_all_valid(4);
        bm.set_valid(1, false);
        bm.resize(10);
        assert!(bm.is_null(1));
        assert!(bm.is_valid(9));
    }
}
