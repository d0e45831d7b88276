//! Per-row validity bitmap.

use strata_common::VALIDITY_BITS_PER_WORD;

/// Validity bitmap of a vector buffer.
///
/// A missing bitmap means every row is valid; the words are only
/// allocated once the first NULL is recorded. A set bit means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidityMask {
    words: Option<Vec<u64>>,
}

impl ValidityMask {
    /// Creates a mask with every row valid.
    pub fn all_valid() -> Self {
        Self::default()
    }

    /// Returns true if no bitmap has been allocated.
    pub fn is_all_valid(&self) -> bool {
        self.words.is_none()
    }

    /// Returns true if `row` is valid.
    pub fn is_valid(&self, row: usize) -> bool {
        match &self.words {
            None => true,
            Some(words) => words
                .get(row / VALIDITY_BITS_PER_WORD)
                .map_or(true, |w| (w >> (row % VALIDITY_BITS_PER_WORD)) & 1 == 1),
        }
    }

    /// Marks `row` as NULL.
    pub fn set_invalid(&mut self, row: usize) {
        let word = row / VALIDITY_BITS_PER_WORD;
        let words = self.words.get_or_insert_with(Vec::new);
        if words.len() <= word {
            words.resize(word + 1, u64::MAX);
        }
        words[word] &= !(1u64 << (row % VALIDITY_BITS_PER_WORD));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_allocation() {
        let mut mask = ValidityMask::all_valid();
        assert!(mask.is_all_valid());
        assert!(mask.is_valid(5000));

        mask.set_invalid(70);
        assert!(!mask.is_all_valid());
        assert!(!mask.is_valid(70));
        assert!(mask.is_valid(69));
        assert!(mask.is_valid(71));
        assert!(mask.is_valid(1000));
    }
}
