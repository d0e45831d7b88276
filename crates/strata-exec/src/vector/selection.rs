//! Selection vectors: row index indirections.

/// An ordered list of row indices into another vector.
///
/// Slicing a vector with a selection never copies data; selections over
/// selections compose into a single indirection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionVector {
    indices: Vec<usize>,
}

impl SelectionVector {
    /// Creates a selection from explicit indices.
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    /// Creates an empty selection with room for `capacity` indices.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: Vec::with_capacity(capacity),
        }
    }

    /// Selects `length` consecutive rows starting at `offset`.
    pub fn range(offset: usize, length: usize) -> Self {
        Self {
            indices: (offset..offset + length).collect(),
        }
    }

    /// Selects the same row `count` times.
    pub fn repeat(index: usize, count: usize) -> Self {
        Self {
            indices: vec![index; count],
        }
    }

    /// Appends an index.
    pub fn push(&mut self, index: usize) {
        self.indices.push(index);
    }

    /// Returns the number of selected rows.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns the source index of selected row `i`.
    pub fn get(&self, i: usize) -> usize {
        self.indices[i]
    }

    /// Returns the selected indices.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Returns an iterator over the selected indices.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Returns the largest selected index.
    pub fn max_index(&self) -> Option<usize> {
        self.indices.iter().copied().max()
    }

    /// Composes two selections: row `i` of the result reads
    /// `self[inner[i]]`.
    pub fn compose(&self, inner: &SelectionVector) -> SelectionVector {
        SelectionVector {
            indices: inner.iter().map(|i| self.indices[i]).collect(),
        }
    }
}

impl FromIterator<usize> for SelectionVector {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self {
            indices: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose() {
        let outer = SelectionVector::new(vec![4, 2, 0]);
        let inner = SelectionVector::new(vec![2, 2, 1]);
        assert_eq!(outer.compose(&inner).indices(), &[0, 0, 2]);
    }

    #[test]
    fn test_constructors() {
        assert_eq!(SelectionVector::range(3, 2).indices(), &[3, 4]);
        assert_eq!(SelectionVector::repeat(7, 3).indices(), &[7, 7, 7]);
        assert_eq!(SelectionVector::range(0, 4).max_index(), Some(3));
        assert!(SelectionVector::with_capacity(8).is_empty());
    }
}
