#![allow(non_snake_case)]

use num_traits::Num;
use std::iter::zip;

/// Sparse vector type, used internally to map between
/// packed triangles of different sizes

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseVector<T = f64> {
    /// vector dimension
    pub n: usize,
    /// vector of entry indices
    pub nzind: Vec<usize>,
    /// vector of non-zero vector elements
    pub nzval: Vec<T>,
}

impl<T> SparseVector<T>
where
    T: Num + Copy,
{
    /// Creates a `SparseVector` from a dense slice.
    pub fn new(values: &[T]) -> Self {
        let (nzind, nzval) = values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != T::zero())
            .map(|(i, &v)| (i, v))
            .unzip();
        SparseVector {
            n: values.len(),
            nzind,
            nzval,
        }
    }

    /// Creates a `SparseVector` from index / value pairs.
    ///
    /// # Panics
    /// Panics if the indices are not strictly increasing and within `0..n`
    pub fn from_parts(n: usize, nzind: Vec<usize>, nzval: Vec<T>) -> Self {
        assert_eq!(nzind.len(), nzval.len());
        assert!(nzind.windows(2).all(|w| w[0] < w[1]));
        assert!(nzind.last().map_or(true, |&i| i < n));
        SparseVector { n, nzind, nzval }
    }

    pub fn nnz(&self) -> usize {
        self.nzval.len()
    }

    /// iterator over (index, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        zip(self.nzind.iter().copied(), self.nzval.iter().copied())
    }
}

impl<T> From<SparseVector<T>> for Vec<T>
where
    T: Num + Copy,
{
    fn from(sv: SparseVector<T>) -> Vec<T> {
        let mut v = vec![T::zero(); sv.n];
        for (i, nz) in zip(sv.nzind, sv.nzval) {
            v[i] = nz;
        }
        v
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sparsevector_new() {
        let v = vec![0.1, 0.3, 0.0, 0.0, 0.4, 0.0];

        let vs = SparseVector::new(&v);

        assert_eq!(vs.n, v.len());
        assert_eq!(vs.nnz(), 3);
        assert_eq!(vs.nzind, vec![0, 1, 4]);
        assert_eq!(vs.nzval, vec![0.1, 0.3, 0.4]);

        let vback: Vec<f64> = vs.into();
        assert_eq!(v, vback);
    }

    #[test]
    fn test_sparsevector_index_values() {
        let vs = SparseVector::from_parts(10, vec![1, 4, 9], vec![7usize, 0, 2]);
        let pairs: Vec<_> = vs.iter().collect();
        assert_eq!(pairs, vec![(1, 7), (4, 0), (9, 2)]);
    }
}
