#![allow(non_snake_case)]

use crate::algebra::{Adjoint, FloatT, SparseFormatError, Symmetric};
#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::iter::zip;

/// Sparse matrix in standard Compressed Sparse Column (CSC) format
///
/// __Example usage__ : To construct the 3 x 3 matrix
/// ```text
/// A = [1.  3.  5.]
///     [2.  0.  6.]
///     [0.  4.  7.]
/// ```
///
/// ```no_run
/// use conic_admm::algebra::CscMatrix;
///
/// let A : CscMatrix<f64> = CscMatrix::new(
///    3,                                // m
///    3,                                // n
///    vec![0, 2, 4, 7],                 //colptr
///    vec![0, 1, 0, 2, 0, 1, 2],        //rowval
///    vec![1., 2., 3., 4., 5., 6., 7.], //nzval
///  );
///
/// // optional correctness check
/// assert!(A.check_format().is_ok());
///
/// ```
///

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
pub struct CscMatrix<T = f64> {
    /// number of rows
    pub m: usize,
    /// number of columns
    pub n: usize,
    /// CSC format column pointer.
    ///
    /// Ths field should have length `n+1`. The last entry corresponds
    /// to the the number of nonzeros and should agree with the lengths
    /// of the `rowval` and `nzval` fields.
    pub colptr: Vec<usize>,
    /// vector of row indices
    pub rowval: Vec<usize>,
    /// vector of non-zero matrix elements
    pub nzval: Vec<T>,
}

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    /// `CscMatrix` constructor.
    ///
    /// # Panics
    /// Makes rudimentary dimensional compatibility checks and panics on
    /// failure.   This constructor does __not__
    /// ensure that rows indices are all in bounds or that data is arranged
    /// such that entries within each column appear in order of increasing
    /// row index.   Use [`check_format`](CscMatrix::check_format) for that.
    ///

    pub fn new(m: usize, n: usize, colptr: Vec<usize>, rowval: Vec<usize>, nzval: Vec<T>) -> Self {
        assert_eq!(rowval.len(), nzval.len());
        assert_eq!(colptr.len(), n + 1);
        assert_eq!(colptr[n], rowval.len());
        CscMatrix {
            m,
            n,
            colptr,
            rowval,
            nzval,
        }
    }

    /// allocate space for a sparse matrix with `nnz` elements
    pub fn spalloc(size: (usize, usize), nnz: usize) -> Self {
        let (m, n) = size;
        let mut colptr = vec![0; n + 1];
        let rowval = vec![0; nnz];
        let nzval = vec![T::zero(); nnz];
        colptr[n] = nnz;

        CscMatrix::new(m, n, colptr, rowval, nzval)
    }

    /// An m x n matrix with no structural nonzeros
    pub fn zeros(size: (usize, usize)) -> Self {
        Self::spalloc(size, 0)
    }

    /// Identity matrix of size `n`
    pub fn identity(n: usize) -> Self {
        let colptr = (0usize..=n).collect();
        let rowval = (0usize..n).collect();
        let nzval = vec![T::one(); n];

        CscMatrix::new(n, n, colptr, rowval, nzval)
    }

    /// Assemble a matrix from (row, column, value) triplets.
    ///
    /// Entries are sorted by row within each column.  Repeated
    /// coordinates are summed into a single entry.
    ///
    /// # Panics
    /// Panics if the triplet arrays differ in length or if any index
    /// is out of bounds.
    pub fn new_from_triplets(m: usize, n: usize, I: Vec<usize>, J: Vec<usize>, V: Vec<T>) -> Self {
        assert_eq!(I.len(), J.len());
        assert_eq!(I.len(), V.len());
        assert!(I.iter().all(|&r| r < m));
        assert!(J.iter().all(|&c| c < n));

        // bucket entries by column
        let mut colptr = vec![0usize; n + 1];
        for &c in J.iter() {
            colptr[c] += 1;
        }
        let mut next = vec![0usize; n];
        let mut acc = 0;
        for (p, nx) in zip(colptr.iter_mut(), next.iter_mut()) {
            let count = *p;
            *p = acc;
            *nx = acc;
            acc += count;
        }
        colptr[n] = acc;

        let mut rowval = vec![0usize; acc];
        let mut nzval = vec![T::zero(); acc];
        for ((&r, &c), &v) in zip(zip(&I, &J), &V) {
            let dest = next[c];
            rowval[dest] = r;
            nzval[dest] = v;
            next[c] += 1;
        }

        // sort within each column and sum duplicates,
        // compacting the storage as we go
        let mut write = 0;
        let mut start = 0;
        for col in 0..n {
            let stop = colptr[col + 1];
            let mut entries: Vec<(usize, T)> =
                zip(&rowval[start..stop], &nzval[start..stop]).map(|(&r, &v)| (r, v)).collect();
            entries.sort_by_key(|&(r, _)| r);

            colptr[col] = write;
            for (r, v) in entries {
                if write > colptr[col] && rowval[write - 1] == r {
                    nzval[write - 1] += v;
                } else {
                    rowval[write] = r;
                    nzval[write] = v;
                    write += 1;
                }
            }
            start = stop;
        }
        colptr[n] = write;
        rowval.truncate(write);
        nzval.truncate(write);

        CscMatrix::new(m, n, colptr, rowval, nzval)
    }

    /// number of nonzeros
    pub fn nnz(&self) -> usize {
        self.colptr[self.n]
    }

    /// number of rows
    pub fn nrows(&self) -> usize {
        self.m
    }

    /// number of columns
    pub fn ncols(&self) -> usize {
        self.n
    }

    /// (rows, columns)
    pub fn size(&self) -> (usize, usize) {
        (self.m, self.n)
    }

    pub fn is_square(&self) -> bool {
        self.m == self.n
    }

    /// transpose
    pub fn t(&self) -> Adjoint<'_, Self> {
        Adjoint { src: self }
    }

    /// symmetric view
    pub fn sym(&self) -> Symmetric<'_, Self> {
        debug_assert!(self.is_triu());
        Symmetric { src: self }
    }

    /// Check that matrix data is correctly formatted.
    pub fn check_format(&self) -> Result<(), SparseFormatError> {
        if self.rowval.len() != self.nzval.len() {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        if self.colptr.is_empty()
            || (self.colptr.len() - 1) != self.n
            || self.colptr[self.n] != self.rowval.len()
        {
            return Err(SparseFormatError::IncompatibleDimension);
        }

        //check for colptr monotonicity
        if self.colptr.windows(2).any(|c| c[0] > c[1]) {
            return Err(SparseFormatError::BadColptr);
        }

        //check for rowval monotonicity within each column
        for col in 0..self.n {
            let rng = self.colptr[col]..self.colptr[col + 1];
            if self.rowval[rng].windows(2).any(|c| c[0] >= c[1]) {
                return Err(SparseFormatError::BadRowval);
            }
        }
        //check for row values out of bounds
        if !self.rowval.iter().all(|r| r < &self.m) {
            return Err(SparseFormatError::BadRowval);
        }

        Ok(())
    }

    /// Allocates a new matrix containing only entries from the upper triangular part
    pub fn to_triu(&self) -> Self {
        assert_eq!(self.m, self.n);
        let n = self.n;
        let mut colptr = vec![0; n + 1];
        let mut rowval = Vec::with_capacity(self.nnz());
        let mut nzval = Vec::with_capacity(self.nnz());

        for col in 0..n {
            let rng = self.colptr[col]..self.colptr[col + 1];
            for (&row, &val) in zip(&self.rowval[rng.clone()], &self.nzval[rng]) {
                if row <= col {
                    rowval.push(row);
                    nzval.push(val);
                }
            }
            colptr[col + 1] = rowval.len();
        }
        CscMatrix::new(n, n, colptr, rowval, nzval)
    }

    /// True if the matrix is upper triangular
    pub fn is_triu(&self) -> bool {
        // check lower triangle for any structural entries, regardless
        // of the values that may be assigned to them
        for col in 0..self.ncols() {
            let rows = &self.rowval[self.colptr[col]..self.colptr[col + 1]];
            if rows.iter().any(|&row| row > col) {
                return false;
            }
        }
        true
    }

    /// Returns the value at the given (row,col) index as an Option.
    /// Returns None if the given index is not a structural nonzero.
    ///
    /// # Panics
    /// Panics if the given index is out of bounds.
    pub fn get_entry(&self, idx: (usize, usize)) -> Option<T> {
        let (row, col) = idx;
        assert!(row < self.nrows() && col < self.ncols());

        let first = self.colptr[col];
        let last = self.colptr[col + 1];
        let rows_in_this_column = &self.rowval[first..last];
        match rows_in_this_column.binary_search(&row) {
            Ok(idx) => Some(self.nzval[first + idx]),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_matrix() -> CscMatrix<f64> {
        // A =
        //[ ⋅   4.0    ⋅    ⋅   12.0]
        //[1.0  5.0    ⋅    ⋅     ⋅ ]
        //[ ⋅   6.0    ⋅    ⋅   13.0]
        //[2.0  7.0  10.0   ⋅     ⋅ ]
        //[ ⋅   8.0  11.0   ⋅   14.0]
        //[3.0  9.0    ⋅    ⋅     ⋅ ]
        CscMatrix::new(
            6,
            5,
            vec![0, 3, 9, 11, 11, 14],
            vec![1, 3, 5, 0, 1, 2, 3, 4, 5, 3, 4, 0, 2, 4],
            vec![1., 2., 3., 4., 5., 6., 7., 8., 9., 10., 11., 12., 13., 14.],
        )
    }

    #[test]
    fn test_csc_get_entry() {
        let A = test_matrix();

        assert_eq!(A.get_entry((1, 0)), Some(1.));
        assert_eq!(A.get_entry((5, 0)), Some(3.));
        assert_eq!(A.get_entry((3, 1)), Some(7.));
        assert_eq!(A.get_entry((4, 2)), Some(11.));
        assert_eq!(A.get_entry((4, 4)), Some(14.));

        assert!(A.get_entry((0, 0)).is_none());
        assert!(A.get_entry((2, 2)).is_none());
        assert!(A.get_entry((1, 3)).is_none());
        assert!(A.get_entry((3, 4)).is_none());
        assert!(A.check_format().is_ok());
    }

    #[test]
    fn test_csc_from_triplets() {
        let A = test_matrix();

        // same entries, scrambled, with one entry split in two
        let I = vec![4, 0, 1, 3, 2, 5, 3, 1, 4, 2, 0, 5, 4, 3, 3];
        let J = vec![4, 1, 0, 2, 4, 0, 1, 1, 1, 1, 4, 1, 2, 0, 0];
        let V = vec![14., 4., 1., 10., 13., 3., 7., 5., 8., 6., 12., 9., 11., 1.5, 0.5];

        let B = CscMatrix::new_from_triplets(6, 5, I, J, V);
        assert!(B.check_format().is_ok());
        assert_eq!(A, B);
    }

    #[test]
    fn test_csc_triu() {
        // 3x3 dense with entries 1..9 columnwise
        let A = CscMatrix::new(
            3,
            3,
            vec![0, 3, 6, 9],
            vec![0, 1, 2, 0, 1, 2, 0, 1, 2],
            vec![1., 2., 3., 4., 5., 6., 7., 8., 9.],
        );
        assert!(!A.is_triu());
        let U = A.to_triu();
        assert!(U.is_triu());
        assert_eq!(U.colptr, vec![0, 1, 3, 6]);
        assert_eq!(U.nzval, vec![1., 4., 5., 7., 8., 9.]);
    }

    #[test]
    fn test_csc_check_format() {
        let mut A = test_matrix();
        A.rowval.swap(0, 1);
        assert_eq!(A.check_format(), Err(SparseFormatError::BadRowval));

        let mut A = test_matrix();
        A.colptr[2] = 1;
        assert_eq!(A.check_format(), Err(SparseFormatError::BadColptr));

        let mut A = test_matrix();
        A.nzval.pop();
        assert_eq!(A.check_format(), Err(SparseFormatError::IncompatibleDimension));
    }
}
