//---------------------------------------------------------
// low-level internal utilities for counting / filling entries
// in block partitioned sparse matrices.
//
// Assembly is two-pass: the colcount_* functions accumulate
// per-column counts in colptr, colcount_to_colptr converts them to
// fill positions, the fill_* functions place entries while advancing
// colptr, and backshift_colptrs restores a valid column pointer.
//---------------------------------------------------------

use crate::algebra::{CscMatrix, FloatT, MatrixShape};
use std::iter::zip;

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    // increment the self.colptr by the number of nonzeros
    // in a square diagonal matrix placed on the diagonal.
    pub(crate) fn colcount_diag(&mut self, initcol: usize, blockcols: usize) {
        let cols = self.colptr[initcol..(initcol + blockcols)].iter_mut();
        cols.for_each(|x| *x += 1);
    }

    // same as colcount_diag, but counts places
    // where the input matrix M has a missing
    // diagonal entry.  M must be square and TRIU
    pub(crate) fn colcount_missing_diag(&mut self, M: &CscMatrix<T>, initcol: usize) {
        assert_eq!(M.colptr.len(), M.n + 1);
        assert!(self.colptr.len() >= M.n + initcol);

        for i in 0..M.n {
            if !M.has_diagonal_entry(i) {
                self.colptr[i + initcol] += 1;
            }
        }
    }

    // increment the self.colptr by the number of nonzeros in M
    pub(crate) fn colcount_block(&mut self, M: &CscMatrix<T>, initcol: usize, shape: MatrixShape) {
        match shape {
            MatrixShape::T => {
                for row in M.rowval.iter() {
                    self.colptr[initcol + row] += 1;
                }
            }
            MatrixShape::N => {
                for i in 0..M.n {
                    self.colptr[initcol + i] += M.colptr[i + 1] - M.colptr[i];
                }
            }
        }
    }

    // populate values from M using the self.colptr as indicator of
    // next fill location in each column.  If a map is provided, the
    // destination of every entry of M is recorded there
    pub(crate) fn fill_block(
        &mut self,
        M: &CscMatrix<T>,
        mut MtoK: Option<&mut [usize]>,
        initrow: usize,
        initcol: usize,
        shape: MatrixShape,
    ) {
        for i in 0..M.n {
            let rng = M.colptr[i]..M.colptr[i + 1];
            for (j, (&Mrow, &Mval)) in zip(&M.rowval[rng.clone()], &M.nzval[rng.clone()]).enumerate()
            {
                let (row, col) = match shape {
                    MatrixShape::T => (i + initrow, Mrow + initcol),
                    MatrixShape::N => (Mrow + initrow, i + initcol),
                };

                let dest = self.colptr[col];
                self.rowval[dest] = row;
                self.nzval[dest] = Mval;
                self.colptr[col] += 1;
                if let Some(map) = MtoK.as_deref_mut() {
                    map[rng.start + j] = dest;
                }
            }
        }
    }

    // Populate the diagonal with 0s using the K.colptr as indicator of
    // next fill location in each column
    pub(crate) fn fill_diag(&mut self, diagtoK: &mut [usize], offset: usize, blockdim: usize) {
        for (i, col) in (offset..(offset + blockdim)).enumerate() {
            let dest = self.colptr[col];
            self.rowval[dest] = col;
            self.nzval[dest] = T::zero(); //structural zero
            self.colptr[col] += 1;
            diagtoK[i] = dest;
        }
    }

    // same as fill_diag, but only places zero entries where
    // the input matrix M has a missing diagonal entry.
    // M must be square and TRIU
    pub(crate) fn fill_missing_diag(&mut self, M: &CscMatrix<T>, initcol: usize) {
        for i in 0..M.n {
            if !M.has_diagonal_entry(i) {
                let col = i + initcol;
                let dest = self.colptr[col];
                self.rowval[dest] = col;
                self.nzval[dest] = T::zero(); //structural zero
                self.colptr[col] += 1;
            }
        }
    }

    pub(crate) fn colcount_to_colptr(&mut self) {
        let mut currentptr = 0;
        for p in &mut self.colptr {
            let count = *p;
            *p = currentptr;
            currentptr += count;
        }
    }

    pub(crate) fn backshift_colptrs(&mut self) {
        self.colptr.rotate_right(1);
        self.colptr[0] = 0;
    }

    // true if the last entry of column i is on the
    // diagonal.  Only meaningful for TRIU data
    fn has_diagonal_entry(&self, i: usize) -> bool {
        self.colptr[i] != self.colptr[i + 1] && self.rowval[self.colptr[i + 1] - 1] == i
    }
}
