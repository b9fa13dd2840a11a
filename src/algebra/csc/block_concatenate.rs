#![allow(non_snake_case)]
use crate::algebra::{CscMatrix, FloatT, MatrixConcatenationError, MatrixShape};

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    /// Block diagonal concatenation of matrices.
    /// Errors if no blocks are given
    pub fn blockdiag(mats: &[&Self]) -> Result<Self, MatrixConcatenationError> {
        if mats.is_empty() {
            return Err(MatrixConcatenationError::IncompatibleDimension);
        }

        let nrows = mats.iter().map(|m| m.nrows()).sum();
        let ncols = mats.iter().map(|m| m.ncols()).sum();
        let nnzM = mats.iter().map(|m| m.nnz()).sum();
        let mut M = CscMatrix::<T>::spalloc((nrows, ncols), nnzM);

        // assemble the column counts
        M.colptr.fill(0);

        let mut nextcol = 0;
        for mat in mats {
            M.colcount_block(mat, nextcol, MatrixShape::N);
            nextcol += mat.ncols();
        }

        M.colcount_to_colptr();

        // fill in data and rebuild colptr
        let mut nextrow = 0;
        let mut nextcol = 0;
        for mat in mats {
            M.fill_block(mat, None, nextrow, nextcol, MatrixShape::N);
            nextrow += mat.nrows();
            nextcol += mat.ncols();
        }

        M.backshift_colptrs();

        Ok(M)
    }

    /// Horizontal and vertical concatentation of matrix blocks,
    /// given as a slice of block rows.
    /// Errors if given data of incompatible dimensions
    pub fn hvcat(mats: &[&[&Self]]) -> Result<Self, MatrixConcatenationError> {
        // check for consistent block dimensions
        hvcat_dim_check(mats)?;

        // dimensions are consistent and nonzero, so count
        // total rows and columns by counting along the border
        let nrows = mats.iter().map(|blockrow| blockrow[0].nrows()).sum();
        let ncols = mats[0].iter().map(|topblock| topblock.ncols()).sum();
        let nnzM = mats
            .iter()
            .flat_map(|blockrow| blockrow.iter())
            .map(|mat| mat.nnz())
            .sum();

        let mut M = CscMatrix::<T>::spalloc((nrows, ncols), nnzM);

        // assemble the column counts
        M.colptr.fill(0);
        let mut currentcol = 0;
        for i in 0..mats[0].len() {
            for blockrow in mats {
                M.colcount_block(blockrow[i], currentcol, MatrixShape::N);
            }
            currentcol += mats[0][i].ncols();
        }

        M.colcount_to_colptr();

        // fill in data and rebuild colptr.  Blocks within each
        // block column are filled top to bottom, so row indices
        // stay sorted within every column
        let mut currentcol = 0;
        for i in 0..mats[0].len() {
            let mut currentrow = 0;
            for blockrow in mats {
                M.fill_block(blockrow[i], None, currentrow, currentcol, MatrixShape::N);
                currentrow += blockrow[i].nrows();
            }
            currentcol += mats[0][i].ncols();
        }

        M.backshift_colptrs();

        Ok(M)
    }
}

fn hvcat_dim_check<T: FloatT>(mats: &[&[&CscMatrix<T>]]) -> Result<(), MatrixConcatenationError> {
    // error if no blocks
    if mats.is_empty() || mats[0].is_empty() {
        return Err(MatrixConcatenationError::IncompatibleDimension);
    };

    // error unless every block row has the same number of blocks
    let len0 = mats[0].len();
    if mats.iter().any(|blockrow| blockrow.len() != len0) {
        return Err(MatrixConcatenationError::IncompatibleDimension);
    }

    //row checks
    for blockrow in mats {
        let rows = blockrow[0].nrows();
        if blockrow.iter().any(|mat| mat.nrows() != rows) {
            return Err(MatrixConcatenationError::IncompatibleDimension);
        }
    }

    // column checks
    for (blockcol, topblock) in mats[0].iter().enumerate() {
        let cols = topblock.ncols();
        if mats.iter().any(|matrow| matrow[blockcol].ncols() != cols) {
            return Err(MatrixConcatenationError::IncompatibleDimension);
        }
    }

    Ok(())
}
