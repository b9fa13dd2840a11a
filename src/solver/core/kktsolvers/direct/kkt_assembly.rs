#![allow(non_snake_case)]

use crate::algebra::*;

/// Positions of the problem data within the `nzval` of the KKT matrix
#[derive(Debug, Clone)]
pub(crate) struct KKTDataMap {
    /// entries of P
    pub P: Vec<usize>,
    /// entries of A, placed transposed in the upper right block
    pub A: Vec<usize>,
    /// diagonal of the upper left block
    pub diagP: Vec<usize>,
    /// diagonal of the lower right block, i.e. the -1/ρ terms
    pub diag_rho: Vec<usize>,
}

/// Upper triangle of `[P 0; A 0]ᵀ`-style KKT structure
///
/// ```text
/// [P + 0I   Aᵀ]
/// [  ⋅      0I]
/// ```
///
/// with every diagonal entry structurally present.  Values on the
/// diagonal are left at P's diagonal (or zero) and must be set by the caller.
pub(crate) fn assemble_kkt_matrix<T: FloatT>(
    P: &CscMatrix<T>,
    A: &CscMatrix<T>,
) -> (CscMatrix<T>, KKTDataMap) {
    let (m, n) = A.size();
    assert_eq!(P.size(), (n, n));

    let mut map = KKTDataMap {
        P: vec![0; P.nnz()],
        A: vec![0; A.nnz()],
        diagP: vec![0; n],
        diag_rho: vec![0; m],
    };

    let nnz_diagP = (0..n).filter(|&j| P.get_entry((j, j)).is_some()).count();
    let nnzKKT = P.nnz() + (n - nnz_diagP) + A.nnz() + m;

    let mut K = CscMatrix::<T>::spalloc((m + n, m + n), nnzKKT);

    // column counts
    K.colptr.fill(0);
    K.colcount_block(P, 0, MatrixShape::N);
    K.colcount_missing_diag(P, 0);
    K.colcount_block(A, n, MatrixShape::T);
    K.colcount_diag(n, m);
    K.colcount_to_colptr();

    // fill, column order preserving sorted rows
    K.fill_block(P, Some(&mut map.P), 0, 0, MatrixShape::N);
    K.fill_missing_diag(P, 0);
    K.fill_block(A, Some(&mut map.A), 0, n, MatrixShape::T);
    K.fill_diag(&mut map.diag_rho, n, m);
    K.backshift_colptrs();

    // the matrix is triu, so every diagonal entry is last in its column
    for (j, d) in map.diagP.iter_mut().enumerate() {
        *d = K.colptr[j + 1] - 1;
    }

    (K, map)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_kkt_assembly() {
        // P = [1 2; ⋅ ⋅] (missing second diagonal), A = [3 0; 4 5; 0 6]
        let P = CscMatrix::new(2, 2, vec![0, 1, 2], vec![0, 0], vec![1., 2.]);
        let A = CscMatrix::new(3, 2, vec![0, 2, 4], vec![0, 1, 1, 2], vec![3., 4., 5., 6.]);

        let (K, map) = assemble_kkt_matrix(&P, &A);

        assert!(K.check_format().is_ok());
        assert!(K.is_triu());
        assert_eq!(K.size(), (5, 5));
        assert_eq!(K.nnz(), 2 + 1 + 4 + 3);

        for (j, &d) in map.diagP.iter().enumerate() {
            assert_eq!(K.rowval[d], j);
        }
        for (i, &d) in map.diag_rho.iter().enumerate() {
            assert_eq!(K.rowval[d], 2 + i);
        }
        for (k, &dest) in map.A.iter().enumerate() {
            assert_eq!(K.nzval[dest], A.nzval[k]);
        }
        for (k, &dest) in map.P.iter().enumerate() {
            assert_eq!(K.nzval[dest], P.nzval[k]);
        }

        assert_eq!(K.get_entry((0, 3)), Some(4.));
        assert_eq!(K.get_entry((1, 3)), Some(5.));
        assert_eq!(K.get_entry((0, 2)), Some(3.));
        assert_eq!(K.get_entry((1, 4)), Some(6.));
    }
}
