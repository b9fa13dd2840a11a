#![allow(non_snake_case)]
use crate::algebra::utils::{ipermute, permute};
use crate::algebra::*;
use core::cmp::{max, min};
use derive_builder::Builder;
use std::iter::zip;
use thiserror::Error;

/// Error codes returnable from [`QDLDLFactorisation`](QDLDLFactorisation) factor operations

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QDLDLError {
    #[error("Matrix dimension fields are incompatible")]
    IncompatibleDimension,
    #[error("Matrix has a zero column")]
    EmptyColumn,
    #[error("Matrix is not upper triangular")]
    NotUpperTriangular,
    #[error("Matrix factorization produced a zero pivot")]
    ZeroPivot,
    #[error("Invalid permutation vector")]
    InvalidPermutation,
    #[error("Fill reducing ordering failed")]
    OrderingFailed,
}

/// Required settings for [`QDLDLFactorisation`](QDLDLFactorisation)

#[derive(Builder, Debug, Clone)]
pub struct QDLDLSettings<T: FloatT> {
    /// multiplier on the AMD dense row threshold
    #[builder(default = "1.0")]
    pub amd_dense_scale: f64,
    /// user supplied ordering.  AMD is used if `None`
    #[builder(default = "None", setter(strip_option))]
    pub perm: Option<Vec<usize>>,
    /// compute the sparsity pattern of L only
    #[builder(default = "false")]
    pub logical: bool,
    /// expected signs of the pivots, all positive if `None`
    #[builder(default = "None", setter(strip_option))]
    pub Dsigns: Option<Vec<i8>>,
    #[builder(default = "true")]
    pub regularize_enable: bool,
    #[builder(default = "(1e-12).as_T()")]
    pub regularize_eps: T,
    #[builder(default = "(1e-7).as_T()")]
    pub regularize_delta: T,
}

impl<T> Default for QDLDLSettings<T>
where
    T: FloatT,
{
    fn default() -> QDLDLSettings<T> {
        QDLDLSettings {
            amd_dense_scale: 1.0,
            perm: None,
            logical: false,
            Dsigns: None,
            regularize_enable: true,
            regularize_eps: (1e-12).as_T(),
            regularize_delta: (1e-7).as_T(),
        }
    }
}

/// Performs $LDL^T$ factorization of a symmetric quasidefinite matrix
///
/// The input matrix must be square and upper triangular, with at least
/// one entry in every column.  The factors are those of the permuted
/// matrix `A[perm,perm]`.

#[derive(Debug)]
pub struct QDLDLFactorisation<T = f64> {
    /// permutation vector
    pub perm: Vec<usize>,
    /// strictly lower triangular factor, rows ascending within columns
    pub L: CscMatrix<T>,
    /// D and is inverse for A = LDL^T
    pub D: Vec<T>,
    pub Dinv: Vec<T>,
    workspace: QDLDLWorkspace<T>,
    is_logical: bool,
}

impl<T> QDLDLFactorisation<T>
where
    T: FloatT,
{
    pub fn new(
        Ain: &CscMatrix<T>,
        opts: Option<QDLDLSettings<T>>,
    ) -> Result<QDLDLFactorisation<T>, QDLDLError> {
        check_structure(Ain)?;

        let n = Ain.nrows();
        let opts = opts.unwrap_or_default();

        let (perm, iperm) = match opts.perm {
            Some(perm) => {
                let iperm = checked_invperm(&perm)?;
                (perm, iperm)
            }
            None => amd_ordering(Ain, opts.amd_dense_scale)?,
        };

        //permuted upper triangle, plus the map from the input's
        //entries into it for later value updates
        let (triuA, AtoPAPt) = permute_symmetric(Ain, &iperm);

        let mut Dsigns = vec![1_i8; n];
        if let Some(ds) = opts.Dsigns {
            if ds.len() != n {
                return Err(QDLDLError::IncompatibleDimension);
            }
            permute(&mut Dsigns, &ds, &perm);
        }

        let regularizer = Regularizer {
            enable: opts.regularize_enable,
            eps: opts.regularize_eps,
            delta: opts.regularize_delta,
            Dsigns,
            count: 0,
        };

        let mut workspace = QDLDLWorkspace::new(triuA, AtoPAPt, regularizer);

        let sumLnz = workspace.Lnz.iter().sum();
        let mut L = CscMatrix::spalloc((n, n), sumLnz);
        let mut D = vec![T::zero(); n];
        let mut Dinv = vec![T::zero(); n];

        workspace.factor(&mut L, &mut D, &mut Dinv, opts.logical)?;

        Ok(QDLDLFactorisation {
            perm,
            L,
            D,
            Dinv,
            workspace,
            is_logical: opts.logical,
        })
    }

    /// number of positive pivots in D
    pub fn positive_inertia(&self) -> usize {
        self.workspace.positive_inertia
    }

    /// number of pivots modified by dynamic regularization
    pub fn regularize_count(&self) -> usize {
        self.workspace.regularizer.count
    }

    /// Solves Ax = b using LDL factors for A, with x replacing b.
    ///
    /// # Panics
    /// Panics if the factorisation is logical only or if `b` has
    /// the wrong dimension
    pub fn solve(&mut self, b: &mut [T]) {
        assert!(!self.is_logical);
        assert_eq!(b.len(), self.D.len());

        let tmp = &mut self.workspace.fwork;
        permute(tmp, b, &self.perm);

        let L = &self.L;
        lsolve(&L.colptr, &L.rowval, &L.nzval, tmp);
        tmp.hadamard(&self.Dinv);
        ltsolve(&L.colptr, &L.rowval, &L.nzval, tmp);

        ipermute(b, tmp, &self.perm);
    }

    /// Overwrite entries of the factored matrix.  `indices` refer
    /// to positions in the `nzval` of the original input.  Values
    /// take effect at the next [`refactor`](Self::refactor)
    pub fn update_values(&mut self, indices: &[usize], values: &[T]) {
        assert_eq!(indices.len(), values.len());
        let nzval = &mut self.workspace.triuA.nzval;
        let AtoPAPt = &self.workspace.AtoPAPt;

        for (&idx, &v) in zip(indices, values) {
            nzval[AtoPAPt[idx]] = v;
        }
    }

    /// Numerical refactorization, reusing the symbolic analysis
    pub fn refactor(&mut self) -> Result<(), QDLDLError> {
        // a refactor only makes sense numerically
        self.is_logical = false;
        self.workspace
            .factor(&mut self.L, &mut self.D, &mut self.Dinv, false)
    }
}

fn check_structure<T: FloatT>(A: &CscMatrix<T>) -> Result<(), QDLDLError> {
    if !A.is_square() {
        return Err(QDLDLError::IncompatibleDimension);
    }
    if !A.is_triu() {
        return Err(QDLDLError::NotUpperTriangular);
    }
    if A.colptr.windows(2).any(|c| c[0] >= c[1]) {
        return Err(QDLDLError::EmptyColumn);
    }
    Ok(())
}

#[derive(Debug)]
struct Regularizer<T> {
    enable: bool,
    eps: T,
    delta: T,
    Dsigns: Vec<i8>,
    count: usize,
}

impl<T: FloatT> Regularizer<T> {
    // replace a pivot of the wrong sign or too small a magnitude
    fn apply(&mut self, k: usize, d: T) -> T {
        if !self.enable {
            return d;
        }
        let positive = self.Dsigns[k] > 0;
        let signed = if positive { d } else { -d };
        if signed < self.eps {
            self.count += 1;
            if positive {
                self.delta
            } else {
                -self.delta
            }
        } else {
            d
        }
    }
}

#[derive(Debug)]
struct QDLDLWorkspace<T> {
    etree: Vec<usize>,
    Lnz: Vec<usize>,
    iwork: Vec<usize>,
    bwork: Vec<bool>,
    fwork: Vec<T>,

    positive_inertia: usize,

    // permuted upper triangle PAPᵀ actually factored
    triuA: CscMatrix<T>,

    // entries of the input to entries of triuA
    AtoPAPt: Vec<usize>,

    regularizer: Regularizer<T>,
}

const QDLDL_UNKNOWN: usize = usize::MAX;

impl<T> QDLDLWorkspace<T>
where
    T: FloatT,
{
    fn new(triuA: CscMatrix<T>, AtoPAPt: Vec<usize>, regularizer: Regularizer<T>) -> Self {
        let n = triuA.ncols();
        let mut etree = vec![QDLDL_UNKNOWN; n];
        let mut Lnz = vec![0; n];
        let mut iwork = vec![0; n * 3];

        elimination_tree(&triuA, &mut iwork[0..n], &mut Lnz, &mut etree);

        Self {
            etree,
            Lnz,
            iwork,
            bwork: vec![false; n],
            fwork: vec![T::zero(); n],
            positive_inertia: 0,
            triuA,
            AtoPAPt,
            regularizer,
        }
    }

    // Up-looking factorization.  For each k, the k-th row of L solves
    // a sparse triangular system against the part of column k of A above
    // the diagonal, with nonzeros found by walking the elimination tree.
    fn factor(
        &mut self,
        L: &mut CscMatrix<T>,
        D: &mut [T],
        Dinv: &mut [T],
        logical: bool,
    ) -> Result<(), QDLDLError> {
        let A = &self.triuA;
        let n = A.n;
        let (Ap, Ai, Ax) = (&A.colptr, &A.rowval, &A.nzval);

        self.regularizer.count = 0;
        self.positive_inertia = 0;

        let y_markers = &mut self.bwork;
        let (y_idx, iwork) = self.iwork.split_at_mut(n);
        let (elim_buffer, next_colspace) = iwork.split_at_mut(n);
        let y_vals = &mut self.fwork;

        //Lp = cumsum(Lnz), starting from zero
        L.colptr[0] = 0;
        for k in 0..n {
            L.colptr[k + 1] = L.colptr[k] + self.Lnz[k];
        }

        y_markers.fill(false);
        y_vals.fill(T::zero());
        D.fill(T::zero());
        next_colspace.copy_from_slice(&L.colptr[0..n]);
        if logical {
            L.nzval.fill(T::zero());
            Dinv.fill(T::zero());
        }

        for k in 0..n {
            let mut nnz_y = 0;

            // find the nonzero pattern of row k of L
            for i in Ap[k]..Ap[k + 1] {
                let bidx = Ai[i];

                if bidx == k {
                    D[k] = Ax[i];
                    continue;
                }

                y_vals[bidx] = Ax[i];

                if y_markers[bidx] {
                    continue;
                }

                // walk up the tree until reaching a visited node,
                // then store the path in topological order
                let mut nnz_e = 0;
                let mut next_idx = bidx;
                while next_idx != QDLDL_UNKNOWN && next_idx < k && !y_markers[next_idx] {
                    y_markers[next_idx] = true;
                    elim_buffer[nnz_e] = next_idx;
                    nnz_e += 1;
                    next_idx = self.etree[next_idx];
                }
                while nnz_e != 0 {
                    nnz_e -= 1;
                    y_idx[nnz_y] = elim_buffer[nnz_e];
                    nnz_y += 1;
                }
            }

            // numeric solve along the pattern, placing row k of L
            for &cidx in y_idx[0..nnz_y].iter().rev() {
                let tmp_idx = next_colspace[cidx];

                if !logical {
                    let yc = y_vals[cidx];
                    let rng = L.colptr[cidx]..tmp_idx;
                    for (&Lij, &Lxj) in zip(&L.rowval[rng.clone()], &L.nzval[rng]) {
                        y_vals[Lij] -= Lxj * yc;
                    }
                    L.nzval[tmp_idx] = yc * Dinv[cidx];
                    D[k] -= yc * L.nzval[tmp_idx];
                }

                L.rowval[tmp_idx] = k;
                next_colspace[cidx] += 1;

                y_vals[cidx] = T::zero();
                y_markers[cidx] = false;
            }

            if logical {
                continue;
            }

            D[k] = self.regularizer.apply(k, D[k]);

            if D[k] == T::zero() {
                return Err(QDLDLError::ZeroPivot);
            }
            if D[k] > T::zero() {
                self.positive_inertia += 1;
            }
            Dinv[k] = T::recip(D[k]);
        }

        Ok(())
    }
}

// Elimination tree of an upper triangular matrix, and the
// number of nonzeros in each column of its L factor
fn elimination_tree<T: FloatT>(
    A: &CscMatrix<T>,
    work: &mut [usize],
    Lnz: &mut [usize],
    etree: &mut [usize],
) {
    work.fill(0);
    Lnz.fill(0);
    etree.fill(QDLDL_UNKNOWN);

    for j in 0..A.n {
        work[j] = j;
        for &row in &A.rowval[A.colptr[j]..A.colptr[j + 1]] {
            let mut i = row;
            while work[i] != j {
                if etree[i] == QDLDL_UNKNOWN {
                    etree[i] = j;
                }
                Lnz[i] += 1;
                work[i] = j;
                i = etree[i];
            }
        }
    }
}

// Solves (L+I)x = b, with x replacing b
fn lsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in 0..x.len() {
        let xi = x[i];
        let rng = Lp[i]..Lp[i + 1];
        for (&Lij, &Lxj) in zip(&Li[rng.clone()], &Lx[rng]) {
            x[Lij] -= Lxj * xi;
        }
    }
}

// Solves (L+I)'x = b, with x replacing b
fn ltsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in (0..x.len()).rev() {
        let rng = Lp[i]..Lp[i + 1];
        let s = zip(&Li[rng.clone()], &Lx[rng]).fold(T::zero(), |s, (&Lij, &Lxj)| s + Lxj * x[Lij]);
        x[i] -= s;
    }
}

// inverse permutation, with an error for anything that
// is not a permutation of 0..p.len()
fn checked_invperm(p: &[usize]) -> Result<Vec<usize>, QDLDLError> {
    let mut b = vec![QDLDL_UNKNOWN; p.len()];
    for (i, &j) in p.iter().enumerate() {
        if j >= p.len() || b[j] != QDLDL_UNKNOWN {
            return Err(QDLDLError::InvalidPermutation);
        }
        b[j] = i;
    }
    Ok(b)
}

// Upper triangle of the symmetric permutation of the upper triangular
// `A`, i.e. P = A[perm,perm] given iperm.  Rows within the columns of P
// are not sorted.  Follows Davis, "Direct Methods for Sparse Linear Systems"
fn permute_symmetric<T: FloatT>(A: &CscMatrix<T>, iperm: &[usize]) -> (CscMatrix<T>, Vec<usize>) {
    let n = A.n;
    let mut P = CscMatrix::<T>::spalloc((n, n), A.nnz());
    let mut AtoPAPt = vec![0; A.nnz()];

    // count entries in each column of P
    let mut next = vec![0; n + 1];
    for colA in 0..n {
        for &rowA in &A.rowval[A.colptr[colA]..A.colptr[colA + 1]] {
            next[max(iperm[rowA], iperm[colA])] += 1;
        }
    }

    let mut acc = 0;
    for (Pc, count) in zip(&mut P.colptr, &mut next) {
        *Pc = acc;
        acc += *count;
        *count = *Pc;
    }

    for colA in 0..n {
        let colP = iperm[colA];
        for idx in A.colptr[colA]..A.colptr[colA + 1] {
            let rowP = iperm[A.rowval[idx]];
            let col = max(colP, rowP);
            let dest = next[col];
            P.rowval[dest] = min(colP, rowP);
            P.nzval[dest] = A.nzval[idx];
            AtoPAPt[idx] = dest;
            next[col] += 1;
        }
    }
    (P, AtoPAPt)
}

fn amd_ordering<T: FloatT>(
    A: &CscMatrix<T>,
    amd_dense_scale: f64,
) -> Result<(Vec<usize>, Vec<usize>), QDLDLError> {
    let mut control = amd::Control::default();
    control.dense *= amd_dense_scale;
    let (perm, iperm, _info) = amd::order(A.nrows(), &A.colptr, &A.rowval, &control)
        .map_err(|_| QDLDLError::OrderingFailed)?;
    Ok((perm, iperm))
}

#[path = "test.rs"]
#[cfg(test)]
mod test;
