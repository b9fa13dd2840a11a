#![allow(non_snake_case)]
use super::DefaultVariables;
use crate::algebra::*;

// ---------------
// equilibration data
// ---------------

/// Diagonal scaling produced by the Ruiz equilibration procedure.
///
/// The scaled problem is
/// `P̂ = c D P D`, `q̂ = c D q`, `Â = E A D`, `b̂ = E b`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalScaling<T> {
    /// Vector of variable scaling terms
    pub d: Vec<T>,
    /// Vector of inverse variable scaling terms
    pub dinv: Vec<T>,
    /// Vector of constraint scaling terms
    pub e: Vec<T>,
    /// Vector of inverse constraint scaling terms
    pub einv: Vec<T>,
    /// overall scaling for objective function
    pub c: T,
    pub cinv: T,
}

/// Problem scaling.  `Identity` until equilibration has run, so that
/// unscaling an unscaled problem does not touch any data.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ScaleMatrices<T> {
    #[default]
    Identity,
    Diagonal(DiagonalScaling<T>),
}

impl<T> ScaleMatrices<T>
where
    T: FloatT,
{
    pub fn is_identity(&self) -> bool {
        matches!(self, ScaleMatrices::Identity)
    }

    /// objective scale c
    pub fn c(&self) -> T {
        match self {
            ScaleMatrices::Identity => T::one(),
            ScaleMatrices::Diagonal(s) => s.c,
        }
    }

    pub(crate) fn d(&self) -> Option<&[T]> {
        match self {
            ScaleMatrices::Identity => None,
            ScaleMatrices::Diagonal(s) => Some(&s.d),
        }
    }

    pub(crate) fn dinv(&self) -> Option<&[T]> {
        match self {
            ScaleMatrices::Identity => None,
            ScaleMatrices::Diagonal(s) => Some(&s.dinv),
        }
    }

    pub(crate) fn e(&self) -> Option<&[T]> {
        match self {
            ScaleMatrices::Identity => None,
            ScaleMatrices::Diagonal(s) => Some(&s.e),
        }
    }

    pub(crate) fn einv(&self) -> Option<&[T]> {
        match self {
            ScaleMatrices::Identity => None,
            ScaleMatrices::Diagonal(s) => Some(&s.einv),
        }
    }

    pub(crate) fn cinv(&self) -> T {
        match self {
            ScaleMatrices::Identity => T::one(),
            ScaleMatrices::Diagonal(s) => s.cinv,
        }
    }

    // pad with unit scaling for variables and rows added to the problem
    pub(crate) fn extend(&mut self, n: usize, m: usize) {
        if let ScaleMatrices::Diagonal(s) = self {
            s.d.resize(n, T::one());
            s.dinv.resize(n, T::one());
            s.e.resize(m, T::one());
            s.einv.resize(m, T::one());
        }
    }

    /// Maps iterates of the scaled problem to the unscaled one, i.e.
    /// `x = D x̂`, `s = E⁻¹ ŝ`, `μ = E μ̂ / c`.  The variables may be
    /// shorter than the scaling, in which case the leading entries of
    /// the scaling are used.
    pub fn unscale_variables(&self, vars: &mut DefaultVariables<T>) {
        let ScaleMatrices::Diagonal(s) = self else {
            return;
        };
        let (n, m) = vars.dims();
        vars.x.hadamard(&s.d[0..n]);
        vars.s.hadamard(&s.einv[0..m]);
        vars.μ.hadamard(&s.e[0..m]).scale(s.cinv);
    }

    /// Undo the scaling of problem data in place
    pub fn unscale_data(
        &self,
        P: &mut CscMatrix<T>,
        q: &mut [T],
        A: &mut CscMatrix<T>,
        b: &mut [T],
    ) {
        let ScaleMatrices::Diagonal(s) = self else {
            return;
        };
        let (m, n) = A.size();
        let (dinv, einv) = (&s.dinv[0..n], &s.einv[0..m]);

        P.lrscale(dinv, dinv);
        P.scale(s.cinv);
        q.hadamard(dinv).scale(s.cinv);
        A.lrscale(einv, dinv);
        b.hadamard(einv);
    }
}

// ---------------
// Ruiz equilibration
// ---------------

/// Bounds and iteration count of the equilibration
pub(crate) struct EquilibrationParams<T> {
    pub max_iter: u32,
    pub min_scaling: T,
    pub max_scaling: T,
}

/// Scales the problem data in place and returns the scaling used.
/// `rectify` is given the accumulated row scaling `e` and must
/// write into `δ` the correction making `e .* δ` admissible for
/// the cones, returning false if no correction is needed.
pub(crate) fn equilibrate<T, F>(
    P: &mut CscMatrix<T>,
    q: &mut [T],
    A: &mut CscMatrix<T>,
    b: &mut [T],
    params: &EquilibrationParams<T>,
    rectify: F,
) -> DiagonalScaling<T>
where
    T: FloatT,
    F: Fn(&mut [T], &[T]) -> bool,
{
    let (m, n) = A.size();

    let mut d = vec![T::one(); n];
    let mut e = vec![T::one(); m];
    let mut c = T::one();

    // work vectors
    let mut dwork = vec![T::one(); n];
    let mut ework = vec![T::one(); m];

    let scale_min = params.min_scaling;
    let scale_max = params.max_scaling;

    // perform scaling operations for a fixed number of steps
    for _ in 0..params.max_iter {
        kkt_col_norms(P, A, &mut dwork, &mut ework);

        dwork.scalarop(|x| limit_scaling(x, scale_min, scale_max));
        ework.scalarop(|x| limit_scaling(x, scale_min, scale_max));

        dwork.rsqrt();
        ework.rsqrt();

        // Scale the problem data and update the
        // equilibration matrices
        scale_data(P, A, q, b, Some(&dwork), &ework);
        d.hadamard(&dwork);
        e.hadamard(&ework);

        // now use the dwork array to hold the
        // column norms of the newly scaled P
        // so that we can compute the mean
        P.col_norms_sym(&mut dwork);
        let mean_col_norm_P = dwork.mean();
        let inf_norm_q = q.norm_inf();

        if mean_col_norm_P != T::zero() && inf_norm_q != T::zero() {
            let scale_cost = T::max(inf_norm_q, mean_col_norm_P);
            let scale_cost = limit_scaling(scale_cost, scale_min, scale_max);
            let ctmp = T::recip(scale_cost);

            // scale the penalty terms and overall scaling
            P.scale(ctmp);
            q.scale(ctmp);
            c *= ctmp;
        }
    }

    // fix scalings in cones for which elementwise
    // scaling can't be applied
    if rectify(&mut ework, &e) {
        // only rescale again if some cones were rectified
        scale_data(P, A, q, b, None, &ework);
        e.hadamard(&ework);
    }

    let mut dinv = d.clone();
    dinv.recip();
    let mut einv = e.clone();
    einv.recip();

    DiagonalScaling {
        d,
        dinv,
        e,
        einv,
        c,
        cinv: T::recip(c),
    }
}

// ---------------
// utilities
// ---------------

fn kkt_col_norms<T: FloatT>(
    P: &CscMatrix<T>,
    A: &CscMatrix<T>,
    norm_LHS: &mut [T],
    norm_RHS: &mut [T],
) {
    P.col_norms_sym(norm_LHS); // P is triu
    A.col_norms_no_reset(norm_LHS); // incrementally from P norms
    A.row_norms(norm_RHS); // same as column norms of A'
}

fn limit_scaling<T>(s: T, minval: T, maxval: T) -> T
where
    T: FloatT + ScalarMath<T = T>,
{
    s.clip(minval, maxval, T::one(), maxval)
}

fn scale_data<T: FloatT>(
    P: &mut CscMatrix<T>,
    A: &mut CscMatrix<T>,
    q: &mut [T],
    b: &mut [T],
    d: Option<&[T]>,
    e: &[T],
) {
    match d {
        Some(d) => {
            P.lrscale(d, d); // P[:,:] = Ds*P*Ds
            A.lrscale(e, d); // A[:,:] = Es*A*Ds
            q.hadamard(d);
        }
        None => {
            A.lscale(e); // A[:,:] = Es*A
        }
    }
    b.hadamard(e);
}
