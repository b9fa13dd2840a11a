#![allow(non_snake_case)]
use super::DirectLDLSolver;
use crate::algebra::*;
use crate::qdldl::*;

/// [`DirectLDLSolver`] backed by the crate's QDLDL factorization
pub struct QDLDLDirectLDLSolver<T> {
    factors: QDLDLFactorisation<T>,
}

impl<T> QDLDLDirectLDLSolver<T>
where
    T: FloatT,
{
    /// Performs the symbolic analysis only.  Call `refactor` for the
    /// numeric factorization.
    pub fn new(KKT: &CscMatrix<T>, Dsigns: &[i8]) -> Result<Self, QDLDLError> {
        // σ and the -1/ρ block already keep the matrix quasidefinite,
        // so a zero pivot is reported rather than regularized away
        let opts = QDLDLSettings {
            logical: true,
            Dsigns: Some(Dsigns.to_vec()),
            regularize_enable: false,
            amd_dense_scale: 1.5,
            ..QDLDLSettings::default()
        };

        let factors = QDLDLFactorisation::<T>::new(KKT, Some(opts))?;

        Ok(Self { factors })
    }
}

impl<T> DirectLDLSolver<T> for QDLDLDirectLDLSolver<T>
where
    T: FloatT,
{
    fn update_values(&mut self, index: &[usize], values: &[T]) {
        self.factors.update_values(index, values);
    }

    fn refactor(&mut self) -> Result<(), QDLDLError> {
        self.factors.refactor()
    }

    fn solve(&mut self, x: &mut [T], b: &[T]) {
        // NB: QDLDL solves in place
        x.copy_from(b);
        self.factors.solve(x);
    }
}
