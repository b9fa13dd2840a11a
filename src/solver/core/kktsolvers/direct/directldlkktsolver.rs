#![allow(non_snake_case)]

use super::*;
use crate::solver::core::kktsolvers::KKTSolver;
use crate::solver::core::{SolverError, SolverStage};

// -------------------------------------
// KKT solver using a direct LDL factorization
// -------------------------------------

/// The production [`KKTSolver`].  The KKT matrix is assembled once
/// in `factorize`.  Afterwards only the -1/ρ diagonal is rewritten, and
/// `refactor` reuses the symbolic analysis of the first factorization.
pub struct DirectLDLKKTSolver<T: FloatT> {
    n: usize,
    m: usize,

    map: Option<KKTDataMap>,
    ldlsolver: Option<QDLDLDirectLDLSolver<T>>,

    // -1/ρ values for the lower right diagonal
    work_rho: Vec<T>,

    // number of numeric factorizations performed
    factor_count: usize,
}

impl<T> Default for DirectLDLKKTSolver<T>
where
    T: FloatT,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DirectLDLKKTSolver<T>
where
    T: FloatT,
{
    pub fn new() -> Self {
        Self {
            n: 0,
            m: 0,
            map: None,
            ldlsolver: None,
            work_rho: Vec::new(),
            factor_count: 0,
        }
    }

    /// numeric factorizations performed so far, including the first
    pub fn factor_count(&self) -> usize {
        self.factor_count
    }

    fn numeric_factor(&mut self, rhovec: &[T]) -> Result<(), SolverError> {
        let (Some(map), Some(ldlsolver)) = (&self.map, &mut self.ldlsolver) else {
            return Err(SolverError::Ordering {
                requested: SolverStage::KKTFactored,
                missing: SolverStage::Assembled,
            });
        };
        if rhovec.len() != self.m {
            return Err(SolverError::Dimension(format!(
                "penalty vector has length {}, expected {}",
                rhovec.len(),
                self.m
            )));
        }

        self.work_rho.scalarop_from(|ρ| -T::recip(ρ), rhovec);
        ldlsolver.update_values(&map.diag_rho, &self.work_rho);
        ldlsolver.refactor()?;
        self.factor_count += 1;
        Ok(())
    }
}

impl<T> KKTSolver<T> for DirectLDLKKTSolver<T>
where
    T: FloatT,
{
    fn factorize(
        &mut self,
        P: &CscMatrix<T>,
        A: &CscMatrix<T>,
        sigma: T,
        rhovec: &[T],
    ) -> Result<(), SolverError> {
        let (m, n) = A.size();
        if P.size() != (n, n) || rhovec.len() != m {
            return Err(SolverError::Dimension(format!(
                "KKT data of sizes P {:?}, A {:?}, ρ {}",
                P.size(),
                A.size(),
                rhovec.len()
            )));
        }

        let (mut KKT, map) = assemble_kkt_matrix(P, A);

        // proximal term on the upper left diagonal
        for &d in &map.diagP {
            KKT.nzval[d] += sigma;
        }

        let mut Dsigns = vec![1_i8; n + m];
        Dsigns[n..].fill(-1);

        self.n = n;
        self.m = m;
        self.work_rho = vec![T::zero(); m];
        self.ldlsolver = Some(QDLDLDirectLDLSolver::new(&KKT, &Dsigns)?);
        self.map = Some(map);

        self.numeric_factor(rhovec)
    }

    fn refactor(&mut self, rhovec: &[T]) -> Result<(), SolverError> {
        self.numeric_factor(rhovec)
    }

    fn solve(&mut self, lhs: &mut [T], rhs: &[T]) -> Result<(), SolverError> {
        let Some(ldlsolver) = self.ldlsolver.as_mut() else {
            return Err(SolverError::Ordering {
                requested: SolverStage::Optimized,
                missing: SolverStage::KKTFactored,
            });
        };
        let dim = self.n + self.m;
        if lhs.len() != dim || rhs.len() != dim {
            return Err(SolverError::Dimension(format!(
                "KKT solve with lhs {} and rhs {}, expected {dim}",
                lhs.len(),
                rhs.len()
            )));
        }
        ldlsolver.solve(lhs, rhs);
        Ok(())
    }
}
