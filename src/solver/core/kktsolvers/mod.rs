//! Linear system solvers for the ADMM step.
//!
//! Each iteration solves the quasidefinite system
//!
//! ```text
//! [P + σI      Aᵀ        ] [x̃]   [σx - q       ]
//! [A       -diag(1/ρvec) ] [ν ] = [b - s + μ/ρvec]
//! ```
//!
//! whose matrix changes only when the penalty vector ρvec does.

use super::SolverError;
use crate::algebra::*;

pub mod direct;

/// Operations required of a linear solver for the ADMM KKT system
pub trait KKTSolver<T: FloatT> {
    /// Assemble and factor the KKT matrix.  `P` must be upper triangular.
    fn factorize(
        &mut self,
        P: &CscMatrix<T>,
        A: &CscMatrix<T>,
        sigma: T,
        rhovec: &[T],
    ) -> Result<(), SolverError>;

    /// Refactor after a change of the penalty vector, keeping
    /// everything else from the last `factorize`
    fn refactor(&mut self, rhovec: &[T]) -> Result<(), SolverError>;

    /// Solve the factored system, writing the solution into `lhs`.
    /// Fails if nothing has been factored or the lengths are wrong.
    fn solve(&mut self, lhs: &mut [T], rhs: &[T]) -> Result<(), SolverError>;
}
