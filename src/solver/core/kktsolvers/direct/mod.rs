#![allow(non_snake_case)]

use crate::algebra::*;
use crate::qdldl::QDLDLError;

mod directldlkktsolver;
mod kkt_assembly;
mod qdldl;

pub use directldlkktsolver::*;
pub(crate) use kkt_assembly::*;
pub use qdldl::*;

/// Sparse LDLᵀ engines usable by [`DirectLDLKKTSolver`].
///
/// Entries are addressed by their position in the `nzval` of
/// the matrix the engine was constructed from.
pub trait DirectLDLSolver<T: FloatT> {
    fn update_values(&mut self, index: &[usize], values: &[T]);
    fn refactor(&mut self) -> Result<(), QDLDLError>;
    fn solve(&mut self, x: &mut [T], b: &[T]);
}
