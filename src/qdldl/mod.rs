//! Sparse LDLᵀ factorization for quasidefinite matrices.
//!
//! Used both for numerical solves of the ADMM linear system and,
//! in logical mode, for the symbolic Cholesky pattern that drives
//! chordal decomposition.

mod qdldl;
pub use qdldl::*;
