//! Linear algebra for the solver.
//!
//! Sparse matrices are stored in compressed sparse column format via
//! [`CscMatrix`].  Dense vectors are plain slices, with numerical
//! operations provided through the [`VectorMath`] trait.

#![allow(non_snake_case)]

mod csc;
pub(crate) mod dense;
mod error_types;
mod floats;
mod math_traits;
mod matrix_types;
pub(crate) mod scalarmath;
mod sparsevector;
pub(crate) mod utils;
mod vecmath;

pub use csc::*;
pub(crate) use dense::*;
pub use error_types::*;
pub use floats::*;
pub use math_traits::*;
pub use matrix_types::*;
pub(crate) use scalarmath::*;
pub use sparsevector::*;
pub(crate) use utils::*;
