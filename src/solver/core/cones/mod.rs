#![allow(non_snake_case)]

use crate::algebra::FloatT;
use enum_dispatch::*;

//primitive cone types
mod nonnegativecone;
mod psdtrianglecone;
mod socone;
mod zerocone;

//the supported cone wrapper type for primitives
//and the composite cone
mod compositecone;
mod supportedcone;

pub use compositecone::*;
pub use nonnegativecone::*;
pub use psdtrianglecone::*;
pub use socone::*;
pub use supportedcone::*;
pub use zerocone::*;

/// Operations required of every cone in the composite set.
///
/// The ADMM iteration only needs the dimension of each block and a
/// Euclidean projection onto it.  Equilibration additionally needs to
/// know whether a block tolerates a different scaling on every row.
#[enum_dispatch]
pub trait Cone<T>
where
    T: FloatT,
{
    /// number of rows occupied in the composite set
    fn dim(&self) -> usize;

    /// true if the cone is invariant under independent positive
    /// scaling of its entries
    fn is_elementwise(&self) -> bool;

    /// Converts an elementwise scaling `e` into one that preserves
    /// cone membership.  On return `e .* δ` is the rectified scaling.
    /// Returns true if any entry of `δ` differs from one.
    fn rectify_equilibration(&self, δ: &mut [T], e: &[T]) -> bool;

    /// Euclidean projection of `x` onto the cone, in place
    fn project(&mut self, x: &mut [T]);
}

// rectification for cones requiring a uniform scaling,
// i.e. δ .* e == mean(e) on every entry
pub(crate) fn rectify_to_mean<T: FloatT>(δ: &mut [T], e: &[T]) -> bool {
    use crate::algebra::VectorMath;
    let mean = e.mean();
    δ.scalarop_from(|ei| mean / ei, e);
    true
}
