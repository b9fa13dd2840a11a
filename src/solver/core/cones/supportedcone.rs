use super::*;
use crate::algebra::scalarmath::triangular_number;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ---------------------------------------------------
// We define some machinery here for enumerating the
// different cone types that can live in the composite cone
// ---------------------------------------------------

/// API type describing the type of a conic constraint.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SupportedConeT {
    /// The zero cone (used for equality constraints).
    ///
    /// The parameter indicates the cones dimension.
    ZeroConeT(usize),
    /// The nonnegative orthant.
    ///
    /// The parameter indicates the cones dimension.
    NonnegativeConeT(usize),
    /// The second order cone / Lorenz cone / ice-cream cone.
    ///
    /// The parameter indicates the cones dimension.
    SecondOrderConeT(usize),
    /// The positive semidefinite cone in triangular form.
    ///
    /// The parameter indicates the matrix dimension, i.e. size = n
    /// means that the variable is the upper triangle of an nxn matrix.
    PSDTriangleConeT(usize),
}

impl SupportedConeT {
    /// number of rows occupied by the cone
    pub fn nvars(&self) -> usize {
        match self {
            SupportedConeT::ZeroConeT(dim) => *dim,
            SupportedConeT::NonnegativeConeT(dim) => *dim,
            SupportedConeT::SecondOrderConeT(dim) => *dim,
            SupportedConeT::PSDTriangleConeT(dim) => triangular_number(*dim),
        }
    }

    pub(crate) fn is_psd(&self) -> bool {
        matches!(self, SupportedConeT::PSDTriangleConeT(_))
    }

    pub(crate) fn is_zero(&self) -> bool {
        matches!(self, SupportedConeT::ZeroConeT(_))
    }
}

impl std::fmt::Display for SupportedConeT {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SupportedConeT::ZeroConeT(_) => "ZeroCone",
            SupportedConeT::NonnegativeConeT(_) => "NonnegativeCone",
            SupportedConeT::SecondOrderConeT(_) => "SecondOrderCone",
            SupportedConeT::PSDTriangleConeT(_) => "PSDTriangleCone",
        };
        write!(f, "{}({})", name, self.nvars())
    }
}

/// Runtime cone object for a user cone description
pub fn make_cone<T: FloatT>(cone: &SupportedConeT) -> SupportedCone<T> {
    match *cone {
        SupportedConeT::ZeroConeT(dim) => ZeroCone::<T>::new(dim).into(),
        SupportedConeT::NonnegativeConeT(dim) => NonnegativeCone::<T>::new(dim).into(),
        SupportedConeT::SecondOrderConeT(dim) => SecondOrderCone::<T>::new(dim).into(),
        SupportedConeT::PSDTriangleConeT(dim) => PSDTriangleCone::<T>::new(dim).into(),
    }
}

// -------------------------------------
// Enum wrapper for all supported cone types
// -------------------------------------

#[allow(clippy::enum_variant_names)]
#[enum_dispatch(Cone<T>)]
#[derive(Debug, Clone)]
pub enum SupportedCone<T>
where
    T: FloatT,
{
    ZeroCone(ZeroCone<T>),
    NonnegativeCone(NonnegativeCone<T>),
    SecondOrderCone(SecondOrderCone<T>),
    PSDTriangleCone(PSDTriangleCone<T>),
}
