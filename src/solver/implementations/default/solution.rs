use super::*;
use crate::{algebra::*, solver::core::SolverStatus};

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Final state of a solve, expressed in terms of the problem as
/// it was supplied (i.e. unscaled and without decomposition)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
pub struct SolveResult<T> {
    /// primal solution
    pub x: Vec<T>,
    /// dual solution (in dual cone)
    pub y: Vec<T>,
    /// vector of slacks (in primal cone)
    pub s: Vec<T>,
    /// primal objective value
    pub obj_val: T,
    /// final solver status
    pub status: SolverStatus,
    /// number of iterations
    pub iterations: u32,
    pub info: ResultInfo<T>,
    pub times: ResultTimes,
}

impl<T> SolveResult<T>
where
    T: FloatT,
{
    /// An unsolved result for a problem with `n` variables and `m` rows
    pub fn new(n: usize, m: usize) -> Self {
        Self {
            x: vec![T::zero(); n],
            y: vec![T::zero(); m],
            s: vec![T::zero(); m],
            obj_val: T::nan(),
            status: SolverStatus::Unsolved,
            iterations: 0,
            info: ResultInfo::default(),
            times: ResultTimes::default(),
        }
    }

    // copy out iterates of the original problem, with y = -μ
    pub(crate) fn set_variables(&mut self, vars: &DefaultVariables<T>) {
        self.x.copy_from(&vars.x);
        self.s.copy_from(&vars.s);
        self.y.scalarop_from(|μ| -μ, &vars.μ);
    }
}
