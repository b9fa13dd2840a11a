use crate::algebra::*;

// ---------------
// Variables type for default problem format
// ---------------

/// ADMM iterates of the problem in its current (scaled, possibly
/// decomposed) form
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultVariables<T> {
    /// primal variables
    pub x: Vec<T>,
    /// set variables, one block per cone
    pub s: Vec<T>,
    /// dual variables.  The problem dual is `y = -μ`
    pub μ: Vec<T>,
}

impl<T> DefaultVariables<T>
where
    T: FloatT,
{
    pub fn new(n: usize, m: usize) -> Self {
        Self {
            x: vec![T::zero(); n],
            s: vec![T::zero(); m],
            μ: vec![T::zero(); m],
        }
    }

    /// (n, m) of the problem these variables belong to
    pub fn dims(&self) -> (usize, usize) {
        (self.x.len(), self.s.len())
    }

    pub(crate) fn copy_from(&mut self, src: &Self) {
        self.x.copy_from(&src.x);
        self.s.copy_from(&src.s);
        self.μ.copy_from(&src.μ);
    }
}

/// Scratch vectors of the ADMM iteration.  Contents are only
/// meaningful within a single iteration.
#[derive(Debug, Clone)]
pub struct UtilityVariables<T> {
    // length m
    pub(crate) vec_m: Vec<T>,
    // length n
    pub(crate) vec_n: Vec<T>,
    // length n
    pub(crate) vec_n2: Vec<T>,
}

impl<T> UtilityVariables<T>
where
    T: FloatT,
{
    pub fn new(n: usize, m: usize) -> Self {
        Self {
            vec_m: vec![T::zero(); m],
            vec_n: vec![T::zero(); n],
            vec_n2: vec![T::zero(); n],
        }
    }
}

/// Step and residual buffers of the ADMM iteration
#[derive(Debug, Clone)]
pub(crate) struct StepVariables<T> {
    // KKT right hand side and solution, length n + m
    pub ls: Vec<T>,
    pub sol: Vec<T>,
    // relaxed set variable s̃, length m
    pub s_tl: Vec<T>,
    // iterate differences for infeasibility checks
    pub δx: Vec<T>,
    pub δy: Vec<T>,
}

impl<T> StepVariables<T>
where
    T: FloatT,
{
    pub fn new(n: usize, m: usize) -> Self {
        Self {
            ls: vec![T::zero(); n + m],
            sol: vec![T::zero(); n + m],
            s_tl: vec![T::zero(); m],
            δx: vec![T::zero(); n],
            δy: vec![T::zero(); m],
        }
    }
}
