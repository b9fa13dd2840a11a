mod augment_standard;
mod psd_completion;
mod reverse_standard;

use super::chordal_info::ChordalInfo;
use crate::{
    algebra::*,
    solver::{
        core::{cones::SupportedConeT, SolverError},
        implementations::default::DefaultVariables,
    },
};

/// Problem data `(P, q, A, b, cones)` of a decomposed problem
pub(crate) type DecomposedProblem<T> = (
    CscMatrix<T>,
    Vec<T>,
    CscMatrix<T>,
    Vec<T>,
    Vec<SupportedConeT>,
);

impl<T> ChordalInfo<T>
where
    T: FloatT,
{
    /// Rewrites the problem so that every decomposed PSD cone is
    /// replaced by its clique cones.
    pub(crate) fn decomp_augment(
        &mut self,
        P: &CscMatrix<T>,
        q: &[T],
        A: &CscMatrix<T>,
        b: &[T],
    ) -> Result<DecomposedProblem<T>, SolverError> {
        self.decomp_augment_standard(P, q, A, b)
    }

    /// Maps iterates of the decomposed problem back onto the original
    /// problem.  `old_vars` must come from the problem produced by
    /// `decomp_augment`.  With `complete_dual` the dual of every
    /// decomposed cone is completed to a PSD matrix.
    pub(crate) fn decomp_reverse(
        &self,
        old_vars: &DefaultVariables<T>,
        complete_dual: bool,
    ) -> Result<DefaultVariables<T>, SolverError> {
        let (n, m) = self.init_dims;
        let mut new_vars = DefaultVariables::<T>::new(n, m);

        new_vars.x.copy_from(&old_vars.x[0..n]);
        self.decomp_reverse_standard(&mut new_vars, old_vars)?;

        if complete_dual {
            self.psd_completion(&mut new_vars);
        }

        Ok(new_vars)
    }
}
