// -----------------------------------
//  reverse the standard decomposition
// -----------------------------------

use crate::{
    algebra::*,
    solver::{
        chordal::ChordalInfo, core::SolverError, implementations::default::DefaultVariables,
    },
};
use std::iter::zip;

impl<T> ChordalInfo<T>
where
    T: FloatT,
{
    pub(crate) fn decomp_reverse_standard(
        &self,
        new_vars: &mut DefaultVariables<T>,
        old_vars: &DefaultVariables<T>,
    ) -> Result<(), SolverError> {
        let H = self.H.as_ref().ok_or_else(|| {
            SolverError::Decomposition("decomposition was never applied".to_string())
        })?;
        let m = new_vars.s.len();

        H.gemv(&mut new_vars.s, &old_vars.s[m..], T::one(), T::zero());
        H.gemv(&mut new_vars.μ, &old_vars.μ[m..], T::one(), T::zero());

        // entries shared by several cliques carry one copy of the dual
        // per clique.  Average them.
        let mut n_overlaps = vec![T::zero(); H.nrows()];
        H.row_sums(&mut n_overlaps);

        for (μi, &cnt) in zip(new_vars.μ.iter_mut(), &n_overlaps) {
            if cnt > T::one() {
                *μi /= cnt;
            }
        }
        Ok(())
    }
}
