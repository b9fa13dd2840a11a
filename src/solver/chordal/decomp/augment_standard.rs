#![allow(non_snake_case)]

// -----------------------------------------
// The standard decomposition
//
//   min  ½xᵀPx + qᵀx           min  ½xᵀPx + qᵀx
//   s.t. Ax + s = b      →     s.t. Ax + Hv + s₁ = b,   s₁ ∈ {0}
//        s ∈ K                      -v + s₂ = 0,        s₂ ∈ K̃
//
// where K̃ holds the clique cones and H scatters the clique
// entries back onto the packed rows of the original cones.
// -----------------------------------------

use super::DecomposedProblem;
use crate::{
    algebra::*,
    solver::{
        chordal::{ChordalInfo, SparsityPattern},
        core::{
            cones::SupportedConeT::{self, *},
            SolverError,
        },
    },
};

impl<T> ChordalInfo<T>
where
    T: FloatT,
{
    pub(crate) fn decomp_augment_standard(
        &mut self,
        P: &CscMatrix<T>,
        q: &[T],
        A: &CscMatrix<T>,
        b: &[T],
    ) -> Result<DecomposedProblem<T>, SolverError> {
        let (H, cones_new, cone_map) = self.find_standard_H_and_cones();
        let nH = H.ncols();

        let P_new = CscMatrix::blockdiag(&[P, &CscMatrix::<T>::zeros((nH, nH))])?;

        let mut q_new = vec![T::zero(); q.len() + nH];
        q_new[0..q.len()].copy_from(q);

        let mut negI = CscMatrix::identity(nH);
        negI.negate();
        let Z = CscMatrix::zeros((nH, A.ncols()));

        let A_new = CscMatrix::hvcat(&[&[A, &H], &[&Z, &negI]])?;

        let mut b_new = vec![T::zero(); b.len() + nH];
        b_new[0..b.len()].copy_from(b);

        log::debug!(
            "decomposition: problem grows from (n, m) = {:?} to {:?}",
            self.init_dims,
            (A_new.ncols(), A_new.nrows())
        );

        // kept for reconstructing the solution of the original problem
        self.H = Some(H);
        self.cone_map = cone_map;

        Ok((P_new, q_new, A_new, b_new, cones_new))
    }

    // Linking matrix H, the cones of the decomposed problem and the map
    // from each of those cones to its originating cone
    fn find_standard_H_and_cones(&self) -> (CscMatrix<T>, Vec<SupportedConeT>, Vec<usize>) {
        let cones = &self.init_cones;

        let (lenH, _) = self.get_decomposed_dim_and_overlaps();
        let mut H_I = Vec::with_capacity(lenH);

        let ncones = self.init_cone_count() + self.final_psd_cone_count() - self.init_psd_cone_count();
        let mut cones_new = Vec::with_capacity(ncones + cones.len());
        let mut cone_map = Vec::with_capacity(ncones + cones.len());

        // the linking equalities, one zero cone per original cone
        for (coneidx, cone) in cones.iter().enumerate() {
            cones_new.push(ZeroConeT(cone.nvars()));
            cone_map.push(coneidx);
        }

        // cones are copied over until we reach the originating index
        // of the next pattern, which is expanded into its cliques
        let mut patterns_iter = self.spatterns.iter().peekable();
        let mut row = 0;

        for (coneidx, cone) in cones.iter().enumerate() {
            match patterns_iter.next_if(|p| p.orig_index == coneidx) {
                Some(pattern) => {
                    decompose_with_sparsity_pattern(&mut H_I, &mut cones_new, pattern, row);
                    cone_map.resize(cones_new.len(), coneidx);
                }
                None => {
                    decompose_with_cone(&mut H_I, &mut cones_new, cone, row);
                    cone_map.push(coneidx);
                }
            }
            row += cone.nvars();
        }

        // one entry per column
        let H = CscMatrix::<T>::new_from_triplets(
            row,
            lenH,
            H_I,
            (0usize..lenH).collect(),
            vec![T::one(); lenH],
        );

        (H, cones_new, cone_map)
    }
}

fn decompose_with_cone(
    H_I: &mut Vec<usize>,
    cones_new: &mut Vec<SupportedConeT>,
    cone: &SupportedConeT,
    row: usize,
) {
    H_I.extend(row..(row + cone.nvars()));
    cones_new.push(*cone);
}

fn decompose_with_sparsity_pattern(
    H_I: &mut Vec<usize>,
    cones_new: &mut Vec<SupportedConeT>,
    spattern: &SparsityPattern,
    row: usize,
) {
    for i in 0..spattern.n_cliques() {
        // clique vertices are numbered in the reordered tree, but the
        // data still sits at the original rows
        let c = spattern.clique_in_original(i);
        add_subblock_map(H_I, &c, row);

        cones_new.push(PSDTriangleConeT(spattern.sntree.get_nblk(i)));
    }
}

// rows of the packed subblock on `clique_vertices`, column by column
fn add_subblock_map(H_I: &mut Vec<usize>, clique_vertices: &[usize], row_start: usize) {
    let v = clique_vertices;

    for j in 0..v.len() {
        for i in 0..=j {
            H_I.push(row_start + coord_to_upper_triangular_index((v[i], v[j])));
        }
    }
}
