#![allow(non_snake_case)]

use std::iter::zip;

use crate::{
    algebra::*,
    qdldl::*,
    solver::core::{cones::SupportedConeT, SolverError},
};

use super::{MergeMethod, SparsityPattern};

// -------------------------------------
// Chordal Decomposition Information
// -------------------------------------

/// Everything needed to decompose a problem and to map a solution
/// of the decomposed problem back onto the original one.
#[derive(Debug, Clone)]
pub struct ChordalInfo<T> {
    // (n, m) dimensions of the original problem
    pub(crate) init_dims: (usize, usize),
    // original cones of the problem
    pub(crate) init_cones: Vec<SupportedConeT>,
    // positions of all PSD cones in init_cones
    pub(crate) psd_cone_indices: Vec<usize>,

    // sparsity patterns of the decomposable cones, in cone order
    pub(crate) spatterns: Vec<SparsityPattern>,

    // linking matrix of the standard decomposition.  Set by decomp_augment
    pub(crate) H: Option<CscMatrix<T>>,

    // cone index in the decomposed problem -> cone index in the original
    pub(crate) cone_map: Vec<usize>,

    // symbolic factor of the last analysed cone.  Its buffers hold the
    // pattern matrix of the next one.
    pub(crate) L: Option<CscMatrix<f64>>,
}

impl<T> ChordalInfo<T>
where
    T: FloatT,
{
    /// Analyses the aggregate sparsity of every PSD cone with side
    /// larger than `threshold` and keeps those that split into more
    /// than one clique.
    pub fn new(
        A: &CscMatrix<T>,
        b: &[T],
        cones: &[SupportedConeT],
        threshold: usize,
        merge_method: MergeMethod,
    ) -> Result<Self, SolverError> {
        let (m, n) = A.size();

        let conedims: usize = cones.iter().map(|c| c.nvars()).sum();
        if conedims != m || b.len() != m {
            return Err(SolverError::Decomposition(format!(
                "cone rows ({conedims}) and rows of A ({m}) and b ({}) disagree",
                b.len()
            )));
        }

        let psd_cone_indices = cones.iter().position_all(|c| c.is_psd());

        let mut chordal_info = Self {
            init_dims: (n, m),
            init_cones: cones.to_vec(),
            psd_cone_indices,
            spatterns: vec![],
            H: None,
            cone_map: (0..cones.len()).collect(),
            L: None,
        };

        chordal_info.find_sparsity_patterns(A, b, threshold, merge_method)?;

        Ok(chordal_info)
    }

    fn find_sparsity_patterns(
        &mut self,
        A: &CscMatrix<T>,
        b: &[T],
        threshold: usize,
        merge_method: MergeMethod,
    ) -> Result<(), SolverError> {
        // aggregate sparsity pattern across the rows of [A b]
        let mut nz_mask = find_aggregate_sparsity_mask(A, b);

        let mut row = 0;
        for (coneidx, cone) in self.init_cones.iter().enumerate() {
            let rng = row..(row + cone.nvars());
            row = rng.end;

            let SupportedConeT::PSDTriangleConeT(dim) = *cone else {
                continue;
            };
            if dim <= threshold {
                continue;
            }

            let mut strategy = merge_method.make_strategy();
            let spattern = analyse_psdtriangle_sparsity_pattern(
                &mut nz_mask[rng.clone()],
                dim,
                coneidx,
                rng,
                strategy.as_mut(),
                &mut self.L,
            )?;

            if let Some(spattern) = spattern {
                self.spatterns.push(spattern);
            }
        }
        Ok(())
    }

    /// did any PSD cones get decomposed?
    pub fn is_decomposed(&self) -> bool {
        !self.spatterns.is_empty()
    }

    /// sparsity patterns of the decomposed cones
    pub fn patterns(&self) -> &[SparsityPattern] {
        &self.spatterns
    }

    /// cone index in the decomposed problem -> originating cone index
    pub fn cone_map(&self) -> &[usize] {
        &self.cone_map
    }

    /// linking matrix between original and clique variables, once
    /// the decomposition has been applied
    pub fn H(&self) -> Option<&CscMatrix<T>> {
        self.H.as_ref()
    }

    /// (n, m) of the original problem
    pub fn init_dims(&self) -> (usize, usize) {
        self.init_dims
    }

    pub fn init_cones(&self) -> &[SupportedConeT] {
        &self.init_cones
    }

    /// positions of all PSD cones in the original problem
    pub fn psd_cone_indices(&self) -> &[usize] {
        &self.psd_cone_indices
    }

    pub(crate) fn init_cone_count(&self) -> usize {
        self.init_cones.len()
    }

    pub fn init_psd_cone_count(&self) -> usize {
        self.psd_cone_indices.len()
    }

    pub fn decomposable_cone_count(&self) -> usize {
        self.spatterns.len()
    }

    /// PSD cones in the decomposed problem
    pub fn final_psd_cone_count(&self) -> usize {
        self.init_psd_cone_count() + self.final_psd_cones_added()
    }

    fn final_psd_cones_added(&self) -> usize {
        let ncliques: usize = self.spatterns.iter().map(|p| p.n_cliques()).sum();

        // each decomposed cone is replaced, not added to
        ncliques - self.decomposable_cone_count()
    }

    // total packed dimension of all cones after decomposition, and
    // the part of it that is duplicated in clique overlaps
    pub(crate) fn get_decomposed_dim_and_overlaps(&self) -> (usize, usize) {
        let mut patterns_iter = self.spatterns.iter().peekable();
        let mut sum_cols = 0;
        let mut sum_overlaps = 0;

        for (coneidx, cone) in self.init_cones.iter().enumerate() {
            let (cols, overlap) = match patterns_iter.next_if(|p| p.orig_index == coneidx) {
                Some(pattern) => pattern.sntree.get_decomposed_dim_and_overlaps(),
                None => (cone.nvars(), 0),
            };
            sum_cols += cols;
            sum_overlaps += overlap;
        }

        (sum_cols, sum_overlaps)
    }
}

// -------------------------------------
// utility functions
// -------------------------------------

// Clique tree of one PSD cone, or None if the cone is dense or
// its pattern collapses into a single clique
fn analyse_psdtriangle_sparsity_pattern(
    nz_mask: &mut [bool],
    conedim: usize,
    coneidx: usize,
    row_range: std::ops::Range<usize>,
    strategy: &mut dyn super::MergeStrategy,
    L_scratch: &mut Option<CscMatrix<f64>>,
) -> Result<Option<SparsityPattern>, SolverError> {
    // the diagonal is always part of the pattern
    for i in 0..conedim {
        nz_mask[triangular_index(i)] = true;
    }

    if nz_mask.iter().all(|&x| x) {
        return Ok(None);
    }

    let (L, ordering) = find_graph(nz_mask, conedim, L_scratch.take())?;

    let spattern = SparsityPattern::new(&L, ordering, nz_mask, coneidx, row_range, strategy);
    *L_scratch = Some(L);

    if spattern.n_cliques() == 1 {
        return Ok(None);
    }

    log::debug!(
        "cone {coneidx}: PSD({conedim}) split into {} cliques of sizes {:?}",
        spattern.n_cliques(),
        spattern.block_dims()
    );

    Ok(Some(spattern))
}

// true in every row in which [A b] has a nonzero
fn find_aggregate_sparsity_mask<T: FloatT>(A: &CscMatrix<T>, b: &[T]) -> Vec<bool> {
    let mut active = vec![false; b.len()];

    for &r in A.rowval.iter() {
        active[r] = true;
    }

    for (a, &bi) in zip(active.iter_mut(), b) {
        if bi != T::zero() {
            *a = true;
        }
    }
    active
}

// Symbolic factor L of the chordal extension of the graph with
// adjacency `nz_mask`, together with the fill reducing ordering
// used to compute it.  The pattern matrix is built in the buffers
// of `scratch` when one is given.
fn find_graph(
    nz_mask: &[bool],
    conedim: usize,
    scratch: Option<CscMatrix<f64>>,
) -> Result<(CscMatrix<f64>, Vec<usize>), SolverError> {
    let mut pattern = scratch.unwrap_or_else(|| CscMatrix::zeros((0, 0)));
    pattern.m = conedim;
    pattern.n = conedim;
    pattern.colptr.clear();
    pattern.rowval.clear();
    pattern.nzval.clear();

    // the packed mask is already the upper triangle in column order
    pattern.colptr.push(0);
    for col in 0..conedim {
        let start = triangular_number(col);
        for row in 0..=col {
            if nz_mask[start + row] {
                pattern.rowval.push(row);
                pattern.nzval.push(1.);
            }
        }
        pattern.colptr.push(pattern.rowval.len());
    }

    let opts = QDLDLSettings {
        logical: true,
        ..QDLDLSettings::default()
    };

    let factors = QDLDLFactorisation::<f64>::new(&pattern, Some(opts)).map_err(|e| {
        SolverError::Decomposition(format!("symbolic factorization of PSD pattern failed: {e}"))
    })?;

    Ok((factors.L, factors.perm))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::solver::core::cones::SupportedConeT::*;

    // A with a single column touching the given packed entries of
    // a PSD(side) cone
    fn psd_data(side: usize, entries: &[(usize, usize)]) -> (CscMatrix<f64>, Vec<f64>) {
        let m = triangular_number(side);
        let mut rows: Vec<usize> = entries
            .iter()
            .map(|&rc| coord_to_upper_triangular_index(rc))
            .collect();
        rows.sort();
        let k = rows.len();
        let A = CscMatrix::new(m, 1, vec![0, k], rows, vec![1.; k]);
        (A, vec![0.; m])
    }

    // two independent blocks {0,1,2} and {3,4,5} in a 6x6 matrix
    fn two_block_entries() -> Vec<(usize, usize)> {
        let mut e = vec![];
        for blk in [0, 3] {
            for c in blk..blk + 3 {
                for r in blk..c {
                    e.push((r, c));
                }
            }
        }
        e
    }

    #[test]
    fn test_dense_cone_is_not_decomposed() {
        let entries: Vec<_> = (0..4).flat_map(|c| (0..c).map(move |r| (r, c))).collect();
        let (A, b) = psd_data(4, &entries);
        let info = ChordalInfo::new(&A, &b, &[PSDTriangleConeT(4)], 2, MergeMethod::None).unwrap();
        assert!(!info.is_decomposed());
        assert_eq!(info.cone_map(), &[0]);
    }

    #[test]
    fn test_threshold() {
        let (A, b) = psd_data(6, &two_block_entries());

        let info = ChordalInfo::new(&A, &b, &[PSDTriangleConeT(6)], 6, MergeMethod::None).unwrap();
        assert!(!info.is_decomposed());

        let info = ChordalInfo::new(&A, &b, &[PSDTriangleConeT(6)], 5, MergeMethod::None).unwrap();
        assert!(info.is_decomposed());
        assert_eq!(info.decomposable_cone_count(), 1);
        assert_eq!(info.final_psd_cone_count(), 2);
    }

    #[test]
    fn test_two_blocks() {
        let (A, b) = psd_data(6, &two_block_entries());
        let cones = [NonnegativeConeT(0), PSDTriangleConeT(6)];
        for method in [MergeMethod::None, MergeMethod::ParentChild, MergeMethod::CliqueGraph] {
            let info = ChordalInfo::new(&A, &b, &cones, 2, method).unwrap();
            let pattern = &info.patterns()[0];

            assert_eq!(pattern.orig_index(), 1);
            assert_eq!(pattern.n_cliques(), 2);
            assert_eq!(pattern.block_dims(), &[3, 3]);

            let mut cliques: Vec<_> = (0..2).map(|i| pattern.clique_in_original(i)).collect();
            cliques.sort();
            assert_eq!(cliques, vec![vec![0, 1, 2], vec![3, 4, 5]]);
            assert!((0..2).all(|i| pattern.separator(i).is_empty()));

            // every stored entry maps to an entry of the same packed size
            let nzmap = pattern.nz_ind_map();
            assert_eq!(nzmap.nnz(), 12);
            assert!(nzmap.iter().all(|(_, j)| j < 21));
        }
    }

    #[test]
    fn test_factor_scratch_is_reused() {
        // the same two block pattern on two PSD cones
        let (A1, b1) = psd_data(6, &two_block_entries());
        let m = A1.nrows();
        let mut rows = A1.rowval.clone();
        rows.extend(A1.rowval.iter().map(|r| r + m));
        let k = rows.len();
        let A = CscMatrix::new(2 * m, 1, vec![0, k], rows, vec![1.; k]);
        let b = [b1.clone(), b1].concat();
        let cones = [PSDTriangleConeT(6), PSDTriangleConeT(6)];

        let info = ChordalInfo::new(&A, &b, &cones, 2, MergeMethod::None).unwrap();
        assert_eq!(info.decomposable_cone_count(), 2);

        // both cones see the same cliques
        let (p0, p1) = (&info.patterns()[0], &info.patterns()[1]);
        assert_eq!(p0.block_dims(), p1.block_dims());
        assert_eq!(p0.ordering(), p1.ordering());

        // the factor of the last cone is kept
        let L = info.L.as_ref().unwrap();
        assert_eq!(L.size(), (6, 6));
        assert!(L.rowval.iter().all(|&r| r < 6));
    }

    #[test]
    fn test_bad_dimensions() {
        let (A, b) = psd_data(3, &[(0, 1)]);
        let err = ChordalInfo::new(&A, &b, &[PSDTriangleConeT(4)], 2, MergeMethod::None);
        assert!(matches!(err, Err(SolverError::Decomposition(_))));
    }
}
