#![allow(non_snake_case)]
use crate::algebra::*;
use crate::solver::chordal::*;
use std::ops::Range;

// ---------------------------
// Struct to hold clique and sparsity data for a constraint
// ---------------------------

/// Clique tree and orderings of one decomposed PSD constraint.
///
/// Vertices of the tree are numbered so that every clique's supernode
/// is a consecutive range.  `ordering` maps a tree vertex to the
/// row/column of the original matrix and `reverse_ordering` is its
/// inverse.
#[derive(Debug, Clone)]
pub struct SparsityPattern {
    pub(crate) sntree: SuperNodeTree,
    pub(crate) ordering: Vec<usize>,
    pub(crate) reverse_ordering: Vec<usize>,
    // rows of the originating cone in the original problem
    pub(crate) row_range: Range<usize>,
    // index of the originating cone in the original composite cone
    pub(crate) orig_index: usize,
    // packed index of each structural nonzero in the original
    // matrix -> packed index of the same entry after reordering
    pub(crate) nz_ind_map: SparseVector<usize>,
}

impl SparsityPattern {
    pub(crate) fn new<T: FloatT>(
        L: &CscMatrix<T>,
        mut ordering: Vec<usize>,
        nz_mask: &[bool],
        orig_index: usize,
        row_range: Range<usize>,
        strategy: &mut dyn MergeStrategy,
    ) -> Self {
        let mut sntree = SuperNodeTree::new(L);

        // clique merging only if more than one clique present
        if sntree.n_cliques > 1 {
            strategy.merge_cliques(&mut sntree);
        }

        // make each clique's supernode a consecutive block of vertices
        sntree.reorder_snode_consecutively(&mut ordering);
        sntree.calculate_block_dimensions();

        let reverse_ordering = invperm(&ordering);
        let nz_ind_map = find_nz_ind_map(nz_mask, &reverse_ordering);

        Self {
            sntree,
            ordering,
            reverse_ordering,
            row_range,
            orig_index,
            nz_ind_map,
        }
    }

    /// tree vertex -> row of the original matrix
    pub fn ordering(&self) -> &[usize] {
        &self.ordering
    }

    /// row of the original matrix -> tree vertex
    pub fn reverse_ordering(&self) -> &[usize] {
        &self.reverse_ordering
    }

    /// index of the decomposed cone in the original composite cone
    pub fn orig_index(&self) -> usize {
        self.orig_index
    }

    /// rows of the decomposed cone in the original problem
    pub fn row_range(&self) -> Range<usize> {
        self.row_range.clone()
    }

    pub fn n_cliques(&self) -> usize {
        self.sntree.n_cliques
    }

    /// Vertices of the i-th clique (in post order), as sorted
    /// tree vertices
    pub fn clique(&self, i: usize) -> Vec<usize> {
        let mut c: Vec<usize> = self.sntree.get_clique(i).into_iter().collect();
        c.sort_unstable();
        c
    }

    /// The i-th clique as sorted rows of the original matrix
    pub fn clique_in_original(&self, i: usize) -> Vec<usize> {
        let mut c: Vec<usize> = self
            .sntree
            .get_clique(i)
            .iter()
            .map(|&v| self.ordering[v])
            .collect();
        c.sort_unstable();
        c
    }

    /// Separator of the i-th clique, i.e. its overlap with the parent
    pub fn separator(&self, i: usize) -> Vec<usize> {
        let mut s: Vec<usize> = self.sntree.get_separators(i).iter().copied().collect();
        s.sort_unstable();
        s
    }

    /// Post order index of the parent of the i-th clique, if any
    pub fn clique_parent(&self, i: usize) -> Option<usize> {
        self.sntree.get_clique_parent(i)
    }

    /// side dimension of each clique block, in post order
    pub fn block_dims(&self) -> &[usize] {
        &self.sntree.nblk
    }

    pub fn nz_ind_map(&self) -> &SparseVector<usize> {
        &self.nz_ind_map
    }
}

fn find_nz_ind_map(nz_mask: &[bool], reverse_ordering: &[usize]) -> SparseVector<usize> {
    let (nzind, nzval) = nz_mask
        .iter()
        .enumerate()
        .filter(|(_, &nz)| nz)
        .map(|(idx, _)| {
            let (r, c) = upper_triangular_index_to_coord(idx);
            let coord = (reverse_ordering[r], reverse_ordering[c]);
            (idx, coord_to_upper_triangular_index(coord))
        })
        .unzip();

    SparseVector::from_parts(nz_mask.len(), nzind, nzval)
}
