#![allow(non_snake_case)]
use super::VertexSet;
use crate::algebra::*;
use std::iter::zip;

// marks roots, i.e. nodes with no parent
pub(crate) const NO_PARENT: usize = usize::MAX;

// marks supernodes that have been merged away
pub(crate) const INACTIVE_NODE: usize = usize::MAX - 1;

// Supernodal elimination tree of the symbolic factor L of a chordal
// graph.  Supernodes are held in parallel arrays and addressed by
// integer id, so merging two of them is a set union plus relinking
// of the parent / children entries.  A disconnected graph gives a
// forest, with one root per connected component.
#[derive(Debug, Clone)]
pub(crate) struct SuperNodeTree {
    // vertices of each supernode (the clique residuals)
    pub snode: Vec<VertexSet>,
    // post order of the active supernodes
    pub snode_post: Vec<usize>,
    // parent of each supernode, NO_PARENT or INACTIVE_NODE
    pub snode_parent: Vec<usize>,
    // children of each supernode
    pub snode_children: Vec<VertexSet>,
    // post order of the vertices of the elimination tree
    pub post: Vec<usize>,
    // separators, i.e. the part of each clique shared with its parent
    pub separators: Vec<VertexSet>,
    // clique sizes, in post order.  Empty until calculate_block_dimensions
    pub nblk: Vec<usize>,
    // number of active supernodes / cliques
    pub n_cliques: usize,
}

impl SuperNodeTree {
    pub fn new<T: FloatT>(L: &CscMatrix<T>) -> Self {
        let parent = parent_from_L(L);
        let mut children = children_from_parent(&parent);
        let mut post = Vec::with_capacity(parent.len());
        post_order(&mut post, &parent, &mut children, parent.len());

        let degree = higher_degree(L);
        let (snode, snode_parent) = find_supernodes(&parent, &post, &degree);

        let mut snode_children = children_from_parent(&snode_parent);
        let mut snode_post = Vec::with_capacity(snode_parent.len());
        post_order(
            &mut snode_post,
            &snode_parent,
            &mut snode_children,
            snode_parent.len(),
        );

        let separators = find_separators(L, &snode);
        let n_cliques = snode.len();

        Self {
            snode,
            snode_post,
            snode_parent,
            snode_children,
            post,
            separators,
            nblk: Vec::new(),
            n_cliques,
        }
    }

    pub(crate) fn get_snode(&self, i: usize) -> &VertexSet {
        &self.snode[self.snode_post[i]]
    }

    pub(crate) fn get_separators(&self, i: usize) -> &VertexSet {
        &self.separators[self.snode_post[i]]
    }

    // parent of the i-th clique in post order, as a post order index
    pub(crate) fn get_clique_parent(&self, i: usize) -> Option<usize> {
        let p = self.snode_parent[self.snode_post[i]];
        if p == NO_PARENT || p == INACTIVE_NODE {
            return None;
        }
        self.snode_post.iter().position(|&c| c == p)
    }

    // size of the i-th clique in post order
    pub(crate) fn get_nblk(&self, i: usize) -> usize {
        self.nblk[i]
    }

    pub(crate) fn get_overlap(&self, i: usize) -> usize {
        self.get_separators(i).len()
    }

    // supernode ∪ separator of the i-th clique in post order
    pub(crate) fn get_clique(&self, i: usize) -> VertexSet {
        let c = self.snode_post[i];
        let mut out = VertexSet::with_capacity(self.snode[c].len() + self.separators[c].len());
        out.extend(self.snode[c].iter().copied());
        out.extend(self.separators[c].iter().copied());
        out
    }

    // total packed size of the clique blocks and of their overlaps
    pub(crate) fn get_decomposed_dim_and_overlaps(&self) -> (usize, usize) {
        (0..self.n_cliques).fold((0, 0), |(dim, overlaps), i| {
            (
                dim + triangular_number(self.get_nblk(i)),
                overlaps + triangular_number(self.get_overlap(i)),
            )
        })
    }

    // Renumbers the vertices so that every supernode occupies a
    // consecutive range, supernodes taken in post order.  `ordering`
    // maps tree vertices to rows of the original matrix and is
    // updated to match.
    pub(crate) fn reorder_snode_consecutively(&mut self, ordering: &mut [usize]) {
        // p[new] = old
        let mut p = Vec::with_capacity(self.post.len());

        for &i in self.snode_post.iter() {
            let snode = &mut self.snode[i];
            let k = p.len();
            let n = snode.len();
            p.extend(snode.iter().copied());
            p[k..].sort_unstable();

            snode.clear();
            snode.extend(k..(k + n));
        }

        let p_inv = invperm(&p);

        for sep in self.separators.iter_mut() {
            let mut renumbered: Vec<usize> = sep.iter().map(|&v| p_inv[v]).collect();
            renumbered.sort_unstable();
            sep.clear();
            sep.extend(renumbered);
        }

        let old = ordering.to_vec();
        permute(ordering, &old, &p);
    }

    pub(crate) fn calculate_block_dimensions(&mut self) {
        self.nblk = self
            .snode_post
            .iter()
            .map(|&c| self.separators[c].len() + self.snode[c].len())
            .collect();
    }
}

// -------------------------
// utility functions for SuperNodeTree

// the parent of v in the elimination tree is the first off-diagonal
// entry in column v of L.  Empty columns are roots.
fn parent_from_L<T>(L: &CscMatrix<T>) -> Vec<usize>
where
    T: FloatT,
{
    (0..L.ncols())
        .map(|v| {
            let rows = find_higher_order_neighbors(L, v);
            rows.first().copied().unwrap_or(NO_PARENT)
        })
        .collect()
}

fn find_separators<T>(L: &CscMatrix<T>, snode: &[VertexSet]) -> Vec<VertexSet>
where
    T: FloatT,
{
    let mut separators = new_vertex_sets(snode.len());

    for (sn, sep) in zip(snode, separators.iter_mut()) {
        // the lowest vertex sees every higher neighbor of the supernode
        let Some(&vrep) = sn.iter().min() else {
            continue;
        };
        for neighbor in find_higher_order_neighbors(L, vrep) {
            if !sn.contains(neighbor) {
                sep.insert(*neighbor);
            }
        }
    }
    separators
}

fn find_higher_order_neighbors<T>(L: &CscMatrix<T>, v: usize) -> &[usize] {
    &L.rowval[L.colptr[v]..L.colptr[v + 1]]
}

fn higher_degree<T>(L: &CscMatrix<T>) -> Vec<usize>
where
    T: FloatT,
{
    L.colptr.windows(2).map(|w| w[1] - w[0]).collect()
}

fn children_from_parent(parent: &[usize]) -> Vec<VertexSet> {
    let mut children = new_vertex_sets(parent.len());
    for (i, &pi) in parent.iter().enumerate() {
        if pi != NO_PARENT && pi != INACTIVE_NODE {
            children[pi].insert(i);
        }
    }
    children
}

// Post order of a forest given by `parent`.  Nodes that are neither
// roots nor reachable from one (merged away) are dropped, leaving `nc`
// entries in `post`.
pub(crate) fn post_order(
    post: &mut Vec<usize>,
    parent: &[usize],
    children: &mut [VertexSet],
    nc: usize,
) {
    let mut order = vec![usize::MAX; parent.len()];

    // roots pushed in reverse so that the lowest numbered
    // tree is visited first and placed last
    let mut stack: Vec<usize> = parent
        .iter()
        .enumerate()
        .filter(|(_, &p)| p == NO_PARENT)
        .map(|(i, _)| i)
        .rev()
        .collect();

    let mut i = nc;
    while let Some(v) = stack.pop() {
        i -= 1;
        order[v] = i;
        children[v].sort();
        stack.extend(children[v].iter());
    }

    post.clear();
    post.extend(0..parent.len());
    post.sort_by_key(|&x| order[x]);
    post.truncate(nc);
}

// Groups vertices into maximal supernodes.  A vertex joins its
// parent's supernode when it is the first child to do so and the
// parent's column of L is its own column minus the parent itself.
fn find_supernodes(
    parent: &[usize],
    post: &[usize],
    degree: &[usize],
) -> (Vec<VertexSet>, Vec<usize>) {
    let n = parent.len();

    // representative (lowest) vertex of each vertex's supernode
    let mut rep: Vec<usize> = (0..n).collect();
    let mut claimed = vec![false; n];

    for &v in post {
        let p = parent[v];
        if p != NO_PARENT && !claimed[p] && degree[v] == degree[p] + 1 {
            rep[p] = rep[v];
            claimed[p] = true;
        }
    }

    // supernode ids numbered by their representative vertex
    let mut snode_id = vec![usize::MAX; n];
    let mut nsnodes = 0;
    for v in 0..n {
        if rep[v] == v {
            snode_id[v] = nsnodes;
            nsnodes += 1;
        }
    }

    let mut snode = new_vertex_sets(nsnodes);
    for v in 0..n {
        snode[snode_id[rep[v]]].insert(v);
    }

    let mut snode_parent = vec![NO_PARENT; nsnodes];
    for v in 0..n {
        let p = parent[v];
        if p != NO_PARENT && rep[p] != rep[v] {
            snode_parent[snode_id[rep[v]]] = snode_id[rep[p]];
        }
    }

    (snode, snode_parent)
}

fn new_vertex_sets(n: usize) -> Vec<VertexSet> {
    (0..n).map(|_| VertexSet::new()).collect()
}
