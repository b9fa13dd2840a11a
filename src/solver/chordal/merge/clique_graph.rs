#![allow(non_snake_case)]

use super::*;
use crate::algebra::*;
use crate::solver::chordal::{post_order, INACTIVE_NODE, NO_PARENT};
use std::cmp::{max, min, Reverse};
use std::collections::{BTreeMap, HashMap};
use std::iter::zip;

// Merge strategy on the *reduced* clique graph, i.e. the union of all
// clique trees of the chordal graph.  Every edge carries a weight
// estimating the work saved by merging its two cliques.  Cliques are
// merged along the heaviest permissible edge until no edge has a
// nonnegative weight, after which a clique tree is rebuilt as a
// maximum weight spanning tree of the clique intersection graph.
//
// See Garstka, Cannon, Goulart - A clique graph based merging strategy
// for decomposable SDPs (2019).

// edges keyed as (larger index, smaller index)
type EdgeMap = BTreeMap<(usize, usize), isize>;

pub(crate) struct CliqueGraphMergeStrategy {
    stop: bool,
    edges: EdgeMap,
    adjacency_table: HashMap<usize, VertexSet>,
}

impl CliqueGraphMergeStrategy {
    pub(crate) fn new() -> Self {
        Self {
            stop: false,
            edges: EdgeMap::new(),
            adjacency_table: HashMap::new(),
        }
    }
}

impl MergeStrategy for CliqueGraphMergeStrategy {
    fn initialise(&mut self, t: &mut SuperNodeTree) {
        // the tree structure is abandoned here.  Each supernode absorbs
        // its separator and so holds its full clique until the tree
        // is rebuilt in post_process_merge
        for (snode, separator) in zip(t.snode.iter_mut(), t.separators.iter()) {
            snode.extend(separator.iter().copied());
        }

        for (parent, children) in zip(t.snode_parent.iter_mut(), t.snode_children.iter_mut()) {
            *parent = INACTIVE_NODE;
            children.clear();
        }

        let separators = t.separators.clone();
        let pairs = compute_reduced_clique_graph(separators, &t.snode);

        self.edges = pairs
            .into_iter()
            .map(|(r, c)| ((r, c), edge_metric(&t.snode[r], &t.snode[c])))
            .collect();
        self.adjacency_table = compute_adjacency_table(&self.edges, t.snode.len());
        self.stop = self.edges.is_empty();
    }

    fn is_done(&self) -> bool {
        self.stop
    }

    // heaviest edge whose merge keeps the graph a clique graph
    fn traverse(&mut self, t: &SuperNodeTree) -> Option<(usize, usize)> {
        let keys: Vec<(usize, usize)> = self.edges.keys().copied().collect();
        let weights: Vec<isize> = self.edges.values().copied().collect();
        let mut p = vec![0; weights.len()];
        sortperm_rev(&mut p, &weights);

        let found = p
            .into_iter()
            .map(|k| keys[k])
            .find(|&edge| ispermissible(edge, &self.adjacency_table, &t.snode));

        if found.is_none() {
            self.stop = true;
        }
        found
    }

    fn evaluate(&mut self, _t: &SuperNodeTree, cand: (usize, usize)) -> bool {
        let do_merge = self.edges.get(&cand).is_some_and(|&w| w >= 0);

        if !do_merge {
            self.stop = true;
        }
        do_merge
    }

    fn merge_two_cliques(&self, t: &mut SuperNodeTree, cand: (usize, usize)) {
        let (c1, c2) = cand;

        // clique c2 is merged into c1
        set_union_into_indexed(&mut t.snode, c1, c2);
        t.snode[c2].clear();

        t.n_cliques -= 1
    }

    fn update_strategy(&mut self, t: &SuperNodeTree, cand: (usize, usize), do_merge: bool) {
        if !do_merge {
            return;
        }

        let (c_1_ind, c_removed) = cand;
        let c_1 = &t.snode[c_1_ind];

        let neighbors = self.adjacency_table[&c_1_ind].clone();

        // neighbors of the removed clique that are new to c_1
        let mut new_neighbors = self.adjacency_table[&c_removed].clone();
        for e in neighbors.iter() {
            new_neighbors.shift_remove(e);
        }
        new_neighbors.shift_remove(&c_1_ind);

        // drop every edge touching the removed clique
        self.edges.retain(|&(r, c), _| r != c_removed && c != c_removed);

        // reweigh all edges of the grown clique
        for &n_ind in neighbors.iter().chain(new_neighbors.iter()) {
            if n_ind == c_removed {
                continue;
            }
            let key = (max(c_1_ind, n_ind), min(c_1_ind, n_ind));
            self.edges.insert(key, edge_metric(c_1, &t.snode[n_ind]));
        }

        for &new_neighbor in new_neighbors.iter() {
            if let Some(set) = self.adjacency_table.get_mut(&c_1_ind) {
                set.insert(new_neighbor);
            }
            if let Some(set) = self.adjacency_table.get_mut(&new_neighbor) {
                set.insert(c_1_ind);
            }
        }

        self.adjacency_table.remove(&c_removed);
        for set in self.adjacency_table.values_mut() {
            set.shift_remove(&c_removed);
        }
    }

    fn post_process_merge(&mut self, t: &mut SuperNodeTree) {
        t.snode_post = t.snode.iter().position_all(|x| !x.is_empty());
        t.snode_parent = vec![INACTIVE_NODE; t.snode.len()];
        t.snode_children.iter_mut().for_each(|c| c.clear());
        t.separators.iter_mut().for_each(|s| s.clear());

        if t.n_cliques > 1 {
            self.clique_tree_from_graph(t);
        } else if let Some(&c) = t.snode_post.first() {
            t.snode_parent[c] = NO_PARENT;
        }

        t.snode.iter_mut().for_each(|s| s.sort());
        t.separators.iter_mut().for_each(|s| s.sort());
    }
}

impl CliqueGraphMergeStrategy {
    fn clique_tree_from_graph(&mut self, t: &mut SuperNodeTree) {
        // a clique tree is a maximum weight spanning tree of the
        // clique graph weighted by the clique intersection sizes
        for (&(r, c), w) in self.edges.iter_mut() {
            *w = intersect_dim(&t.snode[r], &t.snode[c]) as isize;
        }

        let tree_edges = kruskal(&self.edges, t.snode.len());

        determine_parent_cliques(
            &mut t.snode_parent,
            &mut t.snode_children,
            &t.snode,
            &t.post,
            &tree_edges,
        );

        post_order(
            &mut t.snode_post,
            &t.snode_parent,
            &mut t.snode_children,
            t.n_cliques,
        );

        split_cliques(
            &mut t.snode,
            &mut t.separators,
            &t.snode_parent,
            &t.snode_post,
        );
    }
}

// ------------------- internal utilities -------------------

// Edges of the reduced clique graph, following Habib and Stacho,
// "Polynomial-time algorithm for the leafage of chordal graphs" (2009):
// for each minimal separator S, largest first, connect every pair of
// cliques containing S that lie in different components of the
// separator graph of S.
fn compute_reduced_clique_graph(
    mut separators: Vec<VertexSet>,
    snode: &[VertexSet],
) -> Vec<(usize, usize)> {
    separators.sort_by_key(|s| Reverse(s.len()));

    let mut pairs = Vec::new();

    for separator in separators.iter() {
        let clique_indices = snode
            .iter()
            .position_all(|x| !x.is_empty() && separator.is_subset(*x));

        let H = separator_graph(&clique_indices, separator, snode);
        let components = find_components(&H, &clique_indices);

        for (i, &ci) in clique_indices.iter().enumerate() {
            for &cj in clique_indices[(i + 1)..].iter() {
                if components[&ci] != components[&cj] {
                    pairs.push((max(ci, cj), min(ci, cj)));
                }
            }
        }
    }

    pairs
}

// Separator graph of `separator`: cliques containing it, joined when
// they share more than the separator itself
fn separator_graph(
    clique_ind: &[usize],
    separator: &VertexSet,
    snode: &[VertexSet],
) -> HashMap<usize, Vec<usize>> {
    let mut H: HashMap<usize, Vec<usize>> =
        clique_ind.iter().map(|&v| (v, Vec::new())).collect();

    for (i, &ca) in clique_ind.iter().enumerate() {
        for &cb in clique_ind[(i + 1)..].iter() {
            if !inter_equal(&snode[ca], &snode[cb], separator) {
                H.entry(ca).or_default().push(cb);
                H.entry(cb).or_default().push(ca);
            }
        }
    }
    H
}

// component label of every clique of the separator graph
fn find_components(H: &HashMap<usize, Vec<usize>>, clique_ind: &[usize]) -> HashMap<usize, usize> {
    let mut label = HashMap::<usize, usize>::with_capacity(clique_ind.len());
    let mut stack = Vec::new();

    for (ncomp, &v) in clique_ind.iter().enumerate() {
        if label.contains_key(&v) {
            continue;
        }
        label.insert(v, ncomp);
        stack.push(v);
        while let Some(u) = stack.pop() {
            for &w in H[&u].iter() {
                if let std::collections::hash_map::Entry::Vacant(e) = label.entry(w) {
                    e.insert(ncomp);
                    stack.push(w);
                }
            }
        }
    }
    label
}

// s1 ∩ s2 == s3
fn inter_equal(s1: &VertexSet, s2: &VertexSet, s3: &VertexSet) -> bool {
    let (sa, sb) = if s1.len() < s2.len() { (s1, s2) } else { (s2, s1) };

    let mut dim = 0;
    for e in sa.iter().filter(|e| sb.contains(*e)) {
        if !s3.contains(e) {
            return false;
        }
        dim += 1;
    }
    dim == s3.len()
}

fn compute_adjacency_table(edges: &EdgeMap, num_vertices: usize) -> HashMap<usize, VertexSet> {
    let mut table: HashMap<usize, VertexSet> =
        (0..num_vertices).map(|i| (i, VertexSet::new())).collect();

    for &(r, c) in edges.keys() {
        table.entry(r).or_default().insert(c);
        table.entry(c).or_default().insert(r);
    }
    table
}

// An edge is permissible if every common neighbor N of its cliques
// satisfies C_1 ∩ N == C_2 ∩ N
fn ispermissible(
    edge: (usize, usize),
    adjacency_table: &HashMap<usize, VertexSet>,
    snode: &[VertexSet],
) -> bool {
    let (c_1, c_2) = edge;
    let (Some(adj1), Some(adj2)) = (adjacency_table.get(&c_1), adjacency_table.get(&c_2)) else {
        return false;
    };

    adj1.intersection(adj2).all(|&neighbor| {
        let int1: VertexSet = snode[c_1].intersection(&snode[neighbor]).copied().collect();
        let int2: VertexSet = snode[c_2].intersection(&snode[neighbor]).copied().collect();
        int1.len() == int2.len() && int1.is_subset(&int2)
    })
}

fn intersect_dim(s1: &VertexSet, s2: &VertexSet) -> usize {
    let (sa, sb) = if s1.len() < s2.len() { (s1, s2) } else { (s2, s1) };
    sa.iter().filter(|e| sb.contains(*e)).count()
}

fn union_dim(s1: &VertexSet, s2: &VertexSet) -> usize {
    s1.len() + s2.len() - intersect_dim(s1, s2)
}

// Kruskal's algorithm for a maximum weight spanning forest.  Returns
// the selected edges.
fn kruskal(edges: &EdgeMap, num_vertices: usize) -> Vec<(usize, usize)> {
    let keys: Vec<(usize, usize)> = edges.keys().copied().collect();
    let weights: Vec<isize> = edges.values().copied().collect();

    let mut p = vec![0; weights.len()];
    sortperm_rev(&mut p, &weights);

    let mut connected = DisjointSetUnion::new(num_vertices);
    let mut tree = Vec::new();

    for (row, col) in p.into_iter().map(|k| keys[k]) {
        if !connected.in_same_set(row, col) {
            connected.union(row, col);
            tree.push((row, col));
        }
    }
    tree
}

// Orients the spanning tree.  The root is the clique holding the
// vertex eliminated last; any clique left unreached roots its own tree.
fn determine_parent_cliques(
    snode_parent: &mut [usize],
    snode_children: &mut [VertexSet],
    cliques: &[VertexSet],
    post: &[usize],
    tree_edges: &[(usize, usize)],
) {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); cliques.len()];
    for &(r, c) in tree_edges {
        adjacency[r].push(c);
        adjacency[c].push(r);
    }

    let first_root = post
        .last()
        .and_then(|v| cliques.iter().position(|clique| clique.contains(v)));

    let others = cliques.iter().position_all(|c| !c.is_empty());

    for root in first_root.into_iter().chain(others) {
        if snode_parent[root] != INACTIVE_NODE {
            continue;
        }
        snode_parent[root] = NO_PARENT;

        let mut stack = vec![root];
        while let Some(c) = stack.pop() {
            for &n in adjacency[c].iter() {
                if snode_parent[n] == INACTIVE_NODE && n != root {
                    snode_parent[n] = c;
                    snode_children[c].insert(n);
                    stack.push(n);
                }
            }
        }
    }
}

// Splits each full clique into separator (intersection with the
// parent) and supernode.  Children come first in post order, so the
// parent still holds its full clique at that point.
fn split_cliques(
    snode: &mut [VertexSet],
    separators: &mut [VertexSet],
    snode_parent: &[usize],
    snode_post: &[usize],
) {
    for &c in snode_post {
        let p = snode_parent[c];
        if p == NO_PARENT {
            continue;
        }

        let sep: VertexSet = snode[c].intersection(&snode[p]).copied().collect();
        snode[c].retain(|v| !sep.contains(v));
        separators[c] = sep;
    }
}

// Saving from merging two cliques: n₁³ + n₂³ - n_merged³
fn edge_metric(c_a: &VertexSet, c_b: &VertexSet) -> isize {
    let n_1 = c_a.len() as isize;
    let n_2 = c_b.len() as isize;
    let n_m = union_dim(c_a, c_b) as isize;

    n_1.pow(3) + n_2.pow(3) - n_m.pow(3)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algebra::CscMatrix;

    fn set(v: &[usize]) -> VertexSet {
        v.iter().copied().collect()
    }

    #[test]
    fn test_set_utilities() {
        let a = set(&[1, 2, 3]);
        let b = set(&[2, 3, 4, 5]);
        assert_eq!(intersect_dim(&a, &b), 2);
        assert_eq!(union_dim(&a, &b), 5);
        assert!(inter_equal(&a, &b, &set(&[3, 2])));
        assert!(!inter_equal(&a, &b, &set(&[2])));
        assert_eq!(edge_metric(&a, &b), 27 + 64 - 125);
    }

    #[test]
    fn test_kruskal_picks_heaviest() {
        // triangle with weights 1, 2, 3
        let edges: EdgeMap = [((1, 0), 1), ((2, 0), 2), ((2, 1), 3)].into_iter().collect();
        let mut tree = kruskal(&edges, 3);
        tree.sort();
        assert_eq!(tree, vec![(2, 0), (2, 1)]);
    }

    // L pattern from a list of strictly lower column patterns
    fn factor_from_columns(cols: &[&[usize]]) -> CscMatrix<f64> {
        let mut colptr = vec![0];
        let mut rowval = vec![];
        for c in cols {
            rowval.extend_from_slice(c);
            colptr.push(rowval.len());
        }
        let (n, nnz) = (cols.len(), rowval.len());
        CscMatrix::new(n, n, colptr, rowval, vec![1.; nnz])
    }

    #[test]
    fn test_overlapping_cliques_merge() {
        // {0,1,2,3,4} and {1,2,3,4,5} share four vertices, so one
        // 6x6 block is cheaper than two 5x5 ones
        let L = factor_from_columns(&[&[1, 2, 3, 4], &[2, 3, 4, 5], &[3, 4, 5], &[4, 5], &[5], &[]]);
        let mut t = SuperNodeTree::new(&L);
        assert_eq!(t.n_cliques, 2);

        CliqueGraphMergeStrategy::new().merge_cliques(&mut t);

        assert_eq!(t.n_cliques, 1);
        assert_eq!(t.snode_post.len(), 1);
        assert_eq!(t.get_snode(0).len(), 6);
        assert!(t.get_separators(0).is_empty());
        assert_eq!(t.get_clique_parent(0), None);
    }

    #[test]
    fn test_small_overlaps_stay_apart() {
        // cliques {0,1,3}, {2,3}, {3,4} only share vertex 3
        let L = factor_from_columns(&[&[1, 3], &[3], &[3], &[4], &[]]);
        let mut t = SuperNodeTree::new(&L);
        CliqueGraphMergeStrategy::new().merge_cliques(&mut t);

        assert_eq!(t.n_cliques, 3);
        let roots = (0..3).filter(|&i| t.get_clique_parent(i).is_none()).count();
        assert_eq!(roots, 1);
        for i in 0..2 {
            let p = t.get_clique_parent(i).unwrap();
            let sep: Vec<usize> = t.get_separators(i).iter().copied().collect();
            assert_eq!(sep, vec![3]);
            assert!(t.get_separators(i).is_subset(&t.get_clique(p)));
        }
    }

    #[test]
    fn test_large_cliques_stay_apart() {
        // two 4-cliques {0,1,2,3} and {3,4,5,6} sharing vertex 3
        let L = factor_from_columns(&[&[1, 2, 3], &[2, 3], &[3], &[4, 5, 6], &[5, 6], &[6], &[]]);

        let mut t = SuperNodeTree::new(&L);
        assert_eq!(t.n_cliques, 2);
        CliqueGraphMergeStrategy::new().merge_cliques(&mut t);
        assert_eq!(t.n_cliques, 2);

        // the tree is rebuilt with the shared vertex as separator
        let child = 0;
        let parent = t.get_clique_parent(child).unwrap();
        assert_eq!(t.get_separators(child).len(), 1);
        assert!(t.get_separators(child).is_subset(&t.get_clique(parent)));
    }
}
