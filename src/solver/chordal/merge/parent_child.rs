use super::*;
use crate::solver::chordal::{post_order, INACTIVE_NODE, NO_PARENT};

// Walks the tree from the top down and merges a clique into its
// parent whenever the merge creates little fill, or both supernodes
// are small.
pub(crate) struct ParentChildMergeStrategy {
    stop: bool,
    clique_index: usize,
    t_fill: usize,
    t_size: usize,
}

impl ParentChildMergeStrategy {
    pub(crate) fn new() -> Self {
        Self {
            stop: false,
            clique_index: 0,
            t_fill: 8,
            t_size: 8,
        }
    }
}

impl MergeStrategy for ParentChildMergeStrategy {
    fn initialise(&mut self, t: &mut SuperNodeTree) {
        // roots are skipped in traverse, so start from the very top
        self.clique_index = t.snode_post.len().saturating_sub(1);
        self.stop = t.snode_post.is_empty();
    }

    fn is_done(&self) -> bool {
        self.stop
    }

    // next (parent, child) pair in descending post order
    fn traverse(&mut self, t: &SuperNodeTree) -> Option<(usize, usize)> {
        loop {
            let c = t.snode_post[self.clique_index];
            let p = t.snode_parent[c];
            if p != NO_PARENT {
                return Some((p, c));
            }
            if self.clique_index == 0 {
                self.stop = true;
                return None;
            }
            self.clique_index -= 1;
        }
    }

    fn evaluate(&mut self, t: &SuperNodeTree, cand: (usize, usize)) -> bool {
        if self.stop {
            return false;
        }

        let (parent, child) = cand;

        let (dim_parent_snode, dim_parent_sep) = clique_dim(t, parent);
        let (dim_clique_snode, dim_clique_sep) = clique_dim(t, child);

        let fill = fill_in(
            dim_clique_snode,
            dim_clique_sep,
            dim_parent_snode,
            dim_parent_sep,
        );
        let max_snode = std::cmp::max(dim_clique_snode, dim_parent_snode);

        fill <= self.t_fill || max_snode <= self.t_size
    }

    fn merge_two_cliques(&self, t: &mut SuperNodeTree, cand: (usize, usize)) {
        let (p, ch) = cand;

        // child's vertices join the parent.  The parent's separator
        // is unchanged since the child's separator lies in the parent
        set_union_into_indexed(&mut t.snode, p, ch);
        t.snode[ch].clear();
        t.separators[ch].clear();

        // grandchildren move up to the parent
        for &grandch in t.snode_children[ch].iter() {
            t.snode_parent[grandch] = p;
        }
        t.snode_parent[ch] = INACTIVE_NODE;

        t.snode_children[p].shift_remove(&ch);
        set_union_into_indexed(&mut t.snode_children, p, ch);
        t.snode_children[ch].clear();

        t.n_cliques -= 1;
    }

    fn update_strategy(&mut self, _t: &SuperNodeTree, _cand: (usize, usize), _do_merge: bool) {
        if self.clique_index == 0 {
            self.stop = true
        } else {
            self.clique_index -= 1
        }
    }

    fn post_process_merge(&mut self, t: &mut SuperNodeTree) {
        // drop the emptied supernodes from the post order
        post_order(
            &mut t.snode_post,
            &t.snode_parent,
            &mut t.snode_children,
            t.n_cliques,
        );
    }
}

// -------------------- utilities --------------------

// (supernode, separator) sizes of supernode i, by id
fn clique_dim(t: &SuperNodeTree, i: usize) -> (usize, usize) {
    (t.snode[i].len(), t.separators[i].len())
}

// number of zero entries added to the parent block when the child
// clique is merged into it
fn fill_in(
    dim_clique_snode: usize,
    dim_clique_sep: usize,
    dim_parent_snode: usize,
    dim_parent_sep: usize,
) -> usize {
    let dim_parent = dim_parent_snode + dim_parent_sep;
    let dim_clique = dim_clique_snode + dim_clique_sep;

    (dim_parent - dim_clique_sep) * (dim_clique - dim_clique_sep)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algebra::CscMatrix;

    #[test]
    fn test_small_cliques_merge() {
        // cliques {0,1,3}, {2,3}, {3,4}: every pair is under the size
        // threshold, so everything collapses into one clique
        let L = CscMatrix::new(
            5,
            5,
            vec![0, 2, 3, 4, 5, 5],
            vec![1, 3, 3, 3, 4],
            vec![1.; 5],
        );
        let mut t = SuperNodeTree::new(&L);
        ParentChildMergeStrategy::new().merge_cliques(&mut t);

        assert_eq!(t.n_cliques, 1);
        assert_eq!(t.snode_post.len(), 1);
        assert_eq!(t.get_snode(0).len(), 5);
    }

    #[test]
    fn test_roots_are_not_merged() {
        // two components, each a single supernode
        let L = CscMatrix::new(4, 4, vec![0, 1, 1, 2, 2], vec![1, 3], vec![1.; 2]);
        let mut t = SuperNodeTree::new(&L);
        ParentChildMergeStrategy::new().merge_cliques(&mut t);
        assert_eq!(t.n_cliques, 2);
    }

    #[test]
    fn test_fill_in() {
        // a 2+1 clique under a 3+0 parent adds (3-1)*(3-1) entries
        assert_eq!(fill_in(2, 1, 3, 0), 4);
    }
}
