mod clique_graph;
mod disjoint_set_union;
mod nomerge;
mod parent_child;
use super::{SuperNodeTree, VertexSet};
use crate::solver::core::SolverError;
pub(crate) use clique_graph::*;
pub(crate) use disjoint_set_union::*;
pub(crate) use nomerge::*;
pub(crate) use parent_child::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Clique merging policy applied after the supernodal tree is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MergeMethod {
    /// keep the supernodes as they are
    None,
    /// merge a child into its parent when fill or size are small
    ParentChild,
    /// merge along the reduced clique graph while doing so saves work
    #[default]
    CliqueGraph,
}

impl std::str::FromStr for MergeMethod {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(MergeMethod::None),
            "parent_child" => Ok(MergeMethod::ParentChild),
            "clique_graph" => Ok(MergeMethod::CliqueGraph),
            _ => Err(SolverError::Decomposition(format!(
                "unrecognized merge method \"{s}\""
            ))),
        }
    }
}

impl MergeMethod {
    pub(crate) fn make_strategy(&self) -> Box<dyn MergeStrategy> {
        match self {
            MergeMethod::None => Box::new(NoMergeStrategy::new()),
            MergeMethod::ParentChild => Box::new(ParentChildMergeStrategy::new()),
            MergeMethod::CliqueGraph => Box::new(CliqueGraphMergeStrategy::new()),
        }
    }
}

// All merge strategies must implement the following trait.

pub(crate) trait MergeStrategy {
    // default implementation for all strategies
    fn merge_cliques(&mut self, t: &mut SuperNodeTree) {
        self.initialise(t);

        while !self.is_done() {
            // find merge candidates
            let Some(cand) = self.traverse(t) else {
                break;
            };

            // evaluate whether to merge the candidates
            let do_merge = self.evaluate(t, cand);
            if do_merge {
                self.merge_two_cliques(t, cand);
            }

            // update strategy information after the merge
            self.update_strategy(t, cand, do_merge);

            if t.n_cliques == 1 {
                break;
            }
        }
        self.post_process_merge(t);
    }

    // initialise the tree and strategy
    fn initialise(&mut self, t: &mut SuperNodeTree);

    // merging complete, so stop the merging process
    fn is_done(&self) -> bool;

    // find the next merge candidates
    fn traverse(&mut self, t: &SuperNodeTree) -> Option<(usize, usize)>;

    // evaluate whether to merge a candidate pair or not
    fn evaluate(&mut self, t: &SuperNodeTree, cand: (usize, usize)) -> bool;

    // execute a merge
    fn merge_two_cliques(&self, t: &mut SuperNodeTree, cand: (usize, usize));

    // update the tree/graph and strategy
    fn update_strategy(&mut self, t: &SuperNodeTree, cand: (usize, usize), do_merge: bool);

    // do any post-processing of the tree/graph
    fn post_process_merge(&mut self, t: &mut SuperNodeTree);
}

// sets[c1] = sets[c1] ∪ sets[c2]
fn set_union_into_indexed(sets: &mut [VertexSet], c1: usize, c2: usize) {
    if c1 == c2 {
        return;
    }
    let (target, source) = if c1 < c2 {
        let (head, tail) = sets.split_at_mut(c2);
        (&mut head[c1], &tail[0])
    } else {
        let (head, tail) = sets.split_at_mut(c1);
        (&mut tail[0], &head[c2])
    };
    target.extend(source.iter().copied());
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_union_into_indexed() {
        let mut sets: Vec<VertexSet> = vec![
            [0, 1].into_iter().collect(),
            [2].into_iter().collect(),
            [1, 3].into_iter().collect(),
        ];
        set_union_into_indexed(&mut sets, 0, 2);
        assert_eq!(sets[0].iter().copied().collect::<Vec<_>>(), vec![0, 1, 3]);
        set_union_into_indexed(&mut sets, 2, 1);
        assert_eq!(sets[2].iter().copied().collect::<Vec<_>>(), vec![1, 3, 2]);
        assert_eq!(sets[1].len(), 1);
    }

    #[test]
    fn test_merge_method_parsing() {
        assert_eq!("none".parse::<MergeMethod>().unwrap(), MergeMethod::None);
        assert_eq!(
            "parent_child".parse::<MergeMethod>().unwrap(),
            MergeMethod::ParentChild
        );
        assert_eq!(
            "clique_graph".parse::<MergeMethod>().unwrap(),
            MergeMethod::CliqueGraph
        );
        assert!("greedy".parse::<MergeMethod>().is_err());
    }
}
