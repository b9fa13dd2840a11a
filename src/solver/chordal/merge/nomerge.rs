use super::*;

// leaves the supernodal tree untouched
pub(crate) struct NoMergeStrategy;

impl NoMergeStrategy {
    pub(crate) fn new() -> Self {
        Self {}
    }
}

impl MergeStrategy for NoMergeStrategy {
    fn initialise(&mut self, _t: &mut SuperNodeTree) {}

    fn is_done(&self) -> bool {
        true
    }

    fn traverse(&mut self, _t: &SuperNodeTree) -> Option<(usize, usize)> {
        None
    }

    fn evaluate(&mut self, _t: &SuperNodeTree, _cand: (usize, usize)) -> bool {
        false
    }

    fn merge_two_cliques(&self, _t: &mut SuperNodeTree, _cand: (usize, usize)) {}

    fn update_strategy(&mut self, _t: &SuperNodeTree, _cand: (usize, usize), _do_merge: bool) {}

    fn post_process_merge(&mut self, _t: &mut SuperNodeTree) {}
}
