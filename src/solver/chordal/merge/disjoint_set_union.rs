// disjoint set union (union-find) with union by rank and path halving,
// used by Kruskal's algorithm in the clique graph merge

#[derive(Debug)]
pub(crate) struct DisjointSetUnion {
    parents: Vec<usize>,
    ranks: Vec<usize>,
}

impl DisjointSetUnion {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            parents: (0..n).collect(),
            ranks: vec![0; n],
        }
    }

    pub(crate) fn union(&mut self, x: usize, y: usize) {
        let r = self.root(x);
        let s = self.root(y);

        if r == s {
            return;
        }

        match self.ranks[r].cmp(&self.ranks[s]) {
            std::cmp::Ordering::Greater => {
                self.parents[s] = r;
            }
            std::cmp::Ordering::Less => {
                self.parents[r] = s;
            }
            std::cmp::Ordering::Equal => {
                self.parents[r] = s;
                self.ranks[s] += 1;
            }
        }
    }

    pub(crate) fn in_same_set(&mut self, x: usize, y: usize) -> bool {
        self.root(x) == self.root(y)
    }

    fn root(&mut self, mut x: usize) -> usize {
        while self.parents[x] != x {
            self.parents[x] = self.parents[self.parents[x]];
            x = self.parents[x];
        }
        x
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_union() {
        let mut dsu = DisjointSetUnion::new(5);
        dsu.union(0, 1);
        dsu.union(2, 3);
        dsu.union(1, 2);
        assert!(dsu.in_same_set(0, 2));
        assert!(dsu.in_same_set(1, 3));
        assert!(dsu.in_same_set(0, 3));
        assert!(!dsu.in_same_set(4, 2));

        // union with itself
        let mut dsu = DisjointSetUnion::new(5);
        dsu.union(0, 0);
        assert!(dsu.in_same_set(0, 0));
        assert!(!dsu.in_same_set(0, 1));
    }

    #[test]
    fn test_long_chains() {
        // chains deep enough that the compression has work to do
        let mut dsu = DisjointSetUnion::new(10);
        for i in 0..4 {
            dsu.union(i, i + 1);
        }
        for i in 5..9 {
            dsu.union(i, i + 1);
        }
        assert!(dsu.in_same_set(0, 4));
        assert!(dsu.in_same_set(9, 5));
        assert!(!dsu.in_same_set(4, 5));

        dsu.union(4, 9);
        let common = dsu.root(0);
        assert!((0..10).all(|i| dsu.root(i) == common));
    }
}
