// assorted index and permutation helpers missing from std

use std::cmp::Ordering;

// vectorized std::iter::position, returning the indices
// of *all* elements satisfying a predicate
pub(crate) trait PositionAll<T>: Iterator<Item = T> {
    fn position_all<F>(&mut self, predicate: F) -> Vec<usize>
    where
        F: FnMut(&T) -> bool;
}

impl<T, I> PositionAll<T> for I
where
    I: Iterator<Item = T>,
{
    fn position_all<F>(&mut self, mut f: F) -> Vec<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.enumerate()
            .filter(|(_, item)| f(item))
            .map(|(index, _)| index)
            .collect::<Vec<_>>()
    }
}

// x = b[p]
pub(crate) fn permute<T: Copy>(x: &mut [T], b: &[T], p: &[usize]) {
    assert_eq!(x.len(), b.len());
    assert_eq!(x.len(), p.len());
    for (xi, &pi) in x.iter_mut().zip(p) {
        *xi = b[pi];
    }
}

// x[p] = b
pub(crate) fn ipermute<T: Copy>(x: &mut [T], b: &[T], p: &[usize]) {
    assert_eq!(x.len(), b.len());
    assert_eq!(x.len(), p.len());
    for (&bi, &pi) in b.iter().zip(p) {
        x[pi] = bi;
    }
}

// Construct an inverse permutation from a permutation.
// Panics if p is not a permutation of 0..p.len()
pub(crate) fn invperm(p: &[usize]) -> Vec<usize> {
    let mut b = vec![usize::MAX; p.len()];
    for (i, &j) in p.iter().enumerate() {
        assert!(j < p.len() && b[j] == usize::MAX, "invalid permutation");
        b[j] = i;
    }
    b
}

// stable sort of the indices of v with a user comparison
pub(crate) fn sortperm_by<T, F>(p: &mut [usize], v: &[T], compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    assert_eq!(p.len(), v.len());
    p.iter_mut().enumerate().for_each(|(i, p)| *p = i);
    let mut f = compare;
    p.sort_by(|&i, &j| f(&v[i], &v[j]));
}

// indices of v in descending order, ties kept in place
pub(crate) fn sortperm_rev<T>(p: &mut [usize], v: &[T])
where
    T: Ord,
{
    sortperm_by(p, v, |a, b| b.cmp(a));
}
