#![allow(non_snake_case)]
// -----------------------------------
// psd completion
// -----------------------------------

// The reversed dual of a decomposed cone is only known on the chordal
// pattern.  The remaining entries are free, and are chosen here so that
// the dual is positive semidefinite (Vandenberghe & Andersen, "Chordal
// Graphs and Semidefinite Optimization", p. 362).

use crate::{
    algebra::*,
    solver::{
        chordal::{ChordalInfo, SparsityPattern},
        implementations::default::DefaultVariables,
    },
};

impl<T> ChordalInfo<T>
where
    T: FloatT,
{
    pub(crate) fn psd_completion(&self, variables: &mut DefaultVariables<T>) {
        for pattern in self.spatterns.iter() {
            // μ = -y, and the completion is odd in the matrix it
            // completes, so μ can be completed directly
            let μ = &mut variables.μ[pattern.row_range()];
            complete(μ, pattern);
        }
    }
}

fn complete<T>(μ: &mut [T], pattern: &SparsityPattern)
where
    T: FloatT,
{
    let n = pattern.ordering.len();
    let mut M = vec![T::zero(); n * n];
    svec_to_mat(&mut M, μ, n);
    psd_complete(&mut M, n, pattern);
    mat_to_svec(μ, &M, n);
}

// completes the full n×n column major matrix M, whose entries outside
// the clique blocks of `pattern` are zero
fn psd_complete<T>(M: &mut [T], n: usize, pattern: &SparsityPattern)
where
    T: FloatT,
{
    let sntree = &pattern.sntree;
    let p = &pattern.ordering;

    // W is M permuted into clique order
    let mut W = vec![T::zero(); n * n];
    for col in 0..n {
        for row in 0..n {
            W[col * n + row] = M[p[col] * n + p[row]];
        }
    }

    let mut Wαα = vec![];
    let mut Y = vec![];

    // cliques in descending post order.  The last one is a root.
    for j in (0..sntree.n_cliques.saturating_sub(1)).rev() {
        // supernode and separator of the clique
        let ν: Vec<usize> = sntree.get_snode(j).iter().copied().collect();
        let α: Vec<usize> = sntree.get_separators(j).iter().copied().collect();

        // zeros below the representative vertex of the supernode
        let Some(&i) = ν.iter().min() else {
            continue;
        };
        let η: Vec<usize> = ((i + 1)..n)
            .filter(|x| !α.contains(x) && !ν.contains(x))
            .collect();

        // roots of a forest have no separator and the zeros between
        // components stay zero
        if α.is_empty() || η.is_empty() {
            continue;
        }
        let (kα, kν) = (α.len(), ν.len());

        // Y = Wαα⁺ Wαν
        Wαα.clear();
        Wαα.extend(α.iter().flat_map(|&c| α.iter().map(move |&r| (r, c))).map(|(r, c)| W[c * n + r]));
        Y.clear();
        Y.extend(ν.iter().flat_map(|&c| α.iter().map(move |&r| (r, c))).map(|(r, c)| W[c * n + r]));
        sym_pinv_solve(&mut Wαα, &mut Y, kα, kν);

        // W[η,ν] = Wηα Y, and its transpose
        for (c, &v) in ν.iter().enumerate() {
            let yc = &Y[c * kα..(c + 1) * kα];
            for &e in η.iter() {
                let val = α
                    .iter()
                    .zip(yc)
                    .fold(T::zero(), |acc, (&a, &y)| acc + W[a * n + e] * y);
                W[v * n + e] = val;
                W[e * n + v] = val;
            }
        }
    }

    // back to the original order
    for col in 0..n {
        for row in 0..n {
            M[p[col] * n + p[row]] = W[col * n + row];
        }
    }
}
