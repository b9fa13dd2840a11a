#![allow(non_snake_case)]
#![allow(clippy::type_complexity)]

use conic_admm::algebra::*;
use conic_admm::solver::chordal::{ChordalInfo, MergeMethod};
use conic_admm::solver::core::cones::{Cone, PSDTriangleCone};
use conic_admm::solver::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::ops::Range;

const MERGE_METHODS: [&str; 3] = ["none", "parent_child", "clique_graph"];

fn packed_index(r: usize, c: usize) -> usize {
    let (r, c) = if r <= c { (r, c) } else { (c, r) };
    c * (c + 1) / 2 + r
}

// min ½‖x‖² s.t. b + x ∈ PSD, where x only enters the packed
// entries of the given diagonal blocks
fn block_psd_data(
    side: usize,
    blocks: &[Range<usize>],
) -> (
    CscMatrix<f64>,
    Vec<f64>,
    CscMatrix<f64>,
    Vec<f64>,
    Vec<SupportedConeT>,
) {
    let m = side * (side + 1) / 2;

    let mut rows: Vec<usize> = blocks
        .iter()
        .flat_map(|blk| {
            blk.clone()
                .flat_map(move |c| (blk.start..=c).map(move |r| packed_index(r, c)))
        })
        .collect();
    rows.sort_unstable();
    let n = rows.len();

    let A = CscMatrix::new_from_triplets(m, n, rows.clone(), (0..n).collect(), vec![-1.; n]);
    let P = CscMatrix::identity(n);
    let q = vec![0.; n];

    let mut b = vec![0.; m];
    for &row in &rows {
        b[row] = ((row * 7) % 5) as f64 - 2.;
    }

    (P, q, A, b, vec![PSDTriangleConeT(side)])
}

fn settings(decompose: bool, merge_method: &str) -> DefaultSettings<f64> {
    DefaultSettingsBuilder::default()
        .chordal_decomposition_enable(decompose)
        .chordal_decomposition_merge_method(merge_method.to_string())
        .build()
        .unwrap()
}

#[test]
fn test_two_dense_blocks_decompose() {
    let (P, q, A, b, cones) = block_psd_data(10, &[0..5, 5..10]);

    for method in MERGE_METHODS {
        let solver = DefaultSolver::new(&P, &q, &A, &b, &cones, settings(true, method)).unwrap();
        let ws = solver.workspace();
        assert!(ws.states().is_chordal_decomposed());

        let info = ws.chordal_info().unwrap();
        assert_eq!(info.decomposable_cone_count(), 1);
        assert_eq!(info.final_psd_cone_count(), 2);

        let pattern = &info.patterns()[0];
        assert_eq!(pattern.n_cliques(), 2);
        assert_eq!(pattern.block_dims(), &[5, 5]);
        assert!((0..2).all(|i| pattern.separator(i).is_empty()));

        let mut cliques: Vec<_> = (0..2).map(|i| pattern.clique_in_original(i)).collect();
        cliques.sort();
        assert_eq!(cliques, vec![(0..5).collect::<Vec<_>>(), (5..10).collect()]);

        // one linking zero cone and two clique cones, all from cone 0
        assert_eq!(info.cone_map(), &[0, 0, 0]);
        assert_eq!(
            ws.data().unwrap().cones,
            vec![ZeroConeT(55), PSDTriangleConeT(5), PSDTriangleConeT(5)]
        );
    }
}

#[test]
fn test_decomposition_preserves_solution() {
    let _ = env_logger::builder().is_test(true).try_init();

    let (P, q, A, b, cones) = block_psd_data(6, &[0..3, 3..6]);

    let mut reference = DefaultSolver::new(&P, &q, &A, &b, &cones, settings(false, "none")).unwrap();
    reference.solve();
    assert_eq!(reference.solution.status, SolverStatus::Solved);
    assert!(reference.workspace().chordal_info().is_none());

    for method in MERGE_METHODS {
        let mut solver =
            DefaultSolver::new(&P, &q, &A, &b, &cones, settings(true, method)).unwrap();
        assert!(solver.workspace().states().is_chordal_decomposed());

        solver.solve();

        let sol = &solver.solution;
        assert_eq!(sol.status, SolverStatus::Solved);

        // results are reported in the dimensions of the original problem
        assert_eq!(sol.x.len(), A.ncols());
        assert_eq!(sol.s.len(), A.nrows());
        assert_eq!(sol.y.len(), A.nrows());

        assert!(sol.x.norm_inf_diff(&reference.solution.x) <= 1e-3);
        assert!(sol.s.norm_inf_diff(&reference.solution.s) <= 1e-3);
        assert!(f64::abs(sol.obj_val - reference.solution.obj_val) <= 1e-3);
    }
}

// min ½‖x‖² s.t. B + x ∈ PSD, where B is tridiagonal with ones on the
// diagonal and twos beside it, and x only enters the tridiagonal
// entries.  B is indefinite, so the cone constraint is active.
fn tridiagonal_psd_data(
    side: usize,
) -> (
    CscMatrix<f64>,
    Vec<f64>,
    CscMatrix<f64>,
    Vec<f64>,
    Vec<SupportedConeT>,
) {
    let m = side * (side + 1) / 2;

    let mut rows: Vec<usize> = (0..side).map(|i| packed_index(i, i)).collect();
    rows.extend((1..side).map(|i| packed_index(i - 1, i)));
    rows.sort_unstable();
    let n = rows.len();

    let mut b = vec![0.; m];
    for i in 0..side {
        b[packed_index(i, i)] = 1.;
        if i > 0 {
            b[packed_index(i - 1, i)] = 2. * f64::sqrt(2.);
        }
    }

    let A = CscMatrix::new_from_triplets(m, n, rows, (0..n).collect(), vec![-1.; n]);
    let P = CscMatrix::identity(n);
    let q = vec![0.; n];

    (P, q, A, b, vec![PSDTriangleConeT(side)])
}

fn tight_settings(decompose: bool, complete_dual: bool) -> DefaultSettings<f64> {
    DefaultSettingsBuilder::default()
        .chordal_decomposition_enable(decompose)
        .chordal_decomposition_merge_method("none".to_string())
        .chordal_decomposition_complete_dual(complete_dual)
        .eps_abs(1e-7)
        .eps_rel(1e-7)
        .max_iter(50000)
        .build()
        .unwrap()
}

// norm of the part of y lying outside the PSD cone
fn psd_violation(y: &[f64], side: usize) -> f64 {
    let mut neg_y: Vec<f64> = y.iter().map(|&v| -v).collect();
    PSDTriangleCone::new(side).project(&mut neg_y);
    neg_y.norm()
}

#[test]
fn test_overlapping_cliques_preserve_solution() {
    let _ = env_logger::builder().is_test(true).try_init();

    let side = 8;
    let (P, q, A, b, cones) = tridiagonal_psd_data(side);

    let mut reference = DefaultSolver::new(&P, &q, &A, &b, &cones, tight_settings(false, true)).unwrap();
    reference.solve();
    assert_eq!(reference.solution.status, SolverStatus::Solved);

    let mut solver = DefaultSolver::new(&P, &q, &A, &b, &cones, tight_settings(true, true)).unwrap();
    {
        let ws = solver.workspace();
        assert!(ws.states().is_chordal_decomposed());
        let pattern = &ws.chordal_info().unwrap().patterns()[0];
        assert!(pattern.n_cliques() > 1);
        assert!((0..pattern.n_cliques()).any(|i| !pattern.separator(i).is_empty()));
    }
    solver.solve();

    let (sol, refsol) = (&solver.solution, &reference.solution);
    assert_eq!(sol.status, SolverStatus::Solved);

    assert!(sol.x.norm_inf_diff(&refsol.x) <= 1e-3);
    assert!(sol.s.norm_inf_diff(&refsol.s) <= 1e-3);
    assert!(f64::abs(sol.obj_val - refsol.obj_val) <= 1e-3);

    // the dual is only unique on the entries that A touches
    for &r in A.rowval.iter() {
        assert!(f64::abs(sol.y[r] - refsol.y[r]) <= 1e-3);
    }

    // and the completed dual is PSD
    assert!(psd_violation(&sol.y, side) <= 1e-4);
}

#[test]
fn test_dual_completion_only_fills_free_entries() {
    let side = 8;
    let (P, q, A, b, cones) = tridiagonal_psd_data(side);

    let mut partial = DefaultSolver::new(&P, &q, &A, &b, &cones, tight_settings(true, false)).unwrap();
    partial.solve();
    let mut completed = DefaultSolver::new(&P, &q, &A, &b, &cones, tight_settings(true, true)).unwrap();
    completed.solve();

    let (yp, yc) = (&partial.solution.y, &completed.solution.y);
    assert_eq!(partial.solution.x, completed.solution.x);
    assert_eq!(partial.solution.s, completed.solution.s);

    // zero filled, the tridiagonal dual is indefinite
    assert!(psd_violation(yp, side) > 1e-2);
    assert!(psd_violation(yc, side) <= 1e-4);

    // entries inside the cliques are left alone
    let pattern = &completed.workspace().chordal_info().unwrap().patterns()[0];
    for i in 0..pattern.n_cliques() {
        let clique = pattern.clique_in_original(i);
        for (k, &c) in clique.iter().enumerate() {
            for &r in &clique[..=k] {
                let idx = packed_index(r, c);
                assert!(f64::abs(yp[idx] - yc[idx]) <= 1e-12);
            }
        }
    }
}

#[test]
fn test_small_cone_below_threshold() {
    let (P, q, A, b, cones) = block_psd_data(4, &[0..2, 2..4]);

    let solver = DefaultSolver::new(&P, &q, &A, &b, &cones, settings(true, "clique_graph")).unwrap();
    let ws = solver.workspace();

    // analysed, but left alone
    assert!(!ws.states().is_chordal_decomposed());
    assert!(!ws.chordal_info().unwrap().is_decomposed());
    assert_eq!(ws.data().unwrap().cones, cones);
}

// random sparse patterns on a PSD cone of the given side, as the
// rows touched by a single column of A
fn random_pattern_data(rng: &mut StdRng, side: usize, density: f64) -> (CscMatrix<f64>, Vec<f64>) {
    let m = side * (side + 1) / 2;
    let mut rows = vec![];
    for c in 0..side {
        for r in 0..c {
            if rng.gen_bool(density) {
                rows.push(packed_index(r, c));
            }
        }
    }
    rows.sort_unstable();
    let k = rows.len();
    let A = CscMatrix::new(m, 1, vec![0, k], rows, vec![1.; k]);
    (A, vec![0.; m])
}

#[test]
fn test_clique_tree_properties() {
    let mut rng = StdRng::seed_from_u64(1234);

    for trial in 0..20 {
        let side = 8 + trial % 7;
        let (A, b) = random_pattern_data(&mut rng, side, 0.2);
        let cones = [NonnegativeConeT(0), PSDTriangleConeT(side)];

        for method in [MergeMethod::None, MergeMethod::ParentChild, MergeMethod::CliqueGraph] {
            let info = ChordalInfo::new(&A, &b, &cones, 4, method).unwrap();

            for pattern in info.patterns() {
                assert_eq!(pattern.orig_index(), 1);

                // the orderings are mutually inverse permutations
                let (ord, rev) = (pattern.ordering(), pattern.reverse_ordering());
                assert_eq!(ord.len(), side);
                assert!((0..side).all(|i| rev[ord[i]] == i && ord[rev[i]] == i));

                // every vertex is covered, and each separator lies
                // within the parent clique
                let mut covered = vec![false; side];
                for i in 0..pattern.n_cliques() {
                    let clique = pattern.clique(i);
                    assert_eq!(clique.len(), pattern.block_dims()[i]);
                    clique.iter().for_each(|&v| covered[v] = true);

                    let sep = pattern.separator(i);
                    match pattern.clique_parent(i) {
                        Some(p) => {
                            let parent = pattern.clique(p);
                            assert!(sep.iter().all(|v| parent.contains(v)));
                            assert!(sep.iter().all(|v| clique.contains(v)));
                        }
                        None => assert!(sep.is_empty()),
                    }
                }
                assert!(covered.iter().all(|&c| c));
            }
        }
    }
}

#[test]
fn test_linking_matrix() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..10 {
        let side = 12;
        let (Acol, bpsd) = random_pattern_data(&mut rng, side, 0.15);

        // prepend a nonnegative block so that cone indices shift
        let npsd = Acol.nrows();
        let mut rows = vec![0, 1];
        rows.extend(Acol.rowval.iter().map(|r| r + 2));
        let k = rows.len();
        let A = CscMatrix::new(npsd + 2, 1, vec![0, k], rows, vec![1.; k]);
        let mut b = vec![1., 1.];
        b.extend(bpsd);
        let cones = vec![NonnegativeConeT(2), PSDTriangleConeT(side)];
        let P = CscMatrix::identity(1);

        let solver = DefaultSolver::new(&P, &[0.], &A, &b, &cones, settings(true, "clique_graph")).unwrap();
        let ws = solver.workspace();
        let info = ws.chordal_info().unwrap();
        if !info.is_decomposed() {
            continue;
        }

        let cone_map = info.cone_map();
        let new_cones = &ws.data().unwrap().cones;
        assert_eq!(cone_map.len(), new_cones.len());
        assert!(cone_map.iter().all(|&i| i < cones.len()));

        // the linking zero cones mirror the original cones
        assert_eq!(new_cones[0], ZeroConeT(2));
        assert_eq!(new_cones[1], ZeroConeT(npsd));
        assert_eq!(cone_map[0..2], [0, 1]);

        // H has one unit entry per column, and covers every
        // structural nonzero of the original cones at least once
        let H = info.H().unwrap();
        assert_eq!(H.nrows(), A.nrows());
        assert!((0..H.ncols()).all(|j| H.colptr[j + 1] - H.colptr[j] == 1));
        assert!(H.nzval.iter().all(|&v| v == 1.));

        let mut hits = vec![0; H.nrows()];
        H.rowval.iter().for_each(|&r| hits[r] += 1);
        assert!(A.rowval.iter().all(|&r| hits[r] >= 1));
        assert!((0..side).all(|i| hits[2 + packed_index(i, i)] >= 1));

        // nonnegative rows pass straight through
        assert_eq!(hits[0..2], [1, 1]);
    }
}

#[test]
fn test_linking_reproduces_original_slacks() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..10 {
        let side = 10;
        let (Acol, bpsd) = random_pattern_data(&mut rng, side, 0.2);

        let npsd = Acol.nrows();
        let mut rows = vec![0, 1];
        rows.extend(Acol.rowval.iter().map(|r| r + 2));
        let k = rows.len();
        let vals: Vec<f64> = (0..k).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let A = CscMatrix::new(npsd + 2, 1, vec![0, k], rows, vals);
        let mut b = vec![1., 1.];
        b.extend(bpsd);
        let cones = vec![NonnegativeConeT(2), PSDTriangleConeT(side)];
        let P = CscMatrix::identity(1);

        // unscaled, so that the decomposed data can be read directly
        let settings = DefaultSettingsBuilder::default()
            .equilibrate_enable(false)
            .chordal_decomposition_merge_method("none".to_string())
            .build()
            .unwrap();
        let solver = DefaultSolver::new(&P, &[0.], &A, &b, &cones, settings).unwrap();
        let ws = solver.workspace();
        let info = ws.chordal_info().unwrap();
        if !info.is_decomposed() {
            continue;
        }
        let H = info.H().unwrap();
        let data = ws.data().unwrap();
        let m = A.nrows();

        // slack of the original problem at some x
        let x = [rng.gen_range(-1.0..1.0)];
        let mut s = b.clone();
        A.gemv(&mut s, &x, -1., 1.);

        // split each entry evenly across the cliques that share it
        let mut overlaps = vec![0.; m];
        H.rowval.iter().for_each(|&r| overlaps[r] += 1.);
        let v: Vec<f64> = H.rowval.iter().map(|&r| s[r] / overlaps[r]).collect();

        // decomposed slack at (x, v)
        let xv = [&x[..], &v[..]].concat();
        let mut s_new = data.b.clone();
        data.A.gemv(&mut s_new, &xv, -1., 1.);

        // linking rows vanish and the clique slacks are v itself
        assert!(s_new[..m].norm_inf() < 1e-12);
        assert!(s_new[m..].norm_inf_diff(&v) < 1e-12);

        // aggregating through H gives back the original slack
        let mut s_back = vec![0.; m];
        H.gemv(&mut s_back, &s_new[m..], 1., 0.);
        assert!(s_back.norm_inf_diff(&s) < 1e-12);

        // every clique cone takes its rows from the cone it came from
        let orig_rows = [0..2, 2..m];
        let cone_map = info.cone_map();
        let mut col = 0;
        for (i, cone) in data.cones.iter().enumerate().skip(cones.len()) {
            let rows = &orig_rows[cone_map[i]];
            for j in col..col + cone.nvars() {
                assert!(rows.contains(&H.rowval[H.colptr[j]]));
            }
            col += cone.nvars();
        }
        assert_eq!(col, H.ncols());
    }
}
