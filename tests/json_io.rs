#![allow(non_snake_case)]
#![cfg(feature = "serde")]

use conic_admm::{algebra::*, solver::*};
use std::io::{Seek, SeekFrom};

#[test]
fn test_json_io_decomposed() {
    // a 6x6 PSD cone touched only on two diagonal blocks, so that
    // the problem is decomposed before being written
    let side = 6;
    let m = side * (side + 1) / 2;
    let rows: Vec<usize> = [(0..3), (3..6)]
        .into_iter()
        .flat_map(|blk| {
            let start = blk.start;
            blk.flat_map(move |c| (start..=c).map(move |r| c * (c + 1) / 2 + r))
        })
        .collect();
    let n = rows.len();

    let A = CscMatrix::new_from_triplets(m, n, rows.clone(), (0..n).collect(), vec![-1.; n]);
    let P = CscMatrix::identity(n);
    let q = vec![0.5; n];
    let mut b = vec![0.; m];
    rows.iter().for_each(|&r| b[r] = 1. + (r % 3) as f64);
    let cones = vec![NonnegativeConeT(0), PSDTriangleConeT(side)];

    let settings = DefaultSettingsBuilder::default()
        .time_limit(f64::INFINITY)
        .build()
        .unwrap();

    let mut solver = DefaultSolver::new(&P, &q, &A, &b, &cones, settings).unwrap();
    assert!(solver.workspace().states().is_chordal_decomposed());
    solver.solve();

    let mut file = tempfile::tempfile().unwrap();
    solver.write_to_file(&mut file).unwrap();

    file.seek(SeekFrom::Start(0)).unwrap();
    let mut solver2 = DefaultSolver::<f64>::read_from_file(&mut file).unwrap();

    // the original, unscaled problem was written
    {
        let ws = solver2.workspace();
        assert_eq!(ws.settings().time_limit, f64::INFINITY);
        assert!(ws.states().is_chordal_decomposed());
        let info = ws.chordal_info().unwrap();
        assert_eq!(info.init_dims(), (n, m));
        assert_eq!(info.init_cones(), &cones[..]);
    }

    solver2.solve();
    assert_eq!(solver2.solution.status, solver.solution.status);
    assert!(solver.solution.x.norm_inf_diff(&solver2.solution.x) <= 1e-3);
}

#[test]
fn test_json_read_garbage() {
    use std::io::Write;

    let mut file = tempfile::tempfile().unwrap();
    file.write_all(b"{\"P\": 1}").unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();

    assert!(DefaultSolver::<f64>::read_from_file(&mut file).is_err());
}
