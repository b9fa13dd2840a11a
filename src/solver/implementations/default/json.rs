#![allow(non_snake_case)]
use super::*;
use crate::{algebra::*, solver::core::cones::SupportedConeT};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::Write;
use std::{fs::File, io, io::Read};

// A struct very similar to the problem data, but containing only
// the data types provided by the user (i.e. no internal types).

#[derive(Serialize, Deserialize)]
#[serde(bound = "T: Serialize + DeserializeOwned")]
struct JsonProblemData<T: FloatT> {
    pub P: CscMatrix<T>,
    pub q: Vec<T>,
    pub A: CscMatrix<T>,
    pub b: Vec<T>,
    pub cones: Vec<SupportedConeT>,
    pub settings: DefaultSettings<T>,
}

impl<T> DefaultSolver<T>
where
    T: FloatT + DeserializeOwned + Serialize,
{
    /// Writes the problem as it was originally supplied, together
    /// with the settings, as JSON
    pub fn write_to_file(&self, file: &mut File) -> Result<(), io::Error> {
        let ws = &self.workspace;
        let data = ws
            .data()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no problem data"))?;

        // strip the variables and rows added by a decomposition
        let (n, m, cones) = match ws.chordal_info() {
            Some(info) if info.is_decomposed() => {
                let (n, m) = info.init_dims();
                (n, m, info.init_cones().to_vec())
            }
            _ => (data.n, data.m, data.cones.clone()),
        };

        let mut json_data = JsonProblemData {
            P: leading_block(&data.P, n, n),
            q: data.q[0..n].to_vec(),
            A: leading_block(&data.A, m, n),
            b: data.b[0..m].to_vec(),
            cones,
            settings: ws.settings.clone(),
        };

        // restore scaling to original
        data.scaling.unscale_data(
            &mut json_data.P,
            &mut json_data.q,
            &mut json_data.A,
            &mut json_data.b,
        );

        // sanitize settings to remove values that
        // can't be serialized, i.e. infs
        sanitize_settings(&mut json_data.settings);

        // write to file
        let json = serde_json::to_string(&json_data)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }

    /// Reads a problem written by [`write_to_file`](DefaultSolver::write_to_file)
    /// and sets up a new solver for it
    pub fn read_from_file(file: &mut File) -> Result<Self, io::Error> {
        // read file
        let mut buffer = String::new();
        file.read_to_string(&mut buffer)?;
        let mut json_data: JsonProblemData<T> = serde_json::from_str(&buffer)?;

        // restore sanitized settings to their (likely) original values
        desanitize_settings(&mut json_data.settings);

        // create a solver object
        let P = json_data.P;
        let q = json_data.q;
        let A = json_data.A;
        let b = json_data.b;
        let cones = json_data.cones;
        let settings = json_data.settings;

        Self::new(&P, &q, &A, &b, &cones, settings)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

// the m × n upper left block of M
fn leading_block<T: FloatT>(M: &CscMatrix<T>, m: usize, n: usize) -> CscMatrix<T> {
    let mut colptr = Vec::with_capacity(n + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    colptr.push(0);
    for col in 0..n {
        for k in M.colptr[col]..M.colptr[col + 1] {
            if M.rowval[k] < m {
                rowval.push(M.rowval[k]);
                nzval.push(M.nzval[k]);
            }
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(m, n, colptr, rowval, nzval)
}

fn sanitize_settings<T: FloatT>(settings: &mut DefaultSettings<T>) {
    if settings.time_limit == f64::INFINITY {
        settings.time_limit = f64::MAX;
    }
}

fn desanitize_settings<T: FloatT>(settings: &mut DefaultSettings<T>) {
    if settings.time_limit == f64::MAX {
        settings.time_limit = f64::INFINITY;
    }
}

#[test]
fn test_json_io() {
    use crate::solver::core::SolverStatus;
    use std::io::{Seek, SeekFrom};

    let P = CscMatrix {
        m: 1,
        n: 1,
        colptr: vec![0, 1],
        rowval: vec![0],
        nzval: vec![2.0],
    };
    let q = [1.0];
    let A = CscMatrix {
        m: 1,
        n: 1,
        colptr: vec![0, 1],
        rowval: vec![0],
        nzval: vec![-1.0],
    };
    let b = [-2.0];
    let cones = vec![SupportedConeT::NonnegativeConeT(1)];

    let settings = DefaultSettingsBuilder::default().build().unwrap();

    let mut solver = DefaultSolver::<f64>::new(&P, &q, &A, &b, &cones, settings).unwrap();
    solver.solve();
    assert_eq!(solver.solution.status, SolverStatus::Solved);

    // write the problem to a file
    let mut file = tempfile::tempfile().unwrap();
    solver.write_to_file(&mut file).unwrap();

    // read the problem from the file
    file.seek(SeekFrom::Start(0)).unwrap();
    let mut solver2 = DefaultSolver::<f64>::read_from_file(&mut file).unwrap();

    // the data is read back unscaled
    let data2 = solver2.workspace().data().unwrap();
    assert_eq!(data2.n, 1);
    assert_eq!(data2.m, 1);
    assert_eq!(solver2.workspace().settings(), solver.workspace().settings());

    solver2.solve();
    assert!(solver.solution.x.norm_inf_diff(&solver2.solution.x) < 1e-8);
}
