#![allow(non_snake_case)]
use super::*;
use crate::algebra::*;
use crate::solver::core::{
    cones::{CompositeCone, Cone, SupportedConeT},
    SolverError,
};

// ---------------
// Data type for default problem format
// ---------------

/// Problem data `min ½xᵀPx + qᵀx  s.t.  Ax + s = b, s ∈ K`.
///
/// Holds the problem as the iteration sees it, i.e. scaled and with
/// any PSD cones already decomposed.  `P` is stored as its upper
/// triangle.
#[derive(Debug, Clone)]
pub struct DefaultProblemData<T> {
    pub P: CscMatrix<T>,
    pub q: Vec<T>,
    pub A: CscMatrix<T>,
    pub b: Vec<T>,
    pub cones: Vec<SupportedConeT>,
    pub n: usize,
    pub m: usize,
    pub scaling: ScaleMatrices<T>,
}

impl<T> DefaultProblemData<T>
where
    T: FloatT,
{
    pub fn new(
        P: &CscMatrix<T>,
        q: &[T],
        A: &CscMatrix<T>,
        b: &[T],
        cones: &[SupportedConeT],
    ) -> Result<Self, SolverError> {
        check_dimensions(P, q, A, b, cones)?;

        let (m, n) = A.size();

        Ok(Self {
            P: P.to_triu(),
            q: q.to_vec(),
            A: A.clone(),
            b: b.to_vec(),
            cones: cones.to_vec(),
            n,
            m,
            scaling: ScaleMatrices::Identity,
        })
    }

    /// Ruiz equilibration of the data in place.  Data that has
    /// been scaled already is left untouched.
    pub(crate) fn equilibrate(&mut self, cones: &CompositeCone<T>, settings: &DefaultSettings<T>) {
        if !self.scaling.is_identity() {
            log::warn!("problem data is already scaled, equilibration skipped");
            return;
        }

        // disabled equilibration keeps the identity scaling
        if !settings.equilibrate_enable {
            return;
        }

        let params = EquilibrationParams {
            max_iter: settings.equilibrate_max_iter,
            min_scaling: settings.equilibrate_min_scaling,
            max_scaling: settings.equilibrate_max_scaling,
        };

        let scaling = equilibrate(
            &mut self.P,
            &mut self.q,
            &mut self.A,
            &mut self.b,
            &params,
            |δ, e| cones.rectify_equilibration(δ, e),
        );
        self.scaling = ScaleMatrices::Diagonal(scaling);
    }

    /// Replaces the data with that of a larger, decomposed problem
    pub(crate) fn replace(
        &mut self,
        P: CscMatrix<T>,
        q: Vec<T>,
        A: CscMatrix<T>,
        b: Vec<T>,
        cones: Vec<SupportedConeT>,
    ) {
        let (m, n) = A.size();
        self.P = P;
        self.q = q;
        self.A = A;
        self.b = b;
        self.cones = cones;
        self.m = m;
        self.n = n;
        self.scaling.extend(n, m);
    }
}

fn check_dimensions<T: FloatT>(
    P: &CscMatrix<T>,
    q: &[T],
    A: &CscMatrix<T>,
    b: &[T],
    cones: &[SupportedConeT],
) -> Result<(), SolverError> {
    P.check_format()?;
    A.check_format()?;

    let (m, n) = A.size();

    if !P.is_square() || P.nrows() != n {
        return Err(SolverError::Dimension(format!(
            "P is {:?} but A has {n} columns",
            P.size()
        )));
    }
    if q.len() != n {
        return Err(SolverError::Dimension(format!(
            "q has length {} but A has {n} columns",
            q.len()
        )));
    }
    if b.len() != m {
        return Err(SolverError::Dimension(format!(
            "b has length {} but A has {m} rows",
            b.len()
        )));
    }

    let conedims: usize = cones.iter().map(|c| c.nvars()).sum();
    if conedims != m {
        return Err(SolverError::Dimension(format!(
            "cones have {conedims} rows but A has {m} rows"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::solver::core::cones::SupportedConeT::*;

    #[test]
    fn test_dimension_checks() {
        let P = CscMatrix::<f64>::identity(2);
        let A = CscMatrix::<f64>::identity(2);
        let cones = [NonnegativeConeT(2)];

        assert!(DefaultProblemData::new(&P, &[0., 0.], &A, &[1., 1.], &cones).is_ok());

        let bad = [
            DefaultProblemData::new(&P, &[0.], &A, &[1., 1.], &cones),
            DefaultProblemData::new(&P, &[0., 0.], &A, &[1.], &cones),
            DefaultProblemData::new(&P, &[0., 0.], &A, &[1., 1.], &[NonnegativeConeT(3)]),
            DefaultProblemData::new(&CscMatrix::identity(3), &[0., 0.], &A, &[1., 1.], &cones),
        ];
        for res in bad {
            assert!(matches!(res, Err(SolverError::Dimension(_))));
        }
    }

    #[test]
    fn test_double_equilibration_is_noop() {
        let P = CscMatrix::new(2, 2, vec![0, 1, 2], vec![0, 1], vec![100., 0.1]);
        let A = CscMatrix::new(1, 2, vec![0, 1, 2], vec![0, 0], vec![5., 0.02]);
        let cones = [ZeroConeT(1)];
        let K = CompositeCone::<f64>::new(&cones);
        let settings = DefaultSettings::default();

        let mut data = DefaultProblemData::new(&P, &[1., 1.], &A, &[3.], &cones).unwrap();
        data.equilibrate(&K, &settings);
        assert!(!data.scaling.is_identity());

        // a second pass must not compound the scaling
        let scaled = data.clone();
        data.equilibrate(&K, &settings);
        assert_eq!(data.A, scaled.A);
        assert_eq!(data.P, scaled.P);
        assert_eq!(data.scaling, scaled.scaling);
    }
}
