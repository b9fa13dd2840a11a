#![allow(non_snake_case)]
use super::*;
use crate::{
    algebra::*,
    solver::{
        chordal::ChordalInfo,
        core::{
            cones::{CompositeCone, SupportedConeT},
            kktsolvers::{direct::DirectLDLKKTSolver, KKTSolver},
            SolverError, SolverStage, SolverStates,
        },
    },
    timers::*,
};

/// ρ is kept within these bounds
pub const RHO_MIN: f64 = 1e-6;
pub const RHO_MAX: f64 = 1e6;

/// ρ on equality (zero cone) rows is this multiple of ρ
pub const RHO_EQ_SCALE: f64 = 1e3;

/// Problem data together with the iterates and scratch space sized
/// to it.  Exists only once the workspace has been assembled.
#[derive(Debug)]
pub(crate) struct AssembledProblem<T: FloatT> {
    pub data: DefaultProblemData<T>,
    pub cones: CompositeCone<T>,
    pub variables: DefaultVariables<T>,
    pub utility: UtilityVariables<T>,
    pub step: StepVariables<T>,
}

impl<T> AssembledProblem<T>
where
    T: FloatT,
{
    fn new(data: DefaultProblemData<T>) -> Self {
        let (n, m) = (data.n, data.m);
        let cones = CompositeCone::new(&data.cones);
        Self {
            data,
            cones,
            variables: DefaultVariables::new(n, m),
            utility: UtilityVariables::new(n, m),
            step: StepVariables::new(n, m),
        }
    }

    // the problem changed size, so every buffer sized to it is stale
    fn resize(&mut self) {
        let (n, m) = (self.data.n, self.data.m);
        self.cones = CompositeCone::new(&self.data.cones);
        self.variables = DefaultVariables::new(n, m);
        self.utility = UtilityVariables::new(n, m);
        self.step = StepVariables::new(n, m);
    }
}

/// Owner of everything a solve needs, and the state machine that
/// sequences it:
///
/// `assemble → scale → decompose → factor_kkt → (iterate) → result`
///
/// Each stage raises its [`SolverStage`] flag once.  Re-entering a
/// completed stage does nothing, while running a stage before the
/// stages it depends on fails with [`SolverError::Ordering`].
pub struct Workspace<T: FloatT = f64> {
    pub(crate) settings: DefaultSettings<T>,
    pub(crate) states: SolverStates,
    pub(crate) problem: Option<AssembledProblem<T>>,
    pub(crate) chordal_info: Option<ChordalInfo<T>>,

    pub(crate) rho: T,
    pub(crate) rhovec: Vec<T>,
    pub(crate) kkt_solver: Option<Box<dyn KKTSolver<T>>>,
    pub(crate) rho_updates: Vec<RhoUpdate<T>>,

    pub(crate) timers: Timers,
}

impl<T> Workspace<T>
where
    T: FloatT,
{
    pub fn new(settings: DefaultSettings<T>) -> Result<Self, SolverError> {
        settings.validate()?;
        let rho = settings.rho;

        Ok(Self {
            settings,
            states: SolverStates::default(),
            problem: None,
            chordal_info: None,
            rho,
            rhovec: Vec::new(),
            kkt_solver: None,
            rho_updates: Vec::new(),
            timers: Timers::default(),
        })
    }

    // -------------------------------------
    // pipeline stages
    // -------------------------------------

    /// Copies in the problem data after checking its dimensions
    pub fn assemble(
        &mut self,
        P: &CscMatrix<T>,
        q: &[T],
        A: &CscMatrix<T>,
        b: &[T],
        cones: &[SupportedConeT],
    ) -> Result<(), SolverError> {
        if self.already_done(SolverStage::Assembled) {
            return Ok(());
        }

        let data = DefaultProblemData::new(P, q, A, b, cones)?;
        log::debug!("assembled problem with (n, m) = ({}, {})", data.n, data.m);

        self.problem = Some(AssembledProblem::new(data));
        self.states.set(SolverStage::Assembled);
        Ok(())
    }

    /// Equilibrates the problem data in place
    pub fn scale(&mut self) -> Result<(), SolverError> {
        self.require(SolverStage::Scaled, SolverStage::Assembled)?;
        if self.already_done(SolverStage::Scaled) {
            return Ok(());
        }
        let problem = assembled(&mut self.problem, SolverStage::Scaled)?;

        let timers = &mut self.timers;
        timeit! {timers => "scale"; {
            problem.data.equilibrate(&problem.cones, &self.settings);
        }}

        self.states.set(SolverStage::Scaled);
        log::debug!("problem scaled");
        Ok(())
    }

    /// Replaces every sufficiently large and sparse PSD cone with
    /// cones over the cliques of its sparsity graph.  Returns true if
    /// the problem was decomposed.  The stage flag is only raised when
    /// something was decomposed.
    pub fn decompose(&mut self) -> Result<bool, SolverError> {
        self.require(SolverStage::ChordalDecomposed, SolverStage::Scaled)?;
        if self.already_done(SolverStage::ChordalDecomposed) {
            return Ok(true);
        }
        if !self.settings.chordal_decomposition_enable || self.chordal_info.is_some() {
            return Ok(false);
        }

        let merge_method = self.settings.merge_method()?;
        let threshold = self.settings.chordal_decomposition_threshold;
        let problem = assembled(&mut self.problem, SolverStage::ChordalDecomposed)?;

        let timers = &mut self.timers;
        let result;
        timeit! {timers => "graph"; {
            result = decompose_problem(problem, threshold, merge_method);
        }}
        let (chordal_info, decomposed) = result?;
        self.chordal_info = Some(chordal_info);

        if decomposed {
            self.states.set(SolverStage::ChordalDecomposed);
        } else {
            log::debug!("no PSD cone qualifies for decomposition");
        }
        Ok(decomposed)
    }

    /// Factors the KKT system with the default direct LDL solver
    pub fn factor_kkt(&mut self) -> Result<(), SolverError> {
        self.factor_kkt_with(Box::new(DirectLDLKKTSolver::new()))
    }

    /// Factors the KKT system with the given solver, which is kept
    /// for all subsequent solves and refactorizations
    pub fn factor_kkt_with(&mut self, mut kkt_solver: Box<dyn KKTSolver<T>>) -> Result<(), SolverError> {
        self.require(SolverStage::KKTFactored, SolverStage::Assembled)?;
        self.require(SolverStage::KKTFactored, SolverStage::Scaled)?;
        if self.settings.chordal_decomposition_enable && self.chordal_info.is_none() {
            return Err(SolverError::Ordering {
                requested: SolverStage::KKTFactored,
                missing: SolverStage::ChordalDecomposed,
            });
        }
        if self.already_done(SolverStage::KKTFactored) {
            return Ok(());
        }

        self.rhovec = self.make_rhovec(self.rho)?;
        let sigma = self.settings.sigma;
        let problem = assembled(&mut self.problem, SolverStage::KKTFactored)?;

        let timers = &mut self.timers;
        let result;
        timeit! {timers => "init_factor"; {
            result = kkt_solver.factorize(&problem.data.P, &problem.data.A, sigma, &self.rhovec);
        }}
        result?;

        self.kkt_solver = Some(kkt_solver);
        self.states.set(SolverStage::KKTFactored);
        log::debug!("KKT system factored with ρ = {}", self.rho);
        Ok(())
    }

    /// Changes the penalty ρ, records the change together with the
    /// residuals `(r_prim, r_dual)` that prompted it, and refactors
    /// the KKT system once
    pub fn update_rho(&mut self, rho: T, iter: u32, r_prim: T, r_dual: T) -> Result<(), SolverError> {
        self.require(SolverStage::Optimized, SolverStage::KKTFactored)?;

        let (rho_min, rho_max) = (RHO_MIN.as_T(), RHO_MAX.as_T());
        let clipped = T::min(T::max(rho, rho_min), rho_max);
        if clipped != rho {
            log::warn!("ρ = {} clipped to {}", rho, clipped);
        }

        self.rho = clipped;
        self.rhovec = self.make_rhovec(clipped)?;
        self.rho_updates.push(RhoUpdate {
            iter,
            rho: clipped,
            r_prim,
            r_dual,
        });

        let kkt_solver = self.kkt_solver.as_mut().ok_or(SolverError::Ordering {
            requested: SolverStage::Optimized,
            missing: SolverStage::KKTFactored,
        })?;

        let timers = &mut self.timers;
        let result;
        timeit! {timers => "factor_update"; {
            result = kkt_solver.refactor(&self.rhovec);
        }}
        result
    }

    /// Runs every preprocessing stage in order
    pub fn setup(
        &mut self,
        P: &CscMatrix<T>,
        q: &[T],
        A: &CscMatrix<T>,
        b: &[T],
        cones: &[SupportedConeT],
        kkt_solver: Box<dyn KKTSolver<T>>,
    ) -> Result<(), SolverError> {
        self.assemble(P, q, A, b, cones)?;
        self.scale()?;
        self.decompose()?;
        self.factor_kkt_with(kkt_solver)
    }

    // -------------------------------------
    // result assembly
    // -------------------------------------

    /// Maps the current iterate back to the problem as it was
    /// assembled: the decomposition is reversed first and the
    /// scaling second.
    pub fn original_variables(&self) -> Result<DefaultVariables<T>, SolverError> {
        let problem = self.problem.as_ref().ok_or(SolverError::Ordering {
            requested: SolverStage::Optimized,
            missing: SolverStage::Assembled,
        })?;

        let mut vars = match &self.chordal_info {
            Some(info) if info.is_decomposed() => info.decomp_reverse(
                &problem.variables,
                self.settings.chordal_decomposition_complete_dual,
            )?,
            _ => problem.variables.clone(),
        };
        problem.data.scaling.unscale_variables(&mut vars);
        Ok(vars)
    }

    /// objective value of the current iterate in the original problem
    pub fn objective_value(&self) -> Option<T> {
        let problem = self.problem.as_ref()?;
        let (data, x) = (&problem.data, &problem.variables.x);

        // the padding of a decomposed problem adds nothing
        let cost = data.P.quad_form(x, x) * (0.5).as_T() + data.q.dot(x);
        Some(cost * data.scaling.cinv())
    }

    // -------------------------------------
    // accessors
    // -------------------------------------

    pub fn settings(&self) -> &DefaultSettings<T> {
        &self.settings
    }

    pub fn states(&self) -> &SolverStates {
        &self.states
    }

    /// current problem data, i.e. scaled and possibly decomposed
    pub fn data(&self) -> Option<&DefaultProblemData<T>> {
        self.problem.as_ref().map(|p| &p.data)
    }

    /// current iterate of the scaled, possibly decomposed problem
    pub fn variables(&self) -> Option<&DefaultVariables<T>> {
        self.problem.as_ref().map(|p| &p.variables)
    }

    pub fn chordal_info(&self) -> Option<&ChordalInfo<T>> {
        self.chordal_info.as_ref()
    }

    pub fn rho(&self) -> T {
        self.rho
    }

    pub fn rhovec(&self) -> &[T] {
        &self.rhovec
    }

    pub fn rho_updates(&self) -> &[RhoUpdate<T>] {
        &self.rho_updates
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    // -------------------------------------
    // internals
    // -------------------------------------

    fn require(&self, requested: SolverStage, missing: SolverStage) -> Result<(), SolverError> {
        if self.states.is_set(missing) {
            Ok(())
        } else {
            Err(SolverError::Ordering { requested, missing })
        }
    }

    fn already_done(&self, stage: SolverStage) -> bool {
        let done = self.states.is_set(stage);
        if done {
            log::warn!("stage {stage} already completed, ignored");
        }
        done
    }

    // ρ per row, stiffer on equality rows
    fn make_rhovec(&self, rho: T) -> Result<Vec<T>, SolverError> {
        let problem = self.problem.as_ref().ok_or(SolverError::Ordering {
            requested: SolverStage::KKTFactored,
            missing: SolverStage::Assembled,
        })?;

        let rho_eq = rho * RHO_EQ_SCALE.as_T();
        let mut rhovec = vec![rho; problem.data.m];
        for (cone, rng) in problem.data.cones.iter().zip(problem.cones.rng_cones()) {
            if cone.is_zero() {
                rhovec[rng.clone()].fill(rho_eq);
            }
        }
        Ok(rhovec)
    }
}

fn assembled<T: FloatT>(
    problem: &mut Option<AssembledProblem<T>>,
    requested: SolverStage,
) -> Result<&mut AssembledProblem<T>, SolverError> {
    problem.as_mut().ok_or(SolverError::Ordering {
        requested,
        missing: SolverStage::Assembled,
    })
}

// Analyses the PSD cones of the problem and, if any of them
// decomposes, rewrites the problem in place
fn decompose_problem<T: FloatT>(
    problem: &mut AssembledProblem<T>,
    threshold: usize,
    merge_method: crate::solver::chordal::MergeMethod,
) -> Result<(ChordalInfo<T>, bool), SolverError> {
    let data = &problem.data;
    let mut info = ChordalInfo::new(&data.A, &data.b, &data.cones, threshold, merge_method)?;

    if !info.is_decomposed() {
        return Ok((info, false));
    }

    let (P, q, A, b, cones) = info.decomp_augment(&data.P, &data.q, &data.A, &data.b)?;
    log::debug!(
        "decomposed {} of {} PSD cones into {} cliques",
        info.decomposable_cone_count(),
        info.init_psd_cone_count(),
        info.final_psd_cone_count() + info.decomposable_cone_count() - info.init_psd_cone_count()
    );

    problem.data.replace(P, q, A, b, cones);
    problem.resize();
    Ok((info, true))
}
