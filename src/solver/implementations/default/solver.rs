#![allow(non_snake_case)]
use super::*;
use crate::{
    algebra::*,
    solver::core::{
        cones::{Cone, SupportedConeT},
        kktsolvers::{direct::DirectLDLKKTSolver, KKTSolver},
        SolverError, SolverStage, SolverStatus,
    },
    timers::*,
};

cfg_if::cfg_if! {
    if #[cfg(target_family = "wasm")] {
        use web_time::Instant;
    } else {
        use std::time::Instant;
    }
}

/// ADMM solver for problems in the standard form
///
/// ```text
/// minimize    ½xᵀPx + qᵀx
/// subject to  Ax + s = b
///             s ∈ K
/// ```
///
/// All preprocessing happens in [`new`](DefaultSolver::new): the data
/// is assembled, scaled, chordally decomposed and the KKT system is
/// factored.  [`solve`](DefaultSolver::solve) then runs the operator
/// splitting iteration and fills in [`solution`](DefaultSolver::solution).
pub struct DefaultSolver<T: FloatT = f64> {
    pub(crate) workspace: Workspace<T>,
    pub(crate) residuals: DefaultResiduals<T>,
    /// result of the last solve
    pub solution: SolveResult<T>,
}

impl<T> DefaultSolver<T>
where
    T: FloatT,
{
    pub fn new(
        P: &CscMatrix<T>,
        q: &[T],
        A: &CscMatrix<T>,
        b: &[T],
        cones: &[SupportedConeT],
        settings: DefaultSettings<T>,
    ) -> Result<Self, SolverError> {
        Self::new_with_kkt_solver(P, q, A, b, cones, settings, Box::new(DirectLDLKKTSolver::new()))
    }

    /// As [`new`](DefaultSolver::new), with a user supplied solver for
    /// the KKT system
    pub fn new_with_kkt_solver(
        P: &CscMatrix<T>,
        q: &[T],
        A: &CscMatrix<T>,
        b: &[T],
        cones: &[SupportedConeT],
        settings: DefaultSettings<T>,
        kkt_solver: Box<dyn KKTSolver<T>>,
    ) -> Result<Self, SolverError> {
        let mut workspace = Workspace::new(settings)?;

        workspace.timers.start_as_current("setup");
        let setup = workspace.setup(P, q, A, b, cones, kkt_solver);
        workspace.timers.stop_current();
        setup?;

        let (m, n) = A.size();

        Ok(Self {
            workspace,
            residuals: DefaultResiduals::new(),
            solution: SolveResult::new(n, m),
        })
    }

    pub fn workspace(&self) -> &Workspace<T> {
        &self.workspace
    }

    /// Replaces the settings of a solver that has not been solved yet.
    /// Only settings that do not affect the scaled and factored
    /// problem may change.
    pub fn update_settings(&mut self, settings: DefaultSettings<T>) -> Result<(), SolverError> {
        settings.validate_as_update(&self.workspace.settings)?;
        self.workspace.settings = settings;
        Ok(())
    }

    /// Runs the ADMM iteration to termination.  A solver can only be
    /// solved once, later calls leave the solution untouched.
    pub fn solve(&mut self) {
        if self.workspace.states.is_optimized() {
            log::warn!("problem already solved, solve ignored");
            return;
        }

        self.workspace.timers.reset_timer("solve");
        self.workspace.timers.start_as_current("solve");

        let (status, iterations) = self.iterate();

        self.workspace.timers.start_as_current("post_process");
        self.finalize(status, iterations);
        self.workspace.timers.stop_current();

        self.workspace.timers.stop_current();

        let verbose_timing = self.workspace.settings.verbose_timing;
        self.solution.times = ResultTimes::from_timers(&self.workspace.timers, verbose_timing);
        self.workspace.states.set(SolverStage::Optimized);

        if self.workspace.settings.verbose {
            log::info!(
                "terminated with status {} after {} iterations, objective {:.6e}",
                self.solution.status,
                self.solution.iterations,
                self.solution.obj_val
            );
            if verbose_timing {
                self.workspace.timers.log();
            }
        }
    }

    // main ADMM loop.  Returns the terminal status and iteration count
    fn iterate(&mut self) -> (SolverStatus, u32) {
        let settings = self.workspace.settings.clone();
        let start = Instant::now();

        if settings.verbose {
            log::info!("{:>6} {:>10} {:>10} {:>10}", "iter", "r_prim", "r_dual", "ρ");
        }

        let mut status = SolverStatus::Unsolved;
        let mut iter = 0u32;

        let timers = &mut self.workspace.timers;
        timers.start_as_current("iterate");

        while iter < settings.max_iter {
            iter += 1;

            if let Err(e) = admm_step(&mut self.workspace, &settings) {
                log::error!("iteration {iter} failed: {e}");
                status = SolverStatus::NumericalError;
                break;
            }
            let finite = self
                .workspace
                .variables()
                .is_some_and(|v| v.x.is_finite() && v.μ.is_finite());
            if !finite {
                log::error!("iterate is no longer finite at iteration {iter}");
                status = SolverStatus::NumericalError;
                break;
            }

            let check_termination = iter % settings.check_termination == 0;
            let check_infeasibility = iter % settings.check_infeasibility == 0;
            let check_rho = settings.adaptive_rho && iter % settings.adaptive_rho_interval == 0;

            if check_termination || check_rho {
                if let Some(problem) = self.workspace.problem.as_mut() {
                    self.residuals
                        .update(&problem.data, &problem.variables, &mut problem.utility);
                }
            }

            if check_termination {
                if settings.verbose {
                    log::info!(
                        "{:>6} {:>10.3e} {:>10.3e} {:>10.3e}",
                        iter,
                        self.residuals.r_prim,
                        self.residuals.r_dual,
                        self.workspace.rho
                    );
                }
                if self.residuals.is_converged(&settings) {
                    status = SolverStatus::Solved;
                    break;
                }
            }

            if check_infeasibility {
                if let Some(s) = check_infeasible(&mut self.workspace, &settings) {
                    status = s;
                    break;
                }
            }

            if check_rho {
                if let Err(e) = self.adapt_rho(iter, &settings) {
                    log::error!("ρ update at iteration {iter} failed: {e}");
                    status = SolverStatus::NumericalError;
                    break;
                }
            }

            if start.elapsed().as_secs_f64() > settings.time_limit {
                status = SolverStatus::MaxTime;
                break;
            }
        }

        if status == SolverStatus::Unsolved {
            status = SolverStatus::MaxIterations;
        }

        self.workspace.timers.stop_current();
        (status, iter)
    }

    // square root residual balancing
    fn adapt_rho(&mut self, iter: u32, settings: &DefaultSettings<T>) -> Result<(), SolverError> {
        let ratio = self.residuals.balance_ratio();
        if !ratio.is_finite() || ratio == T::zero() {
            return Ok(());
        }

        let rho = self.workspace.rho;
        let new_rho = rho * T::sqrt(ratio);
        let tol = settings.adaptive_rho_tolerance;

        if new_rho > rho * tol || new_rho < rho / tol {
            log::debug!("iteration {iter}: ρ {rho:.3e} → {new_rho:.3e}");
            let (r_prim, r_dual) = (self.residuals.r_prim, self.residuals.r_dual);
            self.workspace.update_rho(new_rho, iter, r_prim, r_dual)?;
        }
        Ok(())
    }

    fn finalize(&mut self, status: SolverStatus, iterations: u32) {
        let ws = &mut self.workspace;

        if let Some(problem) = ws.problem.as_mut() {
            self.residuals
                .update(&problem.data, &problem.variables, &mut problem.utility);
        }

        let mut status = status;
        match ws.original_variables() {
            Ok(vars) => self.solution.set_variables(&vars),
            Err(e) => {
                log::error!("solution could not be recovered: {e}");
                status = SolverStatus::NumericalError;
            }
        }

        self.solution.obj_val = if status.is_infeasible() {
            T::nan()
        } else {
            ws.objective_value().unwrap_or(T::nan())
        };
        self.solution.status = status;
        self.solution.iterations = iterations;
        self.solution.info =
            ResultInfo::new(self.residuals.r_prim, self.residuals.r_dual, &ws.rho_updates);
    }
}

// One ADMM iteration on the scaled (and possibly decomposed) problem:
//
//   [x̃; ν]  solves the KKT system with rhs [σx - q; b - s + μ/ρ]
//   s̃     = s - (ν + μ)/ρ
//   x     = αx̃ + (1-α)x
//   s_rel = αs̃ + (1-α)s
//   s     = Π_K(s_rel + μ/ρ)
//   μ     = μ + ρ(s_rel - s)
//
// and records the iterate differences δx, δμ.
fn admm_step<T: FloatT>(
    ws: &mut Workspace<T>,
    settings: &DefaultSettings<T>,
) -> Result<(), SolverError> {
    let problem = ws.problem.as_mut().ok_or(SolverError::Ordering {
        requested: SolverStage::Optimized,
        missing: SolverStage::Assembled,
    })?;
    let kkt_solver = ws.kkt_solver.as_mut().ok_or(SolverError::Ordering {
        requested: SolverStage::Optimized,
        missing: SolverStage::KKTFactored,
    })?;
    let timers = &mut ws.timers;
    let ρ = &ws.rhovec;

    let AssembledProblem {
        data,
        cones,
        variables: v,
        step,
        ..
    } = problem;
    let n = data.n;
    let (σ, α) = (settings.sigma, settings.alpha);

    step.δx.copy_from(&v.x);
    step.δy.copy_from(&v.μ);

    // right hand side
    let (ls_x, ls_s) = step.ls.split_at_mut(n);
    ls_x.waxpby(σ, &v.x, -T::one(), &data.q);
    for (i, lsi) in ls_s.iter_mut().enumerate() {
        *lsi = data.b[i] - v.s[i] + v.μ[i] / ρ[i];
    }

    kkt_solver.solve(&mut step.sol, &step.ls)?;
    let (x_tl, ν) = step.sol.split_at(n);

    // relaxed primal updates
    v.x.axpby(α, x_tl, T::one() - α);
    for (i, s_rel) in step.s_tl.iter_mut().enumerate() {
        let s_tl = v.s[i] - (ν[i] + v.μ[i]) / ρ[i];
        *s_rel = α * s_tl + (T::one() - α) * v.s[i];
    }

    // projection onto the cones
    for (i, si) in v.s.iter_mut().enumerate() {
        *si = step.s_tl[i] + v.μ[i] / ρ[i];
    }
    timeit! {timers => "projection"; {
        cones.project(&mut v.s);
    }}

    // dual update
    for (i, μi) in v.μ.iter_mut().enumerate() {
        *μi += ρ[i] * (step.s_tl[i] - v.s[i]);
    }

    step.δx.axpby(T::one(), &v.x, -T::one());
    step.δy.axpby(T::one(), &v.μ, -T::one());

    Ok(())
}

fn check_infeasible<T: FloatT>(
    ws: &mut Workspace<T>,
    settings: &DefaultSettings<T>,
) -> Option<SolverStatus> {
    let problem = ws.problem.as_mut()?;
    let AssembledProblem {
        data,
        cones,
        utility,
        step,
        ..
    } = problem;

    if is_primal_infeasible(&step.δy, data, cones, settings.eps_prim_inf, utility) {
        return Some(SolverStatus::PrimalInfeasible);
    }
    if is_dual_infeasible(&step.δx, data, cones, settings.eps_dual_inf, utility, &mut step.s_tl) {
        return Some(SolverStatus::DualInfeasible);
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::solver::core::cones::SupportedConeT::*;

    fn settings() -> DefaultSettings<f64> {
        DefaultSettingsBuilder::default()
            .eps_abs(1e-7)
            .eps_rel(1e-7)
            .build()
            .unwrap()
    }

    #[test]
    fn test_equality_constrained_qp() {
        // min ½(x₁² + x₂²) s.t. x₁ + x₂ = 1
        let P = CscMatrix::<f64>::identity(2);
        let A = CscMatrix::new(1, 2, vec![0, 1, 2], vec![0, 0], vec![1., 1.]);

        let mut solver =
            DefaultSolver::new(&P, &[0., 0.], &A, &[1.], &[ZeroConeT(1)], settings()).unwrap();
        solver.solve();

        let sol = &solver.solution;
        assert_eq!(sol.status, SolverStatus::Solved);
        assert!(sol.x.norm_inf_diff(&[0.5, 0.5]) < 1e-5);
        assert!((sol.y[0] + 0.5).abs() < 1e-5);
        assert!((sol.obj_val - 0.25).abs() < 1e-5);
        assert!(solver.workspace().states().is_optimized());
    }

    #[test]
    fn test_lp_with_bounds() {
        // min -x₁ - x₂ s.t. x₁ + 2x₂ ≤ 4, x ≥ 0, x₁ ≤ 3
        let P = CscMatrix::<f64>::zeros((2, 2));
        let A = CscMatrix::new(
            4,
            2,
            vec![0, 3, 5],
            vec![0, 1, 3, 0, 2],
            vec![1., -1., 1., 2., -1.],
        );
        let b = [4., 0., 0., 3.];

        let mut solver =
            DefaultSolver::new(&P, &[-1., -1.], &A, &b, &[NonnegativeConeT(4)], DefaultSettings::default())
                .unwrap();
        solver.solve();

        let sol = &solver.solution;
        assert_eq!(sol.status, SolverStatus::Solved);
        assert!(sol.x.norm_inf_diff(&[3., 0.5]) < 1e-3);
        assert!((sol.obj_val + 3.5).abs() < 1e-3);

        // slacks and duals lie in the cone
        assert!(sol.s.iter().all(|&s| s >= -1e-8));
        assert!(sol.y.iter().all(|&y| y >= -1e-8));
    }

    #[test]
    fn test_primal_infeasible() {
        // x ≥ 1 and x ≤ 0
        let P = CscMatrix::<f64>::zeros((1, 1));
        let A = CscMatrix::new(2, 1, vec![0, 2], vec![0, 1], vec![-1., 1.]);

        let mut solver =
            DefaultSolver::new(&P, &[0.], &A, &[-1., 0.], &[NonnegativeConeT(2)], settings())
                .unwrap();
        solver.solve();

        assert_eq!(solver.solution.status, SolverStatus::PrimalInfeasible);
        assert!(solver.solution.obj_val.is_nan());
    }

    #[test]
    fn test_dual_infeasible() {
        // min -x s.t. x ≥ 0
        let P = CscMatrix::<f64>::zeros((1, 1));
        let A = CscMatrix::new(1, 1, vec![0, 1], vec![0], vec![-1.]);

        let mut solver =
            DefaultSolver::new(&P, &[-1.], &A, &[0.], &[NonnegativeConeT(1)], settings()).unwrap();
        solver.solve();

        assert_eq!(solver.solution.status, SolverStatus::DualInfeasible);
    }

    #[test]
    fn test_iteration_limit() {
        let P = CscMatrix::<f64>::identity(2);
        let A = CscMatrix::new(1, 2, vec![0, 1, 2], vec![0, 0], vec![1., 1.]);
        let mut solver =
            DefaultSolver::new(&P, &[0., 0.], &A, &[1.], &[ZeroConeT(1)], settings()).unwrap();

        let limited = DefaultSettings {
            max_iter: 3,
            ..settings()
        };
        solver.update_settings(limited).unwrap();

        let rescaled = DefaultSettings {
            equilibrate_enable: false,
            ..settings()
        };
        assert!(solver.update_settings(rescaled).is_err());

        solver.solve();

        assert_eq!(solver.solution.status, SolverStatus::MaxIterations);
        assert_eq!(solver.solution.iterations, 3);

        // a second solve is ignored
        let before = solver.solution.clone();
        solver.solve();
        assert_eq!(solver.solution, before);
    }
}
