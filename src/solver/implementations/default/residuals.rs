#![allow(non_snake_case)]
use super::*;
use crate::algebra::*;
use crate::solver::core::cones::{CompositeCone, Cone};

// ---------------
// Residuals type for default problem format
// ---------------

/// Residuals of the current iterate, measured on the unscaled problem
#[derive(Debug, Clone, Default)]
pub struct DefaultResiduals<T> {
    /// ‖Ax + s - b‖∞
    pub r_prim: T,
    /// ‖Px + q - Aᵀμ‖∞
    pub r_dual: T,
    /// max(‖Ax‖∞, ‖s‖∞, ‖b‖∞)
    pub max_norm_prim: T,
    /// max(‖Px‖∞, ‖q‖∞, ‖Aᵀμ‖∞)
    pub max_norm_dual: T,
}

impl<T> DefaultResiduals<T>
where
    T: FloatT,
{
    pub fn new() -> Self {
        Self {
            r_prim: T::infinity(),
            r_dual: T::infinity(),
            max_norm_prim: T::zero(),
            max_norm_dual: T::zero(),
        }
    }

    pub(crate) fn update(
        &mut self,
        data: &DefaultProblemData<T>,
        vars: &DefaultVariables<T>,
        work: &mut UtilityVariables<T>,
    ) {
        let scaling = &data.scaling;
        let (einv, dinv, cinv) = (scaling.einv(), scaling.dinv(), scaling.cinv());

        // primal residual, rows unscaled by E⁻¹
        let Ax = &mut work.vec_m;
        data.A.gemv(Ax, &vars.x, T::one(), T::zero());
        let norm_Ax = norm_inf_in(Ax, einv);
        let norm_s = norm_inf_in(&vars.s, einv);
        let norm_b = norm_inf_in(&data.b, einv);

        Ax.axpby(T::one(), &vars.s, T::one());
        Ax.axpby(-T::one(), &data.b, T::one());
        self.r_prim = norm_inf_in(Ax, einv);
        self.max_norm_prim = T::max(norm_Ax, T::max(norm_s, norm_b));

        // dual residual, columns unscaled by D⁻¹/c
        let (Px, Atμ) = (&mut work.vec_n, &mut work.vec_n2);
        data.P.sym().symv(Px, &vars.x, T::one(), T::zero());
        data.A.t().gemv(Atμ, &vars.μ, T::one(), T::zero());
        let norm_Px = norm_inf_in(Px, dinv) * cinv;
        let norm_Atμ = norm_inf_in(Atμ, dinv) * cinv;
        let norm_q = norm_inf_in(&data.q, dinv) * cinv;

        Px.axpby(T::one(), &data.q, T::one());
        Px.axpby(-T::one(), Atμ, T::one());
        self.r_dual = norm_inf_in(Px, dinv) * cinv;
        self.max_norm_dual = T::max(norm_Px, T::max(norm_Atμ, norm_q));
    }

    /// convergence to the absolute / relative tolerances
    pub(crate) fn is_converged(&self, settings: &DefaultSettings<T>) -> bool {
        let eps_prim = settings.eps_abs + settings.eps_rel * self.max_norm_prim;
        let eps_dual = settings.eps_abs + settings.eps_rel * self.max_norm_dual;
        self.r_prim <= eps_prim && self.r_dual <= eps_dual
    }

    /// ratio of relative primal to relative dual residual, used
    /// to balance ρ
    pub(crate) fn balance_ratio(&self) -> T {
        let tiny = T::epsilon();
        let prim = self.r_prim / T::max(self.max_norm_prim, tiny);
        let dual = self.r_dual / T::max(self.max_norm_dual, tiny);
        prim / T::max(dual, tiny)
    }
}

// ---------------
// infeasibility certificates
// ---------------

/// Tests whether the last change of the dual iterate `δμ` certifies
/// primal infeasibility, i.e. whether `y = -δμ` (normalized, unscaled)
/// satisfies `Aᵀy ≈ 0`, `y ∈ K*` and `bᵀy < 0`.
pub(crate) fn is_primal_infeasible<T: FloatT>(
    δμ: &[T],
    data: &DefaultProblemData<T>,
    cones: &mut CompositeCone<T>,
    eps: T,
    work: &mut UtilityVariables<T>,
) -> bool {
    let scaling = &data.scaling;
    let cinv = scaling.cinv();

    // unscaled δμ is E δμ̂ / c
    let u = &mut work.vec_m;
    u.copy_from(δμ);
    if let Some(e) = scaling.e() {
        u.hadamard(e);
    }
    u.scale(cinv);

    let norm = u.norm_inf();
    if norm <= eps {
        return false;
    }
    let factor = cinv / norm;

    // bᵀy < -eps
    if data.b.dot(δμ) * factor <= eps {
        return false;
    }

    // ‖Aᵀy‖ small
    let Atu = &mut work.vec_n;
    data.A.t().gemv(Atu, δμ, T::one(), T::zero());
    if norm_inf_in(Atu, scaling.dinv()) * factor > eps {
        return false;
    }

    // y ∈ K* if and only if Π_K(-y) = 0
    u.scale(T::recip(norm));
    cones.project(u);
    u.norm_inf() <= eps
}

/// Tests whether the last change of the primal iterate `δx` certifies
/// dual infeasibility, i.e. whether `v = δx` (normalized, unscaled)
/// satisfies `Pv ≈ 0`, `-Av ∈ K` and `qᵀv < 0`.
pub(crate) fn is_dual_infeasible<T: FloatT>(
    δx: &[T],
    data: &DefaultProblemData<T>,
    cones: &mut CompositeCone<T>,
    eps: T,
    work: &mut UtilityVariables<T>,
    work_m: &mut [T],
) -> bool {
    let scaling = &data.scaling;
    let cinv = scaling.cinv();

    // unscaled δx is D δx̂
    let v = &mut work.vec_n;
    v.copy_from(δx);
    if let Some(d) = scaling.d() {
        v.hadamard(d);
    }

    let norm = v.norm_inf();
    if norm <= eps {
        return false;
    }
    let factor = T::recip(norm);

    // qᵀv < -eps
    if data.q.dot(δx) * cinv * factor >= -eps {
        return false;
    }

    // ‖Pv‖ small
    let Pv = &mut work.vec_n2;
    data.P.sym().symv(Pv, δx, T::one(), T::zero());
    if norm_inf_in(Pv, scaling.dinv()) * cinv * factor > eps {
        return false;
    }

    // -Av ∈ K, i.e. its distance to K is small
    let w = &mut work.vec_m;
    data.A.gemv(w, δx, -factor, T::zero());
    if let Some(einv) = scaling.einv() {
        w.hadamard(einv);
    }
    work_m.copy_from(w);
    cones.project(work_m);
    w.norm_inf_diff(work_m) <= eps
}

// ‖diag(scale) v‖∞, with an absent scale taken as identity
fn norm_inf_in<T: FloatT>(v: &[T], scale: Option<&[T]>) -> T {
    match scale {
        Some(scale) => v.norm_inf_scaled(&scale[0..v.len()]),
        None => v.norm_inf(),
    }
}
