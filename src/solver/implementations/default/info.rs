use crate::algebra::*;
use crate::timers::*;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A change of the penalty parameter ρ, together with the residuals
/// that prompted it
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RhoUpdate<T> {
    /// iteration at which ρ was changed
    pub iter: u32,
    /// the new value of ρ
    pub rho: T,
    pub r_prim: T,
    pub r_dual: T,
}

/// Residual information of a solve
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
pub struct ResultInfo<T> {
    /// primal residual ‖Ax + s - b‖∞
    pub r_prim: T,
    /// dual residual ‖Px + q + Aᵀy‖∞
    pub r_dual: T,
    /// every change of ρ, in order
    pub rho_updates: Vec<RhoUpdate<T>>,
}

/// Time spent in the stages of a solve, in seconds.  The optional
/// fields are only filled when `verbose_timing` is set.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResultTimes {
    pub solver_time: f64,
    pub setup_time: f64,
    pub scaling_time: f64,
    pub graph_time: Option<f64>,
    pub init_factor_time: Option<f64>,
    pub factor_update_time: Option<f64>,
    pub iter_time: Option<f64>,
    pub proj_time: Option<f64>,
    pub post_time: Option<f64>,
}

impl ResultTimes {
    pub(crate) fn from_timers(timers: &Timers, verbose_timing: bool) -> Self {
        let mut times = ResultTimes {
            solver_time: timers.total_time().as_secs_f64(),
            setup_time: timers.seconds(&["setup"]),
            scaling_time: timers.seconds(&["setup", "scale"]),
            ..ResultTimes::default()
        };

        if verbose_timing {
            times.graph_time = Some(timers.seconds(&["setup", "graph"]));
            times.init_factor_time = Some(timers.seconds(&["setup", "init_factor"]));
            times.factor_update_time = Some(timers.seconds(&["solve", "iterate", "factor_update"]));
            times.iter_time = Some(timers.seconds(&["solve", "iterate"]));
            times.proj_time = Some(timers.seconds(&["solve", "iterate", "projection"]));
            times.post_time = Some(timers.seconds(&["solve", "post_process"]));
        }
        times
    }
}

impl<T> ResultInfo<T>
where
    T: FloatT,
{
    pub(crate) fn new(r_prim: T, r_dual: T, rho_updates: &[RhoUpdate<T>]) -> Self {
        Self {
            r_prim,
            r_dual,
            rho_updates: rho_updates.to_vec(),
        }
    }
}

#[test]
fn test_times_from_timers() {
    let mut timers = Timers::default();
    timeit! {timers => "setup"; {
        timeit! {timers => "scale"; {}}
    }}

    let times = ResultTimes::from_timers(&timers, false);
    assert!(times.scaling_time <= times.setup_time);
    assert!(times.graph_time.is_none());
    assert!(times.post_time.is_none());

    let times = ResultTimes::from_timers(&timers, true);
    assert_eq!(times.graph_time, Some(0.));
    assert!(times.iter_time.is_some());
}
