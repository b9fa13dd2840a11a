//! Solver main module.
//!
//! The solver is organised in three layers:
//!
//! * [`core`](crate::solver::core): cones, KKT solver engines, errors,
//!   solver status and the pipeline stage flags.
//! * [`chordal`](crate::solver::chordal): chordal decomposition of
//!   sparse PSD constraints.
//! * [`implementations`](crate::solver::implementations): the ADMM solver
//!   for problems in the standard format, exposed at the top level of
//!   this module.

pub mod chordal;
pub mod core;
pub mod implementations;

//allows declaration of cone constraints
pub use crate::solver::core::cones::{SupportedConeT, SupportedConeT::*};

//user facing status, stage and error types
pub use crate::solver::core::{SolverError, SolverStage, SolverStates, SolverStatus};

//If we have implemtations for multple alternative
//problem formats, they would live here.   Since we
//only have default, it is exposed at the top level
//in the use statements directly below instead.

pub use crate::solver::implementations::default;
pub use crate::solver::implementations::default::*;
