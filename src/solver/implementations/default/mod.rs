#![allow(non_snake_case)]

mod equilibration;
mod info;
#[cfg(feature = "serde")]
mod json;
mod problemdata;
mod residuals;
mod settings;
mod solution;
mod solver;
mod variables;
mod workspace;

//export flattened
pub use equilibration::*;
pub use info::*;
pub use problemdata::*;
pub use residuals::*;
pub use settings::*;
pub use solution::*;
pub use solver::*;
pub use variables::*;
pub use workspace::*;
