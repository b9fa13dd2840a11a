// package together all of the following and re-export
// in a partially flattened structure :
// : cone trait and standard cone implementations
// : kkt solver engines
// : error types and settings errors
// : solver status and pipeline states

pub mod cones;
pub mod kktsolvers;

//partially flatten top level pieces

mod errors;
mod settings;
mod solver;
pub use errors::*;
pub use settings::*;
pub use solver::*;
