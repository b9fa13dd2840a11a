//! Implementations of the solver for particular problem formats

pub mod default;
