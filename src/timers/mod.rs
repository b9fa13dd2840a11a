//! Internal timers for the solver stages

mod timers;
pub use timers::*;
pub(crate) use timers::{notimeit, timeit};
