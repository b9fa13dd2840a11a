#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ---------------------------------
// Solver status type
// ---------------------------------

/// Status of solver at termination

#[repr(u32)]
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolverStatus {
    /// Problem is not solved (solver hasn't run).
    #[default]
    Unsolved,
    /// Solver terminated with a solution.
    Solved,
    /// Problem is primal infeasible.  Solution returned is a certificate of primal infeasibility.
    PrimalInfeasible,
    /// Problem is dual infeasible.  Solution returned is a certificate of dual infeasibility.
    DualInfeasible,
    /// Iteration limit reached before solution or infeasibility certificate found.
    MaxIterations,
    /// Time limit reached before solution or infeasibility certificate found.
    MaxTime,
    /// Solver terminated with a numerical error
    NumericalError,
}

impl SolverStatus {
    pub fn is_infeasible(&self) -> bool {
        matches!(
            *self,
            SolverStatus::PrimalInfeasible | SolverStatus::DualInfeasible
        )
    }

    pub fn is_errored(&self) -> bool {
        matches!(*self, SolverStatus::NumericalError)
    }
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ---------------------------------
// Workflow state flags
// ---------------------------------

/// Pipeline stages of a solve, in the order they must complete
#[repr(u8)]
#[derive(PartialEq, Eq, Clone, Debug, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolverStage {
    Assembled,
    Scaled,
    ChordalDecomposed,
    KKTFactored,
    Optimized,
}

impl std::fmt::Display for SolverStage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Five independent, monotone completion flags.  A flag can
/// be raised but never lowered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SolverStates {
    flags: u8,
}

impl SolverStates {
    fn bit(stage: SolverStage) -> u8 {
        1 << (stage as u8)
    }

    /// true once `stage` has completed
    pub fn is_set(&self, stage: SolverStage) -> bool {
        self.flags & Self::bit(stage) != 0
    }

    /// mark `stage` as complete.  Returns false if it already was.
    pub(crate) fn set(&mut self, stage: SolverStage) -> bool {
        let was_set = self.is_set(stage);
        self.flags |= Self::bit(stage);
        !was_set
    }

    pub fn is_assembled(&self) -> bool {
        self.is_set(SolverStage::Assembled)
    }
    pub fn is_scaled(&self) -> bool {
        self.is_set(SolverStage::Scaled)
    }
    pub fn is_chordal_decomposed(&self) -> bool {
        self.is_set(SolverStage::ChordalDecomposed)
    }
    pub fn is_kkt_factored(&self) -> bool {
        self.is_set(SolverStage::KKTFactored)
    }
    pub fn is_optimized(&self) -> bool {
        self.is_set(SolverStage::Optimized)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_states_are_monotone() {
        let mut states = SolverStates::default();
        assert!(!states.is_assembled());

        assert!(states.set(SolverStage::Assembled));
        assert!(!states.set(SolverStage::Assembled));
        assert!(states.is_assembled());
        assert!(!states.is_scaled());

        states.set(SolverStage::Optimized);
        assert!(states.is_optimized());
        assert!(states.is_assembled());
        assert!(!states.is_kkt_factored());
    }
}
