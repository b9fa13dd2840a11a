//! __conic_admm__ is an operator splitting (ADMM) solver core for convex conic
//! optimization problems of the form
//!
//! $$
//! \begin{array}{rl}
//! \text{minimize} & \frac{1}{2}x^T P x + q^T x\\\\\[2ex\]
//!  \text{subject to} & Ax + s = b \\\\\[1ex\]
//!         & s \in \mathcal{K}
//!  \end{array}
//! $$
//!
//! with decision variables
//! $x \in \mathbb{R}^n$,
//! $s \in \mathbb{R}^m$
//! and data matrices
//! $P=P^\top \succeq 0$,
//! $q \in \mathbb{R}^n$,
//! $A \in \mathbb{R}^{m \times n}$, and
//! $b \in \mathbb{R}^m$.
//! The convex set $\mathcal{K}$ is a composition of zero, nonnegative,
//! second order and positive semidefinite (triangle packed) cones.
//!
//! ## Features
//!
//! * __Equilibration__: problem data is scaled with a modified Ruiz procedure
//!   that respects the cones whose scaling must be uniform.
//!
//! * __Chordal decomposition__: large sparse PSD constraints are replaced by
//!   constraints on the cliques of a chordal extension of their sparsity graph.
//!   Cliques can be merged with a parent-child or a clique graph strategy.
//!
//! * __Adaptive penalty__: the ADMM step size ρ is rebalanced from the
//!   primal and dual residuals, and the KKT system is refactored with the
//!   direct LDL solver each time it changes.
//!
//! * __Infeasibility detection__: certificates of primal and dual
//!   infeasibility are recognised from the iterate differences.
//!
//! # Example
//!
//! ```
//! use conic_admm::algebra::*;
//! use conic_admm::solver::*;
//!
//! // min ½‖x‖² s.t. x₁ + x₂ = 1
//! let P = CscMatrix::<f64>::identity(2);
//! let A = CscMatrix::new(1, 2, vec![0, 1, 2], vec![0, 0], vec![1., 1.]);
//! let cones = [ZeroConeT(1)];
//!
//! let mut solver =
//!     DefaultSolver::new(&P, &[0., 0.], &A, &[1.], &cones, DefaultSettings::default()).unwrap();
//! solver.solve();
//! assert_eq!(solver.solution.status, SolverStatus::Solved);
//! ```

//Rust hates greek characters
#![allow(confusable_idents)]

pub mod algebra;
pub mod qdldl;
pub mod solver;
pub mod timers;
