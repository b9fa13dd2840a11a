//! Chordal decomposition of sparse semidefinite constraints.
//!
//! A large PSD constraint whose aggregate sparsity graph is far from
//! dense is replaced by PSD constraints on the cliques of a chordal
//! extension of that graph.  The cliques are organised in a supernodal
//! elimination tree, optionally merged, and tied back to the original
//! constraint through a linking matrix `H`.

type VertexSet = indexmap::IndexSet<usize>;

mod chordal_info;
mod decomp;
mod merge;
mod sparsity_pattern;
mod supernode_tree;

pub use chordal_info::*;
pub use merge::MergeMethod;
pub(crate) use merge::*;
pub use sparsity_pattern::*;
pub(crate) use supernode_tree::*;
