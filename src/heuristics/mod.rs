//! Heuristics module for the Bin Packing Problem.
//! 
//! This module exports the construction heuristics, the neighborhood
//! operators and the variable neighborhood search built on them.

pub mod budget;
pub mod construction;
pub mod moves;
pub mod neighborhoods;
pub mod shaking;
pub mod vns;

pub use construction::*;
pub use neighborhoods::*;
pub use shaking::Shaker;
pub use vns::*;
