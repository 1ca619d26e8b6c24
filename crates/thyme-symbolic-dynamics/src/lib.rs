//! Per-mode discretization primitives for timed hybrid automata
//!
//! This crate provides everything needed to turn one mode of a
//! [`thyme_hybrid_automaton::HybridAutomaton`] into finite symbolic data:
//!
//! - [`grid::UniformGrid`]: a uniform quantizer over a bounded domain with
//!   dense 1-based symbols
//! - [`clock::ClockGrid`]: the finite time grid of a mode's clock
//! - [`dynamics::SymbolicDynamics`]: a mode's discretized transition
//!   relation together with its grids
//! - [`abstractor::ModeAbstractor`]: the hook behind which the
//!   reachability kernel sits, with
//!   [`abstractor::GrowthBoundAbstractor`] as the reference
//!   implementation
//!
//! The assembly of per-mode symbolic data into one labeled transition
//! system lives in a separate crate.

pub mod abstractor;
pub mod clock;
pub mod dynamics;
pub mod grid;

pub use abstractor::{
    AbstractionError, DiscretizationParams, GrowthBound, GrowthBoundAbstractor, ModeAbstractor,
};
pub use clock::ClockGrid;
pub use dynamics::{SymbolicDynamics, SymbolicTransition};
pub use grid::{SetSemantics, UniformGrid};
