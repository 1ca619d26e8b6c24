//! Symbolic abstraction builder for timed hybrid automata
//!
//! This crate turns a [`thyme_hybrid_automaton::HybridAutomaton`] into a
//! finite labeled transition system, the temporal-hybrid symbolic model,
//! suitable for downstream controller synthesis.
//!
//! States of the final automaton are augmented triples of a spatial grid
//! symbol, a time index on the mode's clock grid and the mode id. Inputs
//! come from a single contiguous numbering that multiplexes every mode's
//! continuous controls with the automaton's switching events, continuous
//! ids first. Transitions are the union of
//!
//! - the intra-mode product of each mode's spatial transitions with its
//!   clock advance, and
//! - the switching transitions obtained by enumerating each guard,
//!   applying the reset map at the concrete level and re-abstracting the
//!   images in the target mode's grids.
//!
//! The whole construction runs inside a single
//! [`builder::TimedHybridModelBuilder::build`] call and returns an
//! immutable [`model::TimedHybridModel`]; its accessors are pure and safe
//! to share across threads.
//!
//! # Example
//!
//! ```
//! use thyme_hybrid_automaton::builder::HybridAutomatonBuilder;
//! use thyme_hybrid_automaton::geometry::{AxisBox, GuardSet};
//! use thyme_hybrid_automaton::maps::{ResetMap, VectorField};
//! use thyme_hybrid_automaton::ModeDynamics;
//! use thyme_symbolic_dynamics::{DiscretizationParams, GrowthBound, GrowthBoundAbstractor};
//! use thyme_symbolic_model::builder::TimedHybridModelBuilder;
//!
//! let dynamics = ModeDynamics::new(
//!     AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
//!     AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
//!     VectorField::zero(1),
//! )
//! .unwrap();
//!
//! let ha = HybridAutomatonBuilder::new("demo")
//!     .with_mode(dynamics.clone(), 0.0).unwrap()
//!     .with_mode(dynamics, 0.0).unwrap()
//!     .with_transition(
//!         1,
//!         1,
//!         2,
//!         GuardSet::Box(AxisBox::from_intervals([(0.4, 1.0), (0.0, 0.0)]).unwrap()),
//!         ResetMap::identity(),
//!     ).unwrap()
//!     .build().unwrap();
//!
//! let params = DiscretizationParams::new(vec![0.5], vec![1.0], 0.0);
//! let model = TimedHybridModelBuilder::new(
//!     &ha,
//!     GrowthBoundAbstractor,
//!     vec![params.clone(), params],
//!     vec![GrowthBound::Scalar(0.0), GrowthBound::Scalar(0.0)],
//! )
//! .build()
//! .unwrap();
//!
//! assert_eq!(model.n_inputs(), 3);
//! assert!(model.n_states() > 0);
//! ```

pub mod builder;
pub mod input_map;
pub mod model;

pub use builder::{BoundaryPolicy, ModelBuildError, TimedHybridModelBuilder};
pub use input_map::{GlobalInputMap, InputClass};
pub use model::{AugmentedRegion, AugmentedState, ModelQueryError, TimedHybridModel};
