//! Factory for building a [`TimedHybridModel`] from a hybrid automaton
//!
//! The builder runs all construction phases to completion inside a single
//! [`TimedHybridModelBuilder::build`] call:
//!
//! 1. abstract every mode's continuous dynamics through the configured
//!    [`ModeAbstractor`] and build its clock grid
//! 2. allocate the global input numbering
//! 3. lift every mode's spatial transitions into the product with its
//!    clock advance
//! 4. enumerate every switching transition's guard, apply its reset map at
//!    the concrete level and re-abstract the images in the target mode
//! 5. number the augmented states that occur in any triple and index the
//!    transition relation
//!
//! A failing phase aborts the whole build; a model is either internally
//! consistent or not produced.

use std::collections::{BTreeSet, HashMap};
use std::error;
use std::fmt;

use log::{debug, info, warn};
use nalgebra::DVector;
#[cfg(feature = "config_deserialize")]
use serde::Deserialize;
use thyme_hybrid_automaton::geometry::AxisBox;
use thyme_hybrid_automaton::{HybridAutomaton, SwitchingTransition};
use thyme_symbolic_dynamics::{
    AbstractionError, ClockGrid, DiscretizationParams, GrowthBound, ModeAbstractor, SetSemantics,
};

use crate::input_map::GlobalInputMap;
use crate::model::{AugmentedState, ModeModel, TimedHybridModel};

/// Distance up to which [`BoundaryPolicy::SnapInside`] pulls reset images
/// back onto the target domain
pub const BOUNDARY_SNAP_TOL: f64 = 1e-6;

/// Treatment of reset images on or just outside the target mode's grid
///
/// Reset maps are expected to send guard interiors into the interior of
/// the target grid; images that violate this land on cell boundaries or
/// outside the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config_deserialize", derive(Deserialize))]
pub enum BoundaryPolicy {
    /// Silently drop images outside the gridded domain
    #[default]
    Drop,
    /// Pull images within [`BOUNDARY_SNAP_TOL`] of the domain boundary
    /// onto its closest face before re-abstraction
    SnapInside,
}

/// One transition of the final automaton before numbering
#[derive(Debug, Clone, Copy)]
struct Triple {
    target: AugmentedState,
    source: AugmentedState,
    input: usize,
}

/// Builder producing the temporal-hybrid symbolic model of an automaton
///
/// The builder borrows the hybrid automaton and consumes one
/// [`DiscretizationParams`] and one [`GrowthBound`] per mode, in mode id
/// order.
#[derive(Debug)]
pub struct TimedHybridModelBuilder<'a, A> {
    automaton: &'a HybridAutomaton,
    abstractor: A,
    params: Vec<DiscretizationParams>,
    growth_bounds: Vec<GrowthBound>,
    boundary_policy: BoundaryPolicy,
}

impl<'a, A: ModeAbstractor> TimedHybridModelBuilder<'a, A> {
    /// Create a builder for the given automaton and abstraction inputs
    pub fn new(
        automaton: &'a HybridAutomaton,
        abstractor: A,
        params: Vec<DiscretizationParams>,
        growth_bounds: Vec<GrowthBound>,
    ) -> Self {
        TimedHybridModelBuilder {
            automaton,
            abstractor,
            params,
            growth_bounds,
            boundary_policy: BoundaryPolicy::default(),
        }
    }

    /// Override the treatment of boundary reset images
    pub fn with_boundary_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.boundary_policy = policy;
        self
    }

    /// Run all construction phases and return the finished model
    pub fn build(self) -> Result<TimedHybridModel, ModelBuildError> {
        let n_modes = self.automaton.n_modes();
        if self.params.len() != n_modes {
            return Err(ModelBuildError::DiscretizationCountMismatch {
                expected: n_modes,
                got: self.params.len(),
            });
        }
        if self.growth_bounds.len() != n_modes {
            return Err(ModelBuildError::GrowthBoundCountMismatch {
                expected: n_modes,
                got: self.growth_bounds.len(),
            });
        }

        let modes = self.abstract_modes()?;

        let input_counts: Vec<_> = modes.iter().map(|m| m.dynamics().n_inputs()).collect();
        let input_map = GlobalInputMap::new(
            &input_counts,
            self.automaton
                .transitions()
                .map(|t| (t.id(), t.source(), t.target())),
        );
        info!("Automaton {}: {}", self.automaton.name(), input_map);

        let mut triples = self.intra_mode_triples(&modes, &input_map);
        self.switching_triples(&modes, &input_map, &mut triples)?;

        Ok(Self::assemble(
            self.automaton.name().to_string(),
            modes,
            input_map,
            &triples,
        ))
    }

    /// Phase 1: per-mode symbolic dynamics and clock grids
    fn abstract_modes(&self) -> Result<Vec<ModeModel>, ModelBuildError> {
        let mut modes = Vec::with_capacity(self.automaton.n_modes());
        for mode in self.automaton.modes() {
            let k = mode.id();
            let params = &self.params[k - 1];

            let dynamics = self
                .abstractor
                .abstract_mode(k, mode.dynamics(), params, &self.growth_bounds[k - 1])
                .map_err(|source| ModelBuildError::ModeAbstraction { mode: k, source })?;

            let clock = ClockGrid::new(mode.clock_horizon(), params.time_step());
            debug!(
                "Mode {k}: {} and {} clock steps",
                dynamics,
                clock.n_steps()
            );

            modes.push(ModeModel { dynamics, clock });
        }
        Ok(modes)
    }

    /// Phase 3: product of spatial transitions with the clock advance
    ///
    /// Spatial transitions are independent of the clock index. On an
    /// active clock every spatial transition advances the clock by exactly
    /// one index, so the terminal index has no outgoing copies; on a
    /// frozen clock the only index is 1.
    fn intra_mode_triples(
        &self,
        modes: &[ModeModel],
        input_map: &GlobalInputMap,
    ) -> Vec<Triple> {
        let mut triples = Vec::new();
        for (idx, mode) in modes.iter().enumerate() {
            let k = idx + 1;
            let n_steps = mode.clock().n_steps();

            for transition in mode.dynamics().transitions() {
                let input = input_map
                    .continuous_id(k, transition.input())
                    .unwrap_or_else(|| {
                        panic!(
                            "No global id allocated for input {} of mode {k}",
                            transition.input()
                        )
                    });

                if n_steps == 1 {
                    triples.push(Triple {
                        target: AugmentedState::new(transition.target(), 1, k),
                        source: AugmentedState::new(transition.source(), 1, k),
                        input,
                    });
                } else {
                    for i in 1..n_steps {
                        triples.push(Triple {
                            target: AugmentedState::new(transition.target(), i + 1, k),
                            source: AugmentedState::new(transition.source(), i, k),
                            input,
                        });
                    }
                }
            }
        }

        info!("Intra-mode product: {} triples", triples.len());
        triples
    }

    /// Phase 4: guard enumeration, concrete resets, re-abstraction
    fn switching_triples(
        &self,
        modes: &[ModeModel],
        input_map: &GlobalInputMap,
        out: &mut Vec<Triple>,
    ) -> Result<(), ModelBuildError> {
        for transition in self.automaton.transitions() {
            self.triples_for_transition(transition, modes, input_map, out)?;
        }
        Ok(())
    }

    fn triples_for_transition(
        &self,
        transition: &SwitchingTransition,
        modes: &[ModeModel],
        input_map: &GlobalInputMap,
        out: &mut Vec<Triple>,
    ) -> Result<(), ModelBuildError> {
        let id = transition.id();
        let guard = transition
            .guard()
            .as_box()
            .ok_or(ModelBuildError::UnsupportedGuardShape { transition: id })?;
        let (spatial, (t_lo, t_hi)) = guard
            .split_clock()
            .unwrap_or_else(|| panic!("Guard of transition {id} has no clock dimension"));

        let source_mode = &modes[transition.source() - 1];
        let target_mode = &modes[transition.target() - 1];
        let input = input_map
            .switching_id(id)
            .unwrap_or_else(|| panic!("No global id allocated for transition {id}"));

        let sources = source_mode
            .dynamics()
            .states_in_set(&spatial, SetSemantics::Inner);
        let times = source_mode.clock().indices_in_interval(t_lo, t_hi);
        if sources.is_empty() {
            warn!("Guard of transition {id} contains no source cell");
        }

        let target_bounds = target_mode.dynamics().state_grid().bounds();
        let target_dim = target_mode.dynamics().state_grid().dim();

        let mut emitted = 0usize;
        let mut dropped = 0usize;
        for &symbol in &sources {
            let x = source_mode
                .dynamics()
                .concrete_state(symbol)
                .unwrap_or_else(|| panic!("No cell center for enumerated symbol {symbol}"));

            for &index in &times {
                let time = source_mode
                    .clock()
                    .time_at(index)
                    .unwrap_or_else(|| panic!("No grid point for enumerated time index {index}"));

                let augmented = DVector::from_iterator(
                    x.len() + 1,
                    x.iter().copied().chain(std::iter::once(time)),
                );
                let image = transition.reset().apply(&augmented);
                if image.len() != target_dim + 1 {
                    return Err(ModelBuildError::ResetImageDimensionMismatch {
                        transition: id,
                        expected: target_dim + 1,
                        got: image.len(),
                    });
                }

                let mut point =
                    DVector::from_iterator(target_dim, image.iter().take(target_dim).copied());
                let image_time = image[target_dim];
                if self.boundary_policy == BoundaryPolicy::SnapInside {
                    snap_into(&mut point, &target_bounds);
                }

                // expected misses: the image left the target grids
                match (
                    target_mode.dynamics().abstract_state(&point),
                    target_mode.clock().index_of_time(image_time),
                ) {
                    (Some(target_symbol), Some(target_index)) => {
                        out.push(Triple {
                            target: AugmentedState::new(
                                target_symbol,
                                target_index,
                                transition.target(),
                            ),
                            source: AugmentedState::new(symbol, index, transition.source()),
                            input,
                        });
                        emitted += 1;
                    }
                    _ => dropped += 1,
                }
            }
        }

        if dropped > 0 {
            debug!("Transition {id}: {dropped} reset images left the target grid");
        }
        info!(
            "Transition {id} ({}): {emitted} switching triples",
            input_map.switching_label(input).unwrap_or(""),
        );
        Ok(())
    }

    /// Phase 5: number the augmented states and index the relation
    ///
    /// States are numbered in first-appearance order over the triple list,
    /// which is deterministic for fixed input.
    fn assemble(
        name: String,
        modes: Vec<ModeModel>,
        input_map: GlobalInputMap,
        triples: &[Triple],
    ) -> TimedHybridModel {
        let mut states = Vec::new();
        let mut state_index: HashMap<AugmentedState, usize> = HashMap::new();
        for triple in triples {
            for aug in [triple.source, triple.target] {
                if !state_index.contains_key(&aug) {
                    states.push(aug);
                    state_index.insert(aug, states.len());
                }
            }
        }

        let mut successors: HashMap<(usize, usize), BTreeSet<usize>> = HashMap::new();
        let mut n_transitions = 0usize;
        for triple in triples {
            let source = state_index[&triple.source];
            let target = state_index[&triple.target];
            if successors
                .entry((source, triple.input))
                .or_default()
                .insert(target)
            {
                n_transitions += 1;
            }
        }

        info!(
            "Assembled {name}: {} states, {n_transitions} transitions",
            states.len()
        );

        TimedHybridModel {
            name,
            modes,
            input_map,
            states,
            state_index,
            successors,
            n_transitions,
        }
    }
}

/// Pull coordinates within [`BOUNDARY_SNAP_TOL`] of the bounds onto them
fn snap_into(point: &mut DVector<f64>, bounds: &AxisBox) {
    for d in 0..point.len() {
        let (lo, hi) = bounds
            .interval(d)
            .unwrap_or_else(|| panic!("Snap target has no dimension {d}"));

        if point[d] > hi && point[d] <= hi + BOUNDARY_SNAP_TOL {
            point[d] = hi;
        }
        if point[d] < lo && point[d] >= lo - BOUNDARY_SNAP_TOL {
            point[d] = lo;
        }
    }
}

/// Errors that abort the construction of a [`TimedHybridModel`]
#[derive(Debug, Clone, PartialEq)]
pub enum ModelBuildError {
    /// A guard is not an axis-aligned box
    UnsupportedGuardShape {
        /// Id of the offending hybrid transition
        transition: u32,
    },
    /// The abstractor failed on a mode
    ModeAbstraction {
        /// Id of the mode being abstracted
        mode: usize,
        /// The abstractor's error
        source: AbstractionError,
    },
    /// The number of discretization parameter sets does not match the
    /// number of modes
    DiscretizationCountMismatch {
        /// Number of modes of the automaton
        expected: usize,
        /// Number of parameter sets supplied
        got: usize,
    },
    /// The number of growth bounds does not match the number of modes
    GrowthBoundCountMismatch {
        /// Number of modes of the automaton
        expected: usize,
        /// Number of growth bounds supplied
        got: usize,
    },
    /// A reset map returned a vector of the wrong dimension
    ResetImageDimensionMismatch {
        /// Id of the offending hybrid transition
        transition: u32,
        /// Augmented dimension of the target mode
        expected: usize,
        /// Dimension the reset map returned
        got: usize,
    },
}

impl fmt::Display for ModelBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelBuildError::UnsupportedGuardShape { transition } => {
                write!(
                    f,
                    "Guard of transition {transition} is not an axis-aligned box"
                )
            }
            ModelBuildError::ModeAbstraction { mode, source } => {
                write!(f, "Failed to abstract mode {mode}: {source}")
            }
            ModelBuildError::DiscretizationCountMismatch { expected, got } => {
                write!(
                    f,
                    "Got {got} discretization parameter sets for {expected} modes"
                )
            }
            ModelBuildError::GrowthBoundCountMismatch { expected, got } => {
                write!(f, "Got {got} growth bounds for {expected} modes")
            }
            ModelBuildError::ResetImageDimensionMismatch {
                transition,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Reset map of transition {transition} returned a vector of dimension {got}, \
                     expected the target mode's augmented dimension {expected}"
                )
            }
        }
    }
}

impl error::Error for ModelBuildError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ModelBuildError::ModeAbstraction { source, .. } => Some(source),
            _ => None,
        }
    }
}
