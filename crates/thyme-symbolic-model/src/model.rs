//! The assembled timed hybrid symbolic model
//!
//! A [`TimedHybridModel`] owns the per-mode symbolic dynamics and clock
//! grids, the global input map, the dense numbering of augmented states
//! and the indexed transition relation. All structures are built once by
//! the [`crate::builder::TimedHybridModelBuilder`] and immutable
//! afterwards; every accessor is a pure function of the model.

use std::collections::{BTreeSet, HashMap};
use std::error;
use std::fmt;

use nalgebra::DVector;
use thyme_display_utils::indent_lines;
use thyme_hybrid_automaton::geometry::AxisBox;
use thyme_symbolic_dynamics::{ClockGrid, SetSemantics, SymbolicDynamics};

use crate::input_map::{GlobalInputMap, InputClass};

/// A state of the final automaton: spatial symbol, time index and mode id
///
/// All three components are 1-based; the mode id disambiguates equal
/// `(symbol, time)` pairs of different modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AugmentedState {
    symbol: usize,
    time: usize,
    mode: usize,
}

impl AugmentedState {
    /// Pack a spatial symbol, time index and mode id
    pub fn new(symbol: usize, time: usize, mode: usize) -> Self {
        AugmentedState { symbol, time, mode }
    }

    /// Spatial state symbol within the mode
    pub fn symbol(&self) -> usize {
        self.symbol
    }

    /// Time index on the mode's clock grid
    pub fn time(&self) -> usize {
        self.time
    }

    /// Mode id
    pub fn mode(&self) -> usize {
        self.mode
    }
}

impl fmt::Display for AugmentedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.symbol, self.time, self.mode)
    }
}

/// The symbolic data of one mode inside the assembled model
#[derive(Debug, Clone)]
pub struct ModeModel {
    pub(crate) dynamics: SymbolicDynamics,
    pub(crate) clock: ClockGrid,
}

impl ModeModel {
    /// The mode's discretized spatial dynamics
    pub fn dynamics(&self) -> &SymbolicDynamics {
        &self.dynamics
    }

    /// The mode's clock grid
    pub fn clock(&self) -> &ClockGrid {
        &self.clock
    }
}

/// A per-mode query region for [`TimedHybridModel::states_in_augmented_set`]
#[derive(Debug, Clone)]
pub struct AugmentedRegion {
    pub(crate) mode: usize,
    pub(crate) set: AxisBox,
    pub(crate) window: (f64, f64),
}

impl AugmentedRegion {
    /// Restrict a query to `set x [t_lo, t_hi]` within the given mode
    pub fn new(mode: usize, set: AxisBox, t_lo: f64, t_hi: f64) -> Self {
        AugmentedRegion {
            mode,
            set,
            window: (t_lo, t_hi),
        }
    }
}

/// The temporal-hybrid symbolic model of a timed hybrid automaton
#[derive(Debug, Clone)]
pub struct TimedHybridModel {
    pub(crate) name: String,
    pub(crate) modes: Vec<ModeModel>,
    pub(crate) input_map: GlobalInputMap,
    /// Dense numbering: state id `s` is `states[s - 1]`
    pub(crate) states: Vec<AugmentedState>,
    pub(crate) state_index: HashMap<AugmentedState, usize>,
    /// Transition relation keyed by `(source id, global input id)`
    pub(crate) successors: HashMap<(usize, usize), BTreeSet<usize>>,
    pub(crate) n_transitions: usize,
}

impl TimedHybridModel {
    /// Name inherited from the hybrid automaton
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of modes
    pub fn n_modes(&self) -> usize {
        self.modes.len()
    }

    /// Number of augmented states of the final automaton
    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// All state ids of the final automaton
    pub fn states(&self) -> impl Iterator<Item = usize> {
        1..=self.states.len()
    }

    /// Total number of global inputs
    ///
    /// This counts all allocated ids, whether or not a transition carries
    /// them.
    pub fn n_inputs(&self) -> usize {
        self.input_map.n_inputs()
    }

    /// Number of transitions of the final automaton
    pub fn n_transitions(&self) -> usize {
        self.n_transitions
    }

    /// The global input numbering
    pub fn input_map(&self) -> &GlobalInputMap {
        &self.input_map
    }

    /// The symbolic data of a mode
    pub fn mode(&self, mode: usize) -> Result<&ModeModel, ModelQueryError> {
        self.modes
            .get(mode.wrapping_sub(1))
            .ok_or(ModelQueryError::InvalidModeId { mode })
    }

    /// The local input symbols of a mode
    pub fn mode_inputs(
        &self,
        mode: usize,
    ) -> Result<impl Iterator<Item = usize> + '_, ModelQueryError> {
        Ok(self.mode(mode)?.dynamics.inputs())
    }

    /// Unpack a state id into its augmented state
    pub fn augmented_state(&self, state: usize) -> Result<AugmentedState, ModelQueryError> {
        self.states
            .get(state.wrapping_sub(1))
            .copied()
            .ok_or(ModelQueryError::InvalidStateId { state })
    }

    /// State id of an augmented state, if it is part of the automaton
    pub fn state_id(&self, state: &AugmentedState) -> Option<usize> {
        self.state_index.get(state).copied()
    }

    /// Concrete point, time value and mode id of a state id
    pub fn concrete_state(
        &self,
        state: usize,
    ) -> Result<(DVector<f64>, f64, usize), ModelQueryError> {
        let aug = self.augmented_state(state)?;
        let mode = &self.modes[aug.mode - 1];

        let x = mode.dynamics.concrete_state(aug.symbol).unwrap_or_else(|| {
            panic!("State id {state} refers to unknown spatial symbol {}", aug.symbol)
        });
        let time = mode.clock.time_at(aug.time).unwrap_or_else(|| {
            panic!("State id {state} refers to unknown time index {}", aug.time)
        });

        Ok((x, time, aug.mode))
    }

    /// State id of the augmented state containing `(x, time)` in the mode
    ///
    /// Quantizes the point on the mode's state grid, floors the time value
    /// on its clock grid and resolves the resulting augmented state.
    pub fn abstract_state(
        &self,
        x: &DVector<f64>,
        time: f64,
        mode: usize,
    ) -> Result<usize, ModelQueryError> {
        let mode_model = self.mode(mode)?;

        let symbol = mode_model
            .dynamics
            .abstract_state(x)
            .ok_or(ModelQueryError::AbstractStateNotFound { mode })?;
        let index = mode_model
            .clock
            .floor_index(time)
            .ok_or(ModelQueryError::TimeIndexNotFound { mode })?;

        let aug = AugmentedState::new(symbol, index, mode);
        self.state_id(&aug)
            .ok_or(ModelQueryError::UnknownAugmentedState { state: aug })
    }

    /// All state ids inside the given per-mode regions
    ///
    /// For every region the spatial set is enumerated under inner
    /// semantics, the temporal window snapped to clock indices, and only
    /// augmented states present in the automaton are kept. The result is
    /// ascending and duplicate-free.
    pub fn states_in_augmented_set(
        &self,
        regions: impl IntoIterator<Item = AugmentedRegion>,
    ) -> Result<Vec<usize>, ModelQueryError> {
        let mut out = Vec::new();
        for region in regions {
            let mode_model = self.mode(region.mode)?;

            let symbols = mode_model
                .dynamics
                .states_in_set(&region.set, SetSemantics::Inner);

            let (t_lo, t_hi) = region.window;
            let first = mode_model.clock.ceil_index(t_lo);
            let last = mode_model.clock.floor_index(t_hi);
            let (first, last) = match (first, last) {
                (Some(first), Some(last)) => (first, last),
                _ => continue,
            };

            for &symbol in &symbols {
                for time in first..=last {
                    let aug = AugmentedState::new(symbol, time, region.mode);
                    if let Some(id) = self.state_id(&aug) {
                        out.push(id);
                    }
                }
            }
        }

        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    /// Successor state ids under a global input
    pub fn successors(&self, state: usize, input: usize) -> impl Iterator<Item = usize> + '_ {
        self.successors
            .get(&(state, input))
            .into_iter()
            .flatten()
            .copied()
    }

    /// All transitions as `(target id, source id, global input id)`
    pub fn transition_triples(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.successors
            .iter()
            .flat_map(|(&(source, input), targets)| {
                targets.iter().map(move |&target| (target, source, input))
            })
    }

    /// Concrete input vector of a continuous global id within the mode
    ///
    /// Switching ids have no concrete input and answer `None`; ids that
    /// are invalid or belong to another mode's block are an error.
    pub fn concrete_input(
        &self,
        input: usize,
        mode: usize,
    ) -> Result<Option<DVector<f64>>, ModelQueryError> {
        match self.input_map.classify(input) {
            InputClass::Continuous { mode: k, local } if k == mode => {
                let u = self.modes[k - 1].dynamics.concrete_input(local).unwrap_or_else(|| {
                    panic!("Global input {input} refers to unknown local input {local}")
                });
                Ok(Some(u))
            }
            InputClass::Switching { .. } => Ok(None),
            _ => Err(ModelQueryError::InvalidInputId { input }),
        }
    }

    /// Global id of the continuous input containing `u` in the mode
    ///
    /// Answers `None` when the point is outside the mode's input domain or
    /// the mode does not exist.
    pub fn abstract_input(&self, u: &DVector<f64>, mode: usize) -> Option<usize> {
        let mode_model = self.modes.get(mode.wrapping_sub(1))?;
        let local = mode_model.dynamics.abstract_input(u)?;
        self.input_map.continuous_id(mode, local)
    }
}

impl fmt::Display for TimedHybridModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut modes = String::new();
        for (k, mode) in self.modes.iter().enumerate() {
            modes += &format!("mode {}: {}, {};\n", k + 1, mode.dynamics, mode.clock);
        }
        let modes = format!(
            "modes ({}) {{\n{}}}",
            self.modes.len(),
            indent_lines(modes)
        );

        let body = format!(
            "{modes}\n\nstates: {};\ninputs: {} ({} continuous, {} switching);\ntransitions: {};",
            self.n_states(),
            self.input_map.n_inputs(),
            self.input_map.n_continuous(),
            self.input_map.n_switching(),
            self.n_transitions
        );

        write!(
            f,
            "timedHybridModel {} {{\n{}\n}}\n",
            self.name,
            indent_lines(body)
        )
    }
}

/// Errors of read-only queries on a [`TimedHybridModel`]
///
/// Query failures never mutate the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelQueryError {
    /// The mode id names no mode of the model
    InvalidModeId {
        /// The offending mode id
        mode: usize,
    },
    /// The state id is outside the dense state range
    InvalidStateId {
        /// The offending state id
        state: usize,
    },
    /// The input id is outside both the continuous and switching ranges,
    /// or belongs to a different mode than the queried one
    InvalidInputId {
        /// The offending input id
        input: usize,
    },
    /// The augmented state is not part of the automaton
    UnknownAugmentedState {
        /// The resolved but absent augmented state
        state: AugmentedState,
    },
    /// A concrete point lies outside the mode's gridded state domain
    AbstractStateNotFound {
        /// Mode whose grid was queried
        mode: usize,
    },
    /// A time value lies outside the mode's clock grid
    TimeIndexNotFound {
        /// Mode whose clock was queried
        mode: usize,
    },
}

impl fmt::Display for ModelQueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelQueryError::InvalidModeId { mode } => {
                write!(f, "No mode with id {mode} in the model")
            }
            ModelQueryError::InvalidStateId { state } => {
                write!(f, "No state with id {state} in the model")
            }
            ModelQueryError::InvalidInputId { input } => {
                write!(f, "Input id {input} is not valid for this query")
            }
            ModelQueryError::UnknownAugmentedState { state } => {
                write!(f, "Augmented state {state} is not part of the automaton")
            }
            ModelQueryError::AbstractStateNotFound { mode } => {
                write!(f, "The point lies outside the state grid of mode {mode}")
            }
            ModelQueryError::TimeIndexNotFound { mode } => {
                write!(f, "The time value lies outside the clock grid of mode {mode}")
            }
        }
    }
}

impl error::Error for ModelQueryError {}
