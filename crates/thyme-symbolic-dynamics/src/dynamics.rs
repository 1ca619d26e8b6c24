//! Finite symbolic dynamics of a single mode
//!
//! A [`SymbolicDynamics`] holds the state and input grids of a mode
//! together with the finite transition relation computed by an abstractor.
//! The relation is purely set-valued; no determinism is assumed.

use std::fmt;

use nalgebra::DVector;
use thyme_hybrid_automaton::geometry::AxisBox;

use crate::abstractor::AbstractionError;
use crate::grid::{SetSemantics, UniformGrid};

/// A single spatial transition `source --input--> target`
///
/// All three components are 1-based symbols of the owning mode's grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolicTransition {
    target: usize,
    source: usize,
    input: usize,
}

impl SymbolicTransition {
    /// Create a transition from its target, source and local input symbol
    pub fn new(target: usize, source: usize, input: usize) -> Self {
        SymbolicTransition {
            target,
            source,
            input,
        }
    }

    /// Target state symbol
    pub fn target(&self) -> usize {
        self.target
    }

    /// Source state symbol
    pub fn source(&self) -> usize {
        self.source
    }

    /// Local input symbol
    pub fn input(&self) -> usize {
        self.input
    }
}

impl fmt::Display for SymbolicTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --{}--> {}", self.source, self.input, self.target)
    }
}

/// The discretized dynamics of one mode
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicDynamics {
    state_grid: UniformGrid,
    input_grid: UniformGrid,
    transitions: Vec<SymbolicTransition>,
}

impl SymbolicDynamics {
    /// Create symbolic dynamics from grids and a transition relation
    ///
    /// Every transition must refer to valid symbols of the two grids.
    pub fn new(
        state_grid: UniformGrid,
        input_grid: UniformGrid,
        transitions: Vec<SymbolicTransition>,
    ) -> Result<Self, AbstractionError> {
        let n_states = state_grid.n_cells();
        let n_inputs = input_grid.n_cells();

        for t in &transitions {
            for symbol in [t.source, t.target] {
                if symbol == 0 || symbol > n_states {
                    return Err(AbstractionError::StateSymbolOutOfRange { symbol, n_states });
                }
            }
            if t.input == 0 || t.input > n_inputs {
                return Err(AbstractionError::InputSymbolOutOfRange {
                    symbol: t.input,
                    n_inputs,
                });
            }
        }

        Ok(SymbolicDynamics {
            state_grid,
            input_grid,
            transitions,
        })
    }

    /// Number of state symbols
    pub fn n_states(&self) -> usize {
        self.state_grid.n_cells()
    }

    /// Number of local input symbols
    pub fn n_inputs(&self) -> usize {
        self.input_grid.n_cells()
    }

    /// Number of spatial transitions
    pub fn n_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// All state symbols in ascending order
    pub fn states(&self) -> impl Iterator<Item = usize> {
        self.state_grid.symbols()
    }

    /// All local input symbols in ascending order
    pub fn inputs(&self) -> impl Iterator<Item = usize> {
        self.input_grid.symbols()
    }

    /// The spatial transitions in the order the abstractor produced them
    pub fn transitions(&self) -> impl Iterator<Item = &SymbolicTransition> {
        self.transitions.iter()
    }

    /// Representative point (cell center) of a state symbol
    pub fn concrete_state(&self, symbol: usize) -> Option<DVector<f64>> {
        self.state_grid.center(symbol)
    }

    /// State symbol whose cell contains the point, if any
    pub fn abstract_state(&self, x: &DVector<f64>) -> Option<usize> {
        self.state_grid.symbol_of(x)
    }

    /// State symbols whose cells relate to the set under the semantics
    pub fn states_in_set(&self, set: &AxisBox, semantics: SetSemantics) -> Vec<usize> {
        self.state_grid.symbols_in_box(set, semantics)
    }

    /// Representative point (cell center) of a local input symbol
    pub fn concrete_input(&self, symbol: usize) -> Option<DVector<f64>> {
        self.input_grid.center(symbol)
    }

    /// Local input symbol whose cell contains the point, if any
    pub fn abstract_input(&self, u: &DVector<f64>) -> Option<usize> {
        self.input_grid.symbol_of(u)
    }

    /// The state grid of the mode
    pub fn state_grid(&self) -> &UniformGrid {
        &self.state_grid
    }

    /// The input grid of the mode
    pub fn input_grid(&self) -> &UniformGrid {
        &self.input_grid
    }
}

impl fmt::Display for SymbolicDynamics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} states, {} inputs, {} transitions",
            self.n_states(),
            self.n_inputs(),
            self.n_transitions()
        )
    }
}
