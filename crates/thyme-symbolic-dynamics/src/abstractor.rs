//! Abstraction of a mode's continuous dynamics into symbolic dynamics
//!
//! The [`ModeAbstractor`] trait is the seam behind which the reachability
//! kernel sits: given a mode's continuous dynamics, discretization
//! parameters and a growth bound, it produces the mode's finite
//! [`SymbolicDynamics`]. Downstream builders only rely on this trait, not
//! on a particular abstraction algorithm.
//!
//! [`GrowthBoundAbstractor`] is the reference implementation. For every
//! (cell, input) pair it propagates the cell center one Euler step along
//! the vector field, inflates the cell radius by the growth bound, and
//! collects every cell the resulting tube overlaps. Pairs whose tube
//! leaves the gridded domain produce no transitions.

use std::error;
use std::fmt;

use log::{debug, info};
use nalgebra::{DMatrix, DVector};
#[cfg(feature = "config_deserialize")]
use serde::Deserialize;
use thyme_hybrid_automaton::geometry::GeometryError;
use thyme_hybrid_automaton::geometry::AxisBox;
use thyme_hybrid_automaton::ModeDynamics;

use crate::dynamics::{SymbolicDynamics, SymbolicTransition};
use crate::grid::{GridError, SetSemantics, UniformGrid};

/// Per-mode discretization parameters
///
/// The state and input steps are per-dimension cell sizes; the time step
/// is both the sampling time of the abstraction and the clock resolution
/// of the mode. A time step of zero freezes the mode's clock.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config_deserialize", derive(Deserialize))]
pub struct DiscretizationParams {
    state_step: Vec<f64>,
    input_step: Vec<f64>,
    time_step: f64,
}

impl DiscretizationParams {
    /// Bundle the discretization parameters of one mode
    pub fn new(state_step: Vec<f64>, input_step: Vec<f64>, time_step: f64) -> Self {
        DiscretizationParams {
            state_step,
            input_step,
            time_step,
        }
    }

    /// Per-dimension cell size of the state grid
    pub fn state_step(&self) -> &[f64] {
        &self.state_step
    }

    /// Per-dimension cell size of the input grid
    pub fn input_step(&self) -> &[f64] {
        &self.input_step
    }

    /// Sampling time of the abstraction
    pub fn time_step(&self) -> f64 {
        self.time_step
    }
}

/// A bound on the Jacobian of a mode's dynamics
///
/// Used to over-approximate how a cell-sized initial set grows along the
/// flow over one time step.
#[derive(Debug, Clone, PartialEq)]
pub enum GrowthBound {
    /// A single Lipschitz-style constant applied to every dimension
    Scalar(f64),
    /// A componentwise Jacobian bound matrix
    Matrix(DMatrix<f64>),
}

impl GrowthBound {
    /// Inflate an initial radius to the reachable-tube radius after `dt`
    pub fn inflate(&self, radius: &DVector<f64>, dt: f64) -> Result<DVector<f64>, AbstractionError> {
        match self {
            GrowthBound::Scalar(l) => Ok(radius * (l * dt).exp()),
            GrowthBound::Matrix(m) => {
                if m.nrows() != m.ncols() || m.nrows() != radius.len() {
                    return Err(AbstractionError::GrowthBoundDimensionMismatch {
                        expected: radius.len(),
                        got: m.nrows().max(m.ncols()),
                    });
                }
                Ok((m * dt).exp() * radius)
            }
        }
    }
}

/// Computes the finite symbolic dynamics of a single mode
///
/// Implementations are free to use any sound reachability relation; the
/// builders treat the produced relation purely set-theoretically.
pub trait ModeAbstractor {
    /// Abstract the continuous dynamics of mode `mode_id`
    fn abstract_mode(
        &self,
        mode_id: usize,
        dynamics: &ModeDynamics,
        params: &DiscretizationParams,
        growth: &GrowthBound,
    ) -> Result<SymbolicDynamics, AbstractionError>;
}

/// Reference growth-bound over-approximation abstractor
#[derive(Debug, Clone, Copy, Default)]
pub struct GrowthBoundAbstractor;

impl ModeAbstractor for GrowthBoundAbstractor {
    fn abstract_mode(
        &self,
        mode_id: usize,
        dynamics: &ModeDynamics,
        params: &DiscretizationParams,
        growth: &GrowthBound,
    ) -> Result<SymbolicDynamics, AbstractionError> {
        let state_grid = UniformGrid::from_domain(
            dynamics.state_domain(),
            &DVector::from_vec(params.state_step.clone()),
        )?;
        let input_grid = UniformGrid::from_domain(
            dynamics.input_domain(),
            &DVector::from_vec(params.input_step.clone()),
        )?;

        let dt = params.time_step.max(0.0);
        let bounds = state_grid.bounds();
        let radius = state_grid.step() / 2.0;
        let tube_radius = growth.inflate(&radius, dt)?;

        let mut transitions = Vec::new();
        let mut dropped = 0usize;
        for source in state_grid.symbols() {
            let x = state_grid
                .center(source)
                .unwrap_or_else(|| panic!("No cell center for state symbol {source}"));

            for input in input_grid.symbols() {
                let u = input_grid
                    .center(input)
                    .unwrap_or_else(|| panic!("No cell center for input symbol {input}"));

                let drift = dynamics.vector_field().eval(&x, &u);
                if drift.len() != dynamics.state_dim() {
                    return Err(AbstractionError::VectorFieldDimensionMismatch {
                        mode: mode_id,
                        expected: dynamics.state_dim(),
                        got: drift.len(),
                    });
                }

                let center = &x + drift * dt;
                let tube = AxisBox::new(&center - &tube_radius, &center + &tube_radius)?;

                if !bounds.contains_box(&tube) {
                    // the over-approximation leaves the domain, the pair
                    // gets no transitions
                    dropped += 1;
                    continue;
                }

                for target in state_grid.symbols_in_box(&tube, SetSemantics::Outer) {
                    transitions.push(SymbolicTransition::new(target, source, input));
                }
            }
        }

        if dropped > 0 {
            debug!(
                "Mode {mode_id}: {dropped} state-input pairs leave the domain"
            );
        }
        info!(
            "Mode {mode_id}: abstracted into {} states, {} inputs, {} transitions",
            state_grid.n_cells(),
            input_grid.n_cells(),
            transitions.len()
        );

        SymbolicDynamics::new(state_grid, input_grid, transitions)
    }
}

/// Errors that can occur while abstracting a mode
#[derive(Debug, Clone, PartialEq)]
pub enum AbstractionError {
    /// A grid could not be constructed
    Grid(GridError),
    /// A reachable tube is not a valid box
    Geometry(GeometryError),
    /// A transition refers to a state symbol outside the grid
    StateSymbolOutOfRange {
        /// The offending symbol
        symbol: usize,
        /// Number of state symbols of the mode
        n_states: usize,
    },
    /// A transition refers to an input symbol outside the grid
    InputSymbolOutOfRange {
        /// The offending symbol
        symbol: usize,
        /// Number of input symbols of the mode
        n_inputs: usize,
    },
    /// The growth bound does not match the state dimension
    GrowthBoundDimensionMismatch {
        /// State dimension of the mode
        expected: usize,
        /// Dimension of the supplied bound
        got: usize,
    },
    /// The vector field returned a derivative of the wrong dimension
    VectorFieldDimensionMismatch {
        /// Mode being abstracted
        mode: usize,
        /// State dimension of the mode
        expected: usize,
        /// Dimension the vector field returned
        got: usize,
    },
}

impl fmt::Display for AbstractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbstractionError::Grid(e) => write!(f, "Failed to construct a grid: {e}"),
            AbstractionError::Geometry(e) => {
                write!(f, "Failed to construct a reachable tube: {e}")
            }
            AbstractionError::StateSymbolOutOfRange { symbol, n_states } => {
                write!(
                    f,
                    "State symbol {symbol} is outside the grid with {n_states} states"
                )
            }
            AbstractionError::InputSymbolOutOfRange { symbol, n_inputs } => {
                write!(
                    f,
                    "Input symbol {symbol} is outside the grid with {n_inputs} inputs"
                )
            }
            AbstractionError::GrowthBoundDimensionMismatch { expected, got } => {
                write!(
                    f,
                    "Growth bound has dimension {got}, state space has dimension {expected}"
                )
            }
            AbstractionError::VectorFieldDimensionMismatch {
                mode,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Vector field of mode {mode} returned a derivative of dimension {got}, \
                     expected {expected}"
                )
            }
        }
    }
}

impl error::Error for AbstractionError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            AbstractionError::Grid(e) => Some(e),
            AbstractionError::Geometry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridError> for AbstractionError {
    fn from(value: GridError) -> Self {
        AbstractionError::Grid(value)
    }
}

impl From<GeometryError> for AbstractionError {
    fn from(value: GeometryError) -> Self {
        AbstractionError::Geometry(value)
    }
}
