//! Factory methods for building a valid [`HybridAutomaton`]
//!
//! This module contains the builder [`HybridAutomatonBuilder`] for a
//! [`HybridAutomaton`]. The builder assigns contiguous mode ids, checks
//! that every switching transition connects declared modes, and checks that
//! every guard ranges over the augmented (state x clock) space of its
//! source mode.

use std::error;
use std::fmt;

use log::warn;

use crate::geometry::GuardSet;
use crate::maps::ResetMap;
use crate::{HybridAutomaton, Mode, ModeDynamics, SwitchingTransition};

/// Builder for constructing a [`HybridAutomaton`]
///
/// Modes must be added before the transitions that connect them; each call
/// to [`HybridAutomatonBuilder::with_mode`] assigns the next free mode id,
/// starting from 1.
///
/// # Example
///
/// ```
/// use thyme_hybrid_automaton::builder::HybridAutomatonBuilder;
/// use thyme_hybrid_automaton::geometry::{AxisBox, GuardSet};
/// use thyme_hybrid_automaton::maps::{ResetMap, VectorField};
/// use thyme_hybrid_automaton::ModeDynamics;
///
/// let dynamics = ModeDynamics::new(
///     AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
///     AxisBox::from_intervals([(-1.0, 1.0)]).unwrap(),
///     VectorField::new(|_x, u| u.clone()),
/// )
/// .unwrap();
///
/// let ha = HybridAutomatonBuilder::new("thermostat")
///     .with_mode(dynamics.clone(), 1.0).unwrap()
///     .with_mode(dynamics, 1.0).unwrap()
///     .with_transition(
///         1,
///         1,
///         2,
///         GuardSet::Box(AxisBox::from_intervals([(0.5, 1.0), (0.0, 1.0)]).unwrap()),
///         ResetMap::identity(),
///     ).unwrap()
///     .build().unwrap();
///
/// assert_eq!(ha.n_modes(), 2);
/// assert_eq!(ha.n_transitions(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct HybridAutomatonBuilder {
    ha: HybridAutomaton,
}

impl HybridAutomatonBuilder {
    /// Create a new hybrid automaton builder
    pub fn new(name: impl ToString) -> Self {
        HybridAutomatonBuilder {
            ha: HybridAutomaton {
                name: name.to_string(),
                modes: Vec::new(),
                transitions: Vec::new(),
            },
        }
    }

    /// Number of modes added so far
    pub fn n_modes(&self) -> usize {
        self.ha.modes.len()
    }

    /// Check whether a mode with the given id has been added
    pub fn has_mode(&self, id: usize) -> bool {
        id >= 1 && id <= self.ha.modes.len()
    }

    /// Add a mode with the next free id
    ///
    /// A clock horizon of zero declares a frozen clock for the mode;
    /// negative horizons are rejected.
    pub fn with_mode(
        mut self,
        dynamics: ModeDynamics,
        clock_horizon: f64,
    ) -> Result<Self, BuilderError> {
        let id = self.ha.modes.len() + 1;

        if clock_horizon < 0.0 {
            return Err(BuilderError::NegativeClockHorizon {
                mode: id,
                horizon: clock_horizon,
            });
        }

        self.ha.modes.push(Mode {
            id,
            dynamics,
            clock_horizon,
        });
        Ok(self)
    }

    /// Add a switching transition between two already declared modes
    ///
    /// The transition id must be unique; the guard must range over the
    /// augmented (state x clock) space of the source mode.
    pub fn with_transition(
        mut self,
        id: u32,
        source: usize,
        target: usize,
        guard: GuardSet,
        reset: ResetMap,
    ) -> Result<Self, BuilderError> {
        if self.ha.transitions.iter().any(|t| t.id == id) {
            return Err(BuilderError::DuplicateTransitionId { id });
        }

        if !self.has_mode(source) {
            return Err(BuilderError::UnknownSourceMode {
                transition: id,
                mode: source,
            });
        }

        if !self.has_mode(target) {
            return Err(BuilderError::UnknownTargetMode {
                transition: id,
                mode: target,
            });
        }

        let expected = self.ha.modes[source - 1].dynamics.augmented_dim();
        if guard.dim() != expected {
            return Err(BuilderError::GuardDimensionMismatch {
                transition: id,
                expected,
                got: guard.dim(),
            });
        }

        self.ha.transitions.push(SwitchingTransition {
            id,
            source,
            target,
            guard,
            reset,
        });
        Ok(self)
    }

    /// Finish the construction of the hybrid automaton
    pub fn build(self) -> Result<HybridAutomaton, BuilderError> {
        if self.ha.modes.is_empty() {
            return Err(BuilderError::EmptyAutomaton);
        }

        for mode in &self.ha.modes {
            if self.ha.transitions.iter().all(|t| t.source != mode.id) && self.ha.modes.len() > 1 {
                warn!(
                    "Mode {} of automaton {} has no outgoing switching transition",
                    mode.id, self.ha.name
                );
            }
        }

        Ok(self.ha)
    }
}

/// Errors that can occur while building a [`HybridAutomaton`]
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderError {
    /// The automaton has no modes
    EmptyAutomaton,
    /// A mode was declared with a negative clock horizon
    NegativeClockHorizon {
        /// Id the mode would have received
        mode: usize,
        /// The rejected horizon
        horizon: f64,
    },
    /// A transition id was used twice
    DuplicateTransitionId {
        /// The duplicated id
        id: u32,
    },
    /// A transition references an undeclared source mode
    UnknownSourceMode {
        /// Id of the offending transition
        transition: u32,
        /// The undeclared mode id
        mode: usize,
    },
    /// A transition references an undeclared target mode
    UnknownTargetMode {
        /// Id of the offending transition
        transition: u32,
        /// The undeclared mode id
        mode: usize,
    },
    /// A guard does not range over the source mode's augmented space
    GuardDimensionMismatch {
        /// Id of the offending transition
        transition: u32,
        /// Augmented dimension of the source mode
        expected: usize,
        /// Dimension of the supplied guard
        got: usize,
    },
}

impl fmt::Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuilderError::EmptyAutomaton => {
                write!(f, "A hybrid automaton must have at least one mode")
            }
            BuilderError::NegativeClockHorizon { mode, horizon } => {
                write!(
                    f,
                    "Mode {mode} declares a negative clock horizon {horizon}"
                )
            }
            BuilderError::DuplicateTransitionId { id } => {
                write!(f, "Transition id {id} is already in use")
            }
            BuilderError::UnknownSourceMode { transition, mode } => {
                write!(
                    f,
                    "Transition {transition} starts in undeclared mode {mode}"
                )
            }
            BuilderError::UnknownTargetMode { transition, mode } => {
                write!(
                    f,
                    "Transition {transition} ends in undeclared mode {mode}"
                )
            }
            BuilderError::GuardDimensionMismatch {
                transition,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Guard of transition {transition} has dimension {got}, \
                     but the source mode's augmented space has dimension {expected}"
                )
            }
        }
    }
}

impl error::Error for BuilderError {}

#[cfg(test)]
mod tests {
    use nalgebra::{DMatrix, DVector};

    use crate::geometry::AxisBox;
    use crate::maps::VectorField;

    use super::*;

    fn dynamics_1d() -> ModeDynamics {
        ModeDynamics::new(
            AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
            AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
            VectorField::zero(1),
        )
        .unwrap()
    }

    fn box_guard_2d() -> GuardSet {
        GuardSet::Box(AxisBox::from_intervals([(0.0, 1.0), (0.0, 1.0)]).unwrap())
    }

    #[test]
    fn test_mode_ids_are_contiguous() {
        let builder = HybridAutomatonBuilder::new("t")
            .with_mode(dynamics_1d(), 0.0)
            .unwrap()
            .with_mode(dynamics_1d(), 1.0)
            .unwrap();

        assert!(builder.has_mode(1));
        assert!(builder.has_mode(2));
        assert!(!builder.has_mode(0));
        assert!(!builder.has_mode(3));

        let ha = builder.build().unwrap();
        assert_eq!(
            ha.modes().map(|m| m.id()).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_rejects_negative_horizon() {
        let err = HybridAutomatonBuilder::new("t").with_mode(dynamics_1d(), -1.0);
        assert_eq!(
            err.unwrap_err(),
            BuilderError::NegativeClockHorizon {
                mode: 1,
                horizon: -1.0
            }
        );
    }

    #[test]
    fn test_rejects_empty_automaton() {
        assert_eq!(
            HybridAutomatonBuilder::new("t").build().unwrap_err(),
            BuilderError::EmptyAutomaton
        );
    }

    #[test]
    fn test_rejects_duplicate_transition_id() {
        let err = HybridAutomatonBuilder::new("t")
            .with_mode(dynamics_1d(), 0.0)
            .unwrap()
            .with_transition(1, 1, 1, box_guard_2d(), ResetMap::identity())
            .unwrap()
            .with_transition(1, 1, 1, box_guard_2d(), ResetMap::identity());

        assert_eq!(
            err.unwrap_err(),
            BuilderError::DuplicateTransitionId { id: 1 }
        );
    }

    #[test]
    fn test_rejects_unknown_modes() {
        let err = HybridAutomatonBuilder::new("t")
            .with_mode(dynamics_1d(), 0.0)
            .unwrap()
            .with_transition(1, 2, 1, box_guard_2d(), ResetMap::identity());
        assert_eq!(
            err.unwrap_err(),
            BuilderError::UnknownSourceMode {
                transition: 1,
                mode: 2
            }
        );

        let err = HybridAutomatonBuilder::new("t")
            .with_mode(dynamics_1d(), 0.0)
            .unwrap()
            .with_transition(1, 1, 5, box_guard_2d(), ResetMap::identity());
        assert_eq!(
            err.unwrap_err(),
            BuilderError::UnknownTargetMode {
                transition: 1,
                mode: 5
            }
        );
    }

    #[test]
    fn test_rejects_guard_dimension_mismatch() {
        // spatial-only guard, the clock dimension is missing
        let spatial_guard = GuardSet::Box(AxisBox::from_intervals([(0.0, 1.0)]).unwrap());

        let err = HybridAutomatonBuilder::new("t")
            .with_mode(dynamics_1d(), 0.0)
            .unwrap()
            .with_transition(3, 1, 1, spatial_guard, ResetMap::identity());

        assert_eq!(
            err.unwrap_err(),
            BuilderError::GuardDimensionMismatch {
                transition: 3,
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn test_polyhedral_guard_dimension_is_checked() {
        // a polyhedron over the augmented space passes the dimension check
        let poly = GuardSet::polyhedron(
            DMatrix::from_row_slice(1, 2, &[1.0, 0.0]),
            DVector::from_vec(vec![0.5]),
        )
        .unwrap();

        let ha = HybridAutomatonBuilder::new("t")
            .with_mode(dynamics_1d(), 0.0)
            .unwrap()
            .with_transition(1, 1, 1, poly, ResetMap::identity())
            .unwrap()
            .build()
            .unwrap();

        assert!(ha.transition(1).unwrap().guard().as_box().is_none());
    }
}
