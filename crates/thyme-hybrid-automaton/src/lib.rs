//! A library to define and interact with timed hybrid automata
//!
//! A timed hybrid automaton is a finite set of modes, each carrying its own
//! continuous dynamics over a bounded state domain and an explicit clock,
//! together with guarded switching transitions between modes. A switching
//! transition fires inside its guard, a set over the augmented
//! (state x clock) space of the source mode, and relocates the augmented
//! state through a reset map into the target mode.
//!
//! This crate contains the data model only:
//! - [`Mode`] and [`ModeDynamics`]: a mode's continuous dynamics, domains
//!   and clock horizon
//! - [`SwitchingTransition`]: a guarded, resetting edge between two modes
//! - [`HybridAutomaton`]: the automaton itself, produced by the validating
//!   [`builder::HybridAutomatonBuilder`]
//!
//! Discretization of the modes and construction of symbolic models on top
//! of this model live in separate crates.

use std::fmt;

use thyme_display_utils::{indent_lines, join_display};

pub mod builder;
pub mod geometry;
pub mod maps;

use geometry::{AxisBox, GuardSet};
use maps::{ResetMap, VectorField};

/// Continuous dynamics of a single mode
///
/// The spatial state ranges over `state_domain` and the continuous input
/// over `input_domain`; both domains are bounded axis-aligned boxes. The
/// clock is not part of the spatial state.
#[derive(Debug, Clone)]
pub struct ModeDynamics {
    state_domain: AxisBox,
    input_domain: AxisBox,
    vector_field: VectorField,
}

impl ModeDynamics {
    /// Create the dynamics of a mode from its domains and vector field
    ///
    /// Both domains must have at least one dimension.
    pub fn new(
        state_domain: AxisBox,
        input_domain: AxisBox,
        vector_field: VectorField,
    ) -> Result<Self, geometry::GeometryError> {
        if state_domain.dim() == 0 || input_domain.dim() == 0 {
            return Err(geometry::GeometryError::ZeroDimensional);
        }

        Ok(ModeDynamics {
            state_domain,
            input_domain,
            vector_field,
        })
    }

    /// Number of spatial state dimensions
    pub fn state_dim(&self) -> usize {
        self.state_domain.dim()
    }

    /// Number of continuous input dimensions
    pub fn input_dim(&self) -> usize {
        self.input_domain.dim()
    }

    /// Dimension of the augmented (state x clock) space
    pub fn augmented_dim(&self) -> usize {
        self.state_dim() + 1
    }

    /// Bounded domain of the spatial state
    pub fn state_domain(&self) -> &AxisBox {
        &self.state_domain
    }

    /// Bounded domain of the continuous input
    pub fn input_domain(&self) -> &AxisBox {
        &self.input_domain
    }

    /// Right-hand side of the continuous dynamics
    pub fn vector_field(&self) -> &VectorField {
        &self.vector_field
    }
}

/// A discrete location of a timed hybrid automaton
///
/// Mode ids are contiguous starting from 1, in the order in which modes
/// were added to the builder.
#[derive(Debug, Clone)]
pub struct Mode {
    id: usize,
    dynamics: ModeDynamics,
    clock_horizon: f64,
}

impl Mode {
    /// Id of the mode
    pub fn id(&self) -> usize {
        self.id
    }

    /// Continuous dynamics of the mode
    pub fn dynamics(&self) -> &ModeDynamics {
        &self.dynamics
    }

    /// Upper end of the mode's clock range
    ///
    /// A horizon of zero declares a frozen clock.
    pub fn clock_horizon(&self) -> f64 {
        self.clock_horizon
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = indent_lines(format!(
            "state {};\ninput {};\nclock horizon {};",
            self.dynamics.state_domain, self.dynamics.input_domain, self.clock_horizon
        ));
        write!(f, "mode {} {{\n{}\n}}", self.id, body)
    }
}

/// A guarded switching transition between two modes
///
/// The guard ranges over the augmented (state x clock) space of the source
/// mode; the reset map relocates augmented vectors into the target mode's
/// augmented space.
#[derive(Debug, Clone)]
pub struct SwitchingTransition {
    id: u32,
    source: usize,
    target: usize,
    guard: GuardSet,
    reset: ResetMap,
}

impl SwitchingTransition {
    /// Id assigned to the transition when it was added to the builder
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Id of the source mode
    pub fn source(&self) -> usize {
        self.source
    }

    /// Id of the target mode
    pub fn target(&self) -> usize {
        self.target
    }

    /// Guard set enabling the transition
    pub fn guard(&self) -> &GuardSet {
        &self.guard
    }

    /// Reset map applied when the transition fires
    pub fn reset(&self) -> &ResetMap {
        &self.reset
    }
}

impl fmt::Display for SwitchingTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}\n{}",
            self.id,
            self.source,
            self.target,
            indent_lines(format!("when ( {} )", self.guard))
        )
    }
}

/// A timed hybrid automaton
///
/// Construct instances through the [`builder::HybridAutomatonBuilder`],
/// which validates mode ids, transition endpoints and guard dimensions.
#[derive(Debug, Clone)]
pub struct HybridAutomaton {
    name: String,
    modes: Vec<Mode>,
    transitions: Vec<SwitchingTransition>,
}

impl HybridAutomaton {
    /// Name of the automaton
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of modes
    pub fn n_modes(&self) -> usize {
        self.modes.len()
    }

    /// Modes in ascending id order
    pub fn modes(&self) -> impl Iterator<Item = &Mode> {
        self.modes.iter()
    }

    /// Look up a mode by id
    pub fn mode(&self, id: usize) -> Option<&Mode> {
        // ids are contiguous from 1
        self.modes.get(id.checked_sub(1)?)
    }

    /// Number of switching transitions
    pub fn n_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// Switching transitions in the order they were declared
    ///
    /// This order is the canonical enumeration order used when transitions
    /// are numbered downstream.
    pub fn transitions(&self) -> impl Iterator<Item = &SwitchingTransition> {
        self.transitions.iter()
    }

    /// Look up a switching transition by id
    pub fn transition(&self, id: u32) -> Option<&SwitchingTransition> {
        self.transitions.iter().find(|t| t.id == id)
    }

    /// Transitions leaving the given mode
    pub fn outgoing_transitions(&self, mode: usize) -> impl Iterator<Item = &SwitchingTransition> {
        self.transitions.iter().filter(move |t| t.source == mode)
    }

    /// Transitions entering the given mode
    pub fn incoming_transitions(&self, mode: usize) -> impl Iterator<Item = &SwitchingTransition> {
        self.transitions.iter().filter(move |t| t.target == mode)
    }
}

impl fmt::Display for HybridAutomaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modes = format!(
            "modes ({}) {{\n{}}}",
            self.modes.len(),
            indent_lines(join_display(self.modes.iter(), "\n") + "\n")
        );

        let transitions = format!(
            "transitions ({}) {{\n{}}}",
            self.transitions.len(),
            indent_lines(join_display(self.transitions.iter(), "\n") + "\n")
        );

        write!(
            f,
            "hybridAutomaton {} {{\n{}\n}}\n",
            self.name,
            indent_lines(format!("{modes}\n\n{transitions}"))
        )
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::DVector;

    use super::builder::HybridAutomatonBuilder;
    use super::*;

    fn unit_dynamics() -> ModeDynamics {
        ModeDynamics::new(
            AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
            AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
            VectorField::zero(1),
        )
        .unwrap()
    }

    #[test]
    fn test_mode_dynamics_rejects_zero_dimensions() {
        let empty = AxisBox::from_intervals([]).unwrap();
        let unit = AxisBox::from_intervals([(0.0, 1.0)]).unwrap();

        assert_eq!(
            ModeDynamics::new(empty.clone(), unit.clone(), VectorField::zero(0)).unwrap_err(),
            geometry::GeometryError::ZeroDimensional
        );
        assert_eq!(
            ModeDynamics::new(unit, empty, VectorField::zero(1)).unwrap_err(),
            geometry::GeometryError::ZeroDimensional
        );
    }

    #[test]
    fn test_automaton_accessors() {
        let guard = GuardSet::Box(
            AxisBox::from_intervals([(0.4, 1.0), (0.0, 0.0)]).unwrap(),
        );

        let ha = HybridAutomatonBuilder::new("test_ha")
            .with_mode(unit_dynamics(), 0.0)
            .unwrap()
            .with_mode(unit_dynamics(), 2.0)
            .unwrap()
            .with_transition(1, 1, 2, guard, ResetMap::identity())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(ha.name(), "test_ha");
        assert_eq!(ha.n_modes(), 2);
        assert_eq!(ha.n_transitions(), 1);

        assert_eq!(ha.mode(1).unwrap().id(), 1);
        assert_eq!(ha.mode(2).unwrap().clock_horizon(), 2.0);
        assert!(ha.mode(0).is_none());
        assert!(ha.mode(3).is_none());

        let t = ha.transition(1).unwrap();
        assert_eq!((t.source(), t.target()), (1, 2));

        assert_eq!(ha.outgoing_transitions(1).count(), 1);
        assert_eq!(ha.outgoing_transitions(2).count(), 0);
        assert_eq!(ha.incoming_transitions(2).count(), 1);
        assert_eq!(ha.incoming_transitions(1).count(), 0);
    }

    #[test]
    fn test_augmented_dim() {
        let dyn2 = ModeDynamics::new(
            AxisBox::from_intervals([(0.0, 1.0), (0.0, 1.0)]).unwrap(),
            AxisBox::from_intervals([(-1.0, 1.0)]).unwrap(),
            VectorField::zero(2),
        )
        .unwrap();

        assert_eq!(dyn2.state_dim(), 2);
        assert_eq!(dyn2.input_dim(), 1);
        assert_eq!(dyn2.augmented_dim(), 3);
    }

    #[test]
    fn test_display_automaton() {
        let guard = GuardSet::Box(
            AxisBox::from_intervals([(0.4, 1.0), (0.0, 0.0)]).unwrap(),
        );

        let ha = HybridAutomatonBuilder::new("demo")
            .with_mode(unit_dynamics(), 0.0)
            .unwrap()
            .with_mode(unit_dynamics(), 0.0)
            .unwrap()
            .with_transition(7, 1, 2, guard, ResetMap::identity())
            .unwrap()
            .build()
            .unwrap();

        let rendered = ha.to_string();
        assert!(rendered.starts_with("hybridAutomaton demo {"));
        assert!(rendered.contains("modes (2) {"));
        assert!(rendered.contains("mode 1 {"));
        assert!(rendered.contains("clock horizon 0;"));
        assert!(rendered.contains("transitions (1) {"));
        assert!(rendered.contains("7: 1 -> 2"));
        assert!(rendered.contains("when ( [0.4, 1] x [0, 0] )"));

        let x = DVector::from_vec(vec![0.5, 0.0]);
        assert!(ha.transition(7).unwrap().guard().as_box().unwrap().contains_point(&x));
    }
}
