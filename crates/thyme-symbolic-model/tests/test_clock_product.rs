//! The intra-mode product of spatial transitions with the clock advance,
//! exercised through a hand-built abstraction.

use std::collections::BTreeSet;

use nalgebra::DVector;
use thyme_hybrid_automaton::builder::HybridAutomatonBuilder;
use thyme_hybrid_automaton::geometry::AxisBox;
use thyme_hybrid_automaton::maps::VectorField;
use thyme_hybrid_automaton::{HybridAutomaton, ModeDynamics};
use thyme_symbolic_dynamics::{
    AbstractionError, DiscretizationParams, GrowthBound, ModeAbstractor, SymbolicDynamics,
    SymbolicTransition, UniformGrid,
};
use thyme_symbolic_model::{AugmentedState, ModelQueryError, TimedHybridModelBuilder};

/// Answers every mode with the same prebuilt symbolic dynamics
struct FixedAbstractor {
    dynamics: SymbolicDynamics,
}

impl FixedAbstractor {
    /// Two spatial cells, one input, and the single transition `1 -> 2`
    fn single_step() -> Self {
        let state_grid = UniformGrid::from_domain(
            &AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
            &DVector::from_vec(vec![0.5]),
        )
        .unwrap();
        let input_grid = UniformGrid::from_domain(
            &AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
            &DVector::from_vec(vec![1.0]),
        )
        .unwrap();

        FixedAbstractor {
            dynamics: SymbolicDynamics::new(
                state_grid,
                input_grid,
                vec![SymbolicTransition::new(2, 1, 1)],
            )
            .unwrap(),
        }
    }
}

impl ModeAbstractor for FixedAbstractor {
    fn abstract_mode(
        &self,
        _mode_id: usize,
        _dynamics: &ModeDynamics,
        _params: &DiscretizationParams,
        _growth: &GrowthBound,
    ) -> Result<SymbolicDynamics, AbstractionError> {
        Ok(self.dynamics.clone())
    }
}

/// One mode over `[0, 1]` whose clock runs `0, 1, 2`
fn single_mode_automaton() -> HybridAutomaton {
    let dynamics = ModeDynamics::new(
        AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
        AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
        VectorField::zero(1),
    )
    .unwrap();

    HybridAutomatonBuilder::new("clocked")
        .with_mode(dynamics, 2.0)
        .unwrap()
        .build()
        .unwrap()
}

fn build_model(ha: &HybridAutomaton) -> thyme_symbolic_model::TimedHybridModel {
    TimedHybridModelBuilder::new(
        ha,
        FixedAbstractor::single_step(),
        vec![DiscretizationParams::new(vec![0.5], vec![1.0], 1.0)],
        vec![GrowthBound::Scalar(0.0)],
    )
    .build()
    .unwrap()
}

#[test]
fn test_one_temporal_copy_per_clock_step() {
    let ha = single_mode_automaton();
    let model = build_model(&ha);

    // the single spatial transition is lifted once per non-terminal index
    let triples: BTreeSet<_> = model.transition_triples().collect();
    let expected: BTreeSet<_> = [
        (
            model.state_id(&AugmentedState::new(2, 2, 1)).unwrap(),
            model.state_id(&AugmentedState::new(1, 1, 1)).unwrap(),
            1,
        ),
        (
            model.state_id(&AugmentedState::new(2, 3, 1)).unwrap(),
            model.state_id(&AugmentedState::new(1, 2, 1)).unwrap(),
            1,
        ),
    ]
    .into_iter()
    .collect();

    assert_eq!(triples, expected);
    assert_eq!(model.n_transitions(), 2);
}

#[test]
fn test_terminal_index_has_no_outgoing_transitions() {
    let ha = single_mode_automaton();
    let model = build_model(&ha);

    for (_, source, _) in model.transition_triples() {
        let aug = model.augmented_state(source).unwrap();
        assert!(aug.time() < 3);
    }
}

#[test]
fn test_only_reached_augmented_states_are_numbered() {
    let ha = single_mode_automaton();
    let model = build_model(&ha);

    // (1,1), (1,2), (2,2), (2,3) occur in triples; (1,3), (2,1) do not
    assert_eq!(model.n_states(), 4);
    assert!(model.state_id(&AugmentedState::new(1, 3, 1)).is_none());
    assert!(model.state_id(&AugmentedState::new(2, 1, 1)).is_none());
}

#[test]
fn test_abstract_state_misses() {
    let ha = single_mode_automaton();
    let model = build_model(&ha);

    // a quantizable point whose augmented state was never reached
    let err = model
        .abstract_state(&DVector::from_vec(vec![0.25]), 2.0, 1)
        .unwrap_err();
    assert_eq!(
        err,
        ModelQueryError::UnknownAugmentedState {
            state: AugmentedState::new(1, 3, 1)
        }
    );

    // outside the state grid
    let err = model
        .abstract_state(&DVector::from_vec(vec![7.0]), 0.0, 1)
        .unwrap_err();
    assert_eq!(err, ModelQueryError::AbstractStateNotFound { mode: 1 });

    // below the clock grid
    let err = model
        .abstract_state(&DVector::from_vec(vec![0.25]), -1.0, 1)
        .unwrap_err();
    assert_eq!(err, ModelQueryError::TimeIndexNotFound { mode: 1 });

    // unknown mode
    let err = model
        .abstract_state(&DVector::from_vec(vec![0.25]), 0.0, 2)
        .unwrap_err();
    assert_eq!(err, ModelQueryError::InvalidModeId { mode: 2 });
}

#[test]
fn test_round_trip_through_concrete_state() {
    let ha = single_mode_automaton();
    let model = build_model(&ha);

    for s in model.states() {
        let (x, time, mode) = model.concrete_state(s).unwrap();
        assert_eq!(model.abstract_state(&x, time, mode).unwrap(), s);
    }
}
