//! Function-valued components of a hybrid automaton
//!
//! Continuous dynamics and reset maps are supplied by the caller as plain
//! closures. [`VectorField`] and [`ResetMap`] wrap them so that modes and
//! transitions stay cloneable and debuggable.

use std::fmt;
use std::sync::Arc;

use nalgebra::DVector;

/// Right-hand side `f(x, u)` of a mode's continuous dynamics
///
/// The closure receives the spatial state and the continuous input and
/// returns the state derivative. The clock dimension is not part of the
/// spatial state; its rate is always one.
#[derive(Clone)]
pub struct VectorField {
    field: Arc<dyn Fn(&DVector<f64>, &DVector<f64>) -> DVector<f64> + Send + Sync>,
}

impl VectorField {
    /// Wrap a closure as a vector field
    pub fn new(
        field: impl Fn(&DVector<f64>, &DVector<f64>) -> DVector<f64> + Send + Sync + 'static,
    ) -> Self {
        VectorField {
            field: Arc::new(field),
        }
    }

    /// A vector field that is zero everywhere
    pub fn zero(state_dim: usize) -> Self {
        VectorField::new(move |_, _| DVector::zeros(state_dim))
    }

    /// Evaluate the vector field at state `x` under input `u`
    pub fn eval(&self, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
        (self.field)(x, u)
    }
}

impl fmt::Debug for VectorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VectorField(..)")
    }
}

/// Relocation of the augmented state at the moment of a mode switch
///
/// The closure receives the augmented vector of the source mode (spatial
/// state followed by the clock value) and returns the augmented vector of
/// the target mode.
#[derive(Clone)]
pub struct ResetMap {
    map: Arc<dyn Fn(&DVector<f64>) -> DVector<f64> + Send + Sync>,
}

impl ResetMap {
    /// Wrap a closure as a reset map
    pub fn new(map: impl Fn(&DVector<f64>) -> DVector<f64> + Send + Sync + 'static) -> Self {
        ResetMap { map: Arc::new(map) }
    }

    /// The reset map that leaves the augmented state unchanged
    pub fn identity() -> Self {
        ResetMap::new(|x: &DVector<f64>| x.clone())
    }

    /// Apply the reset map to an augmented vector
    pub fn apply(&self, x: &DVector<f64>) -> DVector<f64> {
        (self.map)(x)
    }
}

impl fmt::Debug for ResetMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResetMap(..)")
    }
}
