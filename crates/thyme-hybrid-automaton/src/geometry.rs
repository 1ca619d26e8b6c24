//! Axis-aligned geometry for mode domains and switching guards
//!
//! This module defines [`AxisBox`], the axis-aligned box type used for state
//! and input domains as well as for the supported shape of switching guards,
//! and [`GuardSet`], which additionally admits general polyhedral guards that
//! downstream abstraction passes may reject.
//!
//! Guards of a timed hybrid automaton range over the augmented space of a
//! mode, i.e. the spatial state dimensions followed by the clock dimension.
//! [`AxisBox::split_clock`] provides the corresponding projections.

use std::error;
use std::fmt;

use nalgebra::{DMatrix, DVector};
use thyme_display_utils::display_interval_product;

/// Absolute tolerance applied to all containment and intersection checks
pub const ABS_TOL: f64 = 1e-9;

/// An axis-aligned box `[l_1, u_1] x ... x [l_n, u_n]`
#[derive(Debug, Clone, PartialEq)]
pub struct AxisBox {
    lower: DVector<f64>,
    upper: DVector<f64>,
}

impl AxisBox {
    /// Create a box from its lower and upper corner
    ///
    /// Both corners must have the same dimension and every interval must be
    /// nonempty, i.e. `lower[d] <= upper[d]` for all dimensions.
    pub fn new(lower: DVector<f64>, upper: DVector<f64>) -> Result<Self, GeometryError> {
        if lower.len() != upper.len() {
            return Err(GeometryError::DimensionMismatch {
                expected: lower.len(),
                got: upper.len(),
            });
        }

        for d in 0..lower.len() {
            if lower[d] > upper[d] {
                return Err(GeometryError::EmptyInterval {
                    dim: d,
                    lower: lower[d],
                    upper: upper[d],
                });
            }
        }

        Ok(AxisBox { lower, upper })
    }

    /// Create a box from per-dimension `(lower, upper)` intervals
    ///
    /// # Example
    ///
    /// ```
    /// use thyme_hybrid_automaton::geometry::AxisBox;
    ///
    /// let b = AxisBox::from_intervals([(0.0, 1.0), (0.0, 2.0)]).unwrap();
    /// assert_eq!(b.dim(), 2);
    /// assert_eq!(b.interval(1), Some((0.0, 2.0)));
    /// ```
    pub fn from_intervals(
        intervals: impl IntoIterator<Item = (f64, f64)>,
    ) -> Result<Self, GeometryError> {
        let (lower, upper): (Vec<f64>, Vec<f64>) = intervals.into_iter().unzip();
        AxisBox::new(DVector::from_vec(lower), DVector::from_vec(upper))
    }

    /// Number of dimensions of the box
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    /// Lower corner of the box
    pub fn lower(&self) -> &DVector<f64> {
        &self.lower
    }

    /// Upper corner of the box
    pub fn upper(&self) -> &DVector<f64> {
        &self.upper
    }

    /// Interval of the box in dimension `d`
    pub fn interval(&self, d: usize) -> Option<(f64, f64)> {
        if d < self.dim() {
            Some((self.lower[d], self.upper[d]))
        } else {
            None
        }
    }

    /// Per-dimension widths of the box
    pub fn widths(&self) -> DVector<f64> {
        &self.upper - &self.lower
    }

    /// Check whether the point lies in the box (closed, up to [`ABS_TOL`])
    ///
    /// Points of a different dimension are never contained.
    pub fn contains_point(&self, x: &DVector<f64>) -> bool {
        x.len() == self.dim()
            && (0..self.dim())
                .all(|d| x[d] >= self.lower[d] - ABS_TOL && x[d] <= self.upper[d] + ABS_TOL)
    }

    /// Check whether `other` is contained in the box (closed, up to [`ABS_TOL`])
    pub fn contains_box(&self, other: &AxisBox) -> bool {
        other.dim() == self.dim()
            && (0..self.dim()).all(|d| {
                other.lower[d] >= self.lower[d] - ABS_TOL
                    && other.upper[d] <= self.upper[d] + ABS_TOL
            })
    }

    /// Check whether the boxes overlap on a set of positive measure
    ///
    /// Boxes that merely touch on a shared face do not intersect in this
    /// sense.
    pub fn intersects(&self, other: &AxisBox) -> bool {
        other.dim() == self.dim()
            && (0..self.dim()).all(|d| {
                other.lower[d] < self.upper[d] - ABS_TOL
                    && other.upper[d] > self.lower[d] + ABS_TOL
            })
    }

    /// Split an augmented-space box into its spatial part and its clock
    /// interval
    ///
    /// The clock is the last dimension. Returns `None` for boxes with fewer
    /// than two dimensions, which cannot carry both a spatial part and a
    /// clock.
    pub fn split_clock(&self) -> Option<(AxisBox, (f64, f64))> {
        if self.dim() < 2 {
            return None;
        }

        let last = self.dim() - 1;
        let spatial = AxisBox {
            lower: DVector::from_iterator(last, self.lower.iter().take(last).copied()),
            upper: DVector::from_iterator(last, self.upper.iter().take(last).copied()),
        };

        Some((spatial, (self.lower[last], self.upper[last])))
    }
}

impl fmt::Display for AxisBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            display_interval_product(
                (0..self.dim()).map(|d| (self.lower[d], self.upper[d]))
            )
        )
    }
}

/// A guard set over the augmented (state x clock) space of a mode
///
/// Abstraction passes only support axis-aligned [`GuardSet::Box`] guards;
/// the [`GuardSet::Polyhedron`] variant exists so that unsupported guard
/// shapes are an explicit runtime case rather than silently impossible.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardSet {
    /// An axis-aligned box guard
    Box(AxisBox),
    /// An H-representation polyhedron `{ x : normals * x <= offsets }`
    Polyhedron {
        /// One outward normal per half-space, as matrix rows
        normals: DMatrix<f64>,
        /// Right-hand side of the half-space inequalities
        offsets: DVector<f64>,
    },
}

impl GuardSet {
    /// Create a polyhedral guard from its half-space representation
    pub fn polyhedron(
        normals: DMatrix<f64>,
        offsets: DVector<f64>,
    ) -> Result<Self, GeometryError> {
        if normals.nrows() != offsets.len() {
            return Err(GeometryError::DimensionMismatch {
                expected: normals.nrows(),
                got: offsets.len(),
            });
        }

        Ok(GuardSet::Polyhedron { normals, offsets })
    }

    /// Dimension of the space the guard lives in
    pub fn dim(&self) -> usize {
        match self {
            GuardSet::Box(b) => b.dim(),
            GuardSet::Polyhedron { normals, .. } => normals.ncols(),
        }
    }

    /// Return the guard as an axis-aligned box, if it is one
    pub fn as_box(&self) -> Option<&AxisBox> {
        match self {
            GuardSet::Box(b) => Some(b),
            GuardSet::Polyhedron { .. } => None,
        }
    }
}

impl fmt::Display for GuardSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardSet::Box(b) => write!(f, "{b}"),
            GuardSet::Polyhedron { normals, .. } => {
                write!(f, "{{ x : A x <= b }} ({} half-spaces)", normals.nrows())
            }
        }
    }
}

/// Errors that can occur when constructing geometric sets
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Two related quantities have different dimensions
    DimensionMismatch {
        /// Dimension required by the first quantity
        expected: usize,
        /// Dimension found on the second quantity
        got: usize,
    },
    /// An interval with `lower > upper` was supplied
    EmptyInterval {
        /// Dimension of the offending interval
        dim: usize,
        /// Lower bound supplied
        lower: f64,
        /// Upper bound supplied
        upper: f64,
    },
    /// A set with no dimensions was supplied where a nondegenerate domain
    /// is required
    ZeroDimensional,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::DimensionMismatch { expected, got } => {
                write!(f, "Dimension mismatch: expected {expected}, got {got}")
            }
            GeometryError::EmptyInterval { dim, lower, upper } => {
                write!(
                    f,
                    "Empty interval [{lower}, {upper}] in dimension {dim}"
                )
            }
            GeometryError::ZeroDimensional => {
                write!(f, "A domain must have at least one dimension")
            }
        }
    }
}

impl error::Error for GeometryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_dimension_mismatch() {
        let err = AxisBox::new(DVector::from_vec(vec![0.0]), DVector::from_vec(vec![1.0, 2.0]));
        assert_eq!(
            err,
            Err(GeometryError::DimensionMismatch {
                expected: 1,
                got: 2
            })
        );
    }

    #[test]
    fn test_new_rejects_empty_interval() {
        let err = AxisBox::from_intervals([(0.0, 1.0), (2.0, 1.0)]);
        assert_eq!(
            err,
            Err(GeometryError::EmptyInterval {
                dim: 1,
                lower: 2.0,
                upper: 1.0
            })
        );
    }

    #[test]
    fn test_contains_point() {
        let b = AxisBox::from_intervals([(0.0, 1.0), (0.0, 2.0)]).unwrap();

        assert!(b.contains_point(&DVector::from_vec(vec![0.5, 1.0])));
        assert!(b.contains_point(&DVector::from_vec(vec![0.0, 2.0])));
        assert!(b.contains_point(&DVector::from_vec(vec![1.0 + 1e-10, 0.0])));
        assert!(!b.contains_point(&DVector::from_vec(vec![1.1, 0.0])));
        assert!(!b.contains_point(&DVector::from_vec(vec![0.5])));
    }

    #[test]
    fn test_contains_box() {
        let outer = AxisBox::from_intervals([(0.0, 1.0)]).unwrap();
        let inner = AxisBox::from_intervals([(0.25, 0.75)]).unwrap();
        let touching = AxisBox::from_intervals([(0.5, 1.0)]).unwrap();
        let sticking_out = AxisBox::from_intervals([(0.5, 1.5)]).unwrap();

        assert!(outer.contains_box(&inner));
        assert!(outer.contains_box(&touching));
        assert!(outer.contains_box(&outer));
        assert!(!outer.contains_box(&sticking_out));
        assert!(!inner.contains_box(&outer));
    }

    #[test]
    fn test_intersects_is_open() {
        let a = AxisBox::from_intervals([(0.0, 0.5)]).unwrap();
        let b = AxisBox::from_intervals([(0.5, 1.0)]).unwrap();
        let c = AxisBox::from_intervals([(0.4, 0.6)]).unwrap();

        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(b.intersects(&c));
    }

    #[test]
    fn test_split_clock() {
        let guard = AxisBox::from_intervals([(0.4, 0.6), (-1.0, 2.0), (0.0, 5.0)]).unwrap();
        let (spatial, (t_lo, t_hi)) = guard.split_clock().unwrap();

        assert_eq!(
            spatial,
            AxisBox::from_intervals([(0.4, 0.6), (-1.0, 2.0)]).unwrap()
        );
        assert_eq!((t_lo, t_hi), (0.0, 5.0));

        let too_small = AxisBox::from_intervals([(0.0, 1.0)]).unwrap();
        assert!(too_small.split_clock().is_none());
    }

    #[test]
    fn test_guard_set_as_box() {
        let b = AxisBox::from_intervals([(0.0, 1.0), (0.0, 1.0)]).unwrap();
        let guard = GuardSet::Box(b.clone());
        assert_eq!(guard.as_box(), Some(&b));
        assert_eq!(guard.dim(), 2);

        let poly = GuardSet::polyhedron(
            DMatrix::from_row_slice(2, 2, &[1.0, 1.0, -1.0, 0.0]),
            DVector::from_vec(vec![1.0, 0.0]),
        )
        .unwrap();
        assert_eq!(poly.as_box(), None);
        assert_eq!(poly.dim(), 2);
    }

    #[test]
    fn test_polyhedron_rejects_row_mismatch() {
        let err = GuardSet::polyhedron(
            DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]),
            DVector::from_vec(vec![1.0]),
        );
        assert_eq!(
            err,
            Err(GeometryError::DimensionMismatch {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_display() {
        let b = AxisBox::from_intervals([(0.0, 1.0), (0.5, 2.5)]).unwrap();
        assert_eq!(b.to_string(), "[0, 1] x [0.5, 2.5]");
        assert_eq!(GuardSet::Box(b).to_string(), "[0, 1] x [0.5, 2.5]");
    }
}
