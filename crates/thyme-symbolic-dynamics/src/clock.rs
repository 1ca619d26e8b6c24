//! Finite uniform time grids for mode clocks
//!
//! Every mode carries its own clock, discretized into the grid
//! `0, Δt, 2Δt, ..., horizon` with 1-based time indices. A mode whose
//! horizon or time step is zero has a frozen clock: its grid is the single
//! point `0` and every time-related query answers index 1.

use std::fmt;

use log::warn;
use thyme_display_utils::join_display;

/// Absolute tolerance for matching a time value against a grid point
pub const TIME_TOL: f64 = 1e-7;

/// A finite uniform grid over a mode's clock range
#[derive(Debug, Clone, PartialEq)]
pub struct ClockGrid {
    steps: Vec<f64>,
    dt: f64,
    active: bool,
}

impl ClockGrid {
    /// Build the clock grid for the given horizon and time step
    ///
    /// A non-positive horizon or time step yields a frozen clock. For an
    /// active clock the number of steps is the closest integer to
    /// `horizon / dt`, at least one.
    pub fn new(horizon: f64, dt: f64) -> Self {
        if horizon <= 0.0 || dt <= 0.0 {
            return ClockGrid {
                steps: vec![0.0],
                dt: 0.0,
                active: false,
            };
        }

        let n = (horizon / dt).round().max(1.0) as usize;
        ClockGrid {
            steps: (0..=n).map(|i| i as f64 * dt).collect(),
            dt,
            active: true,
        }
    }

    /// Whether the clock advances at all
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of grid points
    pub fn n_steps(&self) -> usize {
        self.steps.len()
    }

    /// The grid points in increasing order
    pub fn steps(&self) -> &[f64] {
        &self.steps
    }

    /// Time value at the given 1-based index
    pub fn time_at(&self, index: usize) -> Option<f64> {
        if index == 0 {
            return None;
        }
        self.steps.get(index - 1).copied()
    }

    /// Index of the grid point matching the time value
    ///
    /// Matches within [`TIME_TOL`] first; values between grid points inside
    /// the grid's reach resolve to the nearest point. Values further than
    /// half a step outside the grid have no index. On a frozen clock every
    /// time value answers index 1.
    pub fn index_of_time(&self, time: f64) -> Option<usize> {
        if !self.active {
            return Some(1);
        }

        let first = self.steps[0];
        let last = *self.steps.last().unwrap_or(&first);
        if time < first - self.dt / 2.0 - TIME_TOL || time > last + self.dt / 2.0 + TIME_TOL {
            return None;
        }

        if let Some(i) = self.steps.iter().position(|s| (time - s).abs() <= TIME_TOL) {
            return Some(i + 1);
        }

        let nearest = ((time - first) / self.dt).round().max(0.0) as usize;
        Some(nearest.min(self.steps.len() - 1) + 1)
    }

    /// Largest index whose grid point is at most the time value
    ///
    /// Values beyond the last grid point floor to the last index; values
    /// below the first grid point have no floor.
    pub fn floor_index(&self, time: f64) -> Option<usize> {
        if !self.active {
            return Some(1);
        }

        if time < self.steps[0] - TIME_TOL {
            return None;
        }

        let i = ((time - self.steps[0] + TIME_TOL) / self.dt).floor().max(0.0) as usize;
        Some(i.min(self.steps.len() - 1) + 1)
    }

    /// Smallest index whose grid point is at least the time value
    ///
    /// Values below the first grid point ceil to index 1; values beyond the
    /// last grid point have no ceiling.
    pub fn ceil_index(&self, time: f64) -> Option<usize> {
        if !self.active {
            return Some(1);
        }

        let last = self.steps[self.steps.len() - 1];
        if time > last + TIME_TOL {
            return None;
        }

        let i = ((time - self.steps[0] - TIME_TOL) / self.dt).ceil().max(0.0) as usize;
        Some(i.min(self.steps.len() - 1) + 1)
    }

    /// All indices whose grid points lie in `[lo, hi]`, in increasing order
    ///
    /// On a frozen clock the answer is always index 1; intervals that do
    /// not contain the clock origin are reported, since they cannot be
    /// meant for a clock that never leaves it.
    pub fn indices_in_interval(&self, lo: f64, hi: f64) -> Vec<usize> {
        if !self.active {
            if lo > TIME_TOL || hi < -TIME_TOL {
                warn!(
                    "Temporal window [{lo}, {hi}] queried on a frozen clock"
                );
            }
            return vec![1];
        }

        if hi < lo {
            return Vec::new();
        }

        let first = ((lo - self.steps[0] - TIME_TOL) / self.dt).ceil().max(0.0) as usize;
        let last = ((hi - self.steps[0] + TIME_TOL) / self.dt).floor();
        if last < 0.0 {
            return Vec::new();
        }
        let last = (last as usize).min(self.steps.len() - 1);

        if first > last {
            return Vec::new();
        }

        (first..=last).map(|i| i + 1).collect()
    }
}

impl fmt::Display for ClockGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.active {
            write!(f, "clock {{ {} }}", join_display(self.steps.iter(), ", "))
        } else {
            write!(f, "clock {{ frozen }}")
        }
    }
}
