//! Uniform rectilinear grids over bounded continuous domains
//!
//! A [`UniformGrid`] partitions an axis-aligned domain into equally sized
//! cells and numbers them with dense symbols starting from 1, the first
//! dimension varying fastest. The grid provides the forward and inverse
//! maps between concrete vectors and symbols as well as the enumeration of
//! all symbols whose cells relate to a query box under an inner or outer
//! semantic.

use std::error;
use std::fmt;

use nalgebra::DVector;
use thyme_hybrid_automaton::geometry::{AxisBox, ABS_TOL};

/// Semantics of enumerating grid cells against a query set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetSemantics {
    /// Cells fully contained in the set (up to tolerance)
    Inner,
    /// Cells overlapping the set on positive measure
    Outer,
}

/// A uniform grid over a bounded axis-aligned domain
#[derive(Debug, Clone, PartialEq)]
pub struct UniformGrid {
    origin: DVector<f64>,
    step: DVector<f64>,
    cells: Vec<usize>,
}

impl UniformGrid {
    /// Create a grid covering `domain` with the given per-dimension cell
    /// size
    ///
    /// The number of cells per dimension is the smallest count covering the
    /// domain width; degenerate widths yield a single cell.
    pub fn from_domain(domain: &AxisBox, step: &DVector<f64>) -> Result<Self, GridError> {
        if step.len() != domain.dim() {
            return Err(GridError::DimensionMismatch {
                expected: domain.dim(),
                got: step.len(),
            });
        }

        for d in 0..step.len() {
            if step[d] <= 0.0 {
                return Err(GridError::NonPositiveStep { dim: d, step: step[d] });
            }
        }

        let widths = domain.widths();
        let cells = (0..step.len())
            .map(|d| ((widths[d] / step[d] - ABS_TOL).ceil()).max(1.0) as usize)
            .collect();

        Ok(UniformGrid {
            origin: domain.lower().clone(),
            step: step.clone(),
            cells,
        })
    }

    /// Number of dimensions of the grid
    pub fn dim(&self) -> usize {
        self.cells.len()
    }

    /// Total number of cells
    pub fn n_cells(&self) -> usize {
        self.cells.iter().product()
    }

    /// Number of cells along each dimension
    pub fn cells_per_dim(&self) -> &[usize] {
        &self.cells
    }

    /// Per-dimension cell size
    pub fn step(&self) -> &DVector<f64> {
        &self.step
    }

    /// All symbols of the grid in ascending order
    pub fn symbols(&self) -> impl Iterator<Item = usize> {
        1..=self.n_cells()
    }

    /// The box covered by the grid
    ///
    /// May exceed the original domain by less than one cell per dimension
    /// when the cell size does not divide the domain width.
    pub fn bounds(&self) -> AxisBox {
        let upper = DVector::from_iterator(
            self.dim(),
            (0..self.dim()).map(|d| self.origin[d] + self.cells[d] as f64 * self.step[d]),
        );
        AxisBox::new(self.origin.clone(), upper)
            .unwrap_or_else(|e| panic!("Grid bounds are not a valid box: {e}"))
    }

    /// Center point of the cell with the given symbol
    pub fn center(&self, symbol: usize) -> Option<DVector<f64>> {
        let indices = self.multi_index(symbol)?;
        Some(DVector::from_iterator(
            self.dim(),
            (0..self.dim())
                .map(|d| self.origin[d] + (indices[d] as f64 + 0.5) * self.step[d]),
        ))
    }

    /// The cell of the given symbol as a box
    pub fn cell(&self, symbol: usize) -> Option<AxisBox> {
        let indices = self.multi_index(symbol)?;
        let lower = DVector::from_iterator(
            self.dim(),
            (0..self.dim()).map(|d| self.origin[d] + indices[d] as f64 * self.step[d]),
        );
        let upper = DVector::from_iterator(
            self.dim(),
            (0..self.dim()).map(|d| self.origin[d] + (indices[d] + 1) as f64 * self.step[d]),
        );
        // lower <= upper holds for any valid multi index
        AxisBox::new(lower, upper).ok()
    }

    /// Symbol of the cell containing the point, if any
    ///
    /// Points on interior cell boundaries belong to the cell on their upper
    /// side; points on the outermost faces belong to the outermost cells.
    pub fn symbol_of(&self, x: &DVector<f64>) -> Option<usize> {
        if x.len() != self.dim() {
            return None;
        }

        let mut indices = Vec::with_capacity(self.dim());
        for d in 0..self.dim() {
            let upper = self.origin[d] + self.cells[d] as f64 * self.step[d];
            if x[d] < self.origin[d] - ABS_TOL || x[d] > upper + ABS_TOL {
                return None;
            }

            let i = ((x[d] - self.origin[d]) / self.step[d]).floor().max(0.0) as usize;
            indices.push(i.min(self.cells[d] - 1));
        }

        Some(self.linear_symbol(&indices))
    }

    /// All symbols whose cells relate to `set` under the given semantics,
    /// in ascending symbol order
    ///
    /// Sets of a different dimension yield no symbols.
    pub fn symbols_in_box(&self, set: &AxisBox, semantics: SetSemantics) -> Vec<usize> {
        if set.dim() != self.dim() {
            return Vec::new();
        }

        let mut lo = Vec::with_capacity(self.dim());
        let mut hi = Vec::with_capacity(self.dim());
        for d in 0..self.dim() {
            let rel_lo = (set.lower()[d] - self.origin[d]) / self.step[d];
            let rel_hi = (set.upper()[d] - self.origin[d]) / self.step[d];
            let tol = ABS_TOL / self.step[d];

            let (first, last) = match semantics {
                SetSemantics::Inner => (
                    (rel_lo - tol).ceil(),
                    (rel_hi + tol).floor() - 1.0,
                ),
                SetSemantics::Outer => (
                    (rel_lo + tol).floor(),
                    (rel_hi - tol).ceil() - 1.0,
                ),
            };

            let first = first.max(0.0) as usize;
            let last = last.min(self.cells[d] as f64 - 1.0);
            if last < first as f64 {
                return Vec::new();
            }

            lo.push(first);
            hi.push(last as usize);
        }

        // odometer over the per-dimension ranges, dimension 0 fastest, so
        // the produced symbols are ascending
        let mut out = Vec::new();
        let mut indices = lo.clone();
        loop {
            out.push(self.linear_symbol(&indices));

            let mut d = 0;
            loop {
                if d == self.dim() {
                    return out;
                }
                if indices[d] < hi[d] {
                    indices[d] += 1;
                    break;
                }
                indices[d] = lo[d];
                d += 1;
            }
        }
    }

    fn linear_symbol(&self, indices: &[usize]) -> usize {
        let mut symbol = 0;
        let mut stride = 1;
        for d in 0..self.dim() {
            symbol += indices[d] * stride;
            stride *= self.cells[d];
        }
        symbol + 1
    }

    fn multi_index(&self, symbol: usize) -> Option<Vec<usize>> {
        if symbol == 0 || symbol > self.n_cells() {
            return None;
        }

        let mut rest = symbol - 1;
        let mut indices = Vec::with_capacity(self.dim());
        for d in 0..self.dim() {
            indices.push(rest % self.cells[d]);
            rest /= self.cells[d];
        }
        Some(indices)
    }
}

impl fmt::Display for UniformGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} cells)",
            self.bounds(),
            self.n_cells()
        )
    }
}

/// Errors that can occur when constructing a [`UniformGrid`]
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// Domain and cell-size vector have different dimensions
    DimensionMismatch {
        /// Dimension of the domain
        expected: usize,
        /// Dimension of the cell-size vector
        got: usize,
    },
    /// A cell size is zero or negative
    NonPositiveStep {
        /// Offending dimension
        dim: usize,
        /// Supplied cell size
        step: f64,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::DimensionMismatch { expected, got } => {
                write!(
                    f,
                    "Cell-size vector has dimension {got}, domain has dimension {expected}"
                )
            }
            GridError::NonPositiveStep { dim, step } => {
                write!(f, "Cell size {step} in dimension {dim} is not positive")
            }
        }
    }
}

impl error::Error for GridError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_grid_1d() -> UniformGrid {
        // two cells: [0, 0.5] and [0.5, 1]
        UniformGrid::from_domain(
            &AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
            &DVector::from_vec(vec![0.5]),
        )
        .unwrap()
    }

    #[test]
    fn test_from_domain_errors() {
        let domain = AxisBox::from_intervals([(0.0, 1.0)]).unwrap();

        assert_eq!(
            UniformGrid::from_domain(&domain, &DVector::from_vec(vec![0.5, 0.5])).unwrap_err(),
            GridError::DimensionMismatch {
                expected: 1,
                got: 2
            }
        );
        assert_eq!(
            UniformGrid::from_domain(&domain, &DVector::from_vec(vec![0.0])).unwrap_err(),
            GridError::NonPositiveStep { dim: 0, step: 0.0 }
        );
    }

    #[test]
    fn test_cell_counts() {
        let grid = unit_grid_1d();
        assert_eq!(grid.n_cells(), 2);

        // non-dividing step rounds the cell count up
        let grid = UniformGrid::from_domain(
            &AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
            &DVector::from_vec(vec![0.4]),
        )
        .unwrap();
        assert_eq!(grid.n_cells(), 3);

        let grid = UniformGrid::from_domain(
            &AxisBox::from_intervals([(0.0, 1.0), (0.0, 1.5)]).unwrap(),
            &DVector::from_vec(vec![0.5, 0.5]),
        )
        .unwrap();
        assert_eq!(grid.cells_per_dim(), &[2, 3]);
        assert_eq!(grid.n_cells(), 6);
    }

    #[test]
    fn test_center_symbol_round_trip() {
        let grid = UniformGrid::from_domain(
            &AxisBox::from_intervals([(0.0, 1.0), (0.0, 1.0)]).unwrap(),
            &DVector::from_vec(vec![0.5, 0.5]),
        )
        .unwrap();

        for q in grid.symbols() {
            let x = grid.center(q).unwrap();
            assert_eq!(grid.symbol_of(&x), Some(q));
        }

        assert!(grid.center(0).is_none());
        assert!(grid.center(5).is_none());
    }

    #[test]
    fn test_symbol_numbering_first_dimension_fastest() {
        let grid = UniformGrid::from_domain(
            &AxisBox::from_intervals([(0.0, 1.0), (0.0, 1.0)]).unwrap(),
            &DVector::from_vec(vec![0.5, 0.5]),
        )
        .unwrap();

        assert_eq!(
            grid.center(1).unwrap(),
            DVector::from_vec(vec![0.25, 0.25])
        );
        assert_eq!(
            grid.center(2).unwrap(),
            DVector::from_vec(vec![0.75, 0.25])
        );
        assert_eq!(
            grid.center(3).unwrap(),
            DVector::from_vec(vec![0.25, 0.75])
        );
    }

    #[test]
    fn test_symbol_of_boundaries() {
        let grid = unit_grid_1d();

        // interior boundary points belong to the upper cell
        assert_eq!(grid.symbol_of(&DVector::from_vec(vec![0.5])), Some(2));
        // the domain's outer faces belong to the outermost cells
        assert_eq!(grid.symbol_of(&DVector::from_vec(vec![0.0])), Some(1));
        assert_eq!(grid.symbol_of(&DVector::from_vec(vec![1.0])), Some(2));
        // points outside the domain have no symbol
        assert_eq!(grid.symbol_of(&DVector::from_vec(vec![1.5])), None);
        assert_eq!(grid.symbol_of(&DVector::from_vec(vec![-0.1])), None);
        // dimension mismatch has no symbol
        assert_eq!(grid.symbol_of(&DVector::from_vec(vec![0.5, 0.5])), None);
    }

    #[test]
    fn test_symbols_in_box_inner() {
        let grid = unit_grid_1d();

        // no cell fits into a set smaller than a cell
        let narrow = AxisBox::from_intervals([(0.4, 0.6)]).unwrap();
        assert!(grid.symbols_in_box(&narrow, SetSemantics::Inner).is_empty());

        // [0.4, 1.0] contains exactly the upper cell
        let upper = AxisBox::from_intervals([(0.4, 1.0)]).unwrap();
        assert_eq!(grid.symbols_in_box(&upper, SetSemantics::Inner), vec![2]);

        // the full domain contains both cells
        let all = AxisBox::from_intervals([(0.0, 1.0)]).unwrap();
        assert_eq!(grid.symbols_in_box(&all, SetSemantics::Inner), vec![1, 2]);
    }

    #[test]
    fn test_symbols_in_box_outer() {
        let grid = unit_grid_1d();

        // [0.4, 0.6] overlaps both cells
        let narrow = AxisBox::from_intervals([(0.4, 0.6)]).unwrap();
        assert_eq!(
            grid.symbols_in_box(&narrow, SetSemantics::Outer),
            vec![1, 2]
        );

        // a set touching a cell only on its face does not overlap it
        let touching = AxisBox::from_intervals([(0.5, 1.0)]).unwrap();
        assert_eq!(
            grid.symbols_in_box(&touching, SetSemantics::Outer),
            vec![2]
        );

        // sets beyond the grid yield nothing
        let outside = AxisBox::from_intervals([(2.0, 3.0)]).unwrap();
        assert!(grid.symbols_in_box(&outside, SetSemantics::Outer).is_empty());
    }

    #[test]
    fn test_symbols_in_box_multi_dim() {
        let grid = UniformGrid::from_domain(
            &AxisBox::from_intervals([(0.0, 1.0), (0.0, 1.0)]).unwrap(),
            &DVector::from_vec(vec![0.5, 0.5]),
        )
        .unwrap();

        let quadrant = AxisBox::from_intervals([(0.5, 1.0), (0.0, 1.0)]).unwrap();
        assert_eq!(
            grid.symbols_in_box(&quadrant, SetSemantics::Inner),
            vec![2, 4]
        );
        assert_eq!(
            grid.symbols_in_box(&quadrant, SetSemantics::Outer),
            vec![2, 4]
        );
    }

    #[test]
    fn test_bounds_cover_domain() {
        let grid = UniformGrid::from_domain(
            &AxisBox::from_intervals([(0.0, 1.0)]).unwrap(),
            &DVector::from_vec(vec![0.4]),
        )
        .unwrap();

        // three cells of size 0.4 cover [0, 1.2]
        assert_eq!(
            grid.bounds(),
            AxisBox::from_intervals([(0.0, 1.2000000000000002)]).unwrap()
        );
    }

    #[test]
    fn test_cell() {
        let grid = unit_grid_1d();
        assert_eq!(
            grid.cell(2).unwrap(),
            AxisBox::from_intervals([(0.5, 1.0)]).unwrap()
        );
        assert!(grid.cell(3).is_none());
    }
}
