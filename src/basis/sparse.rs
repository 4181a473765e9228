//! A minimal compressed-sparse-row matrix.

use std::fmt;

use anyhow::bail;
use itertools::Itertools;
use ndarray::Array2;
use num_traits::Zero;

use crate::auxiliary::scalar::PairScalar;
use crate::units::Rescalable;

/// A matrix stored in compressed-sparse-row format. Column indices within each row are strictly
/// increasing.
#[derive(Clone, Debug, PartialEq)]
pub struct CsrMatrix<T> {
    nrows: usize,
    ncols: usize,

    /// Offsets into `indices` and `data`, one per row plus a terminal one.
    indptr: Vec<usize>,

    /// Column index of each stored entry.
    indices: Vec<usize>,

    /// Value of each stored entry.
    data: Vec<T>,
}

impl<T> CsrMatrix<T>
where
    T: Copy + Zero,
{
    /// Constructs a matrix from `(row, column, value)` triplets. Duplicate positions are summed.
    ///
    /// # Errors
    ///
    /// Errors if a triplet lies outside the shape.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        mut triplets: Vec<(usize, usize, T)>,
    ) -> Result<Self, anyhow::Error> {
        if let Some((r, c, _)) = triplets.iter().find(|(r, c, _)| *r >= nrows || *c >= ncols) {
            bail!("Entry ({r}, {c}) lies outside a {nrows} × {ncols} matrix.");
        }
        triplets.sort_by_key(|(r, c, _)| (*r, *c));

        let mut indptr = vec![0; nrows + 1];
        let mut indices = Vec::with_capacity(triplets.len());
        let mut data: Vec<T> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;
        for (r, c, v) in triplets {
            if last == Some((r, c)) {
                if let Some(x) = data.last_mut() {
                    *x = *x + v;
                }
            } else {
                indices.push(c);
                data.push(v);
                indptr[r + 1] += 1;
                last = Some((r, c));
            }
        }
        for r in 0..nrows {
            indptr[r + 1] += indptr[r];
        }
        Ok(Self {
            nrows,
            ncols,
            indptr,
            indices,
            data,
        })
    }

    /// Constructs an all-zero matrix.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            indptr: vec![0; nrows + 1],
            indices: vec![],
            data: vec![],
        }
    }

    /// Returns `(nrows, ncols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Returns the entry at `(row, col)`, or zero if it is not stored or out of range.
    pub fn get(&self, row: usize, col: usize) -> T {
        if row >= self.nrows {
            return T::zero();
        }
        let range = self.indptr[row]..self.indptr[row + 1];
        self.indices[range.clone()]
            .binary_search(&col)
            .map(|i| self.data[range.start + i])
            .unwrap_or_else(|_| T::zero())
    }

    /// Iterates over the stored entries of one row as `(col, value)` pairs.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = if row < self.nrows {
            self.indptr[row]..self.indptr[row + 1]
        } else {
            0..0
        };
        range.map(move |i| (self.indices[i], self.data[i]))
    }

    /// Iterates over all stored entries as `(row, col, value)` triplets in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.nrows).flat_map(move |r| self.row(r).map(move |(c, v)| (r, c, v)))
    }

    /// Returns the dense equivalent.
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::zeros((self.nrows, self.ncols));
        for (r, c, v) in self.iter() {
            dense[(r, c)] = v;
        }
        dense
    }

    /// Applies `f` to every stored entry, keeping the sparsity pattern.
    pub fn map<U, F>(&self, f: F) -> CsrMatrix<U>
    where
        F: Fn(T) -> U,
    {
        CsrMatrix {
            nrows: self.nrows,
            ncols: self.ncols,
            indptr: self.indptr.clone(),
            indices: self.indices.clone(),
            data: self.data.iter().map(|v| f(*v)).collect_vec(),
        }
    }
}

impl<T: PairScalar> Rescalable for CsrMatrix<T> {
    fn rescaled(&self, factor: f64) -> Self {
        let factor = T::from_real(factor);
        self.map(|v| v * factor)
    }
}

impl<T: fmt::Display + Copy + Zero> fmt::Display for CsrMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} × {} sparse matrix with {} stored entries",
            self.nrows,
            self.ncols,
            self.nnz()
        )?;
        for (r, c, v) in self.iter() {
            writeln!(f, "  ({r}, {c})  {v}")?;
        }
        Ok(())
    }
}
