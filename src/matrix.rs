//! Symmetric matrices stored as a packed lower triangle.

use alloc::vec;
use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use crate::buffer::{check_len, ensure_len};
use crate::error::Error;

/// Square symmetric matrix. `(row, col)` and `(col, row)` address the same
/// cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymmetricMatrix {
    dim: usize,
    data: Vec<f64>,
}

#[inline]
fn packed(row: usize, col: usize) -> usize {
    let (r, c) = if row >= col { (row, col) } else { (col, row) };
    r * (r + 1) / 2 + c
}

impl SymmetricMatrix {
    /// Zero matrix of dimension `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0.0; dim * (dim + 1) / 2],
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Change the dimension, zeroing every cell.
    pub fn resize(&mut self, dim: usize) -> Result<(), Error> {
        ensure_len(&mut self.data, dim * (dim + 1) / 2)?;
        self.data.fill(0.0);
        self.dim = dim;
        Ok(())
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// `A x` written into `y`.
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) -> Result<(), Error> {
        check_len(x, self.dim)?;
        check_len(y, self.dim)?;
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = (0..self.dim).map(|j| self[(i, j)] * x[j]).sum();
        }
        Ok(())
    }

    /// Square-root-free Cholesky decomposition `A = L D Lᵀ`.
    ///
    /// `lower` receives the unit lower-triangular `L` (its upper triangle is
    /// meaningless) and `diagonal` receives `D`. Fails on a zero pivot.
    pub fn ldl_decomposition(
        &self,
        lower: &mut SymmetricMatrix,
        diagonal: &mut Vec<f64>,
    ) -> Result<(), Error> {
        if self.dim == 0 {
            return Err(Error::EmptyInput);
        }
        lower.resize(self.dim)?;
        ensure_len(diagonal, self.dim)?;

        for i in 0..self.dim {
            for j in 0..i {
                let mut v = self[(i, j)];
                for k in 0..j {
                    v -= lower[(i, k)] * lower[(j, k)] * diagonal[k];
                }
                lower[(i, j)] = v / diagonal[j];
            }
            let mut d = self[(i, i)];
            for j in 0..i {
                d -= lower[(i, j)] * lower[(i, j)] * diagonal[j];
            }
            if d == 0.0 || !d.is_finite() {
                return Err(Error::SingularMatrix);
            }
            diagonal[i] = d;
            lower[(i, i)] = 1.0;
        }
        Ok(())
    }
}

impl Index<(usize, usize)> for SymmetricMatrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(row < self.dim && col < self.dim, "index out of bounds");
        &self.data[packed(row, col)]
    }
}

impl IndexMut<(usize, usize)> for SymmetricMatrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(row < self.dim && col < self.dim, "index out of bounds");
        &mut self.data[packed(row, col)]
    }
}

/// Reusable decomposition storage for [`SymmetricSolver`].
#[derive(Debug, Clone, Default)]
pub struct SymmetricSolverScratch {
    lower: SymmetricMatrix,
    diagonal: Vec<f64>,
    work: Vec<f64>,
}

/// Solves `A x = b` for symmetric `A` of order `M` (dimension `M + 1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymmetricSolver {
    num_order: usize,
}

impl SymmetricSolver {
    pub fn new(num_order: usize) -> Self {
        Self { num_order }
    }

    pub fn num_order(&self) -> usize {
        self.num_order
    }

    pub fn run(
        &self,
        matrix: &SymmetricMatrix,
        rhs: &[f64],
        solution: &mut [f64],
        scratch: &mut SymmetricSolverScratch,
    ) -> Result<(), Error> {
        let n = self.num_order + 1;
        if matrix.dim() != n {
            return Err(Error::MismatchedLengths);
        }
        check_len(rhs, n)?;
        check_len(solution, n)?;

        matrix.ldl_decomposition(&mut scratch.lower, &mut scratch.diagonal)?;
        let lower = &scratch.lower;
        ensure_len(&mut scratch.work, n)?;
        let y = &mut scratch.work;

        // L y = b
        for i in 0..n {
            let mut v = rhs[i];
            for k in 0..i {
                v -= lower[(i, k)] * y[k];
            }
            y[i] = v;
        }
        // D z = y
        for (yi, d) in y.iter_mut().zip(scratch.diagonal.iter()) {
            *yi /= *d;
        }
        // Lᵀ x = z
        for i in (0..n).rev() {
            let mut v = y[i];
            for k in i + 1..n {
                v -= lower[(k, i)] * y[k];
            }
            y[i] = v;
        }
        solution.copy_from_slice(&y[..]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn cells_alias() {
        let mut m = SymmetricMatrix::new(3);
        m[(2, 0)] = 4.0;
        assert_eq!(m[(0, 2)], 4.0);
        m[(1, 2)] = -1.0;
        assert_eq!(m[(2, 1)], -1.0);
        assert_eq!(m[(1, 1)], 0.0);
    }

    #[test]
    fn decomposition_reconstructs() {
        let mut a = SymmetricMatrix::new(3);
        a[(0, 0)] = 4.0;
        a[(1, 0)] = 2.0;
        a[(1, 1)] = 5.0;
        a[(2, 0)] = -2.0;
        a[(2, 1)] = 1.0;
        a[(2, 2)] = 6.0;
        let mut l = SymmetricMatrix::default();
        let mut d = Vec::new();
        a.ldl_decomposition(&mut l, &mut d).unwrap();
        for i in 0..3 {
            for j in 0..=i {
                let v: f64 = (0..=j).map(|k| l[(i, k)] * d[k] * l[(j, k)]).sum();
                assert!((v - a[(i, j)]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let mut a = SymmetricMatrix::new(2);
        a.fill(1.0);
        let solver = SymmetricSolver::new(1);
        let mut x = vec![0.0; 2];
        let mut scratch = SymmetricSolverScratch::default();
        assert_eq!(
            solver.run(&a, &[1.0, 1.0], &mut x, &mut scratch),
            Err(Error::SingularMatrix)
        );
    }

    #[test]
    fn solves_random_systems() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut scratch = SymmetricSolverScratch::default();
        for n in 1..10 {
            let mut a = SymmetricMatrix::new(n);
            for i in 0..n {
                for j in 0..i {
                    a[(i, j)] = rng.gen_range(-1.0..1.0);
                }
                a[(i, i)] = n as f64 + rng.gen_range(0.0..1.0);
            }
            let b: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let mut x = vec![0.0; n];
            SymmetricSolver::new(n - 1)
                .run(&a, &b, &mut x, &mut scratch)
                .unwrap();
            let mut ax = vec![0.0; n];
            a.mul_vec(&x, &mut ax).unwrap();
            for (p, q) in ax.iter().zip(b.iter()) {
                assert!((p - q).abs() < 1e-10);
            }
        }
    }
}
