//! Toeplitz-plus-Hankel linear system solver.
//!
//! Solves `(T + H) a = b` of dimension `N + 1` where
//!
//! ```text
//! T(i, j) = t(N + i − j)      t = [t(0), …, t(2N)], t(N) on the diagonal
//! H(i, j) = h(i + j)          h = [h(0), …, h(2N)]
//! ```
//!
//! The system is embedded in a block Toeplitz system with 2×2 blocks and
//! solved by the Levinson-type recursion of G. Merchant and T. Parks,
//! "Efficient solution of a Toeplitz-plus-Hankel coefficient matrix system
//! of equations", IEEE Trans. ASSP 30(1), 1982, in `O(N²)` operations.
//!
//! With coefficient modification enabled, `t(N)` is added to the even
//! Toeplitz diagonals and subtracted from the matching Hankel anti-diagonals.
//! The two shifts cancel in `T + H` but keep the leading 2×2 blocks away
//! from singularity when the Hankel part dominates.
//!
//! If a block turns singular the solver falls back to an LDLᵀ solve of the
//! assembled matrix; the Toeplitz generator is then read as symmetric.

use alloc::vec::Vec;
use libm::fabs;

use crate::buffer::{check_len, ensure_len};
use crate::error::Error;
use crate::matrix::{SymmetricMatrix, SymmetricSolver, SymmetricSolverScratch};

/// Blocks whose determinant falls below this are treated as singular.
pub const MIN_DETERMINANT: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Block([[f64; 2]; 2]);

type Pair = [f64; 2];

impl Block {
    const IDENTITY: Block = Block([[1.0, 0.0], [0.0, 1.0]]);

    fn inverse(self) -> Option<Block> {
        let [[a, b], [c, d]] = self.0;
        let det = a * d - b * c;
        if fabs(det) < MIN_DETERMINANT || !det.is_finite() {
            return None;
        }
        let k = 1.0 / det;
        Some(Block([[d * k, -b * k], [-c * k, a * k]]))
    }

    /// `[[a, b], [c, d]] → [[d, c], [b, a]]`
    fn cross(self) -> Block {
        let [[a, b], [c, d]] = self.0;
        Block([[d, c], [b, a]])
    }

    fn mul(self, o: Block) -> Block {
        let [[a, b], [c, d]] = self.0;
        let [[e, f], [g, h]] = o.0;
        Block([[a * e + b * g, a * f + b * h], [c * e + d * g, c * f + d * h]])
    }

    fn apply(self, v: Pair) -> Pair {
        let [[a, b], [c, d]] = self.0;
        [a * v[0] + b * v[1], c * v[0] + d * v[1]]
    }

    fn add(self, o: Block) -> Block {
        let mut r = self;
        for (row, orow) in r.0.iter_mut().zip(o.0.iter()) {
            row[0] += orow[0];
            row[1] += orow[1];
        }
        r
    }

    fn sub(self, o: Block) -> Block {
        let mut r = self;
        for (row, orow) in r.0.iter_mut().zip(o.0.iter()) {
            row[0] -= orow[0];
            row[1] -= orow[1];
        }
        r
    }
}

/// Working storage of [`ToeplitzPlusHankelSolver`].
#[derive(Debug, Clone, Default)]
pub struct ToeplitzPlusHankelScratch {
    r: Vec<Block>,
    x: Vec<Block>,
    prev_x: Vec<Block>,
    p: Vec<Pair>,
    matrix: SymmetricMatrix,
    fallback: SymmetricSolverScratch,
    solution: Vec<f64>,
}

/// Solver for Toeplitz-plus-Hankel systems of order `N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToeplitzPlusHankelSolver {
    num_order: usize,
    coefficients_modification: bool,
}

impl ToeplitzPlusHankelSolver {
    pub fn new(num_order: usize, coefficients_modification: bool) -> Self {
        Self {
            num_order,
            coefficients_modification,
        }
    }

    pub fn num_order(&self) -> usize {
        self.num_order
    }

    pub fn coefficients_modification(&self) -> bool {
        self.coefficients_modification
    }

    /// Solve for `solution` given the Toeplitz generator `toeplitz`
    /// (length `2N + 1`), the Hankel generator `hankel` (length `2N + 1`) and
    /// the right-hand side `constant` (length `N + 1`).
    pub fn run(
        &self,
        toeplitz: &[f64],
        hankel: &[f64],
        constant: &[f64],
        solution: &mut [f64],
        scratch: &mut ToeplitzPlusHankelScratch,
    ) -> Result<(), Error> {
        let n = self.num_order;
        check_len(toeplitz, 2 * n + 1)?;
        check_len(hankel, 2 * n + 1)?;
        check_len(constant, n + 1)?;
        check_len(solution, n + 1)?;
        ensure_len(&mut scratch.solution, n + 1)?;

        match self.block_recursion(toeplitz, hankel, constant, scratch) {
            Ok(()) => {}
            Err(Error::SingularMatrix) => {
                warn_log!(
                    "Toeplitz-plus-Hankel recursion hit a singular block at order {}; using symmetric solver",
                    n
                );
                self.symmetric_fallback(toeplitz, hankel, constant, scratch)?;
            }
            Err(e) => return Err(e),
        }
        solution.copy_from_slice(&scratch.solution);
        Ok(())
    }

    fn block_recursion(
        &self,
        t: &[f64],
        h: &[f64],
        b: &[f64],
        scratch: &mut ToeplitzPlusHankelScratch,
    ) -> Result<(), Error> {
        let n = self.num_order;
        let len = n + 1;
        ensure_len(&mut scratch.r, len)?;
        ensure_len(&mut scratch.x, len)?;
        ensure_len(&mut scratch.prev_x, len)?;
        ensure_len(&mut scratch.p, len)?;
        let r = &mut scratch.r;
        let x = &mut scratch.x;
        let prev_x = &mut scratch.prev_x;
        let p = &mut scratch.p;

        for (i, ri) in r.iter_mut().enumerate() {
            *ri = Block([[t[n + i], h[n + i]], [h[n - i], t[n - i]]]);
        }
        if self.coefficients_modification {
            let d0 = t[n];
            for ri in r.iter_mut().step_by(2) {
                ri.0[0][0] += d0;
                ri.0[1][1] += d0;
            }
            for ri in r.iter_mut().skip(n % 2).step_by(2) {
                ri.0[0][1] -= d0;
                ri.0[1][0] -= d0;
            }
        }
        let bar = |i: usize| -> Pair { [b[i], b[n - i]] };

        x[0] = Block::IDENTITY;
        p[0] = r[0].inverse().ok_or(Error::SingularMatrix)?.apply(bar(0));
        let mut vx = r[0];

        for i in 1..len {
            let mut ex = Block::default();
            let mut ep = [0.0; 2];
            for j in 0..i {
                ex = ex.add(r[i - j].mul(x[j]));
                let e = r[i - j].apply(p[j]);
                ep[0] += e[0];
                ep[1] += e[1];
            }

            let bx = vx
                .cross()
                .inverse()
                .ok_or(Error::SingularMatrix)?
                .mul(ex);
            for j in 1..i {
                x[j] = x[j].sub(prev_x[i - j].cross().mul(bx));
            }
            x[i] = Block::default().sub(bx);
            prev_x[1..=i].copy_from_slice(&x[1..=i]);

            vx = vx.sub(ex.cross().mul(bx));

            let target = bar(i);
            let g = vx
                .cross()
                .inverse()
                .ok_or(Error::SingularMatrix)?
                .apply([target[0] - ep[0], target[1] - ep[1]]);
            for j in 0..i {
                let u = x[i - j].cross().apply(g);
                p[j][0] += u[0];
                p[j][1] += u[1];
            }
            p[i] = g;
        }

        for (s, pi) in scratch.solution.iter_mut().zip(p.iter()) {
            *s = pi[0];
        }
        if scratch.solution.iter().any(|v| !v.is_finite()) {
            return Err(Error::SingularMatrix);
        }
        Ok(())
    }

    fn symmetric_fallback(
        &self,
        t: &[f64],
        h: &[f64],
        b: &[f64],
        scratch: &mut ToeplitzPlusHankelScratch,
    ) -> Result<(), Error> {
        let n = self.num_order;
        scratch.matrix.resize(n + 1)?;
        for i in 0..=n {
            for j in 0..=i {
                scratch.matrix[(i, j)] = t[n + i - j] + h[i + j];
            }
        }
        SymmetricSolver::new(n).run(
            &scratch.matrix,
            b,
            &mut scratch.solution,
            &mut scratch.fallback,
        )
    }
}
