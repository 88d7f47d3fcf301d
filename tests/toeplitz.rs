use cepstra::matrix::{SymmetricMatrix, SymmetricSolver, SymmetricSolverScratch};
use cepstra::toeplitz::{ToeplitzPlusHankelScratch, ToeplitzPlusHankelSolver};
use cepstra::Error;
use rand::{rngs::StdRng, Rng, SeedableRng};

const EPSILON: f64 = 1e-8;

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Symmetric Toeplitz generator `t(N..0..N)` with a dominant diagonal.
fn toeplitz_generator(rng: &mut StdRng, n: usize) -> Vec<f64> {
    let mut half: Vec<f64> = (0..=n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    half[0] = 2.0 * (n as f64 + 1.0);
    half[1..].iter().rev().chain(half.iter()).copied().collect()
}

#[test]
fn random_systems_have_small_residual() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut scratch = ToeplitzPlusHankelScratch::default();
    for n in 0..=16 {
        for _ in 0..10 {
            let t = toeplitz_generator(&mut rng, n);
            let h: Vec<f64> = (0..=2 * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let r: Vec<f64> = (0..=n).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let mut x = vec![0.0; n + 1];
            ToeplitzPlusHankelSolver::new(n, true)
                .run(&t, &h, &r, &mut x, &mut scratch)
                .unwrap();

            let residual: Vec<f64> = (0..=n)
                .map(|i| {
                    (0..=n).map(|j| (t[n + i - j] + h[i + j]) * x[j]).sum::<f64>() - r[i]
                })
                .collect();
            assert!(norm(&residual) / norm(&r) < EPSILON, "order {n}");
        }
    }
}

#[test]
fn agrees_with_symmetric_solver() {
    let mut rng = StdRng::seed_from_u64(6);
    let n = 9;
    let t = toeplitz_generator(&mut rng, n);
    let h: Vec<f64> = (0..=2 * n).map(|k| 0.3 / (1.0 + k as f64)).collect();
    let r: Vec<f64> = (0..=n).map(|_| rng.gen_range(-1.0..1.0)).collect();

    let mut x = vec![0.0; n + 1];
    ToeplitzPlusHankelSolver::new(n, false)
        .run(&t, &h, &r, &mut x, &mut ToeplitzPlusHankelScratch::default())
        .unwrap();

    let mut a = SymmetricMatrix::new(n + 1);
    for i in 0..=n {
        for j in 0..=i {
            a[(i, j)] = t[n + i - j] + h[i + j];
        }
    }
    let mut y = vec![0.0; n + 1];
    SymmetricSolver::new(n)
        .run(&a, &r, &mut y, &mut SymmetricSolverScratch::default())
        .unwrap();
    for (p, q) in x.iter().zip(&y) {
        assert!((p - q).abs() < 1e-10);
    }
}

#[test]
fn singular_system_reports_error() {
    let mut x = vec![7.0; 3];
    let result = ToeplitzPlusHankelSolver::new(2, false).run(
        &[1.0; 5],
        &[0.0; 5],
        &[1.0, 2.0, 3.0],
        &mut x,
        &mut ToeplitzPlusHankelScratch::default(),
    );
    assert_eq!(result, Err(Error::SingularMatrix));
    assert_eq!(x, vec![7.0; 3]);
}
