use cepstra::stability::{CheckMode, MlsaStabilityCheck, Modification, StabilityCheckScratch};
use cepstra::DEFAULT_STABILITY_THRESHOLD;
use rand::{rngs::StdRng, Rng, SeedableRng};

const EPSILON: f64 = 1e-9;

fn fft_mode(modification: Modification) -> CheckMode {
    CheckMode::Fft {
        fft_length: 256,
        modification,
    }
}

#[test]
fn large_first_coefficient_is_reshaped() {
    let theta = DEFAULT_STABILITY_THRESHOLD;
    for alpha in [0.0, 0.42] {
        let check = MlsaStabilityCheck::new(10, alpha, theta, fft_mode(Modification::Scaling)).unwrap();
        let mut scratch = StabilityCheckScratch::default();
        let mut c = vec![0.0; 11];
        c[1] = 5.0;
        let mut reshaped = vec![0.0; 11];

        let report = check.run(&c, Some(&mut reshaped[..]), &mut scratch).unwrap();
        assert!(!report.is_stable);
        assert!(report.maximum_amplitude > theta);

        let after = check.run(&reshaped, None, &mut scratch).unwrap();
        assert!(after.maximum_amplitude <= theta + EPSILON, "alpha {alpha}");
    }
}

#[test]
fn scaling_bounds_random_cepstra() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut scratch = StabilityCheckScratch::default();
    for _ in 0..50 {
        let order = rng.gen_range(1..25);
        let alpha = rng.gen_range(-0.6..0.6);
        let c: Vec<f64> = (0..=order).map(|_| rng.gen_range(-3.0..3.0)).collect();
        let mut reshaped = vec![0.0; order + 1];

        let check = MlsaStabilityCheck::new(order, alpha, 1.0, fft_mode(Modification::Scaling)).unwrap();
        check.run(&c, Some(&mut reshaped[..]), &mut scratch).unwrap();
        let after = check.run(&reshaped, None, &mut scratch).unwrap();
        assert!(after.maximum_amplitude <= 1.0 + EPSILON);

        let fast = MlsaStabilityCheck::new(order, alpha, 1.0, CheckMode::Fast).unwrap();
        fast.run(&c, Some(&mut reshaped[..]), &mut scratch).unwrap();
        let after = fast.run(&reshaped, None, &mut scratch).unwrap();
        assert!(after.maximum_amplitude <= 1.0 + EPSILON);
    }
}

#[test]
fn clipping_brings_peak_down() {
    let check = MlsaStabilityCheck::new(10, 0.0, 4.5, fft_mode(Modification::Clipping)).unwrap();
    let mut scratch = StabilityCheckScratch::default();
    let mut c = vec![0.0; 11];
    c[1] = 5.0;
    c[2] = 1.0;
    let mut reshaped = vec![0.0; 11];
    let before = check.run(&c, Some(&mut reshaped[..]), &mut scratch).unwrap();
    let after = check.run(&reshaped, None, &mut scratch).unwrap();
    assert!(after.maximum_amplitude < before.maximum_amplitude);
}
