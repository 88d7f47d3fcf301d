//! Demonstrates enabling verbose logging for cepstra.
use cepstra::mgcep::{MelGeneralizedCepstralAnalysis, MgcepScratch};

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let periodogram: Vec<f64> = (0..=64)
        .map(|k| 1.0 + 0.5 * (std::f64::consts::PI * k as f64 / 64.0).cos())
        .collect();
    let analysis = MelGeneralizedCepstralAnalysis::new(128, 12, 0.35, -0.5, 30, 1e-6).unwrap();
    let mut mgc = vec![0.0; 13];
    analysis
        .run(&periodogram, &mut mgc, &mut MgcepScratch::default())
        .unwrap();
}
