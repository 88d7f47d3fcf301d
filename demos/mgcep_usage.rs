//! Mel-generalized cepstral analysis of a synthetic vowel-like frame,
//! followed by the conversions usually applied to the result.

use cepstra::gain::GainNormalization;
use cepstra::mgc2mgc::CepstrumFormat;
use cepstra::mgcep::{MelGeneralizedCepstralAnalysis, MgcepScratch};
use cepstra::mlsa::MelCepstrumToMlsa;
use cepstra::spectrum::{MelGeneralizedCepstrumToSpectrum, OutputFormat, SpectrumScratch};
use cepstra::{Complex, RealFft};
use std::f64::consts::PI;

const FFT_LENGTH: usize = 512;
const ORDER: usize = 24;
const ALPHA: f64 = 0.42;
const GAMMA: f64 = -1.0 / 3.0;

fn main() -> Result<(), cepstra::Error> {
    println!("=== cepstra mgcep usage ===\n");

    // Blackman-windowed pulse train through two resonances.
    let resonances = [(0.12, 0.97), (0.3, 0.95)];
    let mut frame = vec![0.0; FFT_LENGTH];
    for (n, x) in frame.iter_mut().enumerate() {
        if n % 80 == 0 {
            *x = 1.0;
        }
    }
    for (f, r) in resonances {
        let (a1, a2) = (2.0 * r * (2.0 * PI * f).cos(), -r * r);
        let (mut y1, mut y2) = (0.0, 0.0);
        for x in frame.iter_mut() {
            let y = *x + a1 * y1 + a2 * y2;
            y2 = y1;
            y1 = y;
            *x = y;
        }
    }
    for (n, x) in frame.iter_mut().enumerate() {
        let t = 2.0 * PI * n as f64 / (FFT_LENGTH - 1) as f64;
        *x *= 0.42 - 0.5 * t.cos() + 0.08 * (2.0 * t).cos();
    }

    // Periodogram
    let fft = RealFft::new(FFT_LENGTH)?;
    let mut spectrum = vec![Complex::new(0.0, 0.0); FFT_LENGTH];
    fft.forward(&frame, &mut spectrum, &mut Vec::new())?;
    let periodogram: Vec<f64> = spectrum[..=FFT_LENGTH / 2]
        .iter()
        .map(|z| z.norm_sqr() + 1e-8)
        .collect();

    // Analysis
    let analysis = MelGeneralizedCepstralAnalysis::new(FFT_LENGTH, ORDER, ALPHA, GAMMA, 30, 1e-6)?;
    let mut mgc = vec![0.0; ORDER + 1];
    analysis.run(&periodogram, &mut mgc, &mut MgcepScratch::default())?;
    println!("1. Mel-generalized cepstrum (alpha {ALPHA}, gamma {GAMMA:.3})");
    println!("   {:?}\n", &mgc[..6]);

    // Fit quality
    let to_spectrum = MelGeneralizedCepstrumToSpectrum::new(
        CepstrumFormat::new(ORDER, ALPHA, GAMMA),
        FFT_LENGTH,
        OutputFormat::Decibel,
    )?;
    let mut envelope = vec![0.0; FFT_LENGTH / 2 + 1];
    to_spectrum.run(&mgc, &mut envelope, None, &mut SpectrumScratch::default())?;
    let peak_bin = envelope
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |best, (k, &v)| if v > best.1 { (k, v) } else { best });
    println!("2. Envelope peak at bin {} ({:.1} dB)\n", peak_bin.0, peak_bin.1);

    // Gain split and filter coefficients for synthesis
    let mut normalized = vec![0.0; ORDER + 1];
    GainNormalization::new(ORDER, GAMMA)?.run(&mgc, &mut normalized)?;
    let mut b = vec![0.0; ORDER + 1];
    MelCepstrumToMlsa::new(ORDER, ALPHA)?.run(&mgc, &mut b)?;
    println!("3. Gain K = {:.6}", normalized[0]);
    println!("   MGLSA coefficients b(0..4) = {:?}", &b[..4]);
    Ok(())
}
