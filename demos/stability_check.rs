//! Check and repair mel-cepstra that would drive an MLSA filter unstable.

use cepstra::stability::{CheckMode, MlsaStabilityCheck, Modification, StabilityCheckScratch};
use cepstra::DEFAULT_STABILITY_THRESHOLD;

fn main() -> Result<(), cepstra::Error> {
    let order = 8;
    let alpha = 0.42;
    let frames = [
        vec![1.0, 0.8, 0.3, 0.1, -0.05, 0.02, 0.0, 0.0, 0.0],
        vec![2.0, 4.5, 2.5, 1.0, 0.5, 0.2, 0.1, 0.0, 0.0],
    ];

    for (name, mode) in [
        ("fast", CheckMode::Fast),
        (
            "fft + clipping",
            CheckMode::Fft {
                fft_length: 256,
                modification: Modification::Clipping,
            },
        ),
        (
            "fft + scaling",
            CheckMode::Fft {
                fft_length: 256,
                modification: Modification::Scaling,
            },
        ),
    ] {
        println!("== {name} ==");
        let check = MlsaStabilityCheck::new(order, alpha, DEFAULT_STABILITY_THRESHOLD, mode)?;
        let mut scratch = StabilityCheckScratch::default();
        let mut modified = vec![0.0; order + 1];
        for (n, c) in frames.iter().enumerate() {
            let before = check.run(c, Some(&mut modified[..]), &mut scratch)?;
            let after = check.run(&modified, None, &mut scratch)?;
            println!(
                "frame {n}: stable {} (peak {:.3}) -> peak after reshaping {:.3}",
                before.is_stable, before.maximum_amplitude, after.maximum_amplitude
            );
        }
    }
    Ok(())
}
