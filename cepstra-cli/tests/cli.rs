use assert_cmd::Command;
use cepstra_cli::{decode_f64s, write_f64s};
use std::io::Write;

fn encode(values: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_f64s(&mut bytes, values).unwrap();
    bytes
}

fn run(bin: &str, args: &[&str], stdin: &[f64]) -> Vec<f64> {
    let output = Command::cargo_bin(bin)
        .unwrap()
        .args(args)
        .write_stdin(encode(stdin))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    decode_f64s(&output).unwrap()
}

#[test]
fn mgcep_flat_periodogram_gives_zero_cepstrum() {
    let input = vec![1.0; 2 * 9];
    let c = run(
        "mgcep",
        &["-m", "4", "-l", "16", "-g", "-0.5", "-q", "periodogram"],
        &input,
    );
    assert_eq!(c.len(), 10);
    for v in c {
        assert!(v.abs() < 1e-6, "{v}");
    }
}

#[test]
fn mgcep_impulse_waveform_from_file() {
    let mut frame = vec![0.0; 16];
    frame[0] = 1.0;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&encode(&frame)).unwrap();

    let output = Command::cargo_bin("mgcep")
        .unwrap()
        .args(["-m", "3", "-l", "16", "-o", "normalized-mlsa"])
        .arg(file.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let c = decode_f64s(&output).unwrap();
    assert_eq!(c.len(), 4);
    // Gain normalization at γ = 0 turns c(0) into K = exp(c(0)) = 1.
    assert!((c[0] - 1.0).abs() < 1e-6, "{c:?}");
    for v in &c[1..] {
        assert!(v.abs() < 1e-6, "{c:?}");
    }
}

#[test]
fn mgcep_decibel_input() {
    let c = run(
        "mgcep",
        &["-m", "2", "-l", "8", "-a", "0", "-c", "2", "-q", "decibel"],
        &[0.0; 5],
    );
    assert_eq!(c.len(), 3);
    assert!(c.iter().all(|v| v.abs() < 1e-6), "{c:?}");
}

#[test]
fn mgcep_rejects_partial_frame() {
    Command::cargo_bin("mgcep")
        .unwrap()
        .args(["-m", "2", "-l", "8", "-q", "periodogram"])
        .write_stdin(encode(&[1.0; 7]))
        .assert()
        .failure();
}

#[cfg(not(feature = "parallel"))]
#[test]
fn mgcep_writes_frames_before_a_partial_one() {
    let output = Command::cargo_bin("mgcep")
        .unwrap()
        .args(["-m", "2", "-l", "8", "-g", "-0.5", "-q", "periodogram"])
        .write_stdin(encode(&[1.0; 12]))
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let c = decode_f64s(&output).unwrap();
    assert_eq!(c.len(), 6);
    for v in c {
        assert!(v.abs() < 1e-6, "{v}");
    }
}

#[test]
fn mgcep_rejects_bad_configuration() {
    Command::cargo_bin("mgcep")
        .unwrap()
        .args(["-m", "8", "-l", "8", "-q", "periodogram"])
        .write_stdin(encode(&[1.0; 5]))
        .assert()
        .failure();
    Command::cargo_bin("mgcep")
        .unwrap()
        .args(["-g", "0.5", "-q", "periodogram"])
        .write_stdin(Vec::new())
        .assert()
        .failure();
}

#[test]
fn mlsacheck_passes_stable_frames_through() {
    let input = [1.0, 0.5, 0.0, 0.3, -0.2, 0.1];
    let out = run("mlsacheck", &["-m", "2", "-l", "16", "-a", "0", "-x"], &input);
    assert_eq!(out, input);
}

#[test]
fn mlsacheck_scales_unstable_frame() {
    let out = run(
        "mlsacheck",
        &["-m", "2", "-l", "16", "-a", "0", "-x", "-e", "ignore"],
        &[0.0, 10.0, 0.0],
    );
    assert!((out[0]).abs() < 1e-9, "{out:?}");
    assert!((out[1] - 4.5).abs() < 1e-9, "{out:?}");
    assert!(out[2].abs() < 1e-9, "{out:?}");
}

#[test]
fn mlsacheck_exit_on_unstable_frame() {
    Command::cargo_bin("mlsacheck")
        .unwrap()
        .args(["-m", "2", "-a", "0", "-f", "-e", "exit"])
        .write_stdin(encode(&[0.0, 10.0, 0.0]))
        .assert()
        .failure();
}
