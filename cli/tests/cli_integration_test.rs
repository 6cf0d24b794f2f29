//! End-to-end runs of the `kctape` binary: encode a binary file to WAV tape
//! audio, decode it back, and compare.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn tmp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("kctape-cli-tests");
    fs::create_dir_all(&dir).expect("failed to create tmp dir");
    dir.join(name)
}

fn run_kctape(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_kctape"))
        .args(args)
        .output()
        .expect("failed to execute kctape");
    assert!(
        output.status.success(),
        "kctape {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stderr).to_string()
        + &String::from_utf8_lossy(&output.stdout)
}

#[test]
fn test_encode_decode_file_round_trip() {
    let input = tmp_path("roundtrip.bin");
    let wav = tmp_path("roundtrip.wav");
    let output = tmp_path("roundtrip_out.bin");
    let data: Vec<u8> = (0..64).map(|i| (i * 7) as u8).collect();
    fs::write(&input, &data).unwrap();

    run_kctape(&[
        "encode",
        input.to_str().unwrap(),
        wav.to_str().unwrap(),
        "--leader",
        "0.25",
    ]);
    assert!(wav.exists(), "encode produced no WAV file");

    let text = run_kctape(&[
        "decode",
        wav.to_str().unwrap(),
        output.to_str().unwrap(),
    ]);
    assert!(text.contains("Wrote 64 bytes"), "unexpected output: {}", text);

    let decoded = fs::read(&output).unwrap();
    assert_eq!(decoded, data);
}

#[test]
fn test_decode_reports_calibration() {
    let input = tmp_path("calib.bin");
    let wav = tmp_path("calib.wav");
    let output = tmp_path("calib_out.bin");
    fs::write(&input, b"calibrate me").unwrap();

    run_kctape(&[
        "encode",
        input.to_str().unwrap(),
        wav.to_str().unwrap(),
        "--leader",
        "0.25",
    ]);
    let text = run_kctape(&[
        "decode",
        wav.to_str().unwrap(),
        output.to_str().unwrap(),
    ]);
    assert!(
        text.contains("Frames per bit"),
        "calibration summary missing: {}",
        text
    );
}

#[test]
fn test_plot_byte_prints_window() {
    let input = tmp_path("plot.bin");
    let wav = tmp_path("plot.wav");
    let output = tmp_path("plot_out.bin");
    fs::write(&input, &[0x41, 0x42, 0x43]).unwrap();

    run_kctape(&[
        "encode",
        input.to_str().unwrap(),
        wav.to_str().unwrap(),
        "--leader",
        "0.25",
    ]);
    let text = run_kctape(&[
        "decode",
        wav.to_str().unwrap(),
        output.to_str().unwrap(),
        "--plot-byte",
        "1",
    ]);
    assert!(
        text.contains("bit boundaries"),
        "diagnostic dump missing: {}",
        text
    );
    assert!(text.contains("42"), "plotted byte value missing: {}", text);
}
