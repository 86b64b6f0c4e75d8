use std::{fs, process::Command};

fn ar_summon(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ar-summon"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch ar-summon binary")
}

#[test]
fn simulate_prints_a_deterministic_summary() {
    let args = ["simulate", "--seed", "17", "--duration", "8"];
    let first = ar_summon(&args);
    let second = ar_summon(&args);

    assert!(first.status.success(), "simulate should succeed");
    let stdout = String::from_utf8(first.stdout).expect("utf-8 summary");
    assert!(stdout.contains("simulated:        8.0s"));
    assert!(stdout.contains("quality:          normal"));
    assert_eq!(stdout.as_bytes(), second.stdout.as_slice());
}

#[test]
fn synth_reports_every_sound() {
    let output = ar_summon(&["synth", "--seed", "3"]);
    assert!(output.status.success(), "synth should succeed");
    let stdout = String::from_utf8(output.stdout).expect("utf-8 report");
    for name in ["magic_circle", "frog", "egg_heartbeat", "ui"] {
        assert!(stdout.contains(name), "missing {name} in {stdout}");
    }
    assert!(stdout.contains("88200 frames"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = std::env::temp_dir().join(format!("ar-summon-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("broken.toml");
    fs::write(&path, "[world.effect]\nduration_ms = -5\n").expect("write config");

    let output = ar_summon(&["--config", path.to_str().expect("utf-8 path"), "synth"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load session config"));

    fs::remove_file(&path).expect("remove config");
}
