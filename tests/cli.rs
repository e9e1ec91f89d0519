use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_config(xml: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp config");
    tmp.write_all(xml.as_bytes()).expect("write config");
    tmp
}

#[test]
fn headless_run_prints_summary() {
    let mut cmd = Command::cargo_bin("danfo-bus").expect("binary exists");
    cmd.args(["--summary-only", "--frames", "100", "--seed", "1"]);
    cmd.assert()
        .success()
        .stdout(contains(
            "Bootstrapped scene with 12 mascot parts and 6 tools",
        ))
        .stdout(contains("Simulated 100 frames: spawned 2, removed 0, live 2"))
        .stdout(contains("Mascot pose y="));
}

#[test]
fn config_file_replaces_catalog_and_cadence() {
    let config = write_config(
        r##"<decor>
  <seed>3</seed>
  <tools>
    <tool><name>Rust</name><color>#dea584</color><glyph>R</glyph></tool>
    <tool><name>Go</name><color>#00add8</color></tool>
  </tools>
  <scene>
    <spawn-modulus>10</spawn-modulus>
  </scene>
</decor>
"##,
    );
    let mut cmd = Command::cargo_bin("danfo-bus").expect("binary exists");
    cmd.arg("--config")
        .arg(config.path())
        .args(["--summary-only", "--frames", "50"]);
    cmd.assert()
        .success()
        .stdout(contains("Bootstrapped scene with 12 mascot parts and 2 tools"))
        .stdout(contains("Simulated 50 frames: spawned 5,"));
}

#[test]
fn invalid_config_fails_with_reason() {
    let config = write_config("<decor><scene><spin>0.5 0.1</spin></scene></decor>");
    let mut cmd = Command::cargo_bin("danfo-bus").expect("binary exists");
    cmd.arg("--config").arg(config.path()).arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("<spin> range is inverted"));
}
