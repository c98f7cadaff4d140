use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::{Builder, NamedTempFile};

fn write_asset() -> NamedTempFile {
    let obj = "\
# two part helmet
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
o Shell
f 1 2 3
o Visor
f 1 3 4
";
    let mut tmp = Builder::new()
        .prefix("helmet")
        .suffix(".obj")
        .tempfile()
        .expect("temp asset");
    tmp.write_all(obj.as_bytes()).expect("write asset");
    tmp
}

fn viewer() -> Command {
    Command::cargo_bin("model-viewer").expect("binary exists")
}

#[test]
fn prints_loaded_state() {
    let asset = write_asset();
    viewer()
        .arg(asset.path())
        .arg("--summary-only")
        .assert()
        .success()
        .stdout(contains("with 2 mesh(es)"))
        .stdout(contains("Shadows: on (light cast=true plane receive=true)"))
        .stdout(contains("Model pos=(0.00, 0.90, 0.00) rot=(0.00, 0.00, 0.00)"))
        .stdout(contains(
            " - Shell color=#ffffff metalness=0.50 cast=true receive=true",
        ))
        .stdout(contains(
            " - Visor color=#ffffff metalness=0.50 cast=true receive=true",
        ));
}

#[test]
fn commands_mutate_every_mesh() {
    let asset = write_asset();
    viewer()
        .arg(asset.path())
        .args(["--summary-only", "--command", "apply-color=#ff8000"])
        .args(["--command", "toggle-gloss", "--command", "toggle-shadows"])
        .assert()
        .success()
        .stdout(contains("Shadows: off (light cast=false plane receive=false)"))
        .stdout(contains(
            " - Shell color=#ff8000 metalness=0.00 cast=false receive=false",
        ))
        .stdout(contains(
            " - Visor color=#ff8000 metalness=0.00 cast=false receive=false",
        ));
}

#[test]
fn invalid_color_leaves_materials_untouched() {
    let asset = write_asset();
    viewer()
        .arg(asset.path())
        .args(["--summary-only", "--command", "apply-color=not-a-color"])
        .assert()
        .success()
        .stdout(contains(" - Shell color=#ffffff"));
}

#[test]
fn early_commands_do_not_touch_the_model() {
    let asset = write_asset();
    viewer()
        .arg(asset.path())
        .args(["--summary-only"])
        .args(["--early-command", "apply-color=#00ff00"])
        .args(["--early-command", "toggle-gloss"])
        .args(["--early-command", "home"])
        .assert()
        .success()
        .stdout(contains(
            " - Shell color=#ffffff metalness=0.50 cast=true receive=true",
        ));
}

#[test]
fn missing_asset_is_reported_without_failing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("missing.obj");
    viewer()
        .arg(&missing)
        .arg("--summary-only")
        .arg("--command")
        .arg("toggle-gloss")
        .assert()
        .success()
        .stdout(contains("Model not loaded: failed to read"))
        .stdout(contains(" - ").not());
}

#[test]
fn config_file_overrides_placement() {
    let asset = write_asset();
    let mut config = NamedTempFile::new().expect("temp config");
    config
        .write_all(
            br#"<viewer>
  <model>
    <position>1 2 3</position>
    <metalness>0.25</metalness>
  </model>
</viewer>"#,
        )
        .expect("write config");
    viewer()
        .arg(asset.path())
        .arg("--config")
        .arg(config.path())
        .args(["--summary-only", "--command", "home"])
        .assert()
        .success()
        .stdout(contains("Model pos=(1.00, 2.00, 3.00)"))
        .stdout(contains("metalness=0.25"))
        .stdout(contains("Camera pos=(0.00, 2.00, 5.00) target=(1.00, 2.00, 3.00)"));
}

#[test]
fn rejects_unknown_commands() {
    viewer()
        .args(["--summary-only", "--command", "explode"])
        .assert()
        .failure()
        .stderr(contains("unknown command"));
}
