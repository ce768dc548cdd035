use chordboot_core::ChordbootConfig;
use chordboot_provider::KexecLoader;
use chordboot_system::SystemKexec;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

fn write_executable(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

/// Fake kexec that logs one line per invocation and fails `-e` on request.
fn fake_kexec(dir: &Path, fail_exec: bool) -> (PathBuf, PathBuf) {
    let log = dir.join("kexec.log");
    let bin = dir.join("kexec");
    write_executable(
        &bin,
        &format!(
            r#"#!/bin/sh
LOG="{log}"
for arg in "$@"; do
  printf '[%s]' "$arg" >> "$LOG"
done
echo >> "$LOG"
if [ "$1" = "-e" ] && [ "{fail}" = "1" ]; then
  echo "kexec_core: Starting new kernel failed" >&2
  exit 255
fi
exit 0
"#,
            log = log.display(),
            fail = if fail_exec { 1 } else { 0 },
        ),
    );
    (bin, log)
}

#[test]
fn load_passes_the_command_line_as_one_argument() {
    let dir = tempdir().unwrap();
    let (bin, log) = fake_kexec(dir.path(), false);
    let kexec = SystemKexec::new(&bin, Duration::from_secs(5), true);

    kexec
        .load_and_execute(
            Path::new("/sdcard/kernels/test.img"),
            "--command-line=\"console name\"=tty0 quiet ",
        )
        .unwrap();

    let recorded = fs::read_to_string(&log).unwrap();
    assert_eq!(
        recorded,
        "[-l][/sdcard/kernels/test.img][--command-line=\"console name\"=tty0 quiet ]\n[-e]\n"
    );
}

#[test]
fn execute_can_be_disabled() {
    let dir = tempdir().unwrap();
    let (bin, log) = fake_kexec(dir.path(), false);
    let kexec = SystemKexec::new(&bin, Duration::from_secs(5), false);

    kexec
        .load_and_execute(Path::new("/boot/zImage"), "--command-line=")
        .unwrap();
    assert_eq!(
        fs::read_to_string(&log).unwrap(),
        "[-l][/boot/zImage][--command-line=]\n"
    );
}

#[test]
fn failed_exec_surfaces_the_diagnostic() {
    let dir = tempdir().unwrap();
    let (bin, _log) = fake_kexec(dir.path(), true);
    let kexec = SystemKexec::new(&bin, Duration::from_secs(5), true);

    let err = kexec
        .load_and_execute(Path::new("/boot/zImage"), "--command-line=")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "kexec exec failed: kexec_core: Starting new kernel failed (exit code 255)"
    );
}

#[test]
fn config_selects_binary_and_mode() {
    let dir = tempdir().unwrap();
    let (bin, log) = fake_kexec(dir.path(), false);
    let mut config = ChordbootConfig::default();
    config.kexec.binary = bin;
    config.kexec.execute = false;

    SystemKexec::from_config(&config)
        .load(Path::new("/boot/zImage"), "--command-line=quiet ")
        .unwrap();
    assert!(fs::read_to_string(&log)
        .unwrap()
        .starts_with("[-l][/boot/zImage]"));
}
