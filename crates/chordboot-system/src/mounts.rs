//! Volume-table driven mounting.
//!
//! Paths are mapped to the configured volume whose mount point is their
//! longest prefix. The live mount table decides whether `mount`/`umount`
//! actually need to run.

use crate::command::SystemCommand;
use chordboot_core::config::VolumeCfg;
use chordboot_core::error::{BootError, BootResult};
use chordboot_core::ChordbootConfig;
use chordboot_provider::Mounter;
use log::{debug, info};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MOUNTS_OVERRIDE_ENV: &str = "CHORDBOOT_MOUNTS_PATH";

const DEFAULT_MOUNTS_PATH: &str = "/proc/mounts";
const MOUNT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SystemMounter {
    volumes: Vec<VolumeCfg>,
    mount: SystemCommand,
    umount: SystemCommand,
}

impl SystemMounter {
    pub fn new(
        volumes: Vec<VolumeCfg>,
        mount_binary: impl Into<PathBuf>,
        umount_binary: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            volumes,
            mount: SystemCommand::new(mount_binary, timeout),
            umount: SystemCommand::new(umount_binary, timeout),
        }
    }

    /// Use `mount`/`umount` from `PATH` with the configured volume table.
    pub fn from_config(config: &ChordbootConfig) -> Self {
        Self::new(config.volumes.clone(), "mount", "umount", MOUNT_TIMEOUT)
    }

    /// Volume whose mount point is the longest component-wise prefix of `path`.
    pub fn volume_for(&self, path: &Path) -> Option<&VolumeCfg> {
        self.volumes
            .iter()
            .filter(|volume| path.starts_with(&volume.mount_point))
            .max_by_key(|volume| volume.mount_point.components().count())
    }

    pub fn is_mounted(&self, mount_point: &Path) -> BootResult<bool> {
        let table = read_mount_table()?;
        Ok(mount_points(&table).iter().any(|mp| mp == mount_point))
    }
}

impl Mounter for SystemMounter {
    type Error = BootError;

    fn ensure_mounted(&self, path: &Path) -> BootResult<()> {
        let Some(volume) = self.volume_for(path) else {
            debug!("no volume covers {}; nothing to mount", path.display());
            return Ok(());
        };
        if self.is_mounted(&volume.mount_point)? {
            return Ok(());
        }

        fs::create_dir_all(&volume.mount_point)?;
        let mount_point = volume.mount_point.to_string_lossy();
        let mut args = vec!["-t", volume.fs_type.as_str()];
        if let Some(options) = volume.options.as_deref() {
            args.extend(["-o", options]);
        }
        args.push(volume.device.as_str());
        args.push(mount_point.as_ref());

        self.mount
            .run_checked(&args, &format!("mount {}", volume.mount_point.display()))?;
        info!("mounted {} on {}", volume.device, volume.mount_point.display());
        Ok(())
    }

    fn ensure_unmounted(&self, path: &Path) -> BootResult<()> {
        let Some(volume) = self.volume_for(path) else {
            return Ok(());
        };
        if !self.is_mounted(&volume.mount_point)? {
            return Ok(());
        }

        let mount_point = volume.mount_point.to_string_lossy();
        self.umount.run_checked(
            &[mount_point.as_ref()],
            &format!("umount {}", volume.mount_point.display()),
        )?;
        info!("unmounted {}", volume.mount_point.display());
        Ok(())
    }
}

fn read_mount_table() -> BootResult<String> {
    let path = env::var(MOUNTS_OVERRIDE_ENV).unwrap_or_else(|_| DEFAULT_MOUNTS_PATH.to_string());
    fs::read_to_string(&path)
        .map_err(|err| BootError::Provider(format!("read mounts file {path}: {err}")))
}

fn mount_points(table: &str) -> Vec<PathBuf> {
    table
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(|field| PathBuf::from(unescape_mount_field(field)))
        .collect()
}

/// Decode the `\ooo` octal escapes the kernel uses for spaces and tabs.
fn unescape_mount_field(input: &str) -> String {
    let mut chars = input.chars().peekable();
    let mut output = String::with_capacity(input.len());

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }

        let mut oct = String::new();
        while oct.len() < 3 {
            match chars.peek() {
                Some(next) if next.is_digit(8) => {
                    oct.push(*next);
                    chars.next();
                }
                _ => break,
            }
        }
        match u8::from_str_radix(&oct, 8) {
            Ok(value) if oct.len() == 3 => output.push(value as char),
            _ => {
                output.push('\\');
                output.push_str(&oct);
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::tests::write_executable;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: impl Into<String>) -> Self {
            let prev = env::var(key).ok();
            env::set_var(key, value.into());
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(prev) = &self.prev {
                env::set_var(self.key, prev);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn volume(mount_point: &str, device: &str, options: Option<&str>) -> VolumeCfg {
        VolumeCfg {
            mount_point: PathBuf::from(mount_point),
            device: device.to_string(),
            fs_type: "vfat".to_string(),
            options: options.map(str::to_string),
        }
    }

    fn recording_mounter(dir: &Path, volumes: Vec<VolumeCfg>) -> (SystemMounter, PathBuf) {
        let log = dir.join("calls.log");
        for name in ["mount", "umount"] {
            write_executable(
                &dir.join(name),
                &format!("#!/bin/sh\necho \"{name} $*\" >> \"{}\"\n", log.display()),
            );
        }
        let mounter = SystemMounter::new(
            volumes,
            dir.join("mount"),
            dir.join("umount"),
            Duration::from_secs(5),
        );
        (mounter, log)
    }

    #[test]
    fn unescape_mount_field_decodes_octals() {
        assert_eq!(unescape_mount_field("/media/SD\\040CARD"), "/media/SD CARD");
        assert_eq!(unescape_mount_field("/mnt/boot"), "/mnt/boot");
        assert_eq!(unescape_mount_field("/odd\\9"), "/odd\\9");
    }

    #[test]
    fn mount_points_reads_the_second_field() {
        let table = "/dev/block/mmcblk0p1 /boot vfat rw 0 0\n\n/dev/sda1 /media/SD\\040CARD vfat rw 0 0\n";
        assert_eq!(
            mount_points(table),
            vec![PathBuf::from("/boot"), PathBuf::from("/media/SD CARD")]
        );
    }

    #[test]
    fn longest_prefix_volume_wins() {
        let mounter = SystemMounter::new(
            vec![
                volume("/sdcard", "/dev/block/mmcblk1p1", None),
                volume("/sdcard/ext", "/dev/block/mmcblk1p2", None),
            ],
            "mount",
            "umount",
            MOUNT_TIMEOUT,
        );
        let hit = mounter.volume_for(Path::new("/sdcard/ext/kernel.img")).unwrap();
        assert_eq!(hit.device, "/dev/block/mmcblk1p2");
        let hit = mounter.volume_for(Path::new("/sdcard/extra.img")).unwrap();
        assert_eq!(hit.device, "/dev/block/mmcblk1p1");
        assert!(mounter.volume_for(Path::new("/system/zImage")).is_none());
    }

    #[test]
    fn mounts_only_when_absent_and_unmounts_only_when_present() {
        let _lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let table = dir.path().join("mounts");
        let target = dir.path().join("sdcard");
        let target_str = target.to_string_lossy().into_owned();
        let (mounter, log) = recording_mounter(
            dir.path(),
            vec![volume(&target_str, "/dev/block/mmcblk1p1", Some("ro,noatime"))],
        );
        let _guard = EnvGuard::set(MOUNTS_OVERRIDE_ENV, table.to_string_lossy().into_owned());

        fs::write(&table, "proc /proc proc rw 0 0\n").unwrap();
        mounter.ensure_mounted(&target.join("kernel.img")).unwrap();
        mounter.ensure_unmounted(&target).unwrap();
        assert!(target.is_dir());

        fs::write(&table, format!("/dev/block/mmcblk1p1 {target_str} vfat rw 0 0\n")).unwrap();
        mounter.ensure_mounted(&target).unwrap();
        mounter.ensure_unmounted(&target.join("kernel.img")).unwrap();

        let calls = fs::read_to_string(&log).unwrap();
        assert_eq!(
            calls,
            format!(
                "mount -t vfat -o ro,noatime /dev/block/mmcblk1p1 {target_str}\numount {target_str}\n"
            )
        );
    }

    #[test]
    fn paths_outside_the_volume_table_are_left_alone() {
        let dir = tempdir().unwrap();
        let (mounter, log) = recording_mounter(dir.path(), Vec::new());
        mounter.ensure_mounted(Path::new("/boot/zImage")).unwrap();
        mounter.ensure_unmounted(Path::new("/boot/zImage")).unwrap();
        assert!(!log.exists());
    }
}
