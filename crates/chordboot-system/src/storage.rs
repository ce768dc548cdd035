//! USB mass-storage export through a gadget LUN file.
//!
//! Writing a block device path into the LUN's `file` attribute hands the
//! device to the USB host; writing an empty line takes it back.

use chordboot_core::error::{BootError, BootResult};
use chordboot_core::ChordbootConfig;
use log::info;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbMassStorage {
    lun_file: PathBuf,
    device: PathBuf,
}

impl UsbMassStorage {
    pub fn new(lun_file: impl Into<PathBuf>, device: impl Into<PathBuf>) -> Self {
        Self {
            lun_file: lun_file.into(),
            device: device.into(),
        }
    }

    /// `None` unless both the LUN file and the device are configured.
    pub fn from_config(config: &ChordbootConfig) -> Option<Self> {
        let lun_file = config.mass_storage.lun_file.clone()?;
        let device = config.mass_storage.device.clone()?;
        Some(Self::new(lun_file, device))
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    pub fn export(&self) -> BootResult<()> {
        let device = self.device.to_string_lossy();
        self.write_lun(device.as_ref())?;
        info!("exported {} over USB", self.device.display());
        Ok(())
    }

    pub fn release(&self) -> BootResult<()> {
        self.write_lun("")?;
        info!("released {} from USB", self.device.display());
        Ok(())
    }

    fn write_lun(&self, value: &str) -> BootResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.lun_file)
            .map_err(|err| {
                BootError::Provider(format!(
                    "open LUN file {}: {err}",
                    self.lun_file.display()
                ))
            })?;
        writeln!(file, "{value}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn export_then_release_rewrites_the_lun_file() {
        let dir = tempdir().unwrap();
        let lun = dir.path().join("file");
        fs::write(&lun, "\n").unwrap();
        let storage = UsbMassStorage::new(&lun, "/dev/block/mmcblk1");

        storage.export().unwrap();
        assert_eq!(fs::read_to_string(&lun).unwrap(), "/dev/block/mmcblk1\n");
        storage.release().unwrap();
        assert_eq!(fs::read_to_string(&lun).unwrap(), "\n");
    }

    #[test]
    fn missing_lun_file_is_a_provider_error() {
        let dir = tempdir().unwrap();
        let storage = UsbMassStorage::new(dir.path().join("absent"), "/dev/block/mmcblk1");
        assert!(matches!(storage.export(), Err(BootError::Provider(_))));
    }

    #[test]
    fn config_requires_both_fields() {
        let mut config = ChordbootConfig::default();
        assert_eq!(UsbMassStorage::from_config(&config), None);
        config.mass_storage.lun_file = Some(PathBuf::from("/sys/lun0/file"));
        assert_eq!(UsbMassStorage::from_config(&config), None);
        config.mass_storage.device = Some(PathBuf::from("/dev/block/mmcblk1"));
        assert_eq!(
            UsbMassStorage::from_config(&config).map(|s| s.device().to_path_buf()),
            Some(PathBuf::from("/dev/block/mmcblk1"))
        );
    }
}
