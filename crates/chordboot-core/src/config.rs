//! Host configuration for chordboot itself.
//!
//! This is where the catalog tiers, the settings file, the kexec binary, and
//! the volume table live. The boot catalog (bootables, tunables, chords) is
//! kept in its own line-oriented files; see [`crate::catalog`].

use crate::catalog::TierPaths;
use crate::cmdline::DEFAULT_CMDLINE_CAPACITY;
use crate::error::{BootError, BootResult};
use log::info;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/chordboot.toml";
pub const CONFIG_PATH_ENV: &str = "CHORDBOOT_CONFIG";

/// Where the two catalog tiers are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TiersCfg {
    #[serde(default = "default_system_dir")]
    pub system_dir: PathBuf,

    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,

    /// Mounted before the local tier is read.
    #[serde(default = "default_local_mount")]
    pub local_mount: PathBuf,
}

fn default_system_dir() -> PathBuf {
    PathBuf::from("/etc")
}

fn default_local_dir() -> PathBuf {
    PathBuf::from("/boot")
}

fn default_local_mount() -> PathBuf {
    PathBuf::from("/boot")
}

impl Default for TiersCfg {
    fn default() -> Self {
        Self {
            system_dir: default_system_dir(),
            local_dir: default_local_dir(),
            local_mount: default_local_mount(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SettingsCfg {
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("/boot/settings")
}

impl Default for SettingsCfg {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

/// Menu presentation and the auto-boot window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MenuCfg {
    #[serde(default = "default_title")]
    pub title: String,

    /// Root of the removable-media browser and of the mass-storage export.
    #[serde(default = "default_removable_root")]
    pub removable_root: PathBuf,

    #[serde(default = "default_key_chord_timeout_secs")]
    pub key_chord_timeout_secs: u64,
}

fn default_title() -> String {
    "chordboot".to_string()
}

fn default_removable_root() -> PathBuf {
    PathBuf::from("/sdcard")
}

fn default_key_chord_timeout_secs() -> u64 {
    2
}

impl Default for MenuCfg {
    fn default() -> Self {
        Self {
            title: default_title(),
            removable_root: default_removable_root(),
            key_chord_timeout_secs: default_key_chord_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct KexecCfg {
    #[serde(default = "default_kexec_binary")]
    pub binary: PathBuf,

    #[serde(default = "default_kexec_timeout_secs")]
    pub timeout_secs: u64,

    /// Run `kexec -e` after a successful load.
    #[serde(default = "default_kexec_execute")]
    pub execute: bool,

    /// Byte budget for the rendered `--command-line=` argument.
    #[serde(default = "default_cmdline_capacity")]
    pub cmdline_capacity: usize,
}

fn default_kexec_binary() -> PathBuf {
    PathBuf::from("/sbin/kexec")
}

fn default_kexec_timeout_secs() -> u64 {
    30
}

fn default_kexec_execute() -> bool {
    true
}

fn default_cmdline_capacity() -> usize {
    DEFAULT_CMDLINE_CAPACITY
}

impl Default for KexecCfg {
    fn default() -> Self {
        Self {
            binary: default_kexec_binary(),
            timeout_secs: default_kexec_timeout_secs(),
            execute: default_kexec_execute(),
            cmdline_capacity: default_cmdline_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InputCfg {
    #[serde(default = "default_device_dir")]
    pub device_dir: PathBuf,
}

fn default_device_dir() -> PathBuf {
    PathBuf::from("/dev/input")
}

impl Default for InputCfg {
    fn default() -> Self {
        Self {
            device_dir: default_device_dir(),
        }
    }
}

/// USB gadget LUN used by the mass-storage action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MassStorageCfg {
    #[serde(default)]
    pub lun_file: Option<PathBuf>,

    /// Block device exported through `lun_file`.
    #[serde(default)]
    pub device: Option<PathBuf>,
}

/// One entry of the volume table used to mount paths on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VolumeCfg {
    pub mount_point: PathBuf,
    pub device: String,

    #[serde(default = "default_fs_type")]
    pub fs_type: String,

    #[serde(default)]
    pub options: Option<String>,
}

fn default_fs_type() -> String {
    "auto".to_string()
}

/// Top-level configuration snapshot loaded from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChordbootConfig {
    #[serde(default)]
    pub tiers: TiersCfg,

    #[serde(default)]
    pub settings: SettingsCfg,

    #[serde(default)]
    pub menu: MenuCfg,

    #[serde(default)]
    pub kexec: KexecCfg,

    #[serde(default)]
    pub input: InputCfg,

    #[serde(default)]
    pub mass_storage: MassStorageCfg,

    #[serde(default)]
    pub volumes: Vec<VolumeCfg>,

    #[serde(skip)]
    pub path: PathBuf,
}

impl ChordbootConfig {
    /// Return the canonical system-wide configuration path.
    pub fn default_path() -> &'static Path {
        Path::new(DEFAULT_CONFIG_PATH)
    }

    /// Load `path`, falling back to built-in defaults when it does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> BootResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        info!(
            "no configuration at {}; using built-in defaults",
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            ..Self::default()
        })
    }

    /// Read a config file from disk; `.toml` is TOML, anything else YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> BootResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let is_toml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some(ext) if ext.eq_ignore_ascii_case("toml")
        );
        let mut cfg = if is_toml {
            toml::from_str::<Self>(&contents)?
        } else {
            serde_yaml::from_str::<Self>(&contents)?
        };
        cfg.path = path.to_path_buf();

        if cfg.kexec.cmdline_capacity == 0 {
            return Err(BootError::InvalidConfig(
                "kexec.cmdline_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(cfg)
    }

    /// Perform a best-effort validation pass and return human-readable issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.menu.title.trim().is_empty() {
            issues.push("menu.title must not be empty".to_string());
        }
        if self.kexec.cmdline_capacity == 0 {
            issues.push("kexec.cmdline_capacity must be greater than 0".to_string());
        }
        if self.kexec.timeout_secs == 0 {
            issues.push("kexec.timeout_secs must be greater than 0".to_string());
        }
        for (key, dir) in [
            ("tiers.system_dir", &self.tiers.system_dir),
            ("tiers.local_dir", &self.tiers.local_dir),
            ("tiers.local_mount", &self.tiers.local_mount),
            ("menu.removable_root", &self.menu.removable_root),
        ] {
            if !dir.is_absolute() {
                issues.push(format!("{key} must be an absolute path: {}", dir.display()));
            }
        }
        if self.mass_storage.lun_file.is_some() != self.mass_storage.device.is_some() {
            issues.push("mass_storage.lun_file and mass_storage.device must be set together".to_string());
        }

        let mut seen = HashSet::new();
        for volume in &self.volumes {
            if volume.device.trim().is_empty() {
                issues.push(format!(
                    "volume {} has an empty device",
                    volume.mount_point.display()
                ));
            }
            if !seen.insert(volume.mount_point.clone()) {
                issues.push(format!(
                    "duplicate volume mount point detected: {}",
                    volume.mount_point.display()
                ));
            }
        }

        issues
    }

    pub fn system_tier(&self) -> TierPaths {
        TierPaths::in_dir(&self.tiers.system_dir)
    }

    pub fn local_tier(&self) -> TierPaths {
        TierPaths::in_dir(&self.tiers.local_dir)
    }

    /// Translate the stored timeout into a `Duration`.
    pub fn key_chord_timeout(&self) -> Duration {
        Duration::from_secs(self.menu.key_chord_timeout_secs)
    }

    pub fn kexec_timeout(&self) -> Duration {
        Duration::from_secs(self.kexec.timeout_secs)
    }
}
