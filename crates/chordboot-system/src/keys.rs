//! Held-key sampling over evdev nodes.

use chordboot_core::error::BootResult;
use chordboot_core::ChordbootConfig;
use chordboot_provider::KeyInput;
use log::{debug, warn};
use std::fs::{self, File};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

const KEY_MAX: usize = 0x2ff;
const KEY_BITS_LEN: usize = KEY_MAX / 8 + 1;

const IOC_READ: libc::c_ulong = 2;

/// `EVIOCGKEY(len)`: read the global key state bitmap of a device.
const fn eviocgkey(len: usize) -> libc::c_ulong {
    (IOC_READ << 30) | ((len as libc::c_ulong) << 16) | ((b'E' as libc::c_ulong) << 8) | 0x18
}

/// Reports a key as held when any opened input device has it down.
#[derive(Debug, Default)]
pub struct EvdevKeys {
    devices: Vec<(PathBuf, File)>,
}

impl EvdevKeys {
    /// Open every `event*` node in `dir`; nodes that fail to open are skipped.
    pub fn open(dir: &Path) -> BootResult<Self> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("event"))
            .map(|entry| entry.path())
            .collect();
        paths.sort();

        let mut devices = Vec::with_capacity(paths.len());
        for path in paths {
            match File::open(&path) {
                Ok(file) => devices.push((path, file)),
                Err(err) => warn!("skipping input device {}: {err}", path.display()),
            }
        }
        debug!("sampling keys from {} input devices", devices.len());
        Ok(Self { devices })
    }

    pub fn from_config(config: &ChordbootConfig) -> BootResult<Self> {
        Self::open(&config.input.device_dir)
    }

    /// A sampler with no devices; every key reads as released.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

impl KeyInput for EvdevKeys {
    fn key_pressed(&self, code: u32) -> bool {
        self.devices.iter().any(|(path, file)| match key_bits(file) {
            Ok(bits) => bit_is_set(&bits, code),
            Err(err) => {
                debug!("EVIOCGKEY on {} failed: {err}", path.display());
                false
            }
        })
    }
}

fn key_bits(file: &File) -> io::Result<[u8; KEY_BITS_LEN]> {
    let mut bits = [0u8; KEY_BITS_LEN];
    // SAFETY: the kernel writes at most KEY_BITS_LEN bytes into `bits`, the
    // size encoded in the request.
    let rc = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            eviocgkey(KEY_BITS_LEN) as _,
            bits.as_mut_ptr(),
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(bits)
}

fn bit_is_set(bits: &[u8], code: u32) -> bool {
    let code = code as usize;
    bits.get(code / 8)
        .is_some_and(|byte| byte & (1 << (code % 8)) != 0)
}
