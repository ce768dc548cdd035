//! Host-backed collaborators for the chordboot menu core.
//!
//! Integrates with the host via:
//! - `kexec` (load, then execute)
//! - `mount`/`umount` driven by the configured volume table and `/proc/mounts`
//! - evdev `EVIOCGKEY` sampling for held keys
//! - `sync(2)` and `reboot(2)`
//! - the USB gadget LUN file for mass-storage export

mod command;
mod kexec;
mod keys;
mod mounts;
mod power;
mod storage;

pub use kexec::SystemKexec;
pub use keys::EvdevKeys;
pub use mounts::{SystemMounter, MOUNTS_OVERRIDE_ENV};
pub use power::SystemPower;
pub use storage::UsbMassStorage;
