//! `sync(2)` and `reboot(2)`.

use chordboot_core::error::{BootError, BootResult};
use chordboot_provider::PowerControl;
use log::info;
use std::io;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPower;

impl PowerControl for SystemPower {
    type Error = BootError;

    fn sync(&self) {
        // SAFETY: sync(2) takes no arguments and cannot fail.
        unsafe { libc::sync() };
    }

    fn reboot(&self) -> BootResult<()> {
        info!("requesting reboot");
        reboot(libc::RB_AUTOBOOT)
    }

    fn power_off(&self) -> BootResult<()> {
        info!("requesting power off");
        reboot(libc::RB_POWER_OFF)
    }
}

/// Only returns when the kernel refused the request.
fn reboot(how: libc::c_int) -> BootResult<()> {
    // SAFETY: reboot(2) with a valid command constant has no memory effects.
    let rc = unsafe { libc::reboot(how) };
    if rc < 0 {
        return Err(BootError::Io(io::Error::last_os_error()));
    }
    Ok(())
}
