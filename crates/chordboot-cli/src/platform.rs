//! The real host: console menu plus the system collaborators.

use crate::console::StdioConsole;
use chordboot_core::error::BootResult;
use chordboot_core::ChordbootConfig;
use chordboot_provider::{KexecLoader, KeyInput, MenuUi, Mounter, PowerControl, StorageExport};
use chordboot_system::{EvdevKeys, SystemKexec, SystemMounter, SystemPower, UsbMassStorage};
use log::warn;
use std::path::Path;

pub(crate) struct HostPlatform {
    ui: StdioConsole,
    keys: EvdevKeys,
    mounter: SystemMounter,
    kexec: SystemKexec,
    power: SystemPower,
}

impl HostPlatform {
    pub(crate) fn from_config(config: &ChordbootConfig) -> Self {
        let keys = EvdevKeys::from_config(config).unwrap_or_else(|err| {
            warn!(
                "no input devices under {}: {err}; key chords disabled",
                config.input.device_dir.display()
            );
            EvdevKeys::empty()
        });

        Self {
            ui: StdioConsole::stdio(UsbMassStorage::from_config(config)),
            keys,
            mounter: SystemMounter::from_config(config),
            kexec: SystemKexec::from_config(config),
            power: SystemPower,
        }
    }
}

impl MenuUi for HostPlatform {
    fn print(&mut self, message: &str) {
        self.ui.print(message);
    }

    fn reset_progress(&mut self) {
        self.ui.reset_progress();
    }

    fn set_display_toggle(&mut self, allowed: bool) {
        self.ui.set_display_toggle(allowed);
    }

    fn display_toggle(&self) -> bool {
        self.ui.display_toggle()
    }

    fn select(&mut self, headers: &[String], labels: &[String], initial: usize) -> Option<usize> {
        self.ui.select(headers, labels, initial)
    }
}

impl StorageExport for HostPlatform {
    fn export_storage(&mut self) {
        self.ui.export_storage();
    }
}

impl KeyInput for HostPlatform {
    fn key_pressed(&self, code: u32) -> bool {
        self.keys.key_pressed(code)
    }
}

impl Mounter for HostPlatform {
    type Error = <SystemMounter as Mounter>::Error;

    fn ensure_mounted(&self, path: &Path) -> BootResult<()> {
        self.mounter.ensure_mounted(path)
    }

    fn ensure_unmounted(&self, path: &Path) -> BootResult<()> {
        self.mounter.ensure_unmounted(path)
    }
}

impl KexecLoader for HostPlatform {
    type Error = <SystemKexec as KexecLoader>::Error;

    fn load_and_execute(&self, image: &Path, cmdline: &str) -> BootResult<()> {
        self.kexec.load_and_execute(image, cmdline)
    }
}

impl PowerControl for HostPlatform {
    type Error = <SystemPower as PowerControl>::Error;

    fn sync(&self) {
        self.power.sync();
    }

    fn reboot(&self) -> BootResult<()> {
        self.power.reboot()
    }

    fn power_off(&self) -> BootResult<()> {
        self.power.power_off()
    }
}
