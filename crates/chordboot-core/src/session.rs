//! Boot session: startup, unattended boot, and shutdown.
//!
//! A [`BootSession`] owns the catalog and the menu built from it for the life
//! of the process. The interactive loop and the action dispatcher live in the
//! navigator module and operate on the same session.

use crate::catalog::{Catalog, TierPaths};
use crate::cmdline::{build_cmdline, CommandLine};
use crate::config::ChordbootConfig;
use crate::error::{BootError, BootResult};
use crate::keychord;
use crate::menu::{build_menu, Action, Menu};
use crate::settings;
use chordboot_provider::Platform;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime knobs derived from [`ChordbootConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub title: String,
    pub system_tier: TierPaths,
    pub local_tier: TierPaths,
    pub local_mount: PathBuf,
    pub settings_path: PathBuf,
    pub removable_root: PathBuf,
    pub key_chord_timeout: Duration,
    pub cmdline_capacity: usize,
}

impl SessionOptions {
    pub fn from_config(config: &ChordbootConfig) -> Self {
        Self {
            title: config.menu.title.clone(),
            system_tier: config.system_tier(),
            local_tier: config.local_tier(),
            local_mount: config.tiers.local_mount.clone(),
            settings_path: config.settings.path.clone(),
            removable_root: config.menu.removable_root.clone(),
            key_chord_timeout: config.key_chord_timeout(),
            cmdline_capacity: config.kexec.cmdline_capacity,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&ChordbootConfig::default())
    }
}

/// What the process does once the menu loop ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDisposition {
    /// Exit without a power action so the supervisor restarts chordboot.
    Reload,
    Reboot,
    PowerOff,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    pub exit: Option<ExitDisposition>,
    /// Set once any tunable is edited from the menu.
    pub settings_modified: bool,
}

pub struct BootSession<P> {
    pub(crate) platform: P,
    pub(crate) catalog: Catalog,
    pub(crate) menu: Menu,
    pub(crate) options: SessionOptions,
    pub(crate) state: RunState,
}

impl<P: Platform> BootSession<P> {
    /// Session with an empty catalog; call [`Self::load_configuration`] next.
    pub fn new(platform: P, options: SessionOptions) -> Self {
        Self::with_catalog(platform, options, Catalog::new())
    }

    /// Session over an already populated catalog.
    pub fn with_catalog(platform: P, options: SessionOptions, catalog: Catalog) -> Self {
        let menu = build_menu(&catalog, &options.removable_root);
        Self {
            platform,
            catalog,
            menu,
            options,
            state: RunState::default(),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn into_platform(self) -> P {
        self.platform
    }

    /// Load both tiers and the saved settings, then rebuild the menu.
    ///
    /// The local tier's mount stays in place so settings can be saved at
    /// shutdown.
    pub fn load_configuration(&mut self) {
        let banner = self.options.title.clone();
        self.platform.print(&banner);

        let system = self.options.system_tier.clone();
        self.catalog.load_tier(&system);

        let local_mount = self.options.local_mount.clone();
        self.mount_or_report(&local_mount);
        let local = self.options.local_tier.clone();
        self.catalog.load_tier(&local);

        let applied = settings::load_settings(
            self.catalog.tunables_mut(),
            &self.options.settings_path,
        );
        debug!("applied {applied} saved settings");

        self.rebuild_menu();
        info!(
            "catalog loaded: {} bootables, {} tunables, {} key chords",
            self.catalog.bootables().len(),
            self.catalog.tunables().len(),
            self.catalog.chords().len()
        );
    }

    pub fn rebuild_menu(&mut self) {
        self.menu = build_menu(&self.catalog, &self.options.removable_root);
    }

    /// Kernel command line for the current selections.
    pub fn command_line(&self) -> CommandLine {
        build_cmdline(self.catalog.tunables(), self.options.cmdline_capacity)
    }

    /// Wait out the chord window, then sample the held keys once.
    pub fn check_key_chords(&self) -> Option<usize> {
        let chord = keychord::wait_and_detect(
            self.catalog.chords(),
            &self.platform,
            self.options.key_chord_timeout,
        );
        debug!("key chord check: {chord:?}");
        chord
    }

    /// Act on the chord check before the menu is shown.
    ///
    /// No chord boots the first bootable, chord 0 goes straight to the menu,
    /// and chord `n` boots bootable `n`. Every path that returns here falls
    /// back to the menu.
    pub fn auto_boot(&mut self, chord: Option<usize>) {
        match chord {
            None => {
                let Some(path) = self.catalog.default_bootable().map(|b| b.path.clone()) else {
                    self.platform
                        .print("No default boot image defined, entering menu...");
                    return;
                };
                self.platform.print("Booting default...");
                self.execute_action(Action::Boot, Some(&path));
                self.platform.print("Boot failed, entering menu.");
            }
            Some(0) => self.platform.print("Entering boot menu..."),
            Some(position) => {
                self.platform
                    .print(&format!("Booting position {position}..."));
                match self.catalog.bootables().get(position).map(|b| b.path.clone()) {
                    Some(path) => {
                        self.execute_action(Action::Boot, Some(&path));
                        self.platform.print("Boot failed, entering menu...");
                    }
                    None => {
                        warn!("key chord {position} has no matching bootable");
                        self.platform.print(&format!(
                            "No boot image at position {position}, entering menu..."
                        ));
                    }
                }
            }
        }
    }

    /// Full lifecycle: load, auto-boot, menu, shutdown.
    pub fn run(&mut self) -> BootResult<ExitDisposition> {
        self.load_configuration();
        let chord = self.check_key_chords();
        self.auto_boot(chord);
        let disposition = self.prompt_and_wait();
        self.finish(disposition)?;
        Ok(disposition)
    }

    /// Persist edited settings, flush, and carry out `disposition`.
    pub fn finish(&mut self, disposition: ExitDisposition) -> BootResult<()> {
        match disposition {
            ExitDisposition::Reboot => self.platform.print("Rebooting..."),
            ExitDisposition::PowerOff => self.platform.print("Shutting down..."),
            ExitDisposition::Reload => info!("reloading configuration"),
        }

        if self.state.settings_modified {
            match settings::save_settings(self.catalog.tunables(), &self.options.settings_path) {
                Ok(()) => {
                    info!("saved settings to {}", self.options.settings_path.display());
                    self.state.settings_modified = false;
                }
                Err(err) => {
                    warn!(
                        "failed to save settings to {}: {err}",
                        self.options.settings_path.display()
                    );
                    self.platform.print("Failed to save settings");
                }
            }
        }

        self.platform.sync();
        match disposition {
            ExitDisposition::Reboot => self.platform.reboot().map_err(BootError::provider),
            ExitDisposition::PowerOff => self.platform.power_off().map_err(BootError::provider),
            ExitDisposition::Reload => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn options_follow_the_config_file() {
        let mut config = ChordbootConfig::default();
        config.tiers.local_dir = PathBuf::from("/data/boot");
        config.menu.key_chord_timeout_secs = 0;
        config.kexec.cmdline_capacity = 512;

        let options = SessionOptions::from_config(&config);
        assert_eq!(options.system_tier.chords, Path::new("/etc/chords"));
        assert_eq!(options.local_tier.tunables, Path::new("/data/boot/tunables"));
        assert_eq!(options.local_mount, Path::new("/boot"));
        assert_eq!(options.key_chord_timeout, Duration::ZERO);
        assert_eq!(options.cmdline_capacity, 512);
    }

    #[test]
    fn default_options_match_default_config() {
        let options = SessionOptions::default();
        assert_eq!(options.title, "chordboot");
        assert_eq!(options.settings_path, Path::new("/boot/settings"));
        assert_eq!(options.removable_root, Path::new("/sdcard"));
        assert_eq!(options.key_chord_timeout, Duration::from_secs(2));
    }
}
