//! Interactive menu loop and action dispatcher.

use crate::browser;
use crate::catalog::TunableId;
use crate::menu::{Action, MenuItem};
use crate::session::{BootSession, ExitDisposition};
use chordboot_provider::Platform;
use log::{debug, info, warn};
use std::path::Path;

impl<P: Platform> BootSession<P> {
    /// Show the menu until a terminal action is chosen.
    ///
    /// Cancelling anywhere returns to the top level. Boot and mass-storage
    /// actions always come back here, whatever their outcome.
    pub fn prompt_and_wait(&mut self) -> ExitDisposition {
        let headers = [self.options.title.clone(), String::new()];
        let mut active: Vec<usize> = Vec::new();

        loop {
            self.platform.reset_progress();

            let Some(labels) = self.menu.resolve(&active).map(|menu| menu.labels().to_vec()) else {
                active.clear();
                continue;
            };

            self.platform.set_display_toggle(true);
            let chosen = self.platform.select(&headers, &labels, 0);
            self.platform.set_display_toggle(false);
            debug!("Chosen item: {chosen:?}");

            let Some(index) = chosen else {
                active.clear();
                continue;
            };

            let item = match self.menu.resolve(&active).and_then(|menu| menu.item(index)) {
                Some(MenuItem::Submenu(_)) => {
                    active.push(index);
                    continue;
                }
                Some(item) => item.clone(),
                None => {
                    warn!("menu selection {index} is out of range");
                    continue;
                }
            };

            match item {
                MenuItem::FileList { action, root } => {
                    if let Some(disposition) = self.browse_and_execute(action, &root) {
                        return disposition;
                    }
                }
                MenuItem::Action { action, path } => {
                    if let Some(disposition) = self.execute_action(action, path.as_deref()) {
                        return disposition;
                    }
                }
                MenuItem::TunableChoice { tunable, value } => {
                    self.choose_tunable(tunable, value);
                    active.clear();
                }
                MenuItem::Separator | MenuItem::Submenu(_) => {}
            }
        }
    }

    /// Run one action; `Some` ends the menu loop.
    pub fn execute_action(&mut self, action: Action, path: Option<&Path>) -> Option<ExitDisposition> {
        match action {
            Action::Boot => {
                match path {
                    Some(image) => self.boot(image),
                    None => warn!("boot action without an image"),
                }
                self.platform.print("Kexec failed");
                None
            }
            Action::MassStorage => {
                let root = self.options.removable_root.clone();
                self.unmount_or_report(&root);
                self.platform.export_storage();
                None
            }
            Action::Reload => Some(self.exit_with(ExitDisposition::Reload)),
            Action::Reboot => Some(self.exit_with(ExitDisposition::Reboot)),
            Action::PowerOff => Some(self.exit_with(ExitDisposition::PowerOff)),
        }
    }

    /// Hand `image` to kexec with the current command line.
    ///
    /// Returns only when the new kernel did not take over.
    pub fn boot(&mut self, image: &Path) {
        let cmdline = self.command_line();
        if cmdline.is_truncated() {
            warn!(
                "kernel command line truncated to {} bytes",
                cmdline.capacity()
            );
        }
        self.platform.print(&format!(
            "Booting '{}', cmdline='{}'",
            image.display(),
            cmdline.as_str()
        ));

        if self.mount_or_report(image) {
            if let Err(err) = self.platform.load_and_execute(image, cmdline.as_str()) {
                warn!("kexec of {} failed: {err}", image.display());
                self.platform.print(&err.to_string());
            }
        }
        self.unmount_or_report(image);
    }

    fn browse_and_execute(&mut self, action: Action, root: &Path) -> Option<ExitDisposition> {
        self.mount_or_report(root);
        let chosen = browser::browse(&mut self.platform, &self.options.title, root);
        let outcome = match chosen {
            Some(image) => self.execute_action(action, Some(&image)),
            None => None,
        };
        self.unmount_or_report(root);
        outcome
    }

    fn choose_tunable(&mut self, id: TunableId, value: i64) {
        let Some(tunable) = self.catalog.tunable_mut(id) else {
            warn!("menu refers to unknown tunable {}", id.0);
            return;
        };
        tunable.select(value);
        info!(
            "tunable {} set to {}",
            tunable.name,
            tunable
                .selected_value()
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string())
        );
        self.state.settings_modified = true;
    }

    fn exit_with(&mut self, disposition: ExitDisposition) -> ExitDisposition {
        self.state.exit = Some(disposition);
        disposition
    }

    pub(crate) fn mount_or_report(&mut self, path: &Path) -> bool {
        match self.platform.ensure_mounted(path) {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to mount {}: {err}", path.display());
                self.platform
                    .print(&format!("Can't mount {}", path.display()));
                false
            }
        }
    }

    pub(crate) fn unmount_or_report(&mut self, path: &Path) {
        if let Err(err) = self.platform.ensure_unmounted(path) {
            warn!("failed to unmount {}: {err}", path.display());
            self.platform
                .print(&format!("Can't unmount {}", path.display()));
        }
    }
}
