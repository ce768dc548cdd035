//! Menu tree projected from the boot catalog.
//!
//! The top-level menu lists, in order: one boot entry per bootable, a
//! separator, one submenu per tunable, then a fixed tail (separator,
//! removable-media browser, mass storage, reload, reboot, power off).
//! Tunable submenus refer back to their tunable by [`TunableId`] so choosing
//! an entry edits the catalog itself.

use crate::catalog::{Catalog, Tunable, TunableId};
use std::path::{Path, PathBuf};

pub const TUNABLES_SEPARATOR: &str = "- - - Tunables - - - -";
pub const MISC_SEPARATOR: &str = "- - -   Misc   - - - -";
pub const REMOVABLE_MEDIA_LABEL: &str = "Boot kernel from SD card";
pub const MASS_STORAGE_LABEL: &str = "Mount mass storage";
pub const RELOAD_LABEL: &str = "Reload chordboot";
pub const REBOOT_LABEL: &str = "Reboot";
pub const POWER_OFF_LABEL: &str = "Power off";
pub const EMPTY_VALUE_LABEL: &str = "(none)";
pub const FLAG_OFF_LABEL: &str = "(off)";
pub const FLAG_ON_LABEL: &str = "(on)";

/// Things a menu entry can ask the dispatcher to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Boot,
    MassStorage,
    Reload,
    Reboot,
    PowerOff,
}

impl Action {
    /// Reload, reboot, and power off end the navigation loop.
    pub fn is_terminal(self) -> bool {
        matches!(self, Action::Reload | Action::Reboot | Action::PowerOff)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    /// Browse for an image below `root`, then run `action` on it.
    FileList { action: Action, root: PathBuf },
    Submenu(Menu),
    Action {
        action: Action,
        path: Option<PathBuf>,
    },
    /// Write `value` into the referenced tunable.
    TunableChoice { tunable: TunableId, value: i64 },
    Separator,
}

/// Items with their display labels.
///
/// `labels()[i]` always describes `items()[i]`; the end of the slice plays
/// the role of the terminating label slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Menu {
    labels: Vec<String>,
    items: Vec<MenuItem>,
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, item: MenuItem) {
        self.labels.push(label.into());
        self.items.push(item);
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&MenuItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Follow submenu indices from this menu; an empty path is `self`.
    pub fn resolve(&self, path: &[usize]) -> Option<&Menu> {
        path.iter().try_fold(self, |menu, index| match menu.item(*index) {
            Some(MenuItem::Submenu(child)) => Some(child),
            _ => None,
        })
    }
}

/// Build the top-level menu from a catalog snapshot.
pub fn build_menu(catalog: &Catalog, removable_root: &Path) -> Menu {
    let mut menu = Menu::new();

    for bootable in catalog.bootables() {
        menu.push(
            bootable.label.clone(),
            MenuItem::Action {
                action: Action::Boot,
                path: Some(bootable.path.clone()),
            },
        );
    }

    menu.push(TUNABLES_SEPARATOR, MenuItem::Separator);
    for (index, tunable) in catalog.tunables().iter().enumerate() {
        menu.push(
            tunable.label.clone(),
            MenuItem::Submenu(build_tunable_menu(TunableId(index), tunable)),
        );
    }

    append_static_tail(&mut menu, removable_root);
    menu
}

/// One entry per candidate value, or `(off)`/`(on)` for flags.
pub fn build_tunable_menu(id: TunableId, tunable: &Tunable) -> Menu {
    let mut menu = Menu::new();
    if tunable.is_flag() {
        menu.push(FLAG_OFF_LABEL, MenuItem::TunableChoice { tunable: id, value: 0 });
        menu.push(FLAG_ON_LABEL, MenuItem::TunableChoice { tunable: id, value: 1 });
        return menu;
    }

    for (index, value) in tunable.values().iter().enumerate() {
        let label = if value.is_empty() {
            EMPTY_VALUE_LABEL
        } else {
            value.as_str()
        };
        menu.push(
            label,
            MenuItem::TunableChoice {
                tunable: id,
                value: index as i64,
            },
        );
    }
    menu
}

fn append_static_tail(menu: &mut Menu, removable_root: &Path) {
    menu.push(MISC_SEPARATOR, MenuItem::Separator);
    menu.push(
        REMOVABLE_MEDIA_LABEL,
        MenuItem::FileList {
            action: Action::Boot,
            root: removable_root.to_path_buf(),
        },
    );
    for (label, action) in [
        (MASS_STORAGE_LABEL, Action::MassStorage),
        (RELOAD_LABEL, Action::Reload),
        (REBOOT_LABEL, Action::Reboot),
        (POWER_OFF_LABEL, Action::PowerOff),
    ] {
        menu.push(label, MenuItem::Action { action, path: None });
    }
}
