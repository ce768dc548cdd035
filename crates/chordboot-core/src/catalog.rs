//! Boot catalog: bootable targets, tunables, and key chords.
//!
//! Each kind comes from its own line-oriented file. Files are loaded once per
//! tier (system defaults, then local overrides) and every tier appends to the
//! same ordered collections; nothing is merged or deduplicated at load time.
//! A missing file contributes nothing, and a line that lacks a mandatory
//! field is dropped on its own.

use crate::keychord::{KeyChord, KEY_CHORD_MAX};
use crate::parser::{parse_c_integer, LineParser};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CHORDS_FILE: &str = "chords";
pub const BOOTABLES_FILE: &str = "bootables";
pub const TUNABLES_FILE: &str = "tunables";

/// A labelled image (or directory) that can be handed to kexec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootable {
    pub label: String,
    pub path: PathBuf,
}

/// Stable handle to a tunable inside a [`Catalog`].
///
/// Tunables are never removed, so a handle stays valid for the catalog's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TunableId(pub usize);

/// Current value of a tunable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunableValue {
    /// One of a fixed list of candidates; `selected` always indexes `values`.
    Choice { values: Vec<String>, selected: usize },
    /// No candidate list: a raw integer rendered as off (0) or on.
    Flag(i64),
}

/// A user-visible kernel command-line setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tunable {
    pub label: String,
    pub name: String,
    value: TunableValue,
}

impl Tunable {
    /// Create a tunable with its first candidate selected, or a cleared flag
    /// when `values` is empty.
    pub fn new(label: impl Into<String>, name: impl Into<String>, values: Vec<String>) -> Self {
        let value = if values.is_empty() {
            TunableValue::Flag(0)
        } else {
            TunableValue::Choice {
                values,
                selected: 0,
            }
        };
        Self {
            label: label.into(),
            name: name.into(),
            value,
        }
    }

    pub fn value(&self) -> &TunableValue {
        &self.value
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.value, TunableValue::Flag(_))
    }

    /// Candidate values; empty for flags.
    pub fn values(&self) -> &[String] {
        match &self.value {
            TunableValue::Choice { values, .. } => values,
            TunableValue::Flag(_) => &[],
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        match &self.value {
            TunableValue::Choice { selected, .. } => Some(*selected),
            TunableValue::Flag(_) => None,
        }
    }

    pub fn selected_value(&self) -> Option<&str> {
        match &self.value {
            TunableValue::Choice { values, selected } => values.get(*selected).map(String::as_str),
            TunableValue::Flag(_) => None,
        }
    }

    pub fn flag(&self) -> Option<i64> {
        match &self.value {
            TunableValue::Flag(raw) => Some(*raw),
            TunableValue::Choice { .. } => None,
        }
    }

    /// Store a menu or settings selection.
    ///
    /// Choice tunables take `value` as a candidate index and ignore indices
    /// outside the list; flags store `value` verbatim.
    pub fn select(&mut self, value: i64) -> bool {
        match &mut self.value {
            TunableValue::Choice { values, selected } => match usize::try_from(value) {
                Ok(index) if index < values.len() => {
                    *selected = index;
                    true
                }
                _ => false,
            },
            TunableValue::Flag(raw) => {
                *raw = value;
                true
            }
        }
    }
}

/// The three catalog files of one configuration tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPaths {
    pub chords: PathBuf,
    pub bootables: PathBuf,
    pub tunables: PathBuf,
}

impl TierPaths {
    /// Standard file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            chords: dir.join(CHORDS_FILE),
            bootables: dir.join(BOOTABLES_FILE),
            tunables: dir.join(TUNABLES_FILE),
        }
    }
}

/// Ordered boot configuration owned by the boot session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    bootables: Vec<Bootable>,
    tunables: Vec<Tunable>,
    chords: Vec<KeyChord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bootables(&self) -> &[Bootable] {
        &self.bootables
    }

    pub fn tunables(&self) -> &[Tunable] {
        &self.tunables
    }

    pub fn tunables_mut(&mut self) -> &mut [Tunable] {
        &mut self.tunables
    }

    pub fn chords(&self) -> &[KeyChord] {
        &self.chords
    }

    pub fn tunable(&self, id: TunableId) -> Option<&Tunable> {
        self.tunables.get(id.0)
    }

    pub fn tunable_mut(&mut self, id: TunableId) -> Option<&mut Tunable> {
        self.tunables.get_mut(id.0)
    }

    /// The first loaded bootable, used for unattended boots.
    pub fn default_bootable(&self) -> Option<&Bootable> {
        self.bootables.first()
    }

    pub fn add_bootable(&mut self, label: impl Into<String>, path: impl Into<PathBuf>) {
        let bootable = Bootable {
            label: label.into(),
            path: path.into(),
        };
        debug!(
            "Adding bootable (label = '{}', path = '{}')",
            bootable.label,
            bootable.path.display()
        );
        self.bootables.push(bootable);
    }

    pub fn add_tunable(&mut self, tunable: Tunable) -> TunableId {
        debug!(
            "Adding tunable (label = '{}', name = '{}', values = {:?})",
            tunable.label,
            tunable.name,
            tunable.values()
        );
        self.tunables.push(tunable);
        TunableId(self.tunables.len() - 1)
    }

    /// Load all three files of `tier`, chords first.
    pub fn load_tier(&mut self, tier: &TierPaths) {
        self.load_key_chords(&tier.chords);
        self.load_bootables(&tier.bootables);
        self.load_tunables(&tier.tunables);
    }

    pub fn load_key_chords(&mut self, path: &Path) -> usize {
        read_catalog_file(path)
            .map(|contents| self.parse_key_chords(&contents))
            .unwrap_or(0)
    }

    pub fn load_bootables(&mut self, path: &Path) -> usize {
        read_catalog_file(path)
            .map(|contents| self.parse_bootables(&contents))
            .unwrap_or(0)
    }

    pub fn load_tunables(&mut self, path: &Path) -> usize {
        read_catalog_file(path)
            .map(|contents| self.parse_tunables(&contents))
            .unwrap_or(0)
    }

    /// One chord per non-empty line; every field is a key code.
    ///
    /// Lines past the table capacity are ignored, as are keys past a chord's
    /// capacity. Returns the number of chords added.
    pub fn parse_key_chords(&mut self, contents: &str) -> usize {
        let mut added = 0;
        for line in contents.lines() {
            if self.chords.len() >= KEY_CHORD_MAX {
                debug!("key chord table full ({KEY_CHORD_MAX}); ignoring remaining lines");
                break;
            }
            let mut fields = LineParser::new(line).peekable();
            if fields.peek().is_none() {
                continue;
            }
            let index = self.chords.len();
            let mut chord = KeyChord::new();
            for field in fields {
                // Codes wider than 32 bits wrap, matching the input layer's int storage.
                let code = parse_c_integer(field) as u32;
                debug!("Adding key {code} to chord {index}");
                chord.push(code);
            }
            self.chords.push(chord);
            added += 1;
        }
        added
    }

    /// `"label" "path"` per line; both fields are mandatory.
    pub fn parse_bootables(&mut self, contents: &str) -> usize {
        let mut added = 0;
        for line in contents.lines() {
            let mut fields = LineParser::new(line);
            let (Some(label), Some(path)) = (fields.next_token(), fields.next_token()) else {
                continue;
            };
            self.add_bootable(label, path);
            added += 1;
        }
        added
    }

    /// `"label" "name" "value"...` per line; label and name are mandatory.
    pub fn parse_tunables(&mut self, contents: &str) -> usize {
        let mut added = 0;
        for line in contents.lines() {
            let mut fields = LineParser::new(line);
            let (Some(label), Some(name)) = (fields.next_token(), fields.next_token()) else {
                continue;
            };
            let values = fields.map(str::to_string).collect();
            self.add_tunable(Tunable::new(label, name, values));
            added += 1;
        }
        added
    }
}

/// Read a catalog file; absent and unreadable files both mean "no records".
pub(crate) fn read_catalog_file(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => {
            info!("Parsing {}", path.display());
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            warn!("skipping unreadable {}: {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn bootables_need_label_and_path() {
        let mut catalog = Catalog::new();
        let added = catalog.parse_bootables(
            "\"Android\" \"/boot/zImage\"\n\
             \"Label only\"\n\
             # comment\n\
             \n\
             \"Ubuntu\" \"/boot/ubuntu\" # trailing\n",
        );
        assert_eq!(added, 2);
        assert_eq!(
            catalog.bootables(),
            &[
                Bootable {
                    label: "Android".into(),
                    path: "/boot/zImage".into()
                },
                Bootable {
                    label: "Ubuntu".into(),
                    path: "/boot/ubuntu".into()
                },
            ]
        );
        assert_eq!(
            catalog.default_bootable().map(|b| b.label.as_str()),
            Some("Android")
        );
    }

    #[test]
    fn identical_lines_are_appended_twice() {
        let mut catalog = Catalog::new();
        let line = "\"Android\" \"/boot/zImage\"\n";
        catalog.parse_bootables(line);
        catalog.parse_bootables(line);
        assert_eq!(catalog.bootables().len(), 2);
        assert_eq!(catalog.bootables()[0], catalog.bootables()[1]);
    }

    #[test]
    fn tunables_collect_trailing_values() {
        let mut catalog = Catalog::new();
        catalog.parse_tunables(
            "\"Boot mode\" \"androidboot.mode\" \"normal\" \"recovery\"\n\
             \"Debug\" \"debug\"\n\
             \"Orphan\"\n\
             \"Mode\" mode \"\" fast slow\n",
        );
        let tunables = catalog.tunables();
        assert_eq!(tunables.len(), 3);

        assert_eq!(tunables[0].label, "Boot mode");
        assert_eq!(tunables[0].values(), &["normal", "recovery"]);
        assert_eq!(tunables[0].selected_value(), Some("normal"));

        assert!(tunables[1].is_flag());
        assert_eq!(tunables[1].flag(), Some(0));

        assert_eq!(tunables[2].values(), &["", "fast", "slow"]);
        assert_eq!(tunables[2].selected_index(), Some(0));
    }

    #[test]
    fn choice_selection_ignores_out_of_range_indices() {
        let mut tunable = Tunable::new("Mode", "mode", vec!["a".into(), "b".into()]);
        assert!(tunable.select(1));
        assert!(!tunable.select(2));
        assert!(!tunable.select(-1));
        assert_eq!(tunable.selected_index(), Some(1));

        let mut flag = Tunable::new("Quiet", "quiet", Vec::new());
        assert!(flag.select(7));
        assert_eq!(flag.flag(), Some(7));
    }

    #[test]
    fn chords_parse_codes_and_respect_caps() {
        let mut catalog = Catalog::new();
        catalog.parse_key_chords("114 115\n# comment\n\n0x1c 034 28 99\n");
        assert_eq!(catalog.chords().len(), 2);
        assert_eq!(catalog.chords()[0].keys(), &[114, 115]);
        assert_eq!(catalog.chords()[1].keys(), &[28, 28, 28]);

        let many: String = (0..20).map(|n| format!("{n}\n")).collect();
        catalog.parse_key_chords(&many);
        assert_eq!(catalog.chords().len(), KEY_CHORD_MAX);
        assert_eq!(catalog.chords()[15].keys(), &[13]);
    }

    #[test]
    fn missing_files_are_a_no_op() {
        let dir = tempdir().unwrap();
        let mut catalog = Catalog::new();
        catalog.load_tier(&TierPaths::in_dir(dir.path()));
        assert_eq!(catalog, Catalog::new());
    }

    #[test]
    fn tiers_append_in_load_order() {
        let system = tempdir().unwrap();
        let local = tempdir().unwrap();
        fs::write(system.path().join(BOOTABLES_FILE), "\"System\" /sys.img\n").unwrap();
        fs::write(
            system.path().join(TUNABLES_FILE),
            "\"Mode\" mode a b\n",
        )
        .unwrap();
        fs::write(local.path().join(BOOTABLES_FILE), "\"Local\" /local.img\n").unwrap();
        fs::write(local.path().join(TUNABLES_FILE), "\"Mode\" mode c\n").unwrap();
        fs::write(local.path().join(CHORDS_FILE), "115\n").unwrap();

        let mut catalog = Catalog::new();
        catalog.load_tier(&TierPaths::in_dir(system.path()));
        catalog.load_tier(&TierPaths::in_dir(local.path()));

        let labels: Vec<_> = catalog.bootables().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["System", "Local"]);
        assert_eq!(catalog.tunables().len(), 2);
        assert_eq!(catalog.tunables()[1].values(), &["c"]);
        assert_eq!(catalog.chords().len(), 1);
    }
}
