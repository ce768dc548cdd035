//! Persisted tunable selections.
//!
//! The settings file holds one `"name" "value"` pair per line. Replaying it
//! after both catalog tiers are loaded restores the user's choices; saving
//! rewrites it from the current selections and keeps the previous copy as
//! `<path>.old`.

use crate::catalog::{read_catalog_file, Tunable};
use crate::error::BootResult;
use crate::parser::{parse_c_integer, LineParser};
use log::debug;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Apply one `name value` pair.
///
/// Names and candidate values compare ASCII case-insensitively. Tunables are
/// scanned in declaration order: a same-named choice tunable without a
/// matching candidate is passed over so a later tier's tunable can take the
/// value, while a same-named flag stores `value` parsed as an integer.
/// Returns whether any tunable changed; unknown names are ignored.
pub fn apply_setting(tunables: &mut [Tunable], name: &str, value: &str) -> bool {
    for tunable in tunables.iter_mut() {
        if !tunable.name.eq_ignore_ascii_case(name) {
            continue;
        }

        if tunable.is_flag() {
            return tunable.select(parse_c_integer(value));
        }

        let position = tunable
            .values()
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(value));
        if let Some(index) = position {
            return tunable.select(index as i64);
        }
    }
    false
}

/// Replay every pair in `contents`; returns how many took effect.
pub fn parse_settings(tunables: &mut [Tunable], contents: &str) -> usize {
    let mut applied = 0;
    for line in contents.lines() {
        let mut fields = LineParser::new(line);
        let (Some(name), Some(value)) = (fields.next_token(), fields.next_token()) else {
            continue;
        };
        if apply_setting(tunables, name, value) {
            applied += 1;
        } else {
            debug!("ignoring setting {name}={value}");
        }
    }
    applied
}

/// Replay the settings file at `path`; a missing file changes nothing.
pub fn load_settings(tunables: &mut [Tunable], path: &Path) -> usize {
    read_catalog_file(path)
        .map(|contents| parse_settings(tunables, &contents))
        .unwrap_or(0)
}

/// Serialise the current selections in declaration order.
pub fn render_settings(tunables: &[Tunable]) -> String {
    let mut out = String::new();
    for tunable in tunables {
        match (tunable.selected_value(), tunable.flag()) {
            (Some(value), _) => out.push_str(&format!("\"{}\"\t\"{}\"\n", tunable.name, value)),
            (None, Some(raw)) => out.push_str(&format!("\"{}\"\t{}\n", tunable.name, raw)),
            (None, None) => {}
        }
    }
    out
}

/// Location of the backup kept by [`save_settings`].
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".old");
    PathBuf::from(name)
}

/// Rotate the existing file to `<path>.old` and write the current selections.
///
/// The rotation is best effort. Callers should only save after a tunable was
/// edited.
pub fn save_settings(tunables: &[Tunable], path: &Path) -> BootResult<()> {
    let backup = backup_path(path);
    if let Err(err) = fs::rename(path, &backup) {
        debug!("no settings backup at {}: {err}", backup.display());
    }

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(parent)?;
    temp.as_file_mut()
        .write_all(render_settings(tunables).as_bytes())?;
    temp.as_file_mut().flush()?;
    let _ = temp.as_file().sync_all();
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
