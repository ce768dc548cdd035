//! Removable-media image browser.
//!
//! Shows one directory at a time through the menu-selection primitive. The
//! first entry always goes up a level, images (`*.img`, any case) follow, then
//! subdirectories with a trailing `/`. Browsing never climbs above the root it
//! started from.

use chordboot_provider::MenuUi;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const PARENT_ENTRY: &str = "../";
pub const IMAGE_SUFFIX: &str = ".img";
pub const BROWSE_PROMPT: &str = "Select image to boot:";

/// Outcome of showing one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseStep {
    Cancelled,
    Up,
    Enter(PathBuf),
    Selected(PathBuf),
}

fn has_image_suffix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= IMAGE_SUFFIX.len()
        && bytes[bytes.len() - IMAGE_SUFFIX.len()..].eq_ignore_ascii_case(IMAGE_SUFFIX.as_bytes())
}

/// Menu labels for `dir`: parent entry, sorted images, sorted directories.
pub fn list_entries(dir: &Path) -> io::Result<Vec<String>> {
    let mut images = Vec::new();
    let mut dirs = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if file_type.is_dir() {
            if name == "." || name == ".." {
                continue;
            }
            dirs.push(format!("{name}/"));
        } else if file_type.is_file() && has_image_suffix(&name) {
            images.push(name);
        }
    }

    images.sort();
    dirs.sort();

    let mut entries = Vec::with_capacity(1 + images.len() + dirs.len());
    entries.push(PARENT_ENTRY.to_string());
    entries.extend(images);
    entries.extend(dirs);
    Ok(entries)
}

/// Show `dir` once and translate the user's choice.
pub fn browse_step<U>(ui: &mut U, title: &str, dir: &Path) -> BrowseStep
where
    U: MenuUi + ?Sized,
{
    let entries = match list_entries(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("error opening {}: {err}", dir.display());
            ui.print(&format!("error opening {}: {err}", dir.display()));
            return BrowseStep::Cancelled;
        }
    };

    let headers = [
        title.to_string(),
        BROWSE_PROMPT.to_string(),
        dir.display().to_string(),
        String::new(),
    ];
    let Some(chosen) = ui.select(&headers, &entries, 0) else {
        return BrowseStep::Cancelled;
    };

    match entries.get(chosen) {
        Some(_) if chosen == 0 => BrowseStep::Up,
        Some(entry) => {
            if let Some(subdir) = entry.strip_suffix('/') {
                BrowseStep::Enter(dir.join(subdir))
            } else {
                ui.print(&format!("-- Selected {entry} ..."));
                BrowseStep::Selected(dir.join(entry))
            }
        }
        None => {
            warn!("selection {chosen} out of range for {}", dir.display());
            BrowseStep::Cancelled
        }
    }
}

/// Browse from `root` until the user picks an image or cancels.
pub fn browse<U>(ui: &mut U, title: &str, root: &Path) -> Option<PathBuf>
where
    U: MenuUi + ?Sized,
{
    let mut current = root.to_path_buf();
    loop {
        match browse_step(ui, title, &current) {
            BrowseStep::Cancelled => return None,
            BrowseStep::Up => current = parent_within(root, &current),
            BrowseStep::Enter(next) => current = next,
            BrowseStep::Selected(image) => return Some(image),
        }
        debug!("browsing {}", current.display());
    }
}

fn parent_within(root: &Path, current: &Path) -> PathBuf {
    current
        .parent()
        .filter(|parent| parent.starts_with(root))
        .unwrap_or(root)
        .to_path_buf()
}
