//! Hardware and kernel facing collaborators.

use std::error::Error;
use std::path::Path;

/// Reports whether a key is held right now.
pub trait KeyInput {
    /// `code` is a Linux input-layer key code (`KEY_*`).
    fn key_pressed(&self, code: u32) -> bool;
}

/// Mount control keyed by path.
///
/// Implementations resolve `path` to the volume that contains it. Both calls
/// are idempotent: mounting a mounted volume or unmounting an unmounted one
/// succeeds without doing anything.
pub trait Mounter {
    type Error: Error + Send + Sync + 'static;

    fn ensure_mounted(&self, path: &Path) -> Result<(), Self::Error>;

    fn ensure_unmounted(&self, path: &Path) -> Result<(), Self::Error>;
}

/// Loads a kernel image and transfers control to it.
pub trait KexecLoader {
    type Error: Error + Send + Sync + 'static;

    /// Load `image` with `cmdline` (already rendered as `--command-line=...`)
    /// and jump into it.
    ///
    /// Returning at all, `Ok` included, means the new kernel did not take over.
    fn load_and_execute(&self, image: &Path, cmdline: &str) -> Result<(), Self::Error>;
}

/// Filesystem flush and machine power state.
pub trait PowerControl {
    type Error: Error + Send + Sync + 'static;

    fn sync(&self);

    fn reboot(&self) -> Result<(), Self::Error>;

    fn power_off(&self) -> Result<(), Self::Error>;
}
