#![forbid(unsafe_code)]

//! Collaborator contracts consumed by the chordboot menu core.
//!
//! The core never touches the screen, the input layer, the mount table, or the
//! kernel loader directly. Everything it needs from the outside world goes
//! through the narrow traits defined here so the menu logic stays testable with
//! recorded fakes.

pub mod device;
pub mod ui;

pub use device::{KexecLoader, KeyInput, Mounter, PowerControl};
pub use ui::{MenuUi, StorageExport};

/// Everything a boot session needs from its host.
///
/// Implemented automatically for any type that provides every collaborator.
pub trait Platform: MenuUi + StorageExport + KeyInput + Mounter + KexecLoader + PowerControl {}

impl<T> Platform for T where
    T: MenuUi + StorageExport + KeyInput + Mounter + KexecLoader + PowerControl
{
}
