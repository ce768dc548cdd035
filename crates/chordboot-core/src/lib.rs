//! Core building blocks of the chordboot boot-selection front end.
//!
//! Configuration parsing, the menu model, key-chord detection, and kernel
//! command-line assembly live here. Screens, input devices, mounts, and the
//! kernel loader are reached only through the `chordboot-provider` traits.

pub mod browser;
pub mod catalog;
pub mod cmdline;
pub mod config;
pub mod error;
pub mod keychord;
pub mod logging;
pub mod menu;
mod navigator;
pub mod parser;
pub mod session;
pub mod settings;

pub use catalog::{Bootable, Catalog, TierPaths, Tunable, TunableId, TunableValue};
pub use cmdline::{build_cmdline, CommandLine};
pub use config::{ChordbootConfig, DEFAULT_CONFIG_PATH};
pub use error::{BootError, BootResult};
pub use keychord::KeyChord;
pub use menu::{build_menu, Action, Menu, MenuItem};
pub use session::{BootSession, ExitDisposition, RunState, SessionOptions};
