//! `kexec`-backed kernel loader.

use crate::command::SystemCommand;
use chordboot_core::error::{BootError, BootResult};
use chordboot_core::ChordbootConfig;
use chordboot_provider::KexecLoader;
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Loads images with `kexec -l` and jumps with `kexec -e`.
#[derive(Debug, Clone)]
pub struct SystemKexec {
    command: SystemCommand,
    execute: bool,
}

impl SystemKexec {
    /// With `execute` unset only the load step runs, leaving the image staged.
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration, execute: bool) -> Self {
        Self {
            command: SystemCommand::new(binary, timeout),
            execute,
        }
    }

    pub fn from_config(config: &ChordbootConfig) -> Self {
        Self::new(
            config.kexec.binary.clone(),
            config.kexec_timeout(),
            config.kexec.execute,
        )
    }

    /// Stage `image` with the rendered `--command-line=...` argument.
    pub fn load(&self, image: &Path, cmdline: &str) -> BootResult<()> {
        let image_arg = image.to_string_lossy();
        self.command
            .run_checked(&["-l", image_arg.as_ref(), cmdline], "kexec load")?;
        info!("staged {} via {}", image.display(), self.command.binary().display());
        Ok(())
    }

    /// Jump into the staged kernel. Only returns on failure.
    pub fn exec(&self) -> BootResult<()> {
        self.command.run_checked(&["-e"], "kexec exec")?;
        Ok(())
    }
}

impl KexecLoader for SystemKexec {
    type Error = BootError;

    fn load_and_execute(&self, image: &Path, cmdline: &str) -> BootResult<()> {
        self.load(image, cmdline)?;
        if self.execute {
            self.exec()?;
        }
        Ok(())
    }
}
