//! Line-oriented menu front end for serial and virtual consoles.
//!
//! Entries are numbered; typing a number selects it, an empty line or `b`
//! goes back.

use chordboot_provider::{MenuUi, StorageExport};
use chordboot_system::UsbMassStorage;
use log::warn;
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::thread;
use std::time::Duration;

const EXPORT_HEADERS: [&str; 3] = [
    "USB Mass storage device",
    "Leaving this menu unmounts the device from your PC.",
    "",
];
const EXPORT_LABEL: &str = "Unmount";

pub(crate) struct ConsoleUi<R, W> {
    input: R,
    output: W,
    display_toggle: bool,
    closed: bool,
    storage: Option<UsbMassStorage>,
}

pub(crate) type StdioConsole = ConsoleUi<StdinLock<'static>, Stdout>;

impl StdioConsole {
    pub(crate) fn stdio(storage: Option<UsbMassStorage>) -> Self {
        ConsoleUi::new(io::stdin().lock(), io::stdout(), storage)
    }
}

impl<R: BufRead, W: Write> ConsoleUi<R, W> {
    pub(crate) fn new(input: R, output: W, storage: Option<UsbMassStorage>) -> Self {
        Self {
            input,
            output,
            display_toggle: false,
            closed: false,
            storage,
        }
    }

    fn emit(&mut self, line: &str) {
        if let Err(err) = writeln!(self.output, "{line}").and_then(|_| self.output.flush()) {
            warn!("console write failed: {err}");
        }
    }

    /// Next input line without its terminator; `None` once input is closed.
    fn read_choice(&mut self) -> Option<String> {
        if self.closed {
            // Nothing can arrive any more; keep the caller's loop from spinning.
            thread::sleep(Duration::from_secs(1));
            return None;
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => {
                warn!("console input closed");
                self.closed = true;
                None
            }
            Ok(_) => Some(line.trim().to_string()),
            Err(err) => {
                warn!("console read failed: {err}");
                None
            }
        }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> MenuUi for ConsoleUi<R, W> {
    fn print(&mut self, message: &str) {
        self.emit(message);
    }

    fn reset_progress(&mut self) {}

    fn set_display_toggle(&mut self, allowed: bool) {
        self.display_toggle = allowed;
    }

    fn display_toggle(&self) -> bool {
        self.display_toggle
    }

    fn select(&mut self, headers: &[String], labels: &[String], initial: usize) -> Option<usize> {
        for header in headers.iter().filter(|h| !h.is_empty()) {
            self.emit(header);
        }
        for (index, label) in labels.iter().enumerate() {
            let marker = if index == initial { '*' } else { ' ' };
            self.emit(&format!("{marker}{index:>3}. {label}"));
        }

        loop {
            self.emit("Choice (empty or 'b' to go back):");
            let answer = self.read_choice()?;
            if answer.is_empty() || answer.eq_ignore_ascii_case("b") {
                return None;
            }
            match answer.parse::<usize>() {
                Ok(index) if index < labels.len() => return Some(index),
                _ => self.emit(&format!("Invalid choice: {answer}")),
            }
        }
    }
}

impl<R: BufRead, W: Write> StorageExport for ConsoleUi<R, W> {
    fn export_storage(&mut self) {
        let Some(storage) = self.storage.clone() else {
            self.emit("Mass storage is not configured");
            return;
        };
        if let Err(err) = storage.export() {
            warn!("mass storage export failed: {err}");
            self.emit(&format!("Unable to export {}", storage.device().display()));
            return;
        }

        let headers: Vec<String> = EXPORT_HEADERS.iter().map(|h| h.to_string()).collect();
        let _ = self.select(&headers, &[EXPORT_LABEL.to_string()], 0);

        if let Err(err) = storage.release() {
            warn!("mass storage release failed: {err}");
            self.emit(&format!("Unable to release {}", storage.device().display()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn console(input: &str) -> ConsoleUi<Cursor<Vec<u8>>, Vec<u8>> {
        ConsoleUi::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), None)
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn numbered_choice_is_returned() {
        let mut ui = console("1\n");
        let chosen = ui.select(&labels(&["chordboot", ""]), &labels(&["Android", "Reboot"]), 0);
        assert_eq!(chosen, Some(1));

        let shown = String::from_utf8(ui.into_output()).unwrap();
        assert!(shown.starts_with("chordboot\n*  0. Android\n   1. Reboot\n"));
    }

    #[test]
    fn invalid_input_reprompts() {
        let mut ui = console("7\nzero\n0\n");
        assert_eq!(ui.select(&[], &labels(&["only"]), 0), Some(0));
        let shown = String::from_utf8(ui.into_output()).unwrap();
        assert!(shown.contains("Invalid choice: 7"));
        assert!(shown.contains("Invalid choice: zero"));
    }

    #[test]
    fn empty_line_back_and_eof_cancel() {
        let mut ui = console("\nb\n");
        let items = labels(&["a"]);
        assert_eq!(ui.select(&[], &items, 0), None);
        assert_eq!(ui.select(&[], &items, 0), None);
        assert_eq!(ui.select(&[], &items, 0), None);
    }

    #[test]
    fn display_toggle_is_tracked() {
        let mut ui = console("");
        assert!(!ui.display_toggle());
        ui.set_display_toggle(true);
        assert!(ui.display_toggle());
    }

    #[test]
    fn export_writes_and_clears_the_lun_file() {
        let dir = tempdir().unwrap();
        let lun = dir.path().join("file");
        fs::write(&lun, "\n").unwrap();
        let storage = UsbMassStorage::new(&lun, "/dev/block/mmcblk1");
        let mut ui = ConsoleUi::new(Cursor::new(b"0\n".to_vec()), Vec::new(), Some(storage));

        ui.export_storage();
        assert_eq!(fs::read_to_string(&lun).unwrap(), "\n");
        let shown = String::from_utf8(ui.into_output()).unwrap();
        assert!(shown.contains("USB Mass storage device"));
    }

    #[test]
    fn export_without_configuration_only_reports() {
        let mut ui = console("");
        ui.export_storage();
        let shown = String::from_utf8(ui.into_output()).unwrap();
        assert_eq!(shown, "Mass storage is not configured\n");
    }
}
