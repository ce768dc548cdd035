//! Screen-facing collaborators.

/// Menu-selection primitive and status output.
///
/// `select` blocks until the user picks an entry. `None` means the user
/// cancelled (the "back" gesture); there is no timeout.
pub trait MenuUi {
    /// Print a status line to the user-visible log area.
    fn print(&mut self, message: &str);

    /// Clear any progress indicator left over from the previous action.
    fn reset_progress(&mut self);

    /// Allow or forbid the display-toggle gesture while a menu is shown.
    fn set_display_toggle(&mut self, allowed: bool);

    /// Whether the display-toggle gesture is currently allowed.
    fn display_toggle(&self) -> bool;

    /// Present `labels` under `headers` with `initial` highlighted and return
    /// the chosen index.
    fn select(&mut self, headers: &[String], labels: &[String], initial: usize) -> Option<usize>;
}

/// Hands the removable media to a USB host as a mass-storage device.
///
/// Returns once the user ends the export.
pub trait StorageExport {
    fn export_storage(&mut self);
}
