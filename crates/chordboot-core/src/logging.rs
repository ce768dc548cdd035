//! Logger bootstrap shared by the chordboot binaries.

use env_logger::{Builder, Env};

/// Install the `env_logger` backend with `default_level` unless `RUST_LOG`
/// says otherwise. Calling this more than once is harmless.
pub fn init(default_level: &str) {
    let _ = Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init();
}
