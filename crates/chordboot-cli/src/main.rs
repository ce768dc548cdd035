//! chordboot: kexec boot menu with key-chord shortcuts, plus operator tooling.

use anyhow::{ensure, Context, Result};
use chordboot_core::config::CONFIG_PATH_ENV;
use chordboot_core::{
    build_cmdline, logging, settings, BootSession, Catalog, ChordbootConfig, ExitDisposition,
    SessionOptions, Tunable, TunableValue, DEFAULT_CONFIG_PATH,
};
use clap::{Parser, Subcommand};
use log::{info, warn};
use schemars::schema_for;
use serde_json::to_string_pretty;
use std::env;
use std::path::{Path, PathBuf};

mod console;
mod platform;

use platform::HostPlatform;

/// Top-level command-line options shared by every subcommand.
#[derive(Parser, Debug)]
#[command(
    name = "chordboot",
    version,
    about = "Boot menu that hands kernels to kexec, with key-chord shortcuts."
)]
struct Cli {
    /// Path to the chordboot configuration file (falls back to $CHORDBOOT_CONFIG).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the boot menu (default).
    Run,

    /// Print the kernel command line the current settings produce.
    Cmdline,

    /// List bootables, tunables, and key chords from both tiers.
    List,

    /// Change a saved tunable selection.
    Set {
        /// Tunable name as it appears on the kernel command line.
        name: String,

        /// Candidate value, or an integer for flag tunables.
        value: String,
    },

    /// Validate a configuration file or emit the config schema.
    Validate {
        /// Path to the configuration file to validate.
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,

        /// Output the JSON schema instead of validating a file.
        #[arg(long)]
        schema: bool,
    },
}

/// Entry point: parse arguments and surface errors with an exit code.
fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    logging::init("info");
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config, env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let config = load_cli_config(&config_path)?;
            let platform = HostPlatform::from_config(&config);
            let mut session = BootSession::new(platform, SessionOptions::from_config(&config));
            let disposition = session.run().context("boot session ended abnormally")?;
            if disposition == ExitDisposition::Reload {
                info!("exiting so the supervisor reloads chordboot");
            }
        }
        Commands::Cmdline => {
            let config = load_cli_config(&config_path)?;
            let catalog = load_catalog(&config);
            let cmdline = build_cmdline(catalog.tunables(), config.kexec.cmdline_capacity);
            if cmdline.is_truncated() {
                warn!(
                    "command line truncated to {} bytes (raise kexec.cmdline_capacity)",
                    cmdline.capacity()
                );
            }
            println!("{}", cmdline.as_str());
        }
        Commands::List => {
            let config = load_cli_config(&config_path)?;
            print_catalog(&load_catalog(&config));
        }
        Commands::Set { name, value } => {
            let config = load_cli_config(&config_path)?;
            let mut catalog = load_catalog(&config);
            ensure!(
                settings::apply_setting(catalog.tunables_mut(), &name, &value),
                "no tunable named {name} accepts the value {value:?}"
            );
            settings::save_settings(catalog.tunables(), &config.settings.path).with_context(|| {
                format!(
                    "failed to save settings to {}",
                    config.settings.path.display()
                )
            })?;
            println!(
                "Saved {name}={value} to {}",
                config.settings.path.display()
            );
        }
        Commands::Validate { file, schema } => {
            if schema {
                let schema = schema_for!(ChordbootConfig);
                println!("{}", to_string_pretty(&schema)?);
                return Ok(());
            }

            let file = file.unwrap_or(config_path);
            let cfg = ChordbootConfig::load(&file)
                .with_context(|| format!("failed to load configuration from {}", file.display()))?;

            let issues = cfg.validate();
            if issues.is_empty() {
                println!(
                    "Configuration valid ({} volumes, settings at {}).",
                    cfg.volumes.len(),
                    cfg.settings.path.display()
                );
            } else {
                eprintln!("Configuration validation failed:");
                for issue in issues {
                    eprintln!("  - {issue}");
                }
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// `--config` wins over the environment, which wins over the built-in path.
fn resolve_config_path(flag: Option<PathBuf>, from_env: Option<PathBuf>) -> PathBuf {
    flag.or(from_env)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn load_cli_config(path: &Path) -> Result<ChordbootConfig> {
    ChordbootConfig::load_or_default(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

/// Both tiers plus saved settings, read in place without mounting anything.
fn load_catalog(config: &ChordbootConfig) -> Catalog {
    let mut catalog = Catalog::new();
    catalog.load_tier(&config.system_tier());
    catalog.load_tier(&config.local_tier());
    settings::load_settings(catalog.tunables_mut(), &config.settings.path);
    catalog
}

fn print_catalog(catalog: &Catalog) {
    println!("Bootables:");
    for (index, bootable) in catalog.bootables().iter().enumerate() {
        println!("  [{index}] {} -> {}", bootable.label, bootable.path.display());
    }
    println!("Tunables:");
    for tunable in catalog.tunables() {
        println!("  {}", describe_tunable(tunable));
    }
    println!("Key chords:");
    for (index, chord) in catalog.chords().iter().enumerate() {
        let keys: Vec<String> = chord.keys().iter().map(u32::to_string).collect();
        println!("  [{index}] {}", keys.join(" "));
    }
}

fn describe_tunable(tunable: &Tunable) -> String {
    match tunable.value() {
        TunableValue::Flag(raw) => format!("{} ({}) = {raw} (flag)", tunable.label, tunable.name),
        TunableValue::Choice { values, selected } => format!(
            "{} ({}) = {:?} of [{}]",
            tunable.label,
            tunable.name,
            values[*selected],
            values
                .iter()
                .map(|v| format!("{v:?}"))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn config_flag_beats_environment() {
        let flag = Some(PathBuf::from("/tmp/flag.toml"));
        let from_env = Some(PathBuf::from("/tmp/env.toml"));
        assert_eq!(
            resolve_config_path(flag, from_env.clone()),
            PathBuf::from("/tmp/flag.toml")
        );
        assert_eq!(
            resolve_config_path(None, from_env),
            PathBuf::from("/tmp/env.toml")
        );
        assert_eq!(
            resolve_config_path(None, None),
            PathBuf::from(DEFAULT_CONFIG_PATH)
        );
    }

    #[test]
    fn catalog_combines_tiers_and_settings() {
        let system = tempdir().unwrap();
        let local = tempdir().unwrap();
        fs::write(system.path().join("bootables"), "\"Android\" /boot/zImage\n").unwrap();
        fs::write(
            system.path().join("tunables"),
            "\"Boot mode\" androidboot.mode normal recovery\n",
        )
        .unwrap();
        fs::write(local.path().join("chords"), "114 115\n").unwrap();
        fs::write(local.path().join("settings"), "androidboot.mode recovery\n").unwrap();

        let mut config = ChordbootConfig::default();
        config.tiers.system_dir = system.path().to_path_buf();
        config.tiers.local_dir = local.path().to_path_buf();
        config.settings.path = local.path().join("settings");

        let catalog = load_catalog(&config);
        assert_eq!(catalog.bootables().len(), 1);
        assert_eq!(catalog.chords()[0].keys(), &[114, 115]);
        assert_eq!(
            describe_tunable(&catalog.tunables()[0]),
            "Boot mode (androidboot.mode) = \"recovery\" of [\"normal\", \"recovery\"]"
        );
    }

    #[test]
    fn flags_describe_their_raw_value() {
        let mut quiet = Tunable::new("Quiet", "quiet", Vec::new());
        quiet.select(-1);
        assert_eq!(describe_tunable(&quiet), "Quiet (quiet) = -1 (flag)");
    }

    #[test]
    fn cli_defaults_to_the_boot_menu() {
        let cli = Cli::parse_from(["chordboot"]);
        assert!(cli.command.is_none());
        let cli = Cli::parse_from(["chordboot", "-c", "/etc/alt.toml", "set", "quiet", "1"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/alt.toml")));
        assert!(matches!(cli.command, Some(Commands::Set { .. })));
    }
}
