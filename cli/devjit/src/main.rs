//! devjit CLI: inspect platform resolution and compiler construction.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use manifest::DevjitManifest;

#[derive(Parser)]
#[command(name = "devjit", version, about = "JIT platform and compiler resolution")]
struct Cli {
    /// Log resolution steps at debug level
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered platforms and compilation devices
    Platforms {
        /// Manifest path (default: devjit.toml, searched upward)
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Parse an accelerator allow-list (e.g., "0,2")
    VisibleDevices {
        /// Comma-separated device ordinals
        list: String,
    },
    /// Resolve platform, compiler and allocator for manifest devices
    Resolve {
        /// Manifest path (default: devjit.toml, searched upward)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Resolve only this device
        #[arg(long)]
        device: Option<String>,
        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Platforms { manifest } => {
            let manifest = load_manifest(&cwd, manifest.as_deref())?;
            commands::platforms::run(&manifest)
        }
        Commands::VisibleDevices { list } => commands::visible_devices::run(&list),
        Commands::Resolve {
            manifest,
            device,
            json,
        } => {
            let manifest = load_manifest(&cwd, manifest.as_deref())?;
            commands::resolve::run(&manifest, device.as_deref(), json)
        }
    }
}

/// Load the manifest at `explicit`, or search upward from `cwd`. Falls back
/// to a host-only manifest when none is found.
fn load_manifest(cwd: &Path, explicit: Option<&Path>) -> anyhow::Result<DevjitManifest> {
    if let Some(path) = explicit {
        return DevjitManifest::load(path);
    }
    match DevjitManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => {
            tracing::debug!(dir = %dir.display(), "loaded manifest");
            Ok(manifest)
        }
        None => Ok(DevjitManifest::host_only()),
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn explicit_manifest_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[[devices]]\nname = \"/device:CPU:1\"\ndevice-type = \"CPU\"\n",
        )
        .unwrap();
        let manifest = load_manifest(dir.path(), Some(&path)).unwrap();
        assert_eq!(manifest.devices[0].name, "/device:CPU:1");
    }

    #[test]
    fn missing_explicit_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_manifest(dir.path(), Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("nope.toml"));
    }

    #[test]
    fn falls_back_to_host_only() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = load_manifest(dir.path(), None).unwrap();
        assert_eq!(manifest.devices.len(), 1);
        commands::resolve::run(&manifest, None, true).unwrap();
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["devjit", "-v", "resolve", "--device", "/device:CPU:0"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Resolve { device: Some(ref d), json: false, .. } if d == "/device:CPU:0"
        ));
        assert!(Cli::try_parse_from(["devjit", "visible-devices", "0,1"]).is_ok());
    }
}
