//! `devjit platforms`: registered platforms and compilation devices.

use std::fmt::Write;

use anyhow::Result;
use devjit_registry::{PlatformManager, ProductionRegistries};

use crate::manifest::DevjitManifest;

/// Print the platforms and compilation devices `manifest` wires up.
pub fn run(manifest: &DevjitManifest) -> Result<()> {
    let registries = manifest.registries()?;
    print!("{}", render(&registries)?);
    Ok(())
}

pub fn render(registries: &ProductionRegistries) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Platforms:")?;
    for platform in registries.platforms.platforms() {
        let compiler = if registries.compilers.has_compiler(platform.id()) {
            "compiler linked"
        } else {
            "no compiler"
        };
        writeln!(
            out,
            "  {:<20} {}  {} device(s), {compiler}",
            platform.name(),
            platform.id(),
            platform.visible_device_count(),
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Compilation devices:")?;
    for (device_type, registration) in registries.devices.registrations() {
        let auto = if registration.autoclustering {
            " (autoclustering)"
        } else {
            ""
        };
        writeln!(
            out,
            "  {device_type:<20} -> {}{auto}",
            registration.compilation_device_name
        )?;
    }
    Ok(out)
}
