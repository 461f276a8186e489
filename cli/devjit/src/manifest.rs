//! `devjit.toml` manifest parsing and registry wiring.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use devjit_device::{
    BackendMetadata, BoundStream, ClientOptions, DeviceHandle, DeviceType, Platform,
    StaticPlatform,
};
use devjit_platform::{JitFlags, SessionConfig};
use devjit_registry::{
    ClientRegistry, CompilationDeviceRegistration, PlatformManager, ProductionRegistries,
    StaticCompiler,
};
use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "devjit.toml";

/// The top-level manifest structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DevjitManifest {
    /// Session configuration handed to the compiler builder.
    #[serde(default)]
    pub session: SessionConfig,
    /// JIT flags. Overrides the environment when present.
    #[serde(default)]
    pub jit: Option<JitFlags>,
    /// Simulated accelerator platforms.
    #[serde(default)]
    pub platforms: Vec<PlatformEntry>,
    /// Extra device type to compilation device registrations.
    #[serde(default)]
    pub compilation_devices: Vec<CompilationDeviceEntry>,
    /// Devices to resolve.
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

/// A `[[platforms]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformEntry {
    pub name: String,
    #[serde(default = "default_device_count")]
    pub device_count: usize,
    /// Link a compiler for this platform.
    #[serde(default)]
    pub compiler: bool,
}

/// A `[[compilation-devices]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompilationDeviceEntry {
    pub device_type: String,
    pub jit_device_type: String,
    #[serde(default)]
    pub autoclustering: bool,
}

/// A `[[devices]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceEntry {
    /// Device name (e.g., "/device:GPU:0").
    pub name: String,
    pub device_type: String,
    #[serde(default = "default_intra_op_threads")]
    pub intra_op_threads: usize,
    /// Platform the device's stream or backend is bound to.
    #[serde(default)]
    pub platform: Option<String>,
    /// Accelerator ordinal of the device's stream.
    #[serde(default)]
    pub ordinal: i32,
    /// Mark the device backend-managed with this compilation device type.
    #[serde(default)]
    pub backend_jit_device_type: Option<String>,
}

fn default_device_count() -> usize {
    1
}

fn default_intra_op_threads() -> usize {
    1
}

impl DevjitManifest {
    /// Search upward from `start_dir` for a `devjit.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                return Ok(Some((Self::load(&candidate)?, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Manifest used when none is found: one host device.
    pub fn host_only() -> Self {
        Self {
            devices: vec![DeviceEntry {
                name: "/device:CPU:0".into(),
                device_type: DeviceType::CPU.into(),
                intra_op_threads: default_intra_op_threads(),
                platform: None,
                ordinal: 0,
                backend_jit_device_type: None,
            }],
            ..Default::default()
        }
    }

    /// Flags from the manifest, or the process-wide flags.
    pub fn jit_flags(&self) -> JitFlags {
        self.jit.clone().unwrap_or_else(|| JitFlags::global().clone())
    }

    /// Production registries extended with this manifest's platforms,
    /// compilers and compilation devices.
    pub fn registries(&self) -> Result<ProductionRegistries> {
        let registries = ProductionRegistries::with_host();
        for entry in &self.platforms {
            let platform = Arc::new(StaticPlatform::new(&entry.name, entry.device_count));
            let id = platform.id();
            registries
                .platforms
                .register(platform)
                .with_context(|| format!("registering platform '{}'", entry.name))?;
            if entry.compiler {
                registries
                    .compilers
                    .register(Arc::new(StaticCompiler::new(entry.name.to_lowercase(), id)))?;
            }
        }
        for entry in &self.compilation_devices {
            registries.devices.register(
                entry.device_type.clone(),
                CompilationDeviceRegistration::new(entry.jit_device_type.clone())
                    .with_autoclustering(entry.autoclustering),
            )?;
        }
        Ok(registries)
    }

    /// Build the device handles described by `[[devices]]`.
    pub fn devices(&self, registries: &ProductionRegistries) -> Result<Vec<DeviceHandle>> {
        self.devices
            .iter()
            .map(|entry| entry.build(registries))
            .collect()
    }
}

impl DeviceEntry {
    fn build(&self, registries: &ProductionRegistries) -> Result<DeviceHandle> {
        let device_type = DeviceType::new(self.device_type.clone());
        let mut device = DeviceHandle::new(self.name.clone(), device_type.clone())
            .with_intra_op_threads(self.intra_op_threads);

        let platform = match &self.platform {
            Some(name) => Some(self.lookup_platform(name, registries)?),
            None => None,
        };

        if let Some(jit_device_type) = &self.backend_jit_device_type {
            let Some(platform) = platform else {
                bail!("device '{}' is backend-managed but names no platform", self.name);
            };
            let client = registries
                .clients
                .get_or_create_client(&ClientOptions::new(Arc::clone(&platform)))?;
            device = device.with_backend_metadata(Arc::new(BackendMetadata::new(
                DeviceType::new(jit_device_type.clone()),
                platform,
                client,
            )));
        } else if let Some(platform) = platform {
            device = device.with_stream(Arc::new(BoundStream::new(platform, self.ordinal)));
        } else if device_type.is_gpu() {
            bail!("accelerator device '{}' names no platform", self.name);
        }
        Ok(device)
    }

    fn lookup_platform(
        &self,
        name: &str,
        registries: &ProductionRegistries,
    ) -> Result<Arc<dyn Platform>> {
        registries
            .platforms
            .platforms()
            .into_iter()
            .find(|p| p.name() == name)
            .with_context(|| format!("device '{}' names unknown platform '{name}'", self.name))
    }
}
