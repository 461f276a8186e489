//! `devjit resolve`: platform and compiler resolution per device.

use anyhow::{bail, Result};
use devjit_device::{Device, DeviceHandle};
use devjit_platform::{
    platform_info_from_device, resolve_allocator, DeviceCompilerBuilder, JitError,
};
use devjit_registry::PlatformManager;
use serde::Serialize;

use crate::manifest::DevjitManifest;

/// Resolution outcome of one device.
#[derive(Debug, Serialize)]
pub struct DeviceReport {
    pub device: String,
    pub device_type: String,
    pub platform: Option<String>,
    pub class: Option<String>,
    pub compiler: CompilerOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum CompilerOutcome {
    Built {
        jit_device_type: String,
        client: bool,
        persistence: bool,
        /// Platform of the resolved allocator.
        #[serde(skip_serializing_if = "Option::is_none")]
        allocator_platform: Option<String>,
        /// Why no allocator could be resolved; the compiler is still usable.
        #[serde(skip_serializing_if = "Option::is_none")]
        allocator_error: Option<String>,
    },
    /// No compiler is linked; the work runs on the executor uncompiled.
    Fallback { reason: String },
    Failed { error: String },
}

pub fn run(manifest: &DevjitManifest, device: Option<&str>, json: bool) -> Result<()> {
    let reports = reports(manifest, device)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }
    for report in &reports {
        print_report(report);
    }
    Ok(())
}

/// Resolve every manifest device, or just `only` when given.
pub fn reports(manifest: &DevjitManifest, only: Option<&str>) -> Result<Vec<DeviceReport>> {
    let registries = manifest.registries()?;
    let devices = manifest.devices(&registries)?;
    let builder = DeviceCompilerBuilder::new(registries.backends(), manifest.jit_flags());

    let selected: Vec<&DeviceHandle> = match only {
        Some(name) => devices.iter().filter(|d| d.name() == name).collect(),
        None => devices.iter().collect(),
    };
    if let Some(name) = only {
        if selected.is_empty() {
            bail!("no device named '{name}' in the manifest");
        }
    }

    let reports = selected
        .into_iter()
        .map(|device| report(device, manifest, &builder, registries.platforms.as_ref()))
        .collect();
    Ok(reports)
}

fn report(
    device: &DeviceHandle,
    manifest: &DevjitManifest,
    builder: &DeviceCompilerBuilder,
    platforms: &dyn PlatformManager,
) -> DeviceReport {
    let mut report = DeviceReport {
        device: device.name().to_string(),
        device_type: device.device_type().to_string(),
        platform: None,
        class: None,
        compiler: CompilerOutcome::Failed {
            error: String::new(),
        },
    };

    let info = match platform_info_from_device(device) {
        Ok(info) => info,
        Err(err) => {
            report.compiler = CompilerOutcome::Failed {
                error: err.to_string(),
            };
            return report;
        }
    };
    report.platform = info
        .platform_id()
        .and_then(|id| platforms.platform_with_id(id).ok())
        .map(|p| p.name().to_string());
    report.class = Some(info.device_class().as_str().to_string());

    report.compiler = match builder.build(device, &manifest.session, &info) {
        Ok(compiler) => {
            let stream = device.accelerator_stream();
            let (allocator_platform, allocator_error) =
                match resolve_allocator(device, stream.as_ref(), &info, platforms) {
                    Ok(allocator) => (Some(allocator.platform_id().to_string()), None),
                    Err(err) => (None, Some(err.to_string())),
                };
            CompilerOutcome::Built {
                jit_device_type: compiler.device_type().to_string(),
                client: compiler.client().is_some(),
                persistence: compiler.persistor().config().is_enabled(),
                allocator_platform,
                allocator_error,
            }
        }
        Err(err @ JitError::Unimplemented { .. }) => CompilerOutcome::Fallback {
            reason: err.to_string(),
        },
        Err(err) => CompilerOutcome::Failed {
            error: err.to_string(),
        },
    };
    report
}

fn print_report(report: &DeviceReport) {
    println!("=== {} ({}) ===", report.device, report.device_type);
    println!(
        "  Platform: {}",
        report.platform.as_deref().unwrap_or("(none)")
    );
    if let Some(class) = &report.class {
        println!("  Class:    {class}");
    }
    match &report.compiler {
        CompilerOutcome::Built {
            jit_device_type,
            client,
            persistence,
            allocator_platform,
            allocator_error,
        } => {
            println!("  Compiler: {jit_device_type}");
            println!("  Client:   {}", if *client { "bound" } else { "deferred" });
            println!(
                "  Cache:    {}",
                if *persistence { "persistent" } else { "in-memory" }
            );
            match (allocator_platform, allocator_error) {
                (Some(platform), _) => println!("  Allocator platform: {platform}"),
                (None, Some(error)) => println!("  Allocator: unresolved ({error})"),
                (None, None) => {}
            }
        }
        CompilerOutcome::Fallback { reason } => {
            println!("  Compiler: none, falls back to executor ({reason})");
        }
        CompilerOutcome::Failed { error } => {
            println!("  Error:    {error}");
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[session.gpu-options]
visible-device-list = "1"

[jit]
persistent-cache-directory = "/tmp/devjit-cache"

[[platforms]]
name = "CUDA"
device-count = 2
compiler = true

[[platforms]]
name = "ROCM"

[[platforms]]
name = "TPU_RUNTIME"

[[devices]]
name = "/device:CPU:0"
device-type = "CPU"

[[devices]]
name = "/device:GPU:0"
device-type = "GPU"
platform = "CUDA"

[[devices]]
name = "/device:GPU:1"
device-type = "GPU"
platform = "ROCM"

[[devices]]
name = "/device:TPU:0"
device-type = "TPU"

[[devices]]
name = "/device:XLA_TPU:0"
device-type = "XLA_TPU"
platform = "TPU_RUNTIME"
backend-jit-device-type = "XLA_TPU_JIT"

[[devices]]
name = "/device:NPU:0"
device-type = "NPU"
"#;

    fn by_name<'a>(reports: &'a [DeviceReport], name: &str) -> &'a DeviceReport {
        reports.iter().find(|r| r.device == name).unwrap()
    }

    #[test]
    fn resolves_every_device_class() {
        let manifest = DevjitManifest::from_toml(MANIFEST).unwrap();
        let reports = reports(&manifest, None).unwrap();
        assert_eq!(reports.len(), 6);

        let cpu = by_name(&reports, "/device:CPU:0");
        assert_eq!(cpu.platform.as_deref(), Some("Host"));
        assert_eq!(cpu.class.as_deref(), Some("host-managed"));
        match &cpu.compiler {
            CompilerOutcome::Built {
                jit_device_type,
                client,
                persistence,
                ..
            } => {
                assert_eq!(jit_device_type, "XLA_CPU_JIT");
                assert!(*client);
                assert!(*persistence);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let gpu = by_name(&reports, "/device:GPU:0");
        assert!(matches!(
            &gpu.compiler,
            CompilerOutcome::Built { jit_device_type, .. } if jit_device_type == "XLA_GPU_JIT"
        ));

        let rocm = by_name(&reports, "/device:GPU:1");
        match &rocm.compiler {
            CompilerOutcome::Fallback { reason } => assert!(reason.contains("ROCM"), "{reason}"),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let tpu = by_name(&reports, "/device:TPU:0");
        assert_eq!(tpu.class.as_deref(), Some("tpu-offloaded"));
        assert!(tpu.platform.is_none());
        match &tpu.compiler {
            CompilerOutcome::Built {
                jit_device_type,
                client,
                allocator_platform,
                allocator_error,
                ..
            } => {
                assert_eq!(jit_device_type, "TPU_XLA_JIT");
                assert!(!*client);
                assert!(allocator_platform.is_none());
                assert!(allocator_error.as_deref().is_some_and(|e| e.contains("TPU")));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let backend = by_name(&reports, "/device:XLA_TPU:0");
        assert_eq!(backend.class.as_deref(), Some("backend-managed"));
        assert_eq!(backend.platform.as_deref(), Some("TPU_RUNTIME"));
        assert!(matches!(
            &backend.compiler,
            CompilerOutcome::Built { jit_device_type, client: true, .. } if jit_device_type == "XLA_TPU_JIT"
        ));

        let npu = by_name(&reports, "/device:NPU:0");
        assert!(matches!(npu.compiler, CompilerOutcome::Failed { .. }));
    }

    #[test]
    fn filters_by_device_name() {
        let manifest = DevjitManifest::from_toml(MANIFEST).unwrap();
        let only_gpu = reports(&manifest, Some("/device:GPU:0")).unwrap();
        assert_eq!(only_gpu.len(), 1);
        assert!(reports(&manifest, Some("/device:GPU:9")).is_err());
    }

    #[test]
    fn malformed_visible_device_list_fails_accelerators_only() {
        let manifest = DevjitManifest::from_toml(
            &MANIFEST.replace("visible-device-list = \"1\"", "visible-device-list = \"1,a\""),
        )
        .unwrap();
        let reports = reports(&manifest, None).unwrap();
        match &by_name(&reports, "/device:GPU:0").compiler {
            CompilerOutcome::Failed { error } => assert!(error.contains("visible_device_list")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        // The backend-managed path never reads the session configuration.
        assert!(matches!(
            by_name(&reports, "/device:XLA_TPU:0").compiler,
            CompilerOutcome::Built { .. }
        ));
    }

    #[test]
    fn reports_serialize_with_status_tag() {
        let manifest = DevjitManifest::host_only();
        let reports = reports(&manifest, None).unwrap();
        let json = serde_json::to_value(&reports).unwrap();
        assert_eq!(json[0]["compiler"]["status"], "built");
        assert_eq!(json[0]["compiler"]["jit_device_type"], "XLA_CPU_JIT");
    }

    #[test]
    fn host_offloaded_tpu_is_built_without_allocator() {
        let manifest =
            DevjitManifest::from_toml("[[devices]]\nname = \"/device:TPU:0\"\ndevice-type = \"TPU\"\n")
                .unwrap();
        let reports = reports(&manifest, None).unwrap();
        assert!(matches!(
            &reports[0].compiler,
            CompilerOutcome::Built { jit_device_type, client: false, .. } if jit_device_type == "TPU_XLA_JIT"
        ));

        let json = serde_json::to_value(&reports).unwrap();
        assert_eq!(json[0]["compiler"]["status"], "built");
        assert!(json[0]["compiler"].get("allocator_platform").is_none());
        assert!(json[0]["compiler"]["allocator_error"].is_string());
    }
}
