//! Session configuration consulted while building compilers.

use serde::{Deserialize, Serialize};

/// Accelerator options of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GpuOptions {
    /// Comma-separated accelerator ordinals this session may use.
    /// Empty means no restriction.
    #[serde(default)]
    pub visible_device_list: String,
}

/// Per-session configuration record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionConfig {
    #[serde(default)]
    pub gpu_options: GpuOptions,
}

impl SessionConfig {
    /// Configuration restricting accelerators to `visible_device_list`.
    pub fn with_visible_devices(visible_device_list: impl Into<String>) -> Self {
        Self {
            gpu_options: GpuOptions {
                visible_device_list: visible_device_list.into(),
            },
        }
    }
}

/// Anything that may carry a [`SessionConfig`], typically a function runtime.
pub trait ConfigSource {
    fn session_config(&self) -> Option<&SessionConfig>;
}

impl ConfigSource for SessionConfig {
    fn session_config(&self) -> Option<&SessionConfig> {
        Some(self)
    }
}

impl ConfigSource for Option<SessionConfig> {
    fn session_config(&self) -> Option<&SessionConfig> {
        self.as_ref()
    }
}

/// No configuration record.
impl ConfigSource for () {
    fn session_config(&self) -> Option<&SessionConfig> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_toml() {
        let config: SessionConfig = toml::from_str(
            r#"
[gpu-options]
visible-device-list = "1,3"
"#,
        )
        .unwrap();
        assert_eq!(config.gpu_options.visible_device_list, "1,3");
    }

    #[test]
    fn missing_sections_default_to_unrestricted() {
        let config: SessionConfig = toml::from_str("").unwrap();
        assert!(config.gpu_options.visible_device_list.is_empty());
    }

    #[test]
    fn sources() {
        assert!(().session_config().is_none());
        assert!(None::<SessionConfig>.session_config().is_none());
        let config = SessionConfig::with_visible_devices("0");
        assert_eq!(
            Some(config.clone()).session_config().unwrap().gpu_options.visible_device_list,
            "0"
        );
        assert_eq!(config.session_config(), Some(&config));
    }
}
