//! Process-wide JIT flags.
//!
//! Flags are read once at startup, from the environment or a manifest, and
//! are read-only afterwards.

use std::path::PathBuf;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::{JitError, Result};

/// Environment variable naming the persistent cache directory.
pub const CACHE_DIRECTORY_VAR: &str = "DEVJIT_PERSISTENT_CACHE_DIRECTORY";
/// Environment variable naming the persistent cache file prefix.
pub const CACHE_PREFIX_VAR: &str = "DEVJIT_PERSISTENT_CACHE_PREFIX";
/// Environment variable disabling strict signature checks on cache entries.
pub const DISABLE_STRICT_SIGNATURE_CHECKS_VAR: &str = "DEVJIT_DISABLE_STRICT_SIGNATURE_CHECKS";

/// Default prefix of persisted executables.
pub const DEFAULT_CACHE_PREFIX: &str = "xla_compile_cache";

/// JIT flags controlling executable persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct JitFlags {
    /// Directory persisted executables are written to. Empty disables
    /// persistence.
    pub persistent_cache_directory: PathBuf,
    /// Skip the strict signature comparison when loading cache entries.
    pub disable_strict_signature_checks: bool,
    /// File-name prefix of persisted executables.
    pub persistent_cache_prefix: String,
}

impl Default for JitFlags {
    fn default() -> Self {
        Self {
            persistent_cache_directory: PathBuf::new(),
            disable_strict_signature_checks: false,
            persistent_cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
        }
    }
}

static GLOBAL_FLAGS: OnceCell<JitFlags> = OnceCell::new();

impl JitFlags {
    /// Read flags from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read flags through `lookup`, falling back to defaults for unset names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut flags = Self::default();
        if let Some(dir) = lookup(CACHE_DIRECTORY_VAR) {
            flags.persistent_cache_directory = PathBuf::from(dir);
        }
        if let Some(prefix) = lookup(CACHE_PREFIX_VAR) {
            flags.persistent_cache_prefix = prefix;
        }
        if let Some(value) = lookup(DISABLE_STRICT_SIGNATURE_CHECKS_VAR) {
            flags.disable_strict_signature_checks =
                parse_bool(DISABLE_STRICT_SIGNATURE_CHECKS_VAR, &value)?;
        }
        Ok(flags)
    }

    /// Install the process-wide flags.
    ///
    /// Returns `false` if flags were already installed (or already read via
    /// [`JitFlags::global`]); the installed value is left unchanged.
    pub fn init_global(flags: JitFlags) -> bool {
        GLOBAL_FLAGS.set(flags).is_ok()
    }

    /// Process-wide flags. Reads the environment on first use if nothing
    /// was installed.
    pub fn global() -> &'static JitFlags {
        GLOBAL_FLAGS.get_or_init(|| {
            JitFlags::from_env().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "ignoring malformed JIT flags, using defaults");
                JitFlags::default()
            })
        })
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        other => Err(JitError::Config {
            name: name.to_string(),
            detail: format!("expected a boolean, got '{other}'"),
        }),
    }
}
