//! Process-wide runtime configuration
//!
//! Configuration is read once, lazily, from the environment unless a value was
//! installed explicitly with [`install`]. It controls the simulated CUDA
//! device topology:
//!
//! | Variable                      | Meaning                                   |
//! |-------------------------------|-------------------------------------------|
//! | `TENSORKIT_CUDA_DEVICES`      | number of CUDA devices (default 1)        |
//! | `TENSORKIT_CUDA_MEMORY_LIMIT` | per-device byte budget (default: none)    |

use crate::error::{Error, Result};
use parking_lot::RwLock;

/// Environment variable holding the CUDA device count
pub const ENV_CUDA_DEVICES: &str = "TENSORKIT_CUDA_DEVICES";
/// Environment variable holding the per-device CUDA memory budget in bytes
pub const ENV_CUDA_MEMORY_LIMIT: &str = "TENSORKIT_CUDA_MEMORY_LIMIT";

/// Runtime configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Number of CUDA devices; `CUDA:i` with `i >= cuda_device_count` is unavailable
    pub cuda_device_count: usize,
    /// Byte budget applied to each CUDA device, `None` for unlimited
    pub cuda_memory_limit: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cuda_device_count: 1,
            cuda_memory_limit: None,
        }
    }
}

impl RuntimeConfig {
    /// Set the CUDA device count
    pub fn with_cuda_device_count(mut self, count: usize) -> Self {
        self.cuda_device_count = count;
        self
    }

    /// Set the per-device CUDA memory budget
    pub fn with_cuda_memory_limit(mut self, limit: Option<usize>) -> Self {
        self.cuda_memory_limit = limit;
        self
    }

    /// Build from environment variables, falling back to defaults for unset ones
    ///
    /// Returns `InvalidArgument` when a variable is set but not a valid count.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(count) = read_env_usize(ENV_CUDA_DEVICES)? {
            config.cuda_device_count = count;
        }
        if let Some(limit) = read_env_usize(ENV_CUDA_MEMORY_LIMIT)? {
            config.cuda_memory_limit = Some(limit);
        }
        Ok(config)
    }
}

fn read_env_usize(name: &'static str) -> Result<Option<usize>> {
    match std::env::var(name) {
        Ok(raw) => parse_usize(name, &raw).map(Some),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(Error::invalid_argument(
            name,
            "value is not valid unicode",
        )),
    }
}

fn parse_usize(name: &'static str, raw: &str) -> Result<usize> {
    raw.trim()
        .replace('_', "")
        .parse::<usize>()
        .map_err(|_| Error::invalid_argument(name, format!("expected an integer, got '{raw}'")))
}

static CONFIG: RwLock<Option<RuntimeConfig>> = parking_lot::const_rwlock(None);

/// Install `config` as the process-wide configuration
///
/// Devices already holding allocations keep them; new budgets apply to later
/// allocations.
pub fn install(config: RuntimeConfig) {
    tracing::debug!(?config, "installing runtime config");
    *CONFIG.write() = Some(config);
}

/// The active configuration, loading it from the environment on first use
///
/// A malformed environment logs a warning and falls back to defaults.
pub fn current() -> RuntimeConfig {
    if let Some(config) = CONFIG.read().as_ref() {
        return config.clone();
    }

    let mut slot = CONFIG.write();
    slot.get_or_insert_with(|| {
        RuntimeConfig::from_env().unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring malformed runtime configuration");
            RuntimeConfig::default()
        })
    })
    .clone()
}
