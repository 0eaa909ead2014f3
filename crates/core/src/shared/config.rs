use std::path::PathBuf;
use std::time::Duration;

use super::constants::{DEFAULT_SOX_PROGRAM, DEFAULT_TOOL_TIMEOUT_SECS};
use super::resource_resolver::{default_cache_dir, default_resources_dir, ResourceError};

/// Settings for building the production degradation environment.
#[derive(Clone, Debug, PartialEq)]
pub struct DegraderConfig {
    /// Root for relative noise and impulse-response paths.
    pub resources_dir: PathBuf,
    /// Where downloaded remote resources are kept.
    pub cache_dir: PathBuf,
    /// Parent of the scoped temporary directories.
    pub tmp_dir: PathBuf,
    pub tool_timeout: Duration,
    pub sox_program: String,
}

impl DegraderConfig {
    /// Configuration using the platform data/cache directories and the
    /// system temp dir.
    pub fn from_platform_dirs() -> Result<Self, ResourceError> {
        Ok(Self {
            resources_dir: default_resources_dir()?,
            cache_dir: default_cache_dir()?,
            tmp_dir: std::env::temp_dir(),
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            sox_program: DEFAULT_SOX_PROGRAM.to_string(),
        })
    }

    pub fn with_resources_dir(mut self, dir: PathBuf) -> Self {
        self.resources_dir = dir;
        self
    }

    pub fn with_tmp_dir(mut self, dir: PathBuf) -> Self {
        self.tmp_dir = dir;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_sox_program(mut self, program: impl Into<String>) -> Self {
        self.sox_program = program.into();
        self
    }
}
