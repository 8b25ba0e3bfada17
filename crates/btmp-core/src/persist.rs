//! Configuration persistence capability.
//!
//! The set-config command writes calibration records (a Bluetooth address
//! string or raw bytes) to a file chosen by the host. The engine only decodes
//! the records; the actual write goes through a [`ConfigStore`].

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};

/// Length of the address string written by [`ConfigMode::Address`]
/// (`"AA:BB:CC:DD:EE:FF"`).
pub const CONFIG_ADDRESS_LEN: usize = 17;

/// Record format selected by the set-config mode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigMode {
    /// Mode 0: a 17-byte address string per record.
    Address,
    /// Modes 1..=3: raw bytes decoded from numeric tokens.
    Raw(u8),
}

impl ConfigMode {
    /// Decode the wire mode (`0..=3`).
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(ConfigMode::Address),
            1..=3 => Ok(ConfigMode::Raw(code as u8)),
            other => Err(Error::InvalidParameter(format!(
                "config mode {other} outside 0..=3"
            ))),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            ConfigMode::Address => 0,
            ConfigMode::Raw(m) => m,
        }
    }
}

impl fmt::Display for ConfigMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Destination for persisted configuration records.
#[async_trait]
pub trait ConfigStore: Send {
    /// Replace the contents of `path` with `payload`.
    async fn write(&mut self, path: &str, mode: ConfigMode, payload: &[u8]) -> Result<()>;
}

/// [`ConfigStore`] backed by the local filesystem.
///
/// Relative paths are resolved against an optional base directory.
#[derive(Debug, Clone, Default)]
pub struct FsConfigStore {
    base_dir: Option<PathBuf>,
}

impl FsConfigStore {
    pub fn new() -> Self {
        FsConfigStore { base_dir: None }
    }

    /// Resolve relative paths against `dir`.
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        FsConfigStore {
            base_dir: Some(dir.into()),
        }
    }

    /// Full path a write to `path` lands on.
    pub fn resolve(&self, path: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) => base.join(path),
            None => PathBuf::from(path),
        }
    }
}

#[async_trait]
impl ConfigStore for FsConfigStore {
    async fn write(&mut self, path: &str, mode: ConfigMode, payload: &[u8]) -> Result<()> {
        let full = self.resolve(path);
        debug!(path = %full.display(), %mode, len = payload.len(), "writing config file");
        tokio::fs::write(&full, payload).await?;
        Ok(())
    }
}
