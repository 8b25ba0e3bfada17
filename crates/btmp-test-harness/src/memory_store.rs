//! In-memory [`ConfigStore`] that records every write.

use async_trait::async_trait;

use btmp_core::{ConfigMode, ConfigStore, Error, Result};

/// One recorded configuration write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWrite {
    pub path: String,
    pub mode: ConfigMode,
    pub payload: Vec<u8>,
}

/// A [`ConfigStore`] that keeps writes in memory.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    writes: Vec<ConfigWrite>,
    fail_next: Option<Error>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful writes, oldest first.
    pub fn writes(&self) -> &[ConfigWrite] {
        &self.writes
    }

    /// Latest payload written to `path`.
    pub fn contents(&self, path: &str) -> Option<&[u8]> {
        self.writes
            .iter()
            .rev()
            .find(|w| w.path == path)
            .map(|w| w.payload.as_slice())
    }

    /// Make the next write fail with `err`.
    pub fn fail_next(&mut self, err: Error) {
        self.fail_next = Some(err);
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn write(&mut self, path: &str, mode: ConfigMode, payload: &[u8]) -> Result<()> {
        if let Some(err) = self.fail_next.take() {
            return Err(err);
        }
        self.writes.push(ConfigWrite {
            path: path.to_string(),
            mode,
            payload: payload.to_vec(),
        });
        Ok(())
    }
}
