//! MpModuleBuilder -- fluent builder for constructing [`MpModule`] instances.
//!
//! Separates configuration from construction so that callers can set the
//! grammar delimiters, the HCI reset timeout, and the calibration defaults
//! before the device is handed over.
//!
//! # Example
//!
//! ```no_run
//! use btmp_engine::builder::MpModuleBuilder;
//! use btmp_engine::models::rtl8761;
//! use std::time::Duration;
//!
//! # fn example<D: btmp_core::Device>(device: D) -> btmp_core::Result<()> {
//! let module = MpModuleBuilder::with_model(rtl8761())
//!     .hci_reset_timeout(Duration::from_millis(1000))
//!     .config_dir("/data/misc/bluedroid")
//!     .build(device)?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use btmp_core::{ConfigStore, Device, Error, FsConfigStore, Result};
use btmp_protocol::Delimiters;

use crate::dispatch::{DEFAULT_HCI_RESET_TIMEOUT, Dispatcher};
use crate::models::{ChipModel, rtl8761};
use crate::module::MpModule;
use crate::params::{
    DEFAULT_MULTI_RX_ENABLE, DEFAULT_TEST_MODE, ParameterStore, TX_DAC_TABLE_LEN,
    TX_GAIN_TABLE_LEN,
};

/// Fluent builder for [`MpModule`].
///
/// All configuration has defaults derived from the [`ChipModel`], so the
/// simplest usage is:
///
/// ```ignore
/// let module = MpModuleBuilder::new().build(device)?;
/// ```
pub struct MpModuleBuilder {
    model: ChipModel,
    delimiters: Delimiters,
    hci_reset_timeout: Duration,
    tx_gain_table: Option<[u8; TX_GAIN_TABLE_LEN]>,
    tx_dac_table: Option<[u8; TX_DAC_TABLE_LEN]>,
    test_mode: u8,
    multi_rx_enable: u8,
    config_dir: Option<PathBuf>,
}

impl Default for MpModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MpModuleBuilder {
    /// Create a builder for the default chip model (RTL8761).
    pub fn new() -> Self {
        Self::with_model(rtl8761())
    }

    /// Create a builder for the given chip model.
    pub fn with_model(model: ChipModel) -> Self {
        MpModuleBuilder {
            model,
            delimiters: Delimiters::default(),
            hci_reset_timeout: DEFAULT_HCI_RESET_TIMEOUT,
            tx_gain_table: None,
            tx_dac_table: None,
            test_mode: DEFAULT_TEST_MODE,
            multi_rx_enable: DEFAULT_MULTI_RX_ENABLE,
            config_dir: None,
        }
    }

    /// Override the pair, field, and result delimiters.
    pub fn delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// Set the timeout for the HCI reset action (default: 700ms).
    pub fn hci_reset_timeout(mut self, timeout: Duration) -> Self {
        self.hci_reset_timeout = timeout;
        self
    }

    /// Override the model's TX gain table.
    pub fn tx_gain_table(mut self, table: [u8; TX_GAIN_TABLE_LEN]) -> Self {
        self.tx_gain_table = Some(table);
        self
    }

    /// Override the model's TX DAC table.
    pub fn tx_dac_table(mut self, table: [u8; TX_DAC_TABLE_LEN]) -> Self {
        self.tx_dac_table = Some(table);
        self
    }

    /// Set the test mode pushed by the set-test-mode action (default: 1,
    /// pseudo-random).
    pub fn test_mode(mut self, mode: u8) -> Self {
        self.test_mode = mode;
        self
    }

    pub fn multi_rx_enable(mut self, enable: u8) -> Self {
        self.multi_rx_enable = enable;
        self
    }

    /// Directory that relative `bt_mp_SetConfig` paths resolve against.
    ///
    /// Only used by [`build()`](Self::build).
    pub fn config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    /// Build an [`MpModule`] with a caller-provided config store.
    ///
    /// This is the primary entry point for testing (pass a
    /// `MemoryConfigStore` from `btmp-test-harness`).
    pub fn build_with_store<D: Device, S: ConfigStore>(
        self,
        device: D,
        store: S,
    ) -> Result<MpModule<D, S>> {
        validate_delimiters(&self.delimiters)?;

        let mut params = ParameterStore::new();
        params.set_tx_gain_table(self.tx_gain_table.unwrap_or(self.model.tx_gain_table));
        params.set_tx_dac_table(self.tx_dac_table.unwrap_or(self.model.tx_dac_table));
        let config = params.config_mut();
        config.test_mode = self.test_mode;
        config.multi_rx_enable = self.multi_rx_enable;

        Ok(MpModule::new(
            device,
            store,
            self.model,
            params,
            Dispatcher::new(self.hci_reset_timeout),
            self.delimiters,
        ))
    }

    /// Build an [`MpModule`] that persists configuration to the filesystem.
    pub fn build<D: Device>(self, device: D) -> Result<MpModule<D, FsConfigStore>> {
        let store = match &self.config_dir {
            Some(dir) => FsConfigStore::with_base_dir(dir.clone()),
            None => FsConfigStore::new(),
        };
        self.build_with_store(device, store)
    }
}

fn validate_delimiters(d: &Delimiters) -> Result<()> {
    for (name, c) in [("pair", d.pair), ("field", d.field)] {
        if c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '+') {
            return Err(Error::InvalidParameter(format!(
                "{name} delimiter {c:?} collides with command text"
            )));
        }
    }
    if d.result.is_alphanumeric() {
        return Err(Error::InvalidParameter(format!(
            "result delimiter {:?} collides with hex output",
            d.result
        )));
    }
    if d.pair == d.field {
        return Err(Error::InvalidParameter(
            "pair and field delimiters must differ".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::SessionState;
    use btmp_test_harness::{DeviceCall, MemoryConfigStore, MockDevice};

    #[tokio::test]
    async fn builder_defaults() {
        let m = MpModuleBuilder::new()
            .build_with_store(MockDevice::new(), MemoryConfigStore::new())
            .unwrap();
        assert_eq!(m.model().name, "RTL8761");
        assert_eq!(m.params().tx_dac_table(), &[0x10, 0x11, 0x12, 0x13, 0x14]);
        assert_eq!(m.params().config().test_mode, DEFAULT_TEST_MODE);
        assert_eq!(m.delimiters(), Delimiters::default());
        assert_eq!(m.session_state(), SessionState::Idle);
        assert!(m.session_report().is_baseline());
    }

    #[tokio::test]
    async fn builder_custom_settings() {
        let mut m = MpModuleBuilder::new()
            .hci_reset_timeout(Duration::from_millis(50))
            .tx_gain_table([1, 2, 3, 4, 5, 6, 7])
            .tx_dac_table([9, 9, 9, 9, 9])
            .test_mode(0)
            .multi_rx_enable(1)
            .build_with_store(MockDevice::new(), MemoryConfigStore::new())
            .unwrap();
        assert_eq!(m.params().tx_gain_table(), &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(m.params().config().multi_rx_enable, 1);

        m.exec_action(crate::action::Action::HciReset).await.unwrap();
        assert_eq!(
            m.device().calls()[0],
            DeviceCall::HciReset(Duration::from_millis(50))
        );
    }

    #[test]
    fn builder_fs_store_uses_config_dir() {
        let m = MpModuleBuilder::new()
            .config_dir("/tmp/btmp")
            .build(MockDevice::new())
            .unwrap();
        assert_eq!(
            m.config_store().resolve("bt_addr"),
            PathBuf::from("/tmp/btmp/bt_addr")
        );
    }

    #[test]
    fn builder_rejects_bad_delimiters() {
        for d in [
            Delimiters {
                pair: ',',
                field: ',',
                result: ',',
            },
            Delimiters {
                pair: 'x',
                field: ',',
                result: ',',
            },
            Delimiters {
                pair: '|',
                field: ' ',
                result: ',',
            },
            Delimiters {
                pair: '|',
                field: ',',
                result: 'a',
            },
        ] {
            let result = MpModuleBuilder::new()
                .delimiters(d)
                .build_with_store(MockDevice::new(), MemoryConfigStore::new());
            assert!(result.is_err(), "{d:?}");
        }
    }
}
