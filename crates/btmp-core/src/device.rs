//! The `Device` trait -- capability interface to one radio chip variant.
//!
//! The engine never talks to a transport directly. Everything it needs from
//! the hardware (raw register access, HCI command/event exchange, session
//! lifecycle controls, parameter setters) is expressed here, and each chip
//! variant provides one implementation wired in at construction time.
//!
//! All methods are `async` because real implementations sit on serial or USB
//! transports. The engine awaits every call to completion before accepting
//! the next command; implementations own their own timeouts and retries.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChipInfo, CounterSample, RegisterSpace, SessionClass, TestConfig};

/// HCI event code for "Command Complete".
pub const HCI_EVENT_COMMAND_COMPLETE: u8 = 0x0E;

/// Asynchronous interface to a radio chip under manufacturing test.
#[async_trait]
pub trait Device: Send {
    // ------------------------------------------------------------------
    // Raw access
    // ------------------------------------------------------------------

    /// Read a full register word.
    ///
    /// `page` is only meaningful for [`RegisterSpace::Bb`].
    async fn read_register(&mut self, space: RegisterSpace, page: u8, address: u16)
        -> Result<u32>;

    /// Write a full register word.
    async fn write_register(
        &mut self,
        space: RegisterSpace,
        page: u8,
        address: u16,
        value: u32,
    ) -> Result<()>;

    /// Send a raw HCI command and collect the bytes of the expected event.
    async fn send_hci_command(
        &mut self,
        opcode: u16,
        payload: &[u8],
        event_code: u8,
    ) -> Result<Vec<u8>>;

    /// Query the chip identity.
    async fn chip_info(&mut self) -> Result<ChipInfo>;

    // ------------------------------------------------------------------
    // Reset controls
    // ------------------------------------------------------------------

    /// Issue an HCI reset and wait up to `timeout` for it to complete.
    async fn hci_reset(&mut self, timeout: Duration) -> Result<()>;

    /// Reset the device-side watchdog/retry counter.
    async fn reset_counters(&mut self) -> Result<()>;

    // ------------------------------------------------------------------
    // Parameter setters
    // ------------------------------------------------------------------

    async fn set_tx_gain_table(&mut self, table: &[u8]) -> Result<()>;

    async fn set_tx_dac_table(&mut self, table: &[u8]) -> Result<()>;

    async fn set_tx_channel(&mut self, channel: u8) -> Result<()>;

    async fn set_rx_channel(&mut self, channel: u8) -> Result<()>;

    async fn set_power_gain_index(&mut self, index: u8) -> Result<()>;

    async fn set_power_gain(&mut self, gain: u8) -> Result<()>;

    async fn set_power_dac(&mut self, dac: u8) -> Result<()>;

    async fn set_payload_type(&mut self, payload_type: u8) -> Result<()>;

    async fn set_whitening_coeff(&mut self, coeff: u8) -> Result<()>;

    async fn set_packet_type(&mut self, packet_type: u8) -> Result<()>;

    /// Program the 48-bit test address.
    async fn set_hit_target(&mut self, target: u64) -> Result<()>;

    async fn set_test_mode(&mut self, mode: u8) -> Result<()>;

    async fn set_multi_rx_enable(&mut self, enable: u8) -> Result<()>;

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Begin a test session using the device's current channel and packet
    /// type.
    async fn session_begin(&mut self, class: SessionClass, config: &TestConfig) -> Result<()>;

    /// Begin a test session, first applying `config.channel` and
    /// `config.packet_type`.
    async fn session_begin_with_config(
        &mut self,
        class: SessionClass,
        config: &TestConfig,
    ) -> Result<()>;

    /// Poll the hardware counters of a running session.
    ///
    /// Returns the deltas accumulated since the previous poll.
    async fn session_update(
        &mut self,
        class: SessionClass,
        config: &TestConfig,
    ) -> Result<CounterSample>;

    /// Stop a running session.
    async fn session_stop(&mut self, class: SessionClass, config: &TestConfig) -> Result<()>;

    /// Transmit exactly one packet in a running packet-TX session.
    async fn send_one_packet(&mut self, config: &TestConfig) -> Result<CounterSample>;
}
