//! Mock device for deterministic testing of the command engine.
//!
//! [`MockDevice`] implements the [`Device`] trait over an in-memory register
//! file, a queue of scripted counter samples, and canned HCI events. Every
//! call is recorded so tests can assert exactly what the engine asked the
//! device to do, and in what order.
//!
//! # Example
//!
//! ```
//! use btmp_core::{CounterSample, RegisterSpace};
//! use btmp_test_harness::MockDevice;
//!
//! let mut mock = MockDevice::new();
//! mock.set_register(RegisterSpace::Rf, 0, 0x3c, 0xf0);
//! mock.push_sample(CounterSample { tx_bits: 1000, tx_packets: 10, ..Default::default() });
//! ```

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;

use btmp_core::{
    ChipInfo, CounterSample, Device, Error, RegisterSpace, Result, SessionClass, TestConfig,
};

/// One recorded call into the mock device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    ReadRegister {
        space: RegisterSpace,
        page: u8,
        address: u16,
    },
    WriteRegister {
        space: RegisterSpace,
        page: u8,
        address: u16,
        value: u32,
    },
    HciCommand {
        opcode: u16,
        payload: Vec<u8>,
        event_code: u8,
    },
    ChipInfo,
    HciReset(Duration),
    ResetCounters,
    SetTxGainTable(Vec<u8>),
    SetTxDacTable(Vec<u8>),
    SetTxChannel(u8),
    SetRxChannel(u8),
    SetPowerGainIndex(u8),
    SetPowerGain(u8),
    SetPowerDac(u8),
    SetPayloadType(u8),
    SetWhiteningCoeff(u8),
    SetPacketType(u8),
    SetHitTarget(u64),
    SetTestMode(u8),
    SetMultiRxEnable(u8),
    SessionBegin(SessionClass),
    SessionBeginWithConfig(SessionClass),
    SessionUpdate(SessionClass),
    SessionStop(SessionClass),
    SendOnePacket,
}

/// A mock [`Device`] for testing without hardware.
///
/// Unset registers read as zero. Counter polls pop the next scripted
/// sample, falling back to the auto sample once the queue is empty. HCI
/// commands without a canned event answer with a minimal Command Complete
/// event carrying a success status.
#[derive(Debug, Default)]
pub struct MockDevice {
    registers: HashMap<(RegisterSpace, u8, u16), u32>,
    samples: VecDeque<CounterSample>,
    auto_sample: CounterSample,
    hci_responses: HashMap<u16, Vec<u8>>,
    chip_info: ChipInfo,
    fail_next: Option<Error>,
    calls: Vec<DeviceCall>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset a register word.
    pub fn set_register(&mut self, space: RegisterSpace, page: u8, address: u16, value: u32) {
        self.registers.insert((space, page, address), value);
    }

    /// Current register word (zero if never written).
    pub fn register(&self, space: RegisterSpace, page: u8, address: u16) -> u32 {
        self.registers
            .get(&(space, page, address))
            .copied()
            .unwrap_or(0)
    }

    /// Queue a sample for the next counter poll.
    pub fn push_sample(&mut self, sample: CounterSample) {
        self.samples.push_back(sample);
    }

    /// Sample returned once the scripted queue is exhausted.
    pub fn set_auto_sample(&mut self, sample: CounterSample) {
        self.auto_sample = sample;
    }

    /// Canned event bytes for `opcode`.
    pub fn set_hci_response(&mut self, opcode: u16, event: Vec<u8>) {
        self.hci_responses.insert(opcode, event);
    }

    pub fn set_chip_info(&mut self, info: ChipInfo) {
        self.chip_info = info;
    }

    /// Make the next device call fail with `err`.
    pub fn fail_next(&mut self, err: Error) {
        self.fail_next = Some(err);
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Record a call and consume any pending injected failure.
    fn record(&mut self, call: DeviceCall) -> Result<()> {
        self.calls.push(call);
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_sample(&mut self) -> CounterSample {
        self.samples.pop_front().unwrap_or(self.auto_sample)
    }
}

#[async_trait]
impl Device for MockDevice {
    async fn read_register(&mut self, space: RegisterSpace, page: u8, address: u16) -> Result<u32> {
        self.record(DeviceCall::ReadRegister {
            space,
            page,
            address,
        })?;
        Ok(self.register(space, page, address))
    }

    async fn write_register(
        &mut self,
        space: RegisterSpace,
        page: u8,
        address: u16,
        value: u32,
    ) -> Result<()> {
        self.record(DeviceCall::WriteRegister {
            space,
            page,
            address,
            value,
        })?;
        self.set_register(space, page, address, value);
        Ok(())
    }

    async fn send_hci_command(
        &mut self,
        opcode: u16,
        payload: &[u8],
        event_code: u8,
    ) -> Result<Vec<u8>> {
        self.record(DeviceCall::HciCommand {
            opcode,
            payload: payload.to_vec(),
            event_code,
        })?;
        let [lo, hi] = opcode.to_le_bytes();
        Ok(self
            .hci_responses
            .get(&opcode)
            .cloned()
            .unwrap_or_else(|| vec![event_code, 0x04, 0x01, lo, hi, 0x00]))
    }

    async fn chip_info(&mut self) -> Result<ChipInfo> {
        self.record(DeviceCall::ChipInfo)?;
        Ok(self.chip_info.clone())
    }

    async fn hci_reset(&mut self, timeout: Duration) -> Result<()> {
        self.record(DeviceCall::HciReset(timeout))
    }

    async fn reset_counters(&mut self) -> Result<()> {
        self.record(DeviceCall::ResetCounters)
    }

    async fn set_tx_gain_table(&mut self, table: &[u8]) -> Result<()> {
        self.record(DeviceCall::SetTxGainTable(table.to_vec()))
    }

    async fn set_tx_dac_table(&mut self, table: &[u8]) -> Result<()> {
        self.record(DeviceCall::SetTxDacTable(table.to_vec()))
    }

    async fn set_tx_channel(&mut self, channel: u8) -> Result<()> {
        self.record(DeviceCall::SetTxChannel(channel))
    }

    async fn set_rx_channel(&mut self, channel: u8) -> Result<()> {
        self.record(DeviceCall::SetRxChannel(channel))
    }

    async fn set_power_gain_index(&mut self, index: u8) -> Result<()> {
        self.record(DeviceCall::SetPowerGainIndex(index))
    }

    async fn set_power_gain(&mut self, gain: u8) -> Result<()> {
        self.record(DeviceCall::SetPowerGain(gain))
    }

    async fn set_power_dac(&mut self, dac: u8) -> Result<()> {
        self.record(DeviceCall::SetPowerDac(dac))
    }

    async fn set_payload_type(&mut self, payload_type: u8) -> Result<()> {
        self.record(DeviceCall::SetPayloadType(payload_type))
    }

    async fn set_whitening_coeff(&mut self, coeff: u8) -> Result<()> {
        self.record(DeviceCall::SetWhiteningCoeff(coeff))
    }

    async fn set_packet_type(&mut self, packet_type: u8) -> Result<()> {
        self.record(DeviceCall::SetPacketType(packet_type))
    }

    async fn set_hit_target(&mut self, target: u64) -> Result<()> {
        self.record(DeviceCall::SetHitTarget(target))
    }

    async fn set_test_mode(&mut self, mode: u8) -> Result<()> {
        self.record(DeviceCall::SetTestMode(mode))
    }

    async fn set_multi_rx_enable(&mut self, enable: u8) -> Result<()> {
        self.record(DeviceCall::SetMultiRxEnable(enable))
    }

    async fn session_begin(&mut self, class: SessionClass, _config: &TestConfig) -> Result<()> {
        self.record(DeviceCall::SessionBegin(class))
    }

    async fn session_begin_with_config(
        &mut self,
        class: SessionClass,
        _config: &TestConfig,
    ) -> Result<()> {
        self.record(DeviceCall::SessionBeginWithConfig(class))
    }

    async fn session_update(
        &mut self,
        class: SessionClass,
        _config: &TestConfig,
    ) -> Result<CounterSample> {
        self.record(DeviceCall::SessionUpdate(class))?;
        Ok(self.next_sample())
    }

    async fn session_stop(&mut self, class: SessionClass, _config: &TestConfig) -> Result<()> {
        self.record(DeviceCall::SessionStop(class))
    }

    async fn send_one_packet(&mut self, _config: &TestConfig) -> Result<CounterSample> {
        self.record(DeviceCall::SendOnePacket)?;
        Ok(self.next_sample())
    }
}
