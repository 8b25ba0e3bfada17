//! Parameter store -- the indexed test configuration table.
//!
//! The host addresses device test parameters by a small integer index
//! (`0..15`). Most slots are scalars of a fixed width; slots 0, 12, and 13
//! are byte arrays written element-by-element. The store owns the values and
//! renders them back in the exact hex widths the host tooling expects.
//!
//! | Index | Slot                  | Width            |
//! |-------|-----------------------|------------------|
//! | 0     | PG raw data           | bytes, `[0]` = length |
//! | 1     | channel number        | 8                |
//! | 2     | packet type           | 8                |
//! | 3     | payload type          | 8                |
//! | 4     | TX packet count       | 16               |
//! | 5     | TX gain value         | 8                |
//! | 6     | whitening coefficient | 8                |
//! | 7     | TX gain index         | 8                |
//! | 8     | TX DAC                | 8                |
//! | 9     | packet header         | 16               |
//! | 10    | hopping fixed channel | 8                |
//! | 11    | hit target            | 48               |
//! | 12    | TX gain table         | 7 bytes          |
//! | 13    | TX DAC table          | 5 bytes          |
//! | 14    | crystal trim          | 32               |

use std::fmt::Write as _;

use btmp_core::{Error, Result, TestConfig};

/// Number of addressable parameter slots.
pub const PARAM_COUNT: usize = 15;

/// Maximum number of bytes held by the PG raw data slot.
pub const PG_RAW_DATA_CAPACITY: usize = 256;

/// Entries in the TX gain table.
pub const TX_GAIN_TABLE_LEN: usize = 7;

/// Entries in the TX DAC table.
pub const TX_DAC_TABLE_LEN: usize = 5;

/// Mask applied to the hit target (48-bit Bluetooth address).
pub const HIT_TARGET_MASK: u64 = 0xFFFF_FFFF_FFFF;

pub const DEFAULT_CHANNEL: u8 = 10;
/// 3-DH5.
pub const DEFAULT_PACKET_TYPE: u8 = 0x0E;
/// PRBS9.
pub const DEFAULT_PAYLOAD_TYPE: u8 = 0x03;
pub const DEFAULT_TX_PACKET_COUNT: u16 = 0;
pub const DEFAULT_TX_GAIN_VALUE: u8 = 0xA9;
pub const DEFAULT_WHITENING_COEFF: u8 = 0;
pub const DEFAULT_TX_GAIN_INDEX: u8 = 0xFF;
pub const DEFAULT_TX_DAC: u8 = 0x13;
pub const DEFAULT_PACKET_HEADER: u16 = 0x1234;
pub const DEFAULT_HOPPING_FIX_CHANNEL: u8 = 0;
pub const DEFAULT_HIT_TARGET: u64 = 0x0000_009E_8B33;
/// Pseudo-random test mode.
pub const DEFAULT_TEST_MODE: u8 = 0x01;
pub const DEFAULT_MULTI_RX_ENABLE: u8 = 0;

/// One addressable slot of the parameter table.
///
/// Declaration order is the wire index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    PgRawData,
    Channel,
    PacketType,
    PayloadType,
    TxPacketCount,
    TxGainValue,
    WhiteningCoeff,
    TxGainIndex,
    TxDac,
    PacketHeader,
    HoppingFixChannel,
    HitTarget,
    TxGainTable,
    TxDacTable,
    Xtal,
}

/// Slots in index order.
const PARAMS: [Param; PARAM_COUNT] = [
    Param::PgRawData,
    Param::Channel,
    Param::PacketType,
    Param::PayloadType,
    Param::TxPacketCount,
    Param::TxGainValue,
    Param::WhiteningCoeff,
    Param::TxGainIndex,
    Param::TxDac,
    Param::PacketHeader,
    Param::HoppingFixChannel,
    Param::HitTarget,
    Param::TxGainTable,
    Param::TxDacTable,
    Param::Xtal,
];

impl Param {
    /// Resolve a host-supplied index.
    pub fn from_index(index: i64) -> Result<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| PARAMS.get(i).copied())
            .ok_or_else(|| {
                Error::InvalidParameter(format!(
                    "parameter index {index} outside 0..{PARAM_COUNT}"
                ))
            })
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether the slot takes the variable `index,count,data…` encoding.
    pub fn is_array(self) -> bool {
        matches!(self, Param::PgRawData | Param::TxGainTable | Param::TxDacTable)
    }
}

/// The device test configuration, addressable by [`Param`] index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterStore {
    config: TestConfig,
    pg_raw_data: Vec<u8>,
    tx_gain_table: [u8; TX_GAIN_TABLE_LEN],
    tx_dac_table: [u8; TX_DAC_TABLE_LEN],
    xtal: u32,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    /// A store holding the power-on defaults.
    pub fn new() -> Self {
        ParameterStore {
            config: TestConfig {
                channel: DEFAULT_CHANNEL,
                packet_type: DEFAULT_PACKET_TYPE,
                payload_type: DEFAULT_PAYLOAD_TYPE,
                tx_packet_count: DEFAULT_TX_PACKET_COUNT,
                tx_gain_value: DEFAULT_TX_GAIN_VALUE,
                whitening_coeff: DEFAULT_WHITENING_COEFF,
                tx_gain_index: DEFAULT_TX_GAIN_INDEX,
                tx_dac: DEFAULT_TX_DAC,
                packet_header: DEFAULT_PACKET_HEADER,
                hopping_fix_channel: DEFAULT_HOPPING_FIX_CHANNEL,
                hit_target: DEFAULT_HIT_TARGET,
                test_mode: DEFAULT_TEST_MODE,
                multi_rx_enable: DEFAULT_MULTI_RX_ENABLE,
            },
            pg_raw_data: vec![0],
            tx_gain_table: [0; TX_GAIN_TABLE_LEN],
            tx_dac_table: [0; TX_DAC_TABLE_LEN],
            xtal: 0,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Scalar configuration handed to the device.
    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TestConfig {
        &mut self.config
    }

    pub fn pg_raw_data(&self) -> &[u8] {
        &self.pg_raw_data
    }

    pub fn tx_gain_table(&self) -> &[u8; TX_GAIN_TABLE_LEN] {
        &self.tx_gain_table
    }

    pub fn tx_dac_table(&self) -> &[u8; TX_DAC_TABLE_LEN] {
        &self.tx_dac_table
    }

    pub fn xtal(&self) -> u32 {
        self.xtal
    }

    pub fn set_tx_gain_table(&mut self, table: [u8; TX_GAIN_TABLE_LEN]) {
        self.tx_gain_table = table;
    }

    pub fn set_tx_dac_table(&mut self, table: [u8; TX_DAC_TABLE_LEN]) {
        self.tx_dac_table = table;
    }

    // ------------------------------------------------------------------
    // Indexed access
    // ------------------------------------------------------------------

    /// Write `value` into slot `index`, narrowed to the slot width.
    ///
    /// Array slots receive the value in element 0.
    pub fn set(&mut self, index: i64, value: i64) -> Result<()> {
        let param = Param::from_index(index)?;
        let c = &mut self.config;
        match param {
            Param::PgRawData => self.pg_raw_data[0] = value as u8,
            Param::Channel => c.channel = value as u8,
            Param::PacketType => c.packet_type = value as u8,
            Param::PayloadType => c.payload_type = value as u8,
            Param::TxPacketCount => c.tx_packet_count = value as u16,
            Param::TxGainValue => c.tx_gain_value = value as u8,
            Param::WhiteningCoeff => c.whitening_coeff = value as u8,
            Param::TxGainIndex => c.tx_gain_index = value as u8,
            Param::TxDac => c.tx_dac = value as u8,
            Param::PacketHeader => c.packet_header = value as u16,
            Param::HoppingFixChannel => c.hopping_fix_channel = value as u8,
            Param::HitTarget => c.hit_target = (value as u64) & HIT_TARGET_MASK,
            Param::TxGainTable => self.tx_gain_table[0] = value as u8,
            Param::TxDacTable => self.tx_dac_table[0] = value as u8,
            Param::Xtal => self.xtal = value as u32,
        }
        Ok(())
    }

    /// Write one byte of an array slot.
    ///
    /// Offsets at or beyond the slot capacity are ignored. Writing the PG
    /// raw data past its current length zero-fills the gap.
    pub fn set_array(&mut self, index: i64, offset: usize, byte: u8) -> Result<()> {
        match Param::from_index(index)? {
            Param::PgRawData => {
                if offset < PG_RAW_DATA_CAPACITY {
                    if offset >= self.pg_raw_data.len() {
                        self.pg_raw_data.resize(offset + 1, 0);
                    }
                    self.pg_raw_data[offset] = byte;
                }
            }
            Param::TxGainTable => {
                if let Some(slot) = self.tx_gain_table.get_mut(offset) {
                    *slot = byte;
                }
            }
            Param::TxDacTable => {
                if let Some(slot) = self.tx_dac_table.get_mut(offset) {
                    *slot = byte;
                }
            }
            other => {
                return Err(Error::InvalidParameter(format!(
                    "parameter {} is not an array slot",
                    other.index()
                )));
            }
        }
        Ok(())
    }

    /// Render slot `index` as `<index><d><value…>`.
    pub fn get(&self, index: i64, delim: char) -> Result<String> {
        let param = Param::from_index(index)?;
        Ok(self.render(param, delim))
    }

    /// Render one slot as `<index><d><value…>` with its fixed hex width.
    pub fn render(&self, param: Param, delim: char) -> String {
        let c = &self.config;
        let mut out = format!("{}{delim}", param.index());
        match param {
            Param::PgRawData => {
                let len = self.pg_raw_data[0];
                let _ = write!(out, "0x{len:02x}");
                for b in self.pg_raw_data.iter().skip(1).take(usize::from(len)) {
                    let _ = write!(out, "{delim}0x{b:02x}");
                }
            }
            Param::Channel => push_u8(&mut out, c.channel),
            Param::PacketType => push_u8(&mut out, c.packet_type),
            Param::PayloadType => push_u8(&mut out, c.payload_type),
            Param::TxPacketCount => push_u16(&mut out, c.tx_packet_count),
            Param::TxGainValue => push_u8(&mut out, c.tx_gain_value),
            Param::WhiteningCoeff => push_u8(&mut out, c.whitening_coeff),
            Param::TxGainIndex => push_u8(&mut out, c.tx_gain_index),
            Param::TxDac => push_u8(&mut out, c.tx_dac),
            Param::PacketHeader => push_u16(&mut out, c.packet_header),
            Param::HoppingFixChannel => push_u8(&mut out, c.hopping_fix_channel),
            Param::HitTarget => {
                let _ = write!(out, "0x{:012x}", c.hit_target);
            }
            Param::TxGainTable => push_bytes(&mut out, &self.tx_gain_table, delim),
            Param::TxDacTable => push_bytes(&mut out, &self.tx_dac_table, delim),
            Param::Xtal => {
                let _ = write!(out, "0x{:08x}", self.xtal);
            }
        }
        out
    }

    /// Render the commonly queried scalars, used when no index is given.
    ///
    /// Order: channel, packet type, payload type, TX count, gain value,
    /// whitening, gain index, DAC, header, hopping channel, hit target.
    pub fn snapshot(&self, delim: char) -> String {
        let c = &self.config;
        let d = delim;
        format!(
            "{:x}{d}{:x}{d}{:x}{d}{:x}{d}{:x}{d}{:x}{d}{:x}{d}{:x}{d}{:x}{d}{:x}{d}{:012x}",
            c.channel,
            c.packet_type,
            c.payload_type,
            c.tx_packet_count,
            c.tx_gain_value,
            c.whitening_coeff,
            c.tx_gain_index,
            c.tx_dac,
            c.packet_header,
            c.hopping_fix_channel,
            c.hit_target,
        )
    }
}

fn push_u8(out: &mut String, v: u8) {
    let _ = write!(out, "0x{v:02x}");
}

fn push_u16(out: &mut String, v: u16) {
    let _ = write!(out, "0x{v:04x}");
}

fn push_bytes(out: &mut String, bytes: &[u8], delim: char) {
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(delim);
        }
        let _ = write!(out, "0x{b:02x}");
    }
}
