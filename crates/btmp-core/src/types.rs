//! Core types shared by the engine and device implementations.

use std::fmt;

use crate::error::{Error, Result};

/// Register bank on the radio chip.
///
/// The wire code is the `type` field of the register read/write command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterSpace {
    /// Baseband registers. The only space that is paged.
    Bb,
    /// Radio-frequency analog/digital registers.
    Rf,
    /// Internal monitor (modem) registers.
    Md,
}

impl RegisterSpace {
    /// Decode the wire code (`0` = BB, `1` = RF, `2` = MD).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RegisterSpace::Bb),
            1 => Some(RegisterSpace::Rf),
            2 => Some(RegisterSpace::Md),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            RegisterSpace::Bb => 0,
            RegisterSpace::Rf => 1,
            RegisterSpace::Md => 2,
        }
    }

    /// Whether addresses in this space carry a page selector.
    pub fn is_paged(self) -> bool {
        self == RegisterSpace::Bb
    }
}

impl fmt::Display for RegisterSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterSpace::Bb => write!(f, "BB"),
            RegisterSpace::Rf => write!(f, "RF"),
            RegisterSpace::Md => write!(f, "MD"),
        }
    }
}

/// Highest bit index addressable in a register word.
pub const REGISTER_MAX_BIT: u8 = 31;

/// A bit field inside one register: `{space, page, address, [msb:lsb]}`.
///
/// Construction validates `msb >= lsb` and `msb <= 31`, so every value of
/// this type describes a non-empty field inside a 32-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterAddress {
    space: RegisterSpace,
    page: u8,
    address: u16,
    msb: u8,
    lsb: u8,
}

impl RegisterAddress {
    /// Build a register field address.
    ///
    /// `page` is ignored (stored as 0) for spaces that are not paged.
    pub fn new(space: RegisterSpace, page: u8, address: u16, msb: u8, lsb: u8) -> Result<Self> {
        if msb > REGISTER_MAX_BIT {
            return Err(Error::InvalidParameter(format!(
                "msb {msb} exceeds bit {REGISTER_MAX_BIT}"
            )));
        }
        if msb < lsb {
            return Err(Error::InvalidParameter(format!(
                "msb {msb} below lsb {lsb}"
            )));
        }
        Ok(RegisterAddress {
            space,
            page: if space.is_paged() { page } else { 0 },
            address,
            msb,
            lsb,
        })
    }

    pub fn space(&self) -> RegisterSpace {
        self.space
    }

    pub fn page(&self) -> u8 {
        self.page
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn msb(&self) -> u8 {
        self.msb
    }

    pub fn lsb(&self) -> u8 {
        self.lsb
    }

    /// Number of bits in the field.
    pub fn width(&self) -> u32 {
        u32::from(self.msb - self.lsb) + 1
    }

    /// Field mask, right-justified (`width` low bits set).
    pub fn value_mask(&self) -> u32 {
        ((1u64 << self.width()) - 1) as u32
    }

    /// Field mask in register position (bits `[lsb..=msb]` set).
    pub fn mask(&self) -> u32 {
        self.value_mask() << self.lsb
    }
}

/// Class of test session driven by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionClass {
    /// Packet transmit with counted packets.
    PacketTx,
    /// Packet receive with BER accounting.
    PacketRx,
    /// Continuous (unmodulated or fixed-pattern) transmit.
    ContinuousTx,
    /// Frequency hopping.
    Hopping,
}

impl fmt::Display for SessionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionClass::PacketTx => write!(f, "packet-tx"),
            SessionClass::PacketRx => write!(f, "packet-rx"),
            SessionClass::ContinuousTx => write!(f, "continuous-tx"),
            SessionClass::Hopping => write!(f, "hopping"),
        }
    }
}

/// Scalar test configuration handed to the device for session and
/// parameter-set operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestConfig {
    pub channel: u8,
    pub packet_type: u8,
    pub payload_type: u8,
    pub tx_packet_count: u16,
    pub tx_gain_value: u8,
    pub whitening_coeff: u8,
    pub tx_gain_index: u8,
    pub tx_dac: u8,
    pub packet_header: u16,
    pub hopping_fix_channel: u8,
    /// 48-bit test Bluetooth address; upper 16 bits are always zero.
    pub hit_target: u64,
    pub test_mode: u8,
    pub multi_rx_enable: u8,
}

/// Counter deltas reported by the device since its previous poll.
///
/// `rssi` is a latest-value reading rather than a delta; `None` leaves the
/// aggregated RSSI unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSample {
    pub tx_bits: u32,
    pub tx_packets: u32,
    pub rx_bits: u32,
    pub rx_packets: u32,
    pub rx_error_bits: u32,
    pub rx_received_packets: u32,
    pub rssi: Option<i8>,
}

/// Identity of the connected chip, as reported by the firmware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipInfo {
    pub hci_version: u8,
    pub hci_revision: u16,
    pub lmp_version: u8,
    pub lmp_subversion: u16,
    pub chip_type: u8,
    pub rom_version: u8,
}
