//! Chip model definitions.
//!
//! Each supported controller is described by a [`ChipModel`] that carries
//! the calibration defaults the parameter store starts from. Models are
//! defined as factory functions (e.g. [`rtl8761()`]).
//!
//! | Model    | Gain table             | DAC table      |
//! |----------|------------------------|----------------|
//! | RTL8761  | 49 4d 69 89 8d a9 a9   | 10 11 12 13 14 |

use crate::params::{TX_DAC_TABLE_LEN, TX_GAIN_TABLE_LEN};

/// Static definition of a test-mode capable Bluetooth controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipModel {
    /// Human-readable model name (e.g. "RTL8761").
    pub name: &'static str,
    /// TX gain table loaded into parameter slot 12.
    pub tx_gain_table: [u8; TX_GAIN_TABLE_LEN],
    /// TX DAC table loaded into parameter slot 13.
    pub tx_dac_table: [u8; TX_DAC_TABLE_LEN],
}

/// Realtek RTL8761.
pub fn rtl8761() -> ChipModel {
    ChipModel {
        name: "RTL8761",
        tx_gain_table: [0x49, 0x4d, 0x69, 0x89, 0x8d, 0xa9, 0xa9],
        tx_dac_table: [0x10, 0x11, 0x12, 0x13, 0x14],
    }
}
