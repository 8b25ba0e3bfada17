//! Session report -- cumulative test counters and their text views.
//!
//! Counters grow monotonically across `UPDATE` polls within a session and
//! return to the baseline (all zero, RSSI −90 dBm) on HCI reset or report
//! clear. Starting a session clears only the counters of that session's
//! direction.

use std::fmt::Write as _;

use btmp_core::{ChipInfo, CounterSample};

/// RSSI reported before any packet has been received, in dBm.
pub const RSSI_BASELINE: i8 = -90;

/// Which counters a report command returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportView {
    Tx,
    ContinuousTx,
    Rx,
    /// Chip identity, queried from the device.
    Chip,
    All,
}

/// Aggregated counters for the current test session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    total_tx_bits: u64,
    total_tx_packets: u64,
    tx_update_bits: u32,
    tx_update_packets: u32,
    total_rx_bits: u64,
    total_rx_packets: u64,
    total_rx_error_bits: u64,
    rx_update_bits: u32,
    rx_update_packets: u32,
    rx_received_packets: u64,
    rssi: i8,
    ber: f64,
}

impl Default for SessionReport {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionReport {
    /// A report at the baseline.
    pub fn new() -> Self {
        SessionReport {
            total_tx_bits: 0,
            total_tx_packets: 0,
            tx_update_bits: 0,
            tx_update_packets: 0,
            total_rx_bits: 0,
            total_rx_packets: 0,
            total_rx_error_bits: 0,
            rx_update_bits: 0,
            rx_update_packets: 0,
            rx_received_packets: 0,
            rssi: RSSI_BASELINE,
            ber: 0.0,
        }
    }

    /// Return every counter to the baseline.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Zero the transmit counters.
    pub fn reset_tx(&mut self) {
        self.total_tx_bits = 0;
        self.total_tx_packets = 0;
        self.tx_update_bits = 0;
        self.tx_update_packets = 0;
    }

    /// Zero the receive counters and restore the RSSI baseline.
    pub fn reset_rx(&mut self) {
        self.total_rx_bits = 0;
        self.total_rx_packets = 0;
        self.total_rx_error_bits = 0;
        self.rx_update_bits = 0;
        self.rx_update_packets = 0;
        self.rx_received_packets = 0;
        self.rssi = RSSI_BASELINE;
        self.ber = 0.0;
    }

    /// Fold one poll's deltas into the totals.
    pub fn fold(&mut self, sample: &CounterSample) {
        self.tx_update_bits = sample.tx_bits;
        self.tx_update_packets = sample.tx_packets;
        self.total_tx_bits = self.total_tx_bits.saturating_add(u64::from(sample.tx_bits));
        self.total_tx_packets = self
            .total_tx_packets
            .saturating_add(u64::from(sample.tx_packets));

        self.rx_update_bits = sample.rx_bits;
        self.rx_update_packets = sample.rx_packets;
        self.total_rx_bits = self.total_rx_bits.saturating_add(u64::from(sample.rx_bits));
        self.total_rx_packets = self
            .total_rx_packets
            .saturating_add(u64::from(sample.rx_packets));
        self.total_rx_error_bits = self
            .total_rx_error_bits
            .saturating_add(u64::from(sample.rx_error_bits));
        self.rx_received_packets = self
            .rx_received_packets
            .saturating_add(u64::from(sample.rx_received_packets));

        if let Some(rssi) = sample.rssi {
            self.rssi = rssi;
        }
        self.ber = if self.total_rx_bits == 0 {
            0.0
        } else {
            self.total_rx_error_bits as f64 / self.total_rx_bits as f64
        };
    }

    pub fn total_tx_bits(&self) -> u64 {
        self.total_tx_bits
    }

    pub fn total_tx_packets(&self) -> u64 {
        self.total_tx_packets
    }

    /// TX bits reported by the most recent poll.
    pub fn tx_update_bits(&self) -> u32 {
        self.tx_update_bits
    }

    pub fn tx_update_packets(&self) -> u32 {
        self.tx_update_packets
    }

    pub fn total_rx_bits(&self) -> u64 {
        self.total_rx_bits
    }

    pub fn total_rx_packets(&self) -> u64 {
        self.total_rx_packets
    }

    pub fn total_rx_error_bits(&self) -> u64 {
        self.total_rx_error_bits
    }

    pub fn rx_update_bits(&self) -> u32 {
        self.rx_update_bits
    }

    pub fn rx_update_packets(&self) -> u32 {
        self.rx_update_packets
    }

    pub fn rx_received_packets(&self) -> u64 {
        self.rx_received_packets
    }

    /// Latest RSSI in dBm.
    pub fn rssi(&self) -> i8 {
        self.rssi
    }

    /// Bit error rate over the whole RX session.
    pub fn ber(&self) -> f64 {
        self.ber
    }

    pub fn is_baseline(&self) -> bool {
        *self == Self::new()
    }

    /// Render the counter fields of `view`, delimiter-joined.
    ///
    /// [`ReportView::Chip`] carries no counters and renders empty; use
    /// [`render_chip_info`] for it.
    ///
    /// Totals are 64-bit and render at full width, so a session that passes
    /// `u32::MAX` bits prints more than 8 hex digits instead of wrapping.
    pub fn render(&self, view: ReportView, delim: char) -> String {
        let d = delim;
        let rssi = rssi_hex(self.rssi);
        match view {
            ReportView::Tx | ReportView::ContinuousTx => {
                format!("{:x}{d}{:x}", self.total_tx_bits, self.total_tx_packets)
            }
            ReportView::Rx => format!(
                "{rssi}{d}{:x}{d}{:x}{d}{:x}",
                self.total_rx_bits, self.total_rx_packets, self.total_rx_error_bits
            ),
            ReportView::All => format!(
                "{:x}{d}{:x}{d}{rssi}{d}{:x}{d}{:x}{d}{:x}{d}{:x}",
                self.total_tx_bits,
                self.total_tx_packets,
                self.total_rx_bits,
                self.total_rx_packets,
                self.total_rx_error_bits,
                self.rx_received_packets
            ),
            ReportView::Chip => String::new(),
        }
    }
}

/// RSSI as the 32-bit two's complement hex the host tools parse.
fn rssi_hex(rssi: i8) -> String {
    format!("{:x}", i32::from(rssi) as u32)
}

/// Render chip identity fields, delimiter-joined.
///
/// Order: chip type, HCI version, HCI revision, LMP version, LMP
/// subversion, ROM version.
pub fn render_chip_info(info: &ChipInfo, delim: char) -> String {
    let mut out = String::new();
    let fields: [u32; 6] = [
        u32::from(info.chip_type),
        u32::from(info.hci_version),
        u32::from(info.hci_revision),
        u32::from(info.lmp_version),
        u32::from(info.lmp_subversion),
        u32::from(info.rom_version),
    ];
    for (i, v) in fields.iter().enumerate() {
        if i > 0 {
            out.push(delim);
        }
        let _ = write!(out, "{v:x}");
    }
    out
}
