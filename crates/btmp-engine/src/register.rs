//! Masked bit-field access over the BB, RF, and MD register spaces.
//!
//! The device only exposes whole-word register reads and writes. Field reads
//! extract `[msb:lsb]` from the word; field writes are a read-modify-write
//! that preserves every bit outside the field. The accessor is not atomic
//! with respect to other writers of the same register.

use tracing::debug;

use btmp_core::{Device, RegisterAddress, Result};

/// Extract the field described by `addr` from a register word,
/// right-justified.
pub fn extract(word: u32, addr: &RegisterAddress) -> u32 {
    (word & addr.mask()) >> addr.lsb()
}

/// Replace the field described by `addr` inside `word` with `value`.
///
/// `value` is truncated to the field width; bits outside the field are
/// returned unchanged.
pub fn merge(word: u32, addr: &RegisterAddress, value: u32) -> u32 {
    (word & !addr.mask()) | ((value & addr.value_mask()) << addr.lsb())
}

/// Bit-field view over one device's registers.
pub struct RegisterAccessor<'a, D: Device + ?Sized> {
    device: &'a mut D,
}

impl<'a, D: Device + ?Sized> RegisterAccessor<'a, D> {
    pub fn new(device: &'a mut D) -> Self {
        RegisterAccessor { device }
    }

    /// Read the field at `addr`.
    pub async fn read(&mut self, addr: &RegisterAddress) -> Result<u32> {
        let word = self
            .device
            .read_register(addr.space(), addr.page(), addr.address())
            .await?;
        let value = extract(word, addr);
        debug!(
            space = %addr.space(),
            page = addr.page(),
            address = addr.address(),
            msb = addr.msb(),
            lsb = addr.lsb(),
            word,
            value,
            "register field read"
        );
        Ok(value)
    }

    /// Write `value` into the field at `addr`, preserving the other bits.
    pub async fn write(&mut self, addr: &RegisterAddress, value: u32) -> Result<()> {
        let word = self
            .device
            .read_register(addr.space(), addr.page(), addr.address())
            .await?;
        let merged = merge(word, addr, value);
        debug!(
            space = %addr.space(),
            page = addr.page(),
            address = addr.address(),
            msb = addr.msb(),
            lsb = addr.lsb(),
            word,
            merged,
            "register field write"
        );
        self.device
            .write_register(addr.space(), addr.page(), addr.address(), merged)
            .await
    }
}
