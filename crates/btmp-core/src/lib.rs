//! btmp-core: Core traits, types, and error definitions for btmp.
//!
//! This crate defines the chip-agnostic abstractions the test engine is
//! written against. Chip-variant drivers implement [`Device`]; hosts that
//! persist calibration data implement [`ConfigStore`].
//!
//! # Key types
//!
//! - [`Device`] -- capability interface to one radio chip
//! - [`ConfigStore`] -- destination for persisted configuration records
//! - [`RegisterAddress`] -- validated `{space, page, address, [msb:lsb]}` field
//! - [`Error`] / [`Result`] / [`Status`] -- error handling and wire status codes

pub mod device;
pub mod error;
pub mod persist;
pub mod types;

// Re-export key types at crate root for ergonomic `use btmp_core::*`.
pub use device::{Device, HCI_EVENT_COMMAND_COMPLETE};
pub use error::{Error, Result, Status};
pub use persist::{CONFIG_ADDRESS_LEN, ConfigMode, ConfigStore, FsConfigStore};
pub use types::*;
