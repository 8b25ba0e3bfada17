//! btmp-test-harness: mock device and config store for the btmp engine.
//!
//! This crate provides [`MockDevice`] for deterministic unit testing of the
//! command engine without real radio hardware, and [`MemoryConfigStore`]
//! for asserting configuration writes without touching the filesystem.

pub mod memory_store;
pub mod mock_device;

pub use memory_store::{ConfigWrite, MemoryConfigStore};
pub use mock_device::{DeviceCall, MockDevice};
