//! Bluetooth mass-production test command engine.
//!
//! This crate turns host command lines into device operations and
//! formatted responses. It provides:
//!
//! - **Parameter store** ([`params`]) -- the indexed test configuration table
//!   with width-exact hex rendering.
//! - **Register accessor** ([`register`]) -- masked read-modify-write of
//!   `[msb:lsb]` fields over the BB, RF, and MD register spaces.
//! - **Command codec** ([`command`], [`codec`]) -- command names and strict
//!   argument decoding with field-count validation.
//! - **Actions and dispatch** ([`action`], [`dispatch`]) -- the dense action
//!   ordinal table and the test session state machine.
//! - **Session report** ([`report`]) -- cumulative counters and their views.
//! - **Module** ([`module`], [`builder`], [`models`]) -- one device under test
//!   with its store, report, and dispatcher, built with smart defaults.
//!
//! # Example
//!
//! ```no_run
//! use btmp_engine::MpModuleBuilder;
//!
//! # async fn example<D: btmp_core::Device>(device: D) -> btmp_core::Result<()> {
//! let mut module = MpModuleBuilder::new().build(device)?;
//! let response = module.handle_line("bt_mp_SetParam 1,39|2,0x0e").await?;
//! assert_eq!(response.text(), "bt_mp_SetParam,0");
//! let response = module.handle_line("bt_mp_Exec 16").await?;
//! println!("{response}");
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod builder;
pub mod codec;
pub mod command;
pub mod dispatch;
pub mod models;
pub mod module;
pub mod params;
pub mod register;
pub mod report;

// Re-export the primary types for ergonomic `use btmp_engine::*`.
pub use action::Action;
pub use builder::MpModuleBuilder;
pub use command::Command;
pub use dispatch::SessionState;
pub use models::ChipModel;
pub use module::MpModule;
pub use params::ParameterStore;
pub use report::{ReportView, SessionReport};
