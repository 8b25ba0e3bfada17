//! Text grammar shared by every btmp command.
//!
//! This crate has no knowledge of what the commands mean. It provides:
//!
//! - [`protocol`] -- the two-level tokenizer, C-style literal parsing, and a
//!   positional field reader that enforces exact field counts
//! - [`response`] -- response line construction with a status that always
//!   matches the rendered text

pub mod protocol;
pub mod response;

pub use protocol::{Delimiters, FieldReader, Tokens, parse_hex, parse_int, tokens};
pub use response::{Response, ResponseBuilder};
