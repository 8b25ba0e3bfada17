//! Tokenizer and numeric literal parsing for the delimited command grammar.
//!
//! Commands carry their arguments as text split on two delimiter levels: a
//! pair delimiter separates groups (`1,10|2,1`), a field delimiter separates
//! fields inside a group. Responses use a third delimiter between result
//! fields. Splitting is done with a plain iterator over string slices, so
//! nested splitting (pairs, then fields) never shares cursor state.

use std::iter::FusedIterator;

use btmp_core::{Error, Result};

/// Default delimiter between top-level groups.
pub const PAIR_DELIM: char = '|';

/// Default delimiter between fields inside a group.
pub const FIELD_DELIM: char = ',';

/// Default delimiter between fields of a response line.
pub const RESULT_DELIM: char = ',';

/// The three reserved delimiter characters of the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub pair: char,
    pub field: char,
    pub result: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Delimiters {
            pair: PAIR_DELIM,
            field: FIELD_DELIM,
            result: RESULT_DELIM,
        }
    }
}

/// Lazy iterator over the non-empty tokens of a string.
///
/// Created by [`tokens`].
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    inner: std::str::Split<'a, char>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.inner.by_ref().find(|s| !s.is_empty())
    }
}

impl FusedIterator for Tokens<'_> {}

/// Split `input` on `delim`, yielding only non-empty tokens.
///
/// Consecutive delimiters and leading/trailing delimiters produce no empty
/// tokens. No whitespace trimming is done.
///
/// ```
/// use btmp_protocol::protocol::tokens;
///
/// let groups: Vec<&str> = tokens("1,10||2,1|", '|').collect();
/// assert_eq!(groups, ["1,10", "2,1"]);
/// ```
pub fn tokens(input: &str, delim: char) -> Tokens<'_> {
    Tokens {
        inner: input.split(delim),
    }
}

/// Parse a C-style integer literal.
///
/// Accepts an optional sign, then `0x`/`0X` hexadecimal, a leading `0` for
/// octal, or decimal. The whole token must be consumed. Magnitudes up to
/// `u64::MAX` are accepted and reinterpreted as `i64`; callers narrow to the
/// width they need.
///
/// ```
/// use btmp_protocol::protocol::parse_int;
///
/// assert_eq!(parse_int("0x1f").unwrap(), 31);
/// assert_eq!(parse_int("017").unwrap(), 15);
/// assert_eq!(parse_int("-3").unwrap(), -3);
/// assert!(parse_int("12abc").is_err());
/// ```
pub fn parse_int(token: &str) -> Result<i64> {
    let (negative, body) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };

    let (radix, digits) = if let Some(hex) = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
    {
        (16, hex)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    };

    // from_str_radix tolerates its own leading sign; the sign was already
    // consumed above, so any further sign is malformed.
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(invalid_literal(token));
    }

    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| invalid_literal(token))?;
    let value = magnitude as i64;
    Ok(if negative { value.wrapping_neg() } else { value })
}

/// Parse a hexadecimal literal, with or without a `0x` prefix.
///
/// ```
/// use btmp_protocol::protocol::parse_hex;
///
/// assert_eq!(parse_hex("9e8b33").unwrap(), 0x9e8b33);
/// assert_eq!(parse_hex("0x00e04c001122").unwrap(), 0x00e0_4c00_1122);
/// ```
pub fn parse_hex(token: &str) -> Result<u64> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(invalid_literal(token));
    }
    u64::from_str_radix(digits, 16).map_err(|_| invalid_literal(token))
}

fn invalid_literal(token: &str) -> Error {
    Error::InvalidParameter(format!("malformed numeric token {token:?}"))
}

/// Positional reader over the fields of one group.
///
/// Each `next_*` call consumes one field and fails with
/// [`Error::InvalidParameter`] if it is missing or malformed.
/// [`finish`](FieldReader::finish) fails if any field is left over, which is
/// how every fixed-shape command rejects redundant tokens.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    fields: Tokens<'a>,
    consumed: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(input: &'a str, delim: char) -> Self {
        FieldReader {
            fields: tokens(input, delim),
            consumed: 0,
        }
    }

    /// Number of fields consumed so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Take the next raw field.
    pub fn next_str(&mut self, name: &str) -> Result<&'a str> {
        match self.fields.next() {
            Some(field) => {
                self.consumed += 1;
                Ok(field)
            }
            None => Err(Error::InvalidParameter(format!(
                "missing field {name} (after {} fields)",
                self.consumed
            ))),
        }
    }

    /// Take the next field as a C-style integer literal.
    pub fn next_int(&mut self, name: &str) -> Result<i64> {
        parse_int(self.next_str(name)?)
    }

    /// Take the next field as a hexadecimal literal.
    pub fn next_hex(&mut self, name: &str) -> Result<u64> {
        parse_hex(self.next_str(name)?)
    }

    /// Take the next field, narrowed to 8 bits.
    pub fn next_u8(&mut self, name: &str) -> Result<u8> {
        Ok(self.next_int(name)? as u8)
    }

    /// Take the next field, narrowed to 16 bits.
    pub fn next_u16(&mut self, name: &str) -> Result<u16> {
        Ok(self.next_int(name)? as u16)
    }

    /// Take the next field, narrowed to 32 bits.
    pub fn next_u32(&mut self, name: &str) -> Result<u32> {
        Ok(self.next_int(name)? as u32)
    }

    /// Take the next field, rejecting values that do not fit `T`.
    pub fn next_checked<T: TryFrom<i64>>(&mut self, name: &str) -> Result<T> {
        let value = self.next_int(name)?;
        T::try_from(value)
            .map_err(|_| Error::InvalidParameter(format!("{name} {value:#x} out of range")))
    }

    /// Fail if any field remains.
    pub fn finish(mut self) -> Result<()> {
        match self.fields.next() {
            Some(extra) => Err(Error::InvalidParameter(format!(
                "redundant field {extra:?} after {} fields",
                self.consumed
            ))),
            None => Ok(()),
        }
    }
}

impl<'a> Iterator for FieldReader<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let field = self.fields.next()?;
        self.consumed += 1;
        Some(field)
    }
}
