//! Response line construction.
//!
//! Every command answers with one line: `<command-name><d><fields…>`. A
//! failed command answers `<command-name><d><status>` and nothing else.
//! [`Response`] carries the status and the rendered text together so the two
//! can never disagree.

use std::fmt;

use btmp_core::{Error, Status};

/// One rendered command response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    command: &'static str,
    status: Status,
    text: String,
}

impl Response {
    /// A bare success response: `<command><d>0`.
    pub fn ok(command: &'static str, delim: char) -> Self {
        Response::status_line(command, delim, Status::Success)
    }

    /// A failure response: `<command><d><status>`.
    pub fn failure(command: &'static str, delim: char, status: Status) -> Self {
        Response::status_line(command, delim, status)
    }

    fn status_line(command: &'static str, delim: char, status: Status) -> Self {
        Response {
            command,
            status,
            text: format!("{command}{delim}{status}"),
        }
    }

    /// A failure response for `err`.
    pub fn from_error(command: &'static str, delim: char, err: &Error) -> Self {
        Response::failure(command, delim, err.status())
    }

    /// Name of the command this response answers.
    pub fn command(&self) -> &'static str {
        self.command
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// The full response line.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Incremental builder for a response line.
///
/// ```
/// use btmp_core::Status;
/// use btmp_protocol::response::ResponseBuilder;
///
/// let resp = ResponseBuilder::new("bt_mp_ReportTx", ',')
///     .field(format_args!("{:x}", 0x1200))
///     .field(format_args!("{:x}", 3))
///     .finish(Status::Success);
/// assert_eq!(resp.text(), "bt_mp_ReportTx,1200,3");
/// ```
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    command: &'static str,
    delim: char,
    text: String,
}

impl ResponseBuilder {
    pub fn new(command: &'static str, delim: char) -> Self {
        ResponseBuilder {
            command,
            delim,
            text: command.to_string(),
        }
    }

    /// Append one delimited field.
    pub fn field(mut self, value: impl fmt::Display) -> Self {
        self.push(value);
        self
    }

    /// Append one delimited field in place.
    pub fn push(&mut self, value: impl fmt::Display) {
        use fmt::Write as _;
        // Writing into a String cannot fail.
        let _ = write!(self.text, "{}{}", self.delim, value);
    }

    /// Append a pre-rendered, already delimited run of fields.
    pub fn raw(mut self, fields: &str) -> Self {
        if !fields.is_empty() {
            self.text.push(self.delim);
            self.text.push_str(fields);
        }
        self
    }

    pub fn finish(self, status: Status) -> Response {
        Response {
            command: self.command,
            status,
            text: self.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_response_shape() {
        let r = Response::failure("bt_mp_RegRW", ',', Status::ParameterError);
        assert_eq!(r.text(), "bt_mp_RegRW,2");
        assert_eq!(r.status(), Status::ParameterError);
        assert_eq!(r.command(), "bt_mp_RegRW");
    }

    #[test]
    fn ok_response_shape() {
        let r = Response::ok("bt_mp_SetParam", ',');
        assert_eq!(r.text(), "bt_mp_SetParam,0");
        assert!(r.status().is_success());
    }

    #[test]
    fn from_error_uses_error_status() {
        let err = Error::Device("nak".into());
        let r = Response::from_error("bt_mp_Exec", ',', &err);
        assert_eq!(r.text(), "bt_mp_Exec,1");
        assert_eq!(r.status(), Status::DeviceError);
    }

    #[test]
    fn builder_appends_fields() {
        let mut b = ResponseBuilder::new("bt_mp_GetParam", ':');
        b.push(1);
        let r = b.field("0x0a").finish(Status::Success);
        assert_eq!(r.text(), "bt_mp_GetParam:1:0x0a");
        assert_eq!(r.to_string(), r.text());
    }

    #[test]
    fn builder_raw_skips_empty() {
        let r = ResponseBuilder::new("cmd", ',')
            .raw("")
            .raw("a,b")
            .finish(Status::Success);
        assert_eq!(r.into_text(), "cmd,a,b");
    }
}
