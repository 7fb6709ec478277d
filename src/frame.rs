//! MC protocol request frames (3E frame, ASCII mode).
//!
//! Every request is an upper-case hex ASCII string:
//!
//! | Component | Size | Description |
//! |-----------|------|-------------|
//! | Subheader + route | 14 chars | [`SUBHEADER`] (`5000`, network, PC, I/O, station) |
//! | Body length | 4 chars | Hex length of everything after this field |
//! | Command | 12 chars | Monitoring timer + command + subcommand ([`READ_COMMAND`] / [`WRITE_COMMAND`]) |
//! | Device | variable | Device address, passed through as-is |
//! | Count | 4 chars | Number of device points, hex |
//! | Value | 4 chars | Write requests only, hex |
//!
//! # Example
//!
//! ```
//! use melsec_mc::Request;
//!
//! let request = Request::read("D0100", 2).unwrap();
//! assert_eq!(request.encode(), "500000FF03FF000015001004010000D01000002");
//! ```

use std::fmt::Write as _;

use crate::error::{McError, Result};
use crate::response::{DATA_OFFSET, WORD_CHARS};

/// Subheader and route fields that open every request.
pub const SUBHEADER: &str = "500000FF03FF00";

/// Monitoring timer, batch read command and word subcommand.
pub const READ_COMMAND: &str = "001004010000";

/// Monitoring timer, batch write command and word subcommand.
pub const WRITE_COMMAND: &str = "001014010000";

/// Largest body length that fits the 4-digit length field.
pub const MAX_BODY_LEN: usize = 0xFFFF;

const HEX_FIELD_LEN: usize = 4;

/// Kind of request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Batch read in word units.
    Read,
    /// Batch write in word units.
    Write,
}

impl Operation {
    /// Returns the 12-character command segment for this operation.
    pub fn command(self) -> &'static str {
        match self {
            Self::Read => READ_COMMAND,
            Self::Write => WRITE_COMMAND,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// A validated read or write request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    operation: Operation,
    device: String,
    count: u16,
    value: Option<u16>,
}

impl Request {
    /// Creates a read request for `count` words starting at `device`.
    ///
    /// The count goes on the wire as 4 hex digits, so 10 words is `000A`
    /// (a decimal `0010` would ask for 16).
    ///
    /// # Errors
    ///
    /// Returns an error if count is 0 or the device is not a usable ASCII string.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::Request;
    ///
    /// let request = Request::read("D0100", 10).unwrap();
    /// assert_eq!(request.count(), 10);
    /// assert!(Request::read("D0100", 0).is_err());
    /// ```
    pub fn read(device: impl Into<String>, count: u16) -> Result<Self> {
        Self::build(Operation::Read, device.into(), count, None)
    }

    /// Creates a write request storing `value` at `device` with the given point count.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Count is 0
    /// - Value is above 0xFFFF (it would not fit the 4-digit field)
    /// - The device is not a usable ASCII string
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::Request;
    ///
    /// let request = Request::write("D0100", 100, 1).unwrap();
    /// assert_eq!(request.value(), Some(100));
    /// assert!(Request::write("D0100", 0x1_0000, 1).is_err());
    /// ```
    pub fn write(device: impl Into<String>, value: u32, count: u16) -> Result<Self> {
        let value = u16::try_from(value).map_err(|_| {
            McError::invalid_parameter(
                "value",
                format!("{value} does not fit in 4 hex digits (max 0xFFFF)"),
            )
        })?;
        Self::build(Operation::Write, device.into(), count, Some(value))
    }

    fn build(operation: Operation, device: String, count: u16, value: Option<u16>) -> Result<Self> {
        if count == 0 {
            return Err(McError::invalid_parameter(
                "count",
                "must be greater than 0",
            ));
        }
        if !device.is_ascii() {
            return Err(McError::invalid_parameter(
                "device",
                format!("'{device}' contains non-ASCII characters"),
            ));
        }

        let request = Self {
            operation,
            device,
            count,
            value,
        };
        if request.body_len() > MAX_BODY_LEN {
            return Err(McError::invalid_parameter(
                "device",
                format!("too long: body must not exceed {MAX_BODY_LEN} characters"),
            ));
        }
        Ok(request)
    }

    /// Returns the operation kind.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Returns the device address as given.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Returns the number of device points.
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Returns the value for write requests.
    pub fn value(&self) -> Option<u16> {
        self.value
    }

    /// Returns the size in bytes of a complete successful response.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::Request;
    ///
    /// assert_eq!(Request::read("D0100", 300).unwrap().response_len(), 1222);
    /// assert_eq!(Request::write("D0100", 1, 1).unwrap().response_len(), 22);
    /// ```
    pub fn response_len(&self) -> usize {
        match self.operation {
            Operation::Read => DATA_OFFSET + WORD_CHARS * usize::from(self.count),
            Operation::Write => DATA_OFFSET,
        }
    }

    fn body_len(&self) -> usize {
        let value_len = if self.value.is_some() { HEX_FIELD_LEN } else { 0 };
        self.operation.command().len() + self.device.len() + HEX_FIELD_LEN + value_len
    }

    /// Encodes the request as an upper-case ASCII frame.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::Request;
    ///
    /// let request = Request::write("d0100", 100, 1).unwrap();
    /// assert_eq!(
    ///     request.encode(),
    ///     "500000FF03FF000019001014010000D010000010064"
    /// );
    /// ```
    pub fn encode(&self) -> String {
        let mut body = String::with_capacity(self.body_len());
        body.push_str(self.operation.command());
        body.push_str(&self.device);
        // Writing to a String cannot fail.
        let _ = write!(body, "{:04X}", self.count);
        if let Some(value) = self.value {
            let _ = write!(body, "{:04X}", value);
        }

        let mut frame = format!("{SUBHEADER}{:04X}{body}", body.len());
        frame.make_ascii_uppercase();
        frame
    }

    /// Encodes the request as bytes ready to send.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode().into_bytes()
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} x{}", self.operation.name(), self.device, self.count)?;
        if let Some(value) = self.value {
            write!(f, " = 0x{:04X}", value)?;
        }
        Ok(())
    }
}
