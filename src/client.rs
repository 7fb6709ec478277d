//! High-level MC protocol client for Mitsubishi PLCs.
//!
//! This module provides the [`Client`] struct, the primary interface for
//! reading and writing PLC devices.
//!
//! # Overview
//!
//! Every call runs the same exchange:
//!
//! 1. Encode the request frame
//! 2. Send it once (a failed send is reported, never retried)
//! 3. Receive the response; if that fails, wait `retry_delay` and receive
//!    exactly once more
//! 4. Check the end code and decode the payload
//!
//! No state survives between calls apart from the open socket.
//!
//! # Example
//!
//! ```no_run
//! use melsec_mc::{Client, ClientConfig, Mode};
//!
//! let config = ClientConfig::new("192.168.3.39", 5000).with_mode(Mode::Tcp);
//! let mut client = Client::new(config)?;
//!
//! // Read D100..D109
//! let words = client.read("D*000100", 10)?;
//!
//! // Write 1234 to D200
//! client.write("D*000200", 1234)?;
//!
//! client.close()?;
//! # Ok::<(), melsec_mc::McError>(())
//! ```
//!
//! # Thread Safety
//!
//! The protocol is strictly request/response, so every exchange takes
//! `&mut self`. Share a client between threads behind a `Mutex`, or open one
//! client per worker. A single call blocks for at most
//! `2 * timeout + retry_delay`.

use std::fmt;
use std::io;
use std::thread;
use std::time::Duration;

use log::{debug, error, warn};

use crate::error::{McError, Result};
use crate::frame::Request;
use crate::response::Response;
use crate::transport::{Mode, SocketTransport, Transport, DEFAULT_TIMEOUT};

/// Delay before the receive retry.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Largest response accepted by a single receive.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Number of extra receive attempts after a failed receive.
pub const RECEIVE_RETRIES: usize = 1;

/// Configuration for creating a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// PLC host name or IP address.
    pub host: String,
    /// PLC port.
    pub port: u16,
    /// Socket type.
    pub mode: Mode,
    /// Receive timeout (also the TCP connect timeout).
    pub timeout: Duration,
    /// Delay before the receive retry.
    pub retry_delay: Duration,
    /// Receive buffer size in bytes.
    pub buffer_size: usize,
}

impl ClientConfig {
    /// Creates a configuration with UDP, a 3 second timeout and a 10 ms retry delay.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::{ClientConfig, Mode};
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::new("192.168.3.39", 5000);
    /// assert_eq!(config.mode, Mode::Udp);
    /// assert_eq!(config.timeout, Duration::from_secs(3));
    /// ```
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            mode: Mode::default(),
            timeout: DEFAULT_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Sets the socket type (default is UDP).
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::{ClientConfig, Mode};
    ///
    /// let mode: Mode = "TCP".parse()?;
    /// let config = ClientConfig::new("192.168.3.39", 5000).with_mode(mode);
    /// # Ok::<(), melsec_mc::McError>(())
    /// ```
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets a custom timeout (default is 3 seconds).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the delay before the receive retry (default is 10 ms).
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Sets the receive buffer size (default is 1024 bytes).
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

/// MC protocol client owning one connection to a PLC.
///
/// The connection is released by [`Client::close`] or, at the latest, when
/// the client is dropped.
pub struct Client<T = SocketTransport> {
    transport: T,
    retry_delay: Duration,
    buffer_size: usize,
}

impl Client<SocketTransport> {
    /// Connects to the PLC described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `McError::Connection` if the socket cannot be created or
    /// connected, and `McError::InvalidParameter` for a zero timeout.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use melsec_mc::{Client, ClientConfig};
    ///
    /// let client = Client::new(ClientConfig::new("192.168.3.39", 5000)).unwrap();
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport =
            SocketTransport::connect(&config.host, config.port, config.mode, config.timeout)
                .inspect_err(|e| error!("{e}"))?;

        Ok(Self::with_transport(transport)
            .with_retry_delay(config.retry_delay)
            .with_buffer_size(config.buffer_size))
    }
}

impl<T: Transport> Client<T> {
    /// Wraps an already connected transport using the default retry delay
    /// and buffer size.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            retry_delay: DEFAULT_RETRY_DELAY,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Sets the delay before the receive retry.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Sets the receive buffer size.
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Reads `count` words starting at `device`.
    ///
    /// Each element is `Some(value)`, or `None` when the response carried no
    /// data for that slot.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Count is 0 or the device is not ASCII (`InvalidParameter`)
    /// - Sending fails (`Send`)
    /// - Both receive attempts fail (`Timeout`, or `Receive` for I/O errors
    ///   and replies that are not ASCII)
    /// - A data word is not hex (`InvalidResponse`)
    /// - The PLC reports a non-zero end code (`EndCode`)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use melsec_mc::{Client, ClientConfig};
    ///
    /// let mut client = Client::new(ClientConfig::new("192.168.3.39", 5000)).unwrap();
    ///
    /// let words = client.read("D*000100", 2).unwrap();
    /// println!("D100-D101: {:?}", words);
    /// ```
    pub fn read(&mut self, device: &str, count: u16) -> Result<Vec<Option<u16>>> {
        let request = Request::read(device, count)?;
        let response = self.exchange(&request)?;
        response
            .words(usize::from(count))
            .inspect_err(|e| error!("{request}: {e}"))
    }

    /// Reads a single word.
    ///
    /// # Errors
    ///
    /// Same as [`Client::read`].
    pub fn read_word(&mut self, device: &str) -> Result<Option<u16>> {
        Ok(self.read(device, 1)?.into_iter().next().flatten())
    }

    /// Writes `value` to a single device point.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Value is above 0xFFFF (`InvalidParameter`, nothing is sent)
    /// - Sending or receiving fails
    /// - The PLC reports a non-zero end code (`EndCode`)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use melsec_mc::{Client, ClientConfig};
    ///
    /// let mut client = Client::new(ClientConfig::new("192.168.3.39", 5000)).unwrap();
    /// client.write("D*000200", 1234).unwrap();
    /// ```
    pub fn write(&mut self, device: &str, value: u32) -> Result<()> {
        self.write_with_count(device, value, 1)
    }

    /// Writes `value` with an explicit device point count in the frame.
    ///
    /// # Errors
    ///
    /// Same as [`Client::write`], plus `InvalidParameter` for a zero count.
    pub fn write_with_count(&mut self, device: &str, value: u32, count: u16) -> Result<()> {
        let request = Request::write(device, value, count)?;
        self.exchange(&request)?;
        Ok(())
    }

    /// Sends `request` and returns the response once its end code is `0000`.
    ///
    /// The receive buffer is grown past the configured size when a read
    /// response needs more room, so long reads are never cut short.
    ///
    /// # Errors
    ///
    /// Transport failures as described on [`Client::read`], and
    /// `McError::EndCode` for a non-zero end code.
    pub fn exchange(&mut self, request: &Request) -> Result<Response> {
        let label = request.to_string();
        let max_bytes = self.buffer_size.max(request.response_len());
        let response = self.send_receive(&request.to_bytes(), max_bytes, &label)?;
        response
            .check_end_code()
            .inspect_err(|e| error!("{label}: {e}"))?;
        Ok(response)
    }

    /// Sends a caller-built command frame and returns the response as
    /// received. The end code is not checked.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use melsec_mc::{Client, ClientConfig};
    ///
    /// let mut client = Client::new(ClientConfig::new("192.168.3.39", 5000)).unwrap();
    ///
    /// // Remote RUN
    /// let response = client.exchange_raw("500000FF03FF00001400101001000000010000").unwrap();
    /// println!("end code {}", response.end_code());
    /// ```
    pub fn exchange_raw(&mut self, frame: &str) -> Result<Response> {
        self.send_receive(frame.as_bytes(), self.buffer_size, "raw command")
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns `McError::Io` if the connection is already closed or the
    /// socket cannot be shut down.
    pub fn close(&mut self) -> Result<()> {
        self.transport.close().map_err(|e| {
            error!("cannot close connection: {e}");
            McError::Io(e)
        })
    }

    fn send_receive(&mut self, frame: &[u8], max_bytes: usize, label: &str) -> Result<Response> {
        debug!("{label}: sending {}", String::from_utf8_lossy(frame));
        if let Err(e) = self.transport.send(frame) {
            error!("{label}: send failed: {e}");
            return Err(McError::Send(e));
        }

        let mut retries = 0;
        loop {
            match self.receive(max_bytes) {
                Ok(response) => {
                    debug!("{label}: received {}", response.as_str());
                    return Ok(response);
                }
                Err(e) if retries < RECEIVE_RETRIES => {
                    retries += 1;
                    warn!(
                        "{label}: receive failed ({e}), retrying in {:?}",
                        self.retry_delay
                    );
                    thread::sleep(self.retry_delay);
                }
                Err(e) => {
                    error!("{label}: receive failed: {e}");
                    return Err(e);
                }
            }
        }
    }

    fn receive(&mut self, max_bytes: usize) -> Result<Response> {
        let bytes = self
            .transport
            .recv(max_bytes)
            .map_err(|e| match e.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => McError::Timeout,
                _ => McError::Receive(e),
            })?;
        // Undecodable bytes are a failed receive, not a device answer.
        Response::from_bytes(&bytes).map_err(|e| {
            McError::Receive(io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
        })
    }
}

impl<T: fmt::Debug> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport)
            .field("retry_delay", &self.retry_delay)
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}
