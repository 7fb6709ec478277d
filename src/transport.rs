//! Socket transport layer for MC protocol communication.
//!
//! This module provides the [`Transport`] trait and its [`SocketTransport`]
//! implementation over `std::net`. The transport layer is completely
//! separated from the protocol layer: it only knows about sockets and bytes.
//!
//! # Design
//!
//! - **Protocol agnostic** - Handles only byte transmission, no frame knowledge
//! - **Synchronous** - Blocking send/receive bounded by the configured timeout
//! - **Simple** - One socket, one remote address, no connection pooling
//!
//! The socket is released when [`Transport::close`] is called or when the
//! [`SocketTransport`] is dropped, whichever comes first. Closing twice is
//! reported as [`io::ErrorKind::NotConnected`].
//!
//! # Example
//!
//! ```no_run
//! use melsec_mc::{Mode, SocketTransport, Transport};
//! use std::time::Duration;
//!
//! let mut transport = SocketTransport::connect(
//!     "192.168.3.39",
//!     5000,
//!     Mode::Udp,
//!     Duration::from_secs(3),
//! )?;
//!
//! transport.send(b"500000FF03FF000015001004010000D01000002")?;
//! let response = transport.recv(1024)?;
//! transport.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{
    Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket,
};
use std::str::FromStr;
use std::time::Duration;

use log::{debug, warn};

use crate::error::{McError, Result};

/// Default receive timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Socket type used to reach the PLC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Stream socket.
    Tcp,
    /// Datagram socket.
    #[default]
    Udp,
}

impl FromStr for Mode {
    type Err = McError;

    /// Parses `"TCP"` or `"UDP"` (ASCII case-insensitive).
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::Mode;
    ///
    /// assert_eq!("TCP".parse::<Mode>().unwrap(), Mode::Tcp);
    /// assert!("SERIAL".parse::<Mode>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("tcp") {
            Ok(Self::Tcp)
        } else if s.eq_ignore_ascii_case("udp") {
            Ok(Self::Udp)
        } else {
            Err(McError::UnsupportedMode {
                mode: s.to_string(),
            })
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("TCP"),
            Self::Udp => f.write_str("UDP"),
        }
    }
}

/// A connected, timeout-bounded byte channel to the PLC.
///
/// Implementations never panic on I/O failure; every failure is returned.
pub trait Transport {
    /// Writes all of `data` to the channel.
    fn send(&mut self, data: &[u8]) -> io::Result<()>;

    /// Blocks until data arrives or the timeout elapses and returns at most
    /// `max_bytes` received bytes.
    fn recv(&mut self, max_bytes: usize) -> io::Result<Vec<u8>>;

    /// Releases the channel. Calling it again returns
    /// [`io::ErrorKind::NotConnected`].
    fn close(&mut self) -> io::Result<()>;
}

enum Channel {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

/// UDP or TCP socket transport.
pub struct SocketTransport {
    channel: Option<Channel>,
    remote_addr: SocketAddr,
    mode: Mode,
}

impl SocketTransport {
    /// Connects to `host:port` using `mode` and sets the read and write
    /// timeouts to `timeout`.
    ///
    /// Every address `host` resolves to is tried in order until one opens,
    /// for both modes. A UDP socket opens without contacting the peer, so for
    /// UDP this skips addresses the local stack cannot use (e.g. IPv6 on an
    /// IPv4-only host). For TCP, `timeout` also bounds each connection attempt.
    ///
    /// # Errors
    ///
    /// - `McError::InvalidParameter` if `timeout` is zero
    /// - `McError::Connection` if the address cannot be resolved or the
    ///   socket cannot be created, connected or configured
    pub fn connect(host: &str, port: u16, mode: Mode, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(McError::invalid_parameter(
                "timeout",
                "must be greater than zero",
            ));
        }

        let addr = format!("{host}:{port}");
        let connection_error = |source: io::Error| McError::Connection {
            addr: addr.clone(),
            source,
        };

        let candidates: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(connection_error)?
            .collect();
        if candidates.is_empty() {
            return Err(connection_error(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "host did not resolve to any address",
            )));
        }

        let mut last_error = None;
        let mut connected = None;
        for remote in candidates {
            let opened = match mode {
                Mode::Udp => open_udp(remote, timeout).map(Channel::Udp),
                Mode::Tcp => open_tcp(remote, timeout).map(Channel::Tcp),
            };
            match opened {
                Ok(channel) => {
                    connected = Some((channel, remote));
                    break;
                }
                Err(e) => {
                    debug!("cannot open {mode} socket to {remote}: {e}");
                    last_error = Some(e);
                }
            }
        }
        let (channel, remote_addr) = match connected {
            Some(connected) => connected,
            None => {
                return Err(connection_error(last_error.unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::NotConnected, "no address to connect")
                })))
            }
        };

        debug!("connected to {remote_addr} over {mode}");

        Ok(Self {
            channel: Some(channel),
            remote_addr,
            mode,
        })
    }

    /// Connects with [`DEFAULT_TIMEOUT`].
    pub fn with_default_timeout(host: &str, port: u16, mode: Mode) -> Result<Self> {
        Self::connect(host, port, mode, DEFAULT_TIMEOUT)
    }

    /// Returns the remote PLC address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Returns the socket type.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns `false` once the transport has been closed.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        match self.channel.as_ref()? {
            Channel::Udp(socket) => socket.local_addr().ok(),
            Channel::Tcp(stream) => stream.local_addr().ok(),
        }
    }

    fn channel_mut(&mut self) -> io::Result<&mut Channel> {
        self.channel.as_mut().ok_or_else(not_connected)
    }
}

fn open_udp(remote: SocketAddr, timeout: Duration) -> io::Result<UdpSocket> {
    let local = if remote.is_ipv4() {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    } else {
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
    };
    let socket = UdpSocket::bind(local)?;
    socket.connect(remote)?;
    socket.set_read_timeout(Some(timeout))?;
    socket.set_write_timeout(Some(timeout))?;
    Ok(socket)
}

fn open_tcp(remote: SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
    let stream = TcpStream::connect_timeout(&remote, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    Ok(stream)
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "socket already closed")
}

impl Transport for SocketTransport {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        match self.channel_mut()? {
            Channel::Udp(socket) => {
                let sent = socket.send(data)?;
                if sent != data.len() {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("datagram truncated: sent {sent} of {} bytes", data.len()),
                    ));
                }
                Ok(())
            }
            Channel::Tcp(stream) => stream.write_all(data),
        }
    }

    fn recv(&mut self, max_bytes: usize) -> io::Result<Vec<u8>> {
        let mut buffer = vec![0u8; max_bytes];
        let size = match self.channel_mut()? {
            Channel::Udp(socket) => socket.recv(&mut buffer)?,
            Channel::Tcp(stream) => {
                let size = stream.read(&mut buffer)?;
                if size == 0 && max_bytes > 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed by peer",
                    ));
                }
                size
            }
        };
        buffer.truncate(size);
        Ok(buffer)
    }

    fn close(&mut self) -> io::Result<()> {
        match self.channel.take() {
            None => Err(not_connected()),
            Some(Channel::Udp(_)) => Ok(()),
            Some(Channel::Tcp(stream)) => match stream.shutdown(Shutdown::Both) {
                Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e),
                _ => Ok(()),
            },
        }
    }
}

impl Drop for SocketTransport {
    fn drop(&mut self) {
        if self.channel.is_some() {
            if let Err(e) = self.close() {
                warn!("closing connection to {} failed: {e}", self.remote_addr);
            }
        }
    }
}

impl fmt::Debug for SocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketTransport")
            .field("mode", &self.mode)
            .field("remote_addr", &self.remote_addr)
            .field("local_addr", &self.local_addr())
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(3));
        assert_eq!(Mode::default(), Mode::Udp);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("TCP".parse::<Mode>().unwrap(), Mode::Tcp);
        assert_eq!("UDP".parse::<Mode>().unwrap(), Mode::Udp);
        assert_eq!("udp".parse::<Mode>().unwrap(), Mode::Udp);

        match "SERIAL".parse::<Mode>() {
            Err(McError::UnsupportedMode { mode }) => assert_eq!(mode, "SERIAL"),
            other => panic!("Expected UnsupportedMode, got {:?}", other),
        }
        assert!("".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Tcp.to_string(), "TCP");
        assert_eq!(Mode::Udp.to_string(), "UDP");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = SocketTransport::connect("127.0.0.1", 5000, Mode::Udp, Duration::ZERO);
        assert!(matches!(result, Err(McError::InvalidParameter { .. })));
    }

    #[test]
    fn test_udp_transport_creation() {
        let transport =
            SocketTransport::connect("127.0.0.1", 5000, Mode::Udp, Duration::from_millis(100))
                .unwrap();
        assert_eq!(transport.remote_addr(), "127.0.0.1:5000".parse().unwrap());
        assert_eq!(transport.mode(), Mode::Udp);
        assert!(transport.is_open());
    }

    #[test]
    fn test_tcp_connection_refused() {
        // Grab a free port, then release it so nothing is listening there.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let result =
            SocketTransport::connect("127.0.0.1", port, Mode::Tcp, Duration::from_millis(200));
        match result {
            Err(e @ McError::Connection { .. }) => assert!(e.is_transport()),
            other => panic!("Expected Connection error, got {:?}", other),
        }
    }

    #[test]
    fn test_udp_connect_uses_resolved_address() {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = peer.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let mut buffer = [0u8; 64];
            let (size, from) = peer.recv_from(&mut buffer).unwrap();
            peer.send_to(&buffer[..size], from).unwrap();
        });

        let mut transport = SocketTransport::connect(
            "127.0.0.1",
            port,
            Mode::Udp,
            Duration::from_secs(2),
        )
        .unwrap();
        assert!(transport.remote_addr().is_ipv4());
        transport.send(b"ECHO").unwrap();
        assert_eq!(transport.recv(64).unwrap(), b"ECHO");
        handle.join().unwrap();
    }

    #[test]
    fn test_close_twice() {
        let mut transport =
            SocketTransport::connect("127.0.0.1", 5000, Mode::Udp, Duration::from_millis(100))
                .unwrap();
        assert!(transport.close().is_ok());
        assert!(!transport.is_open());

        let err = transport.close().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);

        let err = transport.send(b"0000").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn test_udp_send_recv() {
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = peer.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let mut buffer = [0u8; 64];
            let (size, from) = peer.recv_from(&mut buffer).unwrap();
            assert_eq!(&buffer[..size], b"PING");
            peer.send_to(b"PONG", from).unwrap();
        });

        let mut transport =
            SocketTransport::connect("127.0.0.1", port, Mode::Udp, Duration::from_secs(2))
                .unwrap();
        transport.send(b"PING").unwrap();
        assert_eq!(transport.recv(1024).unwrap(), b"PONG");
        handle.join().unwrap();
    }

    #[test]
    fn test_udp_recv_timeout() {
        // Peer stays bound but never answers.
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = peer.local_addr().unwrap().port();

        let mut transport =
            SocketTransport::connect("127.0.0.1", port, Mode::Udp, Duration::from_millis(50))
                .unwrap();
        let err = transport.recv(1024).unwrap_err();
        assert!(matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ));
        drop(peer);
    }

    #[test]
    fn test_tcp_send_recv_and_peer_close() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buffer = [0u8; 64];
            let size = stream.read(&mut buffer).unwrap();
            assert_eq!(&buffer[..size], b"PING");
            stream.write_all(b"PONG").unwrap();
        });

        let mut transport =
            SocketTransport::connect("127.0.0.1", port, Mode::Tcp, Duration::from_secs(2))
                .unwrap();
        transport.send(b"PING").unwrap();
        assert_eq!(transport.recv(1024).unwrap(), b"PONG");
        handle.join().unwrap();

        let err = transport.recv(1024).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(transport.close().is_ok());
    }

    #[test]
    fn test_transport_debug() {
        let transport =
            SocketTransport::connect("127.0.0.1", 5000, Mode::Udp, Duration::from_millis(100))
                .unwrap();
        let debug_str = format!("{:?}", transport);
        assert!(debug_str.contains("SocketTransport"));
        assert!(debug_str.contains("127.0.0.1:5000"));
    }
}
