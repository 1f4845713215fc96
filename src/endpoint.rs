//! IPv4 address and port value type

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::str::FromStr;

use socket2::SockAddr;

use crate::error::{Error, Result};

/// Loopback address text.
pub const LOCALHOST: &str = "127.0.0.1";

/// Immutable IPv4 address and port.
///
/// Address octets are kept in network order. The port is kept in host order
/// and only translated in [`to_native`](Endpoint::to_native) /
/// [`from_native`](Endpoint::from_native).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Endpoint {
    octets: [u8; 4],
    port: u16,
}

impl Endpoint {
    /// Builds an endpoint from dotted-decimal `text` and `port`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidAddress`] unless `text` is four dot-separated octets `0-255`.
    pub fn parse(text: &str, port: u16) -> Result<Self> {
        let addr =
            Ipv4Addr::from_str(text).map_err(|_| Error::InvalidAddress(text.to_owned()))?;
        Ok(Self::new(addr, port))
    }

    /// Endpoint from an already valid address.
    #[must_use]
    pub const fn new(addr: Ipv4Addr, port: u16) -> Self {
        Self {
            octets: addr.octets(),
            port,
        }
    }

    /// `127.0.0.1:port`
    #[must_use]
    pub const fn localhost(port: u16) -> Self {
        Self::new(Ipv4Addr::LOCALHOST, port)
    }

    /// Port in host byte order.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Address as [`Ipv4Addr`].
    #[must_use]
    pub const fn ip(&self) -> Ipv4Addr {
        let [a, b, c, d] = self.octets;
        Ipv4Addr::new(a, b, c, d)
    }

    /// Address as integer in host byte order.
    #[must_use]
    pub const fn ip_value(&self) -> u32 {
        u32::from_be_bytes(self.octets)
    }

    /// Same address with another port.
    #[must_use]
    pub const fn with_port(&self, port: u16) -> Self {
        Self {
            octets: self.octets,
            port,
        }
    }

    /// Native address record for `bind`/`connect`.
    #[must_use]
    pub fn to_native(&self) -> SockAddr {
        SockAddr::from(SocketAddrV4::new(self.ip(), self.port))
    }

    /// Reads a native address record as returned by `accept` or `getsockname`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidAddress`] if the record is not an IPv4 address.
    pub fn from_native(native: &SockAddr) -> Result<Self> {
        native
            .as_socket_ipv4()
            .map(Self::from)
            .ok_or_else(|| Error::InvalidAddress(format!("{:?}", native.as_socket())))
    }
}

impl From<SocketAddrV4> for Endpoint {
    fn from(addr: SocketAddrV4) -> Self {
        Self::new(*addr.ip(), addr.port())
    }
}

impl From<Endpoint> for SocketAddrV4 {
    fn from(endpoint: Endpoint) -> Self {
        SocketAddrV4::new(endpoint.ip(), endpoint.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip(), self.port)
    }
}

/// Parses `a.b.c.d:port`
impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (ip, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidAddress(s.to_owned()))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| Error::InvalidAddress(s.to_owned()))?;
        Self::parse(ip, port)
    }
}
