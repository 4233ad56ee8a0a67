//! Scalar wire types
//!
//! The description keeps addresses as text so it reads naturally in JSON or
//! TOML. Each wrapper renders its text into the fixed-width form the iBFT
//! stores. Parse failures come back as [`IbftError::InvalidValue`]; the field
//! traversal attaches the field path.

use crate::error::{IbftError, IbftResult};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// IANA-assigned iSCSI port, used when a target address omits one
pub const ISCSI_DEFAULT_PORT: u16 = 3260;

/// IP address field (16 bytes on the wire)
///
/// IPv4 addresses are stored IPv4-mapped (`::ffff:a.b.c.d`). An empty
/// address encodes as all zeros.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IpAddress(pub String);

impl IpAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn to_bytes(&self) -> IbftResult<[u8; 16]> {
        let text = self.0.trim();
        if text.is_empty() {
            return Ok([0u8; 16]);
        }
        let ip: IpAddr = text.parse().map_err(|e| {
            IbftError::InvalidValue(format!("'{}' is not an IP address: {}", text, e))
        })?;
        Ok(ip_octets(ip))
    }
}

impl From<IpAddr> for IpAddress {
    fn from(ip: IpAddr) -> Self {
        Self(ip.to_string())
    }
}

impl From<&str> for IpAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

fn ip_octets(ip: IpAddr) -> [u8; 16] {
    match ip {
        IpAddr::V4(v4) => v4.to_ipv6_mapped().octets(),
        IpAddr::V6(v6) => v6.octets(),
    }
}

/// MAC address field (6 bytes on the wire)
///
/// Accepts `aa:bb:cc:dd:ee:ff`, `aa-bb-cc-dd-ee-ff` or twelve bare hex digits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddress(pub String);

impl MacAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn to_bytes(&self) -> IbftResult<[u8; 6]> {
        let text = self.0.trim();
        let mut mac = [0u8; 6];
        if text.is_empty() {
            return Ok(mac);
        }

        let digits: String = if text.contains(':') || text.contains('-') {
            let parts: Vec<&str> = text.split([':', '-']).collect();
            if parts.len() != 6 || parts.iter().any(|p| p.len() != 2) {
                return Err(IbftError::InvalidValue(format!(
                    "'{}' is not a MAC address",
                    text
                )));
            }
            parts.concat()
        } else {
            text.to_string()
        };

        let bytes = hex::decode(&digits).map_err(|e| {
            IbftError::InvalidValue(format!("'{}' is not a MAC address: {}", text, e))
        })?;
        if bytes.len() != mac.len() {
            return Err(IbftError::InvalidValue(format!(
                "'{}' is {} bytes, a MAC address is 6",
                text,
                bytes.len()
            )));
        }
        mac.copy_from_slice(&bytes);
        Ok(mac)
    }
}

impl From<&str> for MacAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// PCI bus/device/function locator (16 bits on the wire)
///
/// Written in lspci notation, `[domain:]bus:device.function`, all hex.
/// Packed as bus in bits 15-8, device in bits 7-3, function in bits 2-0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PciBdf(pub String);

impl PciBdf {
    pub fn new(bdf: impl Into<String>) -> Self {
        Self(bdf.into())
    }

    pub fn to_u16(&self) -> IbftResult<u16> {
        let text = self.0.trim();
        if text.is_empty() {
            return Ok(0);
        }
        let bad = |why: &str| {
            IbftError::InvalidValue(format!("'{}' is not a PCI locator: {}", text, why))
        };

        let parts: Vec<&str> = text.split(':').collect();
        let (bus, devfn) = match parts.as_slice() {
            [bus, devfn] => (*bus, *devfn),
            [domain, bus, devfn] => {
                u16::from_str_radix(domain, 16).map_err(|_| bad("bad domain"))?;
                (*bus, *devfn)
            }
            _ => return Err(bad("expected bus:device.function")),
        };
        let (device, function) = devfn
            .split_once('.')
            .ok_or_else(|| bad("missing function"))?;

        let bus = u8::from_str_radix(bus, 16).map_err(|_| bad("bad bus"))?;
        let device = u8::from_str_radix(device, 16).map_err(|_| bad("bad device"))?;
        let function = u8::from_str_radix(function, 16).map_err(|_| bad("bad function"))?;
        if device > 0x1F {
            return Err(bad("device exceeds 5 bits"));
        }
        if function > 0x07 {
            return Err(bad("function exceeds 3 bits"));
        }

        Ok(pack_bdf(bus, device, function))
    }
}

impl From<&str> for PciBdf {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Bus = 8 bits, Device = 5 bits, Function = 3 bits
pub fn pack_bdf(bus: u8, device: u8, function: u8) -> u16 {
    ((bus as u16) << 8) | (((device & 0x1F) as u16) << 3) | (function & 0x07) as u16
}

/// Target address in `ip:port` / `[ipv6]:port` form
///
/// Not a single wire value: it splits into a 16-byte IP field and a
/// following 16-bit port field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SocketAddress(pub String);

impl SocketAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Split into the IP bytes and the port.
    pub fn split(&self) -> IbftResult<([u8; 16], u16)> {
        let text = self.0.trim();
        if text.is_empty() {
            return Ok(([0u8; 16], 0));
        }
        if let Ok(sock) = text.parse::<SocketAddr>() {
            return Ok((ip_octets(sock.ip()), sock.port()));
        }
        // A bare address means the standard iSCSI port
        let ip: IpAddr = text
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .map_err(|_| IbftError::InvalidValue(format!("'{}' is not an ip:port address", text)))?;
        Ok((ip_octets(ip), ISCSI_DEFAULT_PORT))
    }
}

impl From<SocketAddr> for SocketAddress {
    fn from(sock: SocketAddr) -> Self {
        Self(sock.to_string())
    }
}

impl From<&str> for SocketAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Variable-length string kept in the heap region
///
/// The head only records its (length, offset) pair. The bytes are stored
/// as-is, without a NUL terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeapString(pub String);

impl HeapString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for HeapString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for HeapString {
    fn from(s: String) -> Self {
        Self(s)
    }
}
