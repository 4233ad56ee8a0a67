//! A pure Rust iSCSI Boot Firmware Table (iBFT) encoder
//!
//! This library turns a structured, serde-friendly description of an iBFT
//! into the exact byte sequence an operating system's iSCSI boot driver
//! expects to find in memory. Writing the blob somewhere (a file, a firmware
//! table list) is left to the caller.
//!
//! # Example
//!
//! ```
//! use ibft::{Flag, HeapString, Ibft, IpAddress, SocketAddress};
//!
//! # fn main() -> Result<(), ibft::IbftError> {
//! let mut table = Ibft::disabled();
//!
//! table.initiator.valid = Flag::True;
//! table.initiator.boot = Flag::True;
//! table.initiator.name = HeapString::new("iqn.2025-12.local:initiator");
//!
//! table.nic0.valid = Flag::True;
//! table.nic0.boot = Flag::True;
//! table.nic0.ip_address = IpAddress::new("10.0.0.5");
//! table.nic0.subnet_prefix = 24;
//!
//! table.target0.valid = Flag::True;
//! table.target0.boot = Flag::True;
//! table.target0.target_ip = SocketAddress::new("10.0.0.1:3260");
//! table.target0.target_name = HeapString::new("iqn.2025-12.local:storage.disk1");
//!
//! let bytes = ibft::encode(&table)?;
//! assert_eq!(&bytes[0..4], b"IBFT");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fields;
pub mod flags;
pub mod heap;
pub mod layout;
pub mod table;
pub mod wire;

pub use error::{IbftError, IbftResult};
pub use flags::{pack_flags, Flag};
pub use heap::HeapTable;
pub use layout::{checksum, HEADERS_LEN};
pub use table::{encode, Ibft, IbftInitiator, IbftNic, IbftTarget};
pub use wire::{HeapString, IpAddress, MacAddress, PciBdf, SocketAddress};

/// Version of this library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
