//! iBFT description types and the table assembler
//!
//! The description is plain data meant to be filled in by a config or CLI
//! layer (it round-trips through serde). [`encode`] turns it into the
//! exact bytes a boot driver expects:
//!
//! 1. ACPI header and control block
//! 2. Initiator, NIC0, Target0, NIC1, Target1, each at its fixed offset
//! 3. Heap strings, in the order their fields were visited
//!
//! The header's length and checksum are filled in last.

use crate::error::{IbftError, IbftResult};
use crate::fields::{marshal_fields, Field, Fields, Scalar, Structure};
use crate::flags::Flag;
use crate::heap::HeapTable;
use crate::layout::{self, AcpiHeader, Control, HEADERS_LEN};
use crate::wire::{HeapString, IpAddress, MacAddress, PciBdf, SocketAddress};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OEM_ID: &str = "IBFTRS";
pub const DEFAULT_OEM_TABLE_ID: &str = "IBFTGEN";

/// CHAP type byte of a target
pub mod chap_type {
    pub const NONE: u8 = 0;
    pub const CHAP: u8 = 1;
    pub const MUTUAL_CHAP: u8 = 2;
}

/// How a NIC got its IP address (`origin` byte)
pub mod origin {
    pub const OTHER: u8 = 0;
    pub const MANUAL: u8 = 1;
    pub const WELL_KNOWN: u8 = 2;
    pub const DHCP: u8 = 3;
    pub const ROUTER_ADVERTISEMENT: u8 = 4;
}

/// The iSCSI initiator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IbftInitiator {
    pub valid: Flag,
    pub boot: Flag,
    pub isns_server: IpAddress,
    pub slp_server: IpAddress,
    pub primary_radius_server: IpAddress,
    pub secondary_radius_server: IpAddress,
    pub name: HeapString,
}

impl IbftInitiator {
    /// An initiator with every flag false and nothing filled in
    pub fn disabled() -> Self {
        IbftInitiator {
            valid: Flag::False,
            boot: Flag::False,
            ..Default::default()
        }
    }
}

impl Fields for IbftInitiator {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("isns_server", Field::Scalar(Scalar::Ip(&self.isns_server))),
            ("slp_server", Field::Scalar(Scalar::Ip(&self.slp_server))),
            (
                "primary_radius_server",
                Field::Scalar(Scalar::Ip(&self.primary_radius_server)),
            ),
            (
                "secondary_radius_server",
                Field::Scalar(Scalar::Ip(&self.secondary_radius_server)),
            ),
            ("name", Field::Heap(&self.name)),
        ]
    }
}

/// A boot NIC
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IbftNic {
    pub valid: Flag,
    pub boot: Flag,
    /// Global (true) or link-local (false) address
    pub global: Flag,
    /// Slot this NIC belongs in; taken from its position when absent
    pub index: Option<u8>,
    pub ip_address: IpAddress,
    /// Subnet mask prefix length, e.g. 24 for 255.255.255.0
    pub subnet_prefix: u8,
    pub origin: u8,
    pub gateway: IpAddress,
    pub primary_dns: IpAddress,
    pub secondary_dns: IpAddress,
    pub dhcp: IpAddress,
    pub vlan: u16,
    pub mac_address: MacAddress,
    pub pci_bdf: PciBdf,
    pub host_name: HeapString,
}

impl IbftNic {
    pub fn disabled() -> Self {
        IbftNic {
            valid: Flag::False,
            boot: Flag::False,
            global: Flag::False,
            ..Default::default()
        }
    }
}

impl Fields for IbftNic {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("ip_address", Field::Scalar(Scalar::Ip(&self.ip_address))),
            ("subnet_prefix", Field::Scalar(Scalar::U8(self.subnet_prefix))),
            ("origin", Field::Scalar(Scalar::U8(self.origin))),
            ("gateway", Field::Scalar(Scalar::Ip(&self.gateway))),
            ("primary_dns", Field::Scalar(Scalar::Ip(&self.primary_dns))),
            ("secondary_dns", Field::Scalar(Scalar::Ip(&self.secondary_dns))),
            ("dhcp", Field::Scalar(Scalar::Ip(&self.dhcp))),
            ("vlan", Field::Scalar(Scalar::U16(self.vlan))),
            ("mac_address", Field::Scalar(Scalar::Mac(&self.mac_address))),
            ("pci_bdf", Field::Scalar(Scalar::Bdf(&self.pci_bdf))),
            ("host_name", Field::Heap(&self.host_name)),
        ]
    }
}

/// An iSCSI target, a.k.a. the boot server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IbftTarget {
    pub valid: Flag,
    pub boot: Flag,
    /// Use RADIUS CHAP
    pub chap: Flag,
    /// Use RADIUS reverse CHAP
    pub reverse_chap: Flag,
    pub index: Option<u8>,
    /// `ip:port`; a bare IP means port 3260
    pub target_ip: SocketAddress,
    pub boot_lun: u64,
    /// See [`chap_type`]
    pub chap_type: u8,
    /// Index of the NIC used to reach this target
    pub nic_association: u8,
    pub target_name: HeapString,
    pub chap_name: HeapString,
    pub chap_secret: HeapString,
    pub reverse_chap_name: HeapString,
    pub reverse_chap_secret: HeapString,
}

impl IbftTarget {
    pub fn disabled() -> Self {
        IbftTarget {
            valid: Flag::False,
            boot: Flag::False,
            chap: Flag::False,
            reverse_chap: Flag::False,
            ..Default::default()
        }
    }
}

impl Fields for IbftTarget {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("target_ip", Field::Scalar(Scalar::Socket(&self.target_ip))),
            ("boot_lun", Field::Scalar(Scalar::U64(self.boot_lun))),
            ("chap_type", Field::Scalar(Scalar::U8(self.chap_type))),
            ("nic_association", Field::Scalar(Scalar::U8(self.nic_association))),
            ("target_name", Field::Heap(&self.target_name)),
            ("chap_name", Field::Heap(&self.chap_name)),
            ("chap_secret", Field::Heap(&self.chap_secret)),
            ("reverse_chap_name", Field::Heap(&self.reverse_chap_name)),
            ("reverse_chap_secret", Field::Heap(&self.reverse_chap_secret)),
        ]
    }
}

/// Everything in an iBFT a user might want to set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ibft {
    pub oem_id: String,
    pub oem_table_id: String,
    /// Target login mode: multi-login when true, single-login when false
    pub multi_login: Flag,
    pub initiator: IbftInitiator,
    pub nic0: IbftNic,
    pub target0: IbftTarget,
    pub nic1: IbftNic,
    pub target1: IbftTarget,
}

impl Default for Ibft {
    fn default() -> Self {
        Ibft {
            oem_id: DEFAULT_OEM_ID.to_string(),
            oem_table_id: DEFAULT_OEM_TABLE_ID.to_string(),
            multi_login: Flag::Unset,
            initiator: IbftInitiator::default(),
            nic0: IbftNic::default(),
            target0: IbftTarget::default(),
            nic1: IbftNic::default(),
            target1: IbftTarget::default(),
        }
    }
}

impl Ibft {
    /// A table with every slot present but invalid and single-login mode
    pub fn disabled() -> Self {
        Ibft {
            multi_login: Flag::False,
            initiator: IbftInitiator::disabled(),
            nic0: IbftNic::disabled(),
            target0: IbftTarget::disabled(),
            nic1: IbftNic::disabled(),
            target1: IbftTarget::disabled(),
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> IbftResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> IbftResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Encode this description, see [`encode`].
    pub fn marshal(&self) -> IbftResult<Vec<u8>> {
        encode(self)
    }
}

impl Fields for Ibft {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("initiator", Field::Structure(Structure::Initiator(&self.initiator))),
            (
                "nic0",
                Field::Structure(Structure::Nic {
                    slot: 0,
                    nic: &self.nic0,
                }),
            ),
            (
                "target0",
                Field::Structure(Structure::Target {
                    slot: 0,
                    target: &self.target0,
                }),
            ),
            (
                "nic1",
                Field::Structure(Structure::Nic {
                    slot: 1,
                    nic: &self.nic1,
                }),
            ),
            (
                "target1",
                Field::Structure(Structure::Target {
                    slot: 1,
                    target: &self.target1,
                }),
            ),
        ]
    }
}

/// Encode a table description into a finished iBFT.
///
/// Fails on any unset flag, malformed scalar, oversized string or index
/// mismatch. A wrong fixed-region length is a layout bug and also fails.
pub fn encode(table: &Ibft) -> IbftResult<Vec<u8>> {
    let mut h = HeapTable::new(HEADERS_LEN as usize);

    let control = Control::with_login_mode(table.multi_login)?;
    AcpiHeader::new(&table.oem_id, &table.oem_table_id)?.write(h.head_mut())?;
    control.write(h.head_mut())?;
    log::debug!("iBFT header and control done, head is {} bytes", h.head_len());

    marshal_fields(&mut h, "", table.fields())?;
    log::debug!(
        "iBFT structures done, head is {} bytes, heap is {} bytes",
        h.head_len(),
        h.heap_len()
    );

    if h.head_len() != HEADERS_LEN as usize {
        return Err(IbftError::Layout {
            structure: "headers",
            got: h.head_len(),
            want: HEADERS_LEN as usize,
        });
    }

    let mut bytes = h.into_bytes();
    layout::finalize(&mut bytes)?;
    Ok(bytes)
}
