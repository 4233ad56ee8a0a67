//! Field dispatch and traversal
//!
//! Each description type lists its fields in wire order as a closed set of
//! kinds: a nested structure, a heap string, or a fixed-width scalar. The
//! traversal walks that list once, so declaration order is the byte layout.

use crate::error::{IbftError, IbftResult};
use crate::flags::{pack_flags, Flag};
use crate::heap::HeapTable;
use crate::layout::{structure_id, write_struct_header, INITIATOR_LEN, NIC_LEN, TARGET_LEN};
use crate::table::{IbftInitiator, IbftNic, IbftTarget};
use crate::wire::{HeapString, IpAddress, MacAddress, PciBdf, SocketAddress};
use byteorder::{LittleEndian, WriteBytesExt};

/// Fixed-width scalar written straight into the head
#[derive(Debug, Clone, Copy)]
pub enum Scalar<'a> {
    U8(u8),
    U16(u16),
    U64(u64),
    Ip(&'a IpAddress),
    Mac(&'a MacAddress),
    Bdf(&'a PciBdf),
    /// Expands to a 16-byte IP followed by a u16 port
    Socket(&'a SocketAddress),
}

impl Scalar<'_> {
    pub fn write(&self, out: &mut Vec<u8>) -> IbftResult<()> {
        match *self {
            Scalar::U8(v) => out.write_u8(v)?,
            Scalar::U16(v) => out.write_u16::<LittleEndian>(v)?,
            Scalar::U64(v) => out.write_u64::<LittleEndian>(v)?,
            Scalar::Ip(ip) => out.extend_from_slice(&ip.to_bytes()?),
            Scalar::Mac(mac) => out.extend_from_slice(&mac.to_bytes()?),
            Scalar::Bdf(bdf) => out.write_u16::<LittleEndian>(bdf.to_u16()?)?,
            Scalar::Socket(sock) => {
                let (ip, port) = sock.split()?;
                out.extend_from_slice(&ip);
                out.write_u16::<LittleEndian>(port)?;
            }
        }
        Ok(())
    }
}

/// One of the three iBFT sub-structures, tagged with its slot
#[derive(Debug, Clone, Copy)]
pub enum Structure<'a> {
    Initiator(&'a IbftInitiator),
    Nic { slot: u8, nic: &'a IbftNic },
    Target { slot: u8, target: &'a IbftTarget },
}

impl<'a> Structure<'a> {
    pub fn id(&self) -> u8 {
        match self {
            Structure::Initiator(_) => structure_id::INITIATOR,
            Structure::Nic { .. } => structure_id::NIC,
            Structure::Target { .. } => structure_id::TARGET,
        }
    }

    pub fn length(&self) -> u16 {
        match self {
            Structure::Initiator(_) => INITIATOR_LEN,
            Structure::Nic { .. } => NIC_LEN,
            Structure::Target { .. } => TARGET_LEN,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Structure::Initiator(_) => "initiator",
            Structure::Nic { slot: 0, .. } => "nic0",
            Structure::Nic { .. } => "nic1",
            Structure::Target { slot: 0, .. } => "target0",
            Structure::Target { .. } => "target1",
        }
    }

    /// Index byte of the structure header.
    ///
    /// There is only one initiator; NICs and targets must sit in the slot
    /// their index names.
    pub fn index(&self) -> IbftResult<u8> {
        let (slot, index) = match self {
            Structure::Initiator(_) => return Ok(0),
            Structure::Nic { slot, nic } => (*slot, nic.index),
            Structure::Target { slot, target } => (*slot, target.index),
        };
        match index {
            Some(got) if got != slot => Err(IbftError::InvalidIndex {
                structure: self.label(),
                expected: slot,
                got,
            }),
            _ => Ok(slot),
        }
    }

    /// Flags in bit order for this structure's flags byte
    pub fn flags(&self) -> Vec<(&'static str, Flag)> {
        match self {
            Structure::Initiator(i) => vec![("valid", i.valid), ("boot", i.boot)],
            Structure::Nic { nic, .. } => vec![
                ("valid", nic.valid),
                ("boot", nic.boot),
                ("global", nic.global),
            ],
            Structure::Target { target, .. } => vec![
                ("valid", target.valid),
                ("boot", target.boot),
                ("chap", target.chap),
                ("reverse_chap", target.reverse_chap),
            ],
        }
    }

    pub fn fields(&self) -> Vec<(&'static str, Field<'a>)> {
        match *self {
            Structure::Initiator(i) => i.fields(),
            Structure::Nic { nic, .. } => nic.fields(),
            Structure::Target { target, .. } => target.fields(),
        }
    }
}

/// How a single field is encoded
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    Structure(Structure<'a>),
    Heap(&'a HeapString),
    Scalar(Scalar<'a>),
}

/// Types whose fields are laid out on the wire in declaration order
pub trait Fields {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)>;
}

/// Encode `fields` in order into the head, spilling strings to the heap.
///
/// `path` prefixes field names in errors and trace output.
pub fn marshal_fields(
    h: &mut HeapTable,
    path: &str,
    fields: Vec<(&'static str, Field<'_>)>,
) -> IbftResult<()> {
    for (name, field) in fields {
        let field_path = if path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", path, name)
        };
        log::trace!(
            "field {} at head {}, heap {}",
            field_path,
            h.head_len(),
            h.heap_len()
        );

        match field {
            Field::Structure(s) => marshal_structure(h, s)?,
            Field::Heap(s) => {
                // Heap strings can hold CHAP secrets; only their size is logged
                log::trace!("{}: heap string, {} bytes", field_path, s.len());
                let (len, offset) = h.store_string(&field_path, s.as_bytes())?;
                let head = h.head_mut();
                head.write_u16::<LittleEndian>(len)?;
                head.write_u16::<LittleEndian>(offset)?;
            }
            Field::Scalar(v) => v.write(h.head_mut()).map_err(|e| e.in_field(&field_path))?,
        }
    }
    Ok(())
}

/// Emit a structure header followed by the structure's own fields.
fn marshal_structure(h: &mut HeapTable, s: Structure<'_>) -> IbftResult<()> {
    let label = s.label();
    let flags = pack_flags(label, &s.flags())?;
    let index = s.index()?;
    let start = h.head_len();

    write_struct_header(h.head_mut(), s.id(), s.length(), index, flags)?;
    marshal_fields(h, label, s.fields())?;

    let written = h.head_len() - start;
    if written != s.length() as usize {
        return Err(IbftError::Layout {
            structure: label,
            got: written,
            want: s.length() as usize,
        });
    }
    log::debug!(
        "wrote {} ({} bytes, flags {:#04x}), head is {} bytes",
        label,
        written,
        flags,
        h.head_len()
    );
    Ok(())
}
