//! iBFT layout constants and fixed-region emitters
//!
//! ```text
//! Name        size    offset
//! Header      48      0       ACPI table header
//! Control     18      48      offsets of every structure below
//! Initiator   74      66
//! NIC0        102     140
//! Target0     54      242
//! NIC1        102     296
//! Target1     54      398
//! Heap        var     452     strings, addressed by (length, offset)
//! ```
//!
//! All multi-byte values are little-endian.

use crate::error::{IbftError, IbftResult};
use crate::flags::{pack_flags, Flag};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::io::Write;

/// Table signature
pub const SIGNATURE: &[u8; 4] = b"IBFT";
/// ACPI table revision
pub const REVISION: u8 = 1;

/// Structure IDs (common header byte 0)
pub mod structure_id {
    pub const RESERVED: u8 = 0;
    pub const CONTROL: u8 = 1;
    pub const INITIATOR: u8 = 2;
    pub const NIC: u8 = 3;
    pub const TARGET: u8 = 4;
    pub const EXTENSIONS: u8 = 5;
}

/// Structure version, 1 in all cases since 2009
pub const STRUCTURE_VERSION: u8 = 1;

pub const HEADER_LEN: u16 = 48;
pub const CONTROL_LEN: u16 = 18;
pub const INITIATOR_LEN: u16 = 74;
pub const NIC_LEN: u16 = 102;
pub const TARGET_LEN: u16 = 54;
/// Structure header prefix: ID, version, length (u16), index, flags
pub const STRUCT_HEADER_LEN: usize = 6;

/// Length of the whole fixed region; the heap starts here.
pub const HEADERS_LEN: u16 =
    HEADER_LEN + CONTROL_LEN + INITIATOR_LEN + NIC_LEN + TARGET_LEN + NIC_LEN + TARGET_LEN;

pub const INITIATOR_OFFSET: u16 = HEADER_LEN + CONTROL_LEN;
pub const NIC0_OFFSET: u16 = INITIATOR_OFFSET + INITIATOR_LEN;
pub const TARGET0_OFFSET: u16 = NIC0_OFFSET + NIC_LEN;
pub const NIC1_OFFSET: u16 = TARGET0_OFFSET + TARGET_LEN;
pub const TARGET1_OFFSET: u16 = NIC1_OFFSET + NIC_LEN;

/// Header byte offsets patched once the table is assembled
const LENGTH_OFFSET: usize = 4;
const CHECKSUM_OFFSET: usize = 9;

pub const OEM_ID_LEN: usize = 6;
pub const OEM_TABLE_ID_LEN: usize = 8;

/// Write the common structure header prefix.
pub fn write_struct_header<W: Write>(
    w: &mut W,
    id: u8,
    length: u16,
    index: u8,
    flags: u8,
) -> IbftResult<()> {
    w.write_u8(id)?;
    w.write_u8(STRUCTURE_VERSION)?;
    w.write_u16::<LittleEndian>(length)?;
    w.write_u8(index)?;
    w.write_u8(flags)?;
    Ok(())
}

/// Control structure
///
/// Everything but the login mode is fixed by the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    /// Bit 0: 0 = multi-login mode, 1 = single-login mode
    pub flags: u8,
    pub extensions: u16,
    pub initiator: u16,
    pub nic0: u16,
    pub target0: u16,
    pub nic1: u16,
    pub target1: u16,
}

impl Control {
    /// The control block with every offset filled in and login mode bits clear
    pub const LAYOUT: Control = Control {
        flags: 0,
        extensions: 0,
        initiator: INITIATOR_OFFSET,
        nic0: NIC0_OFFSET,
        target0: TARGET0_OFFSET,
        nic1: NIC1_OFFSET,
        target1: TARGET1_OFFSET,
    };

    /// The layout control block with its login mode taken from `multi_login`.
    pub fn with_login_mode(multi_login: Flag) -> IbftResult<Self> {
        let flags = pack_flags("control", &[("single_login", multi_login.negate())])?;
        Ok(Control {
            flags,
            ..Control::LAYOUT
        })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> IbftResult<()> {
        write_struct_header(w, structure_id::CONTROL, CONTROL_LEN, 0, self.flags)?;
        w.write_u16::<LittleEndian>(self.extensions)?;
        w.write_u16::<LittleEndian>(self.initiator)?;
        w.write_u16::<LittleEndian>(self.nic0)?;
        w.write_u16::<LittleEndian>(self.target0)?;
        w.write_u16::<LittleEndian>(self.nic1)?;
        w.write_u16::<LittleEndian>(self.target1)?;
        Ok(())
    }
}

/// ACPI table header (48 bytes)
///
/// Length and checksum are written as zero and patched by [`finalize`]
/// once the whole table exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcpiHeader {
    pub oem_id: [u8; OEM_ID_LEN],
    pub oem_table_id: [u8; OEM_TABLE_ID_LEN],
}

impl AcpiHeader {
    /// Build a header from text IDs, zero padding unused trailing bytes.
    pub fn new(oem_id: &str, oem_table_id: &str) -> IbftResult<Self> {
        Ok(AcpiHeader {
            oem_id: padded("oem_id", oem_id)?,
            oem_table_id: padded("oem_table_id", oem_table_id)?,
        })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> IbftResult<()> {
        w.write_all(SIGNATURE)?;
        w.write_u32::<LittleEndian>(0)?; // length
        w.write_u8(REVISION)?;
        w.write_u8(0)?; // checksum
        w.write_all(&self.oem_id)?;
        w.write_all(&self.oem_table_id)?;
        w.write_all(&[0u8; 24])?;
        Ok(())
    }
}

fn padded<const N: usize>(field: &str, text: &str) -> IbftResult<[u8; N]> {
    let bytes = text.as_bytes();
    if bytes.len() > N {
        return Err(IbftError::InvalidField {
            field: field.to_string(),
            reason: format!("'{}' is longer than {} bytes", text, N),
        });
    }
    let mut out = [0u8; N];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

/// Byte that makes `bytes` sum to zero mod 256 when added to it
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    0u8.wrapping_sub(sum)
}

/// Patch the total length and checksum into an assembled table.
pub fn finalize(table: &mut [u8]) -> IbftResult<()> {
    if table.len() < HEADER_LEN as usize {
        return Err(IbftError::Layout {
            structure: "header",
            got: table.len(),
            want: HEADER_LEN as usize,
        });
    }
    let len = u32::try_from(table.len()).map_err(|_| IbftError::Layout {
        structure: "table",
        got: table.len(),
        want: u32::MAX as usize,
    })?;

    LittleEndian::write_u32(&mut table[LENGTH_OFFSET..LENGTH_OFFSET + 4], len);
    table[CHECKSUM_OFFSET] = 0;
    table[CHECKSUM_OFFSET] = checksum(table);
    Ok(())
}
