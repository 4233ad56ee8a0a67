//! End-to-end tests for iBFT encoding
//!
//! These tests encode full table descriptions and check the result the way
//! a boot driver would read it:
//! - Fixed region layout and structure header prefixes
//! - Heap (length, offset) references
//! - ACPI header length and checksum
//! - Failure modes (unset flags, bad scalars, oversized strings)

use byteorder::{ByteOrder, LittleEndian};
use ibft::layout::{
    self, structure_id, INITIATOR_OFFSET, NIC0_OFFSET, NIC1_OFFSET, TARGET0_OFFSET,
    TARGET1_OFFSET,
};
use ibft::{encode, Flag, HeapString, Ibft, IbftError, IpAddress, HEADERS_LEN};
use once_cell::sync::Lazy;

// ============================================================================
// Fixture
// ============================================================================

static BOOT_TABLE: Lazy<Ibft> = Lazy::new(|| {
    toml::from_str(include_str!("fixtures/boot.toml"))
        .expect("Failed to parse fixtures/boot.toml - invalid table description")
});

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Helpers
// ============================================================================

/// Structure header prefix decoded from the fixed region
#[derive(Debug, PartialEq, Eq)]
struct StructHeader {
    id: u8,
    version: u8,
    length: u16,
    index: u8,
    flags: u8,
}

fn struct_header(bytes: &[u8], at: u16) -> StructHeader {
    let at = at as usize;
    StructHeader {
        id: bytes[at],
        version: bytes[at + 1],
        length: LittleEndian::read_u16(&bytes[at + 2..at + 4]),
        index: bytes[at + 4],
        flags: bytes[at + 5],
    }
}

/// Read the (length, offset) pair at `at`
fn heap_ref(bytes: &[u8], at: usize) -> (usize, usize) {
    (
        LittleEndian::read_u16(&bytes[at..at + 2]) as usize,
        LittleEndian::read_u16(&bytes[at + 2..at + 4]) as usize,
    )
}

fn heap_str(bytes: &[u8], at: usize) -> &[u8] {
    let (len, off) = heap_ref(bytes, at);
    &bytes[off..off + len]
}

/// Positions of every heap reference in the fixed region
fn heap_ref_positions() -> Vec<usize> {
    let mut refs = vec![INITIATOR_OFFSET as usize + 70];
    for nic in [NIC0_OFFSET, NIC1_OFFSET] {
        refs.push(nic as usize + 98);
    }
    for target in [TARGET0_OFFSET, TARGET1_OFFSET] {
        for field in [34, 38, 42, 46, 50] {
            refs.push(target as usize + field);
        }
    }
    refs
}

fn byte_sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

// ============================================================================
// Scenario tests
// ============================================================================

#[test]
fn test_minimal_boot_scenario() {
    init_logger();

    let mut table = Ibft::disabled();
    table.multi_login = Flag::False;
    table.initiator.valid = Flag::True;
    table.initiator.boot = Flag::True;
    table.initiator.name = HeapString::new("iqn.initiator");
    table.nic0.valid = Flag::True;
    table.nic0.boot = Flag::True;
    table.nic0.ip_address = IpAddress::new("10.0.0.5");
    table.target0.valid = Flag::True;
    table.target0.boot = Flag::True;
    table.target0.target_name = HeapString::new("iqn.target");
    table.target0.boot_lun = 0;

    let bytes = encode(&table).unwrap();

    assert_eq!(
        bytes.len(),
        HEADERS_LEN as usize + "iqn.initiator".len() + "iqn.target".len()
    );
    assert_eq!(
        heap_str(&bytes, INITIATOR_OFFSET as usize + 70),
        b"iqn.initiator"
    );
    assert_eq!(heap_str(&bytes, TARGET0_OFFSET as usize + 34), b"iqn.target");

    // Single-login mode sets control bit 0
    assert_eq!(bytes[layout::HEADER_LEN as usize + 5], 1);
    assert_eq!(&bytes[NIC0_OFFSET as usize + 18..NIC0_OFFSET as usize + 22], &[10, 0, 0, 5]);
}

#[test]
fn test_fixture_table_layout() {
    init_logger();
    let bytes = BOOT_TABLE.marshal().unwrap();

    assert_eq!(&bytes[0..4], b"IBFT");
    assert_eq!(&bytes[10..14], b"ACME");
    assert_eq!(&bytes[16..24], b"IBFTTEST");
    // Multi-login clears control bit 0
    assert_eq!(bytes[layout::HEADER_LEN as usize + 5], 0);

    let expected = [
        (INITIATOR_OFFSET, structure_id::INITIATOR, layout::INITIATOR_LEN, 0, 0b11),
        (NIC0_OFFSET, structure_id::NIC, layout::NIC_LEN, 0, 0b111),
        (TARGET0_OFFSET, structure_id::TARGET, layout::TARGET_LEN, 0, 0b0011),
        (NIC1_OFFSET, structure_id::NIC, layout::NIC_LEN, 1, 0b101),
        (TARGET1_OFFSET, structure_id::TARGET, layout::TARGET_LEN, 1, 0b0001),
    ];
    for (offset, id, length, index, flags) in expected {
        assert_eq!(
            struct_header(&bytes, offset),
            StructHeader {
                id,
                version: 1,
                length,
                index,
                flags,
            },
            "structure at offset {}",
            offset
        );
    }
}

#[test]
fn test_control_block_offsets() {
    let bytes = BOOT_TABLE.marshal().unwrap();
    let c = layout::HEADER_LEN as usize;

    assert_eq!(struct_header(&bytes, layout::HEADER_LEN).id, structure_id::CONTROL);
    assert_eq!(struct_header(&bytes, layout::HEADER_LEN).length, 18);
    let offsets: Vec<u16> = (0..6)
        .map(|i| LittleEndian::read_u16(&bytes[c + 6 + i * 2..c + 8 + i * 2]))
        .collect();
    assert_eq!(
        offsets,
        vec![0, INITIATOR_OFFSET, NIC0_OFFSET, TARGET0_OFFSET, NIC1_OFFSET, TARGET1_OFFSET]
    );
}

#[test]
fn test_heap_references_resolve() {
    let table = &*BOOT_TABLE;
    let bytes = table.marshal().unwrap();

    let expected: Vec<&str> = vec![
        table.initiator.name.0.as_str(),
        table.nic0.host_name.0.as_str(),
        table.nic1.host_name.0.as_str(),
        table.target0.target_name.0.as_str(),
        table.target0.chap_name.0.as_str(),
        table.target0.chap_secret.0.as_str(),
        table.target0.reverse_chap_name.0.as_str(),
        table.target0.reverse_chap_secret.0.as_str(),
        table.target1.target_name.0.as_str(),
        table.target1.chap_name.0.as_str(),
        table.target1.chap_secret.0.as_str(),
        table.target1.reverse_chap_name.0.as_str(),
        table.target1.reverse_chap_secret.0.as_str(),
    ];

    for (pos, want) in heap_ref_positions().into_iter().zip(expected) {
        let (len, off) = heap_ref(&bytes, pos);
        if want.is_empty() {
            assert_eq!((len, off), (0, 0), "empty string at {}", pos);
            continue;
        }
        assert!(off >= HEADERS_LEN as usize, "offset {} inside fixed region", off);
        assert!(off < bytes.len());
        assert_eq!(&bytes[off..off + len], want.as_bytes());
    }
}

#[test]
fn test_heap_is_in_traversal_order() {
    let table = &*BOOT_TABLE;
    let bytes = table.marshal().unwrap();

    let heap = String::from_utf8(bytes[HEADERS_LEN as usize..].to_vec()).unwrap();
    let expected = [
        "iqn.2025-12.local:initiator",
        "client-a",
        "iqn.2025-12.local:storage.disk1",
        "initiator-user",
        "initiator-secret",
        "iqn.2025-12.local:storage.disk2",
    ]
    .concat();
    assert_eq!(heap, expected);
}

#[test]
fn test_header_length_and_checksum() {
    let bytes = BOOT_TABLE.marshal().unwrap();
    assert_eq!(LittleEndian::read_u32(&bytes[4..8]) as usize, bytes.len());
    assert_eq!(bytes[8], layout::REVISION);
    assert_eq!(byte_sum(&bytes), 0);
}

#[test]
fn test_fixed_region_is_constant() {
    let empty = Ibft::disabled().marshal().unwrap();
    let full = BOOT_TABLE.marshal().unwrap();

    assert_eq!(empty.len(), HEADERS_LEN as usize);
    assert!(full.len() > HEADERS_LEN as usize);
    // Nothing in the fixed region moves when the heap grows
    for offset in [INITIATOR_OFFSET, NIC0_OFFSET, TARGET0_OFFSET, NIC1_OFFSET, TARGET1_OFFSET] {
        assert_eq!(struct_header(&empty, offset).id, struct_header(&full, offset).id);
        assert_eq!(
            struct_header(&empty, offset).length,
            struct_header(&full, offset).length
        );
    }
}

#[test]
fn test_encode_is_idempotent() {
    let first = BOOT_TABLE.marshal().unwrap();
    let second = BOOT_TABLE.marshal().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_target_ipv6_address() {
    let bytes = BOOT_TABLE.marshal().unwrap();
    let t = TARGET1_OFFSET as usize;
    let mut want = [0u8; 16];
    want[0] = 0xFD;
    want[15] = 0x01;
    assert_eq!(&bytes[t + 6..t + 22], &want);
    assert_eq!(LittleEndian::read_u16(&bytes[t + 22..t + 24]), 3260);
    assert_eq!(LittleEndian::read_u64(&bytes[t + 24..t + 32]), 1);
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn test_initiator_name_too_long() {
    let mut table = Ibft::disabled();
    table.initiator.name = HeapString::new("x".repeat(u16::MAX as usize + 1));

    match encode(&table) {
        Err(IbftError::StringTooLong { field, len }) => {
            assert_eq!(field, "initiator.name");
            assert_eq!(len, 65536);
        }
        other => panic!("expected StringTooLong, got {:?}", other),
    }
}

#[test]
fn test_heap_past_16_bit_offsets() {
    let mut table = Ibft::disabled();
    table.initiator.name = HeapString::new("x".repeat(65_100));
    table.target0.target_name = HeapString::new("iqn.too-far");

    assert!(matches!(
        encode(&table),
        Err(IbftError::HeapOverflow { .. })
    ));
}

#[test]
fn test_unset_flag_is_reported() {
    let mut table = BOOT_TABLE.clone();
    table.nic1.global = Flag::Unset;

    match encode(&table) {
        Err(IbftError::UnsetFlag { structure, flag }) => {
            assert_eq!(structure, "nic1");
            assert_eq!(flag, "global");
        }
        other => panic!("expected UnsetFlag, got {:?}", other),
    }
}

#[test]
fn test_malformed_scalar_is_reported() {
    let mut table = BOOT_TABLE.clone();
    table.target0.target_ip = ibft::SocketAddress::new("storage.local:3260");

    match encode(&table) {
        Err(IbftError::InvalidField { field, .. }) => assert_eq!(field, "target0.target_ip"),
        other => panic!("expected InvalidField, got {:?}", other),
    }
}

#[test]
fn test_swapped_index_is_rejected() {
    let mut table = BOOT_TABLE.clone();
    table.nic0.index = Some(1);

    assert!(matches!(
        encode(&table),
        Err(IbftError::InvalidIndex {
            structure: "nic0",
            expected: 0,
            got: 1
        })
    ));
}

#[test]
fn test_json_description() {
    let json = r#"{
        "multi_login": false,
        "initiator": { "valid": true, "boot": true, "name": "iqn.json" },
        "nic0": { "valid": true, "boot": true, "global": false, "ip_address": "192.168.1.20" },
        "target0": { "valid": true, "boot": true, "chap": false, "reverse_chap": false,
                     "target_ip": "192.168.1.1", "target_name": "iqn.json.target" },
        "nic1": { "valid": false, "boot": false, "global": false },
        "target1": { "valid": false, "boot": false, "chap": false, "reverse_chap": false }
    }"#;

    let bytes = Ibft::from_json(json).unwrap().marshal().unwrap();
    assert_eq!(
        bytes.len(),
        HEADERS_LEN as usize + "iqn.json".len() + "iqn.json.target".len()
    );
    assert_eq!(heap_str(&bytes, TARGET0_OFFSET as usize + 34), b"iqn.json.target");
    // Bare target address gets the iSCSI port
    let t = TARGET0_OFFSET as usize;
    assert_eq!(LittleEndian::read_u16(&bytes[t + 22..t + 24]), 3260);
}
