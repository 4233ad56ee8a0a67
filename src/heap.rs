//! Head/heap buffer pair
//!
//! The head holds every fixed-position structure; the heap collects string
//! data that the head refers to by (length, offset). All head regions have
//! fixed sizes, so the heap's absolute start is known before anything is
//! written and each append can return its final offset immediately.

use crate::error::{IbftError, IbftResult};

/// The two output buffers of a single encode
#[derive(Debug)]
pub struct HeapTable {
    head: Vec<u8>,
    heap: Vec<u8>,
    head_len: usize,
}

impl HeapTable {
    /// Create an empty pair for a table whose fixed region is `head_len` bytes.
    pub fn new(head_len: usize) -> Self {
        HeapTable {
            head: Vec::with_capacity(head_len),
            heap: Vec::new(),
            head_len,
        }
    }

    /// Buffer that fixed-position bytes are written to
    pub fn head_mut(&mut self) -> &mut Vec<u8> {
        &mut self.head
    }

    pub fn head(&self) -> &[u8] {
        &self.head
    }

    pub fn heap(&self) -> &[u8] {
        &self.heap
    }

    pub fn head_len(&self) -> usize {
        self.head.len()
    }

    pub fn heap_len(&self) -> usize {
        self.heap.len()
    }

    /// Absolute table offset of a heap-relative offset
    pub fn absolute(&self, heap_offset: usize) -> usize {
        self.head_len + heap_offset
    }

    /// Append bytes to the heap, returning their heap-relative offset.
    pub fn append_heap(&mut self, bytes: &[u8]) -> usize {
        let offset = self.heap.len();
        self.heap.extend_from_slice(bytes);
        offset
    }

    /// Store a heap string and return the (length, absolute offset) pair
    /// to record in the head.
    ///
    /// An empty string records `(0, 0)` and takes no heap space.
    pub fn store_string(&mut self, field: &str, bytes: &[u8]) -> IbftResult<(u16, u16)> {
        if bytes.is_empty() {
            return Ok((0, 0));
        }

        let len = u16::try_from(bytes.len()).map_err(|_| IbftError::StringTooLong {
            field: field.to_string(),
            len: bytes.len(),
        })?;

        let offset = self.absolute(self.heap.len());
        let offset = u16::try_from(offset).map_err(|_| IbftError::HeapOverflow {
            field: field.to_string(),
            offset,
        })?;

        self.append_heap(bytes);
        Ok((len, offset))
    }

    /// Concatenate head and heap into the finished table.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut out = self.head;
        out.extend_from_slice(&self.heap);
        out
    }
}
