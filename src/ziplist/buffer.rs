//! The contiguous byte buffer backing a list, and its fixed-position header:
//!
//! ```text
//! [total_bytes: u32][tail_offset: u32][entry_count: u16] entries... [0xFF]
//! ```
//!
//! All counters are big-endian.

/// Size of the fixed header preceding the first entry.
pub const HEADER_SIZE: usize = 10;

/// Marks the end of the entries.
pub const END: u8 = 0xFF;

const TOTAL_BYTES_AT: usize = 0;
const TAIL_OFFSET_AT: usize = 4;
const ENTRY_COUNT_AT: usize = 8;

/// Smallest valid buffer: header plus terminator.
pub const MIN_SIZE: usize = HEADER_SIZE + 1;

pub(crate) fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

pub(crate) fn write_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_be_bytes());
}

/// Exclusive owner of the encoded bytes. Offsets into it are plain `usize`s, never references,
/// since every resize may move the allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBuffer {
    bytes: Vec<u8>,
}

impl ListBuffer {
    /// An empty list: header and terminator only.
    pub fn create() -> ListBuffer {
        let mut buf = ListBuffer {
            bytes: vec![0; MIN_SIZE],
        };
        buf.bytes[HEADER_SIZE] = END;
        buf.set_total_bytes(MIN_SIZE);
        buf.set_tail_offset(HEADER_SIZE);
        buf.set_entry_count(0);
        buf
    }

    /// Wraps bytes that have already been validated.
    pub(crate) fn from_vec(bytes: Vec<u8>) -> ListBuffer {
        ListBuffer { bytes }
    }

    /// Grows or shrinks the buffer to `new_total` bytes, keeping the common prefix, and writes the
    /// terminator and `total_bytes` for the new size. Never goes below `MIN_SIZE`.
    pub fn resize(&mut self, new_total: usize) {
        let new_total = new_total.max(MIN_SIZE);
        self.bytes.resize(new_total, 0);
        self.bytes[new_total - 1] = END;
        self.set_total_bytes(new_total);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    /// Actual length of the buffer.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Length according to the header.
    pub fn total_bytes(&self) -> usize {
        read_u32(&self.bytes, TOTAL_BYTES_AT) as usize
    }

    fn set_total_bytes(&mut self, total: usize) {
        write_u32(&mut self.bytes, TOTAL_BYTES_AT, total as u32);
    }

    pub fn tail_offset(&self) -> usize {
        read_u32(&self.bytes, TAIL_OFFSET_AT) as usize
    }

    pub(crate) fn set_tail_offset(&mut self, offset: usize) {
        write_u32(&mut self.bytes, TAIL_OFFSET_AT, offset as u32);
    }

    /// The header's entry count. Once it reaches `u16::MAX` it stops tracking and the list has to
    /// be walked to know its length.
    pub fn entry_count(&self) -> u16 {
        u16::from_be_bytes([self.bytes[ENTRY_COUNT_AT], self.bytes[ENTRY_COUNT_AT + 1]])
    }

    fn set_entry_count(&mut self, count: u16) {
        self.bytes[ENTRY_COUNT_AT..ENTRY_COUNT_AT + 2].copy_from_slice(&count.to_be_bytes());
    }

    pub(crate) fn adjust_entry_count(&mut self, delta: i32) {
        let count = self.entry_count();
        if count < u16::MAX {
            let adjusted = (i32::from(count) + delta).clamp(0, i32::from(u16::MAX));
            self.set_entry_count(adjusted as u16);
        }
    }

    pub fn first_entry_offset() -> usize {
        HEADER_SIZE
    }

    pub fn last_entry_offset(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.tail_offset())
        }
    }

    /// Position of the terminator, which is also where tail insertions happen.
    pub fn end_offset(&self) -> usize {
        self.bytes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.bytes[HEADER_SIZE] == END
    }

    pub(crate) fn is_end(&self, offset: usize) -> bool {
        self.bytes.get(offset) == Some(&END)
    }
}

impl Default for ListBuffer {
    fn default() -> Self {
        Self::create()
    }
}
