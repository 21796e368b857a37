//! A compact list encoding: every entry of the list lives back to back in one contiguous byte
//! buffer, with a small self-describing header per entry instead of per-node allocations.
//!
//! ```text
//! [total_bytes][tail_offset][entry_count] [prev_len][type_len][content] ... [0xFF]
//! ```
//!
//! Each entry records the byte length of the entry before it, which is what allows walking the
//! list backwards. Because that field is 1 byte for predecessors shorter than 254 bytes and 5
//! bytes otherwise, changing one entry can change the length of the next one, and so on: see
//! [`cascade::cascade`].
//!
//! Entries are addressed by byte offset. Offsets are only meaningful for the buffer state they
//! were obtained from; any insertion or deletion may move everything after the point of change.
//!
//! A `ZipList` does no locking of its own. Shared use needs one exclusive lock per list, held for
//! each mutating call.

pub mod buffer;
pub mod cascade;
pub mod codec;
mod error;
pub mod mutator;
pub mod navigator;

pub use buffer::ListBuffer;
pub use codec::{Encoding, EntryView, OwnedValue, Value};
pub use error::ZipListError;
pub use navigator::{Entry, Iter, RevIter};

/// A list stored in the compact encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ZipList {
    buf: ListBuffer,
}

impl ZipList {
    pub fn new() -> ZipList {
        ZipList {
            buf: ListBuffer::create(),
        }
    }

    pub fn push_head(&mut self, content: &[u8]) -> Result<usize, ZipListError> {
        mutator::insert(&mut self.buf, ListBuffer::first_entry_offset(), content)
    }

    pub fn push_tail(&mut self, content: &[u8]) -> Result<usize, ZipListError> {
        let end = self.buf.end_offset();
        mutator::insert(&mut self.buf, end, content)
    }

    /// Inserts in front of the entry at `offset`. The terminator offset appends.
    pub fn insert_before(&mut self, offset: usize, content: &[u8]) -> Result<usize, ZipListError> {
        mutator::insert(&mut self.buf, offset, content)
    }

    /// Inserts right after the entry at `offset`.
    pub fn insert_after(&mut self, offset: usize, content: &[u8]) -> Result<usize, ZipListError> {
        let at = match navigator::next(&self.buf, offset)? {
            Some(next) => next,
            None => self.buf.end_offset(),
        };
        mutator::insert(&mut self.buf, at, content)
    }

    /// Removes the entry at `offset`, returning the offset its successor now starts at.
    pub fn delete_at(&mut self, offset: usize) -> Result<usize, ZipListError> {
        mutator::delete(&mut self.buf, offset)
    }

    pub fn pop_head(&mut self) -> Result<Option<OwnedValue>, ZipListError> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        self.take(ListBuffer::first_entry_offset()).map(Some)
    }

    pub fn pop_tail(&mut self) -> Result<Option<OwnedValue>, ZipListError> {
        match self.buf.last_entry_offset() {
            Some(tail) => self.take(tail).map(Some),
            None => Ok(None),
        }
    }

    fn take(&mut self, offset: usize) -> Result<OwnedValue, ZipListError> {
        let value = self.get(offset)?.to_owned_value();
        mutator::delete(&mut self.buf, offset)?;
        Ok(value)
    }

    /// The value stored at `offset`.
    pub fn get(&self, offset: usize) -> Result<Value<'_>, ZipListError> {
        let view = navigator::ensure_entry(&self.buf, offset)?;
        Ok(view.value(self.buf.as_bytes()))
    }

    /// Offset of the entry at position `index`. Negative indexes count from the tail, `-1` being
    /// the last entry.
    pub fn index(&self, index: i64) -> Result<Option<usize>, ZipListError> {
        let found = if index >= 0 {
            self.iter().nth(index as usize)
        } else {
            let back = index.unsigned_abs() - 1;
            self.iter_rev().nth(back as usize)
        };
        found.transpose().map(|entry| entry.map(|e| e.offset()))
    }

    pub fn find(&self, content: &[u8]) -> Result<Option<EntryView>, ZipListError> {
        navigator::find(&self.buf, content)
    }

    /// See [`navigator::find_from`].
    pub fn find_from(
        &self,
        offset: usize,
        content: &[u8],
        skip: usize,
    ) -> Result<Option<EntryView>, ZipListError> {
        navigator::find_from(&self.buf, offset, content, skip)
    }

    pub fn next(&self, offset: usize) -> Result<Option<usize>, ZipListError> {
        navigator::next(&self.buf, offset)
    }

    pub fn prev(&self, offset: usize) -> Result<Option<usize>, ZipListError> {
        navigator::prev(&self.buf, offset)
    }

    /// Number of entries. Only walks the list when the header count has saturated.
    pub fn len(&self) -> Result<usize, ZipListError> {
        match self.buf.entry_count() {
            u16::MAX => navigator::count(&self.buf),
            count => Ok(usize::from(count)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Size of the encoded buffer in bytes.
    pub fn blob_len(&self) -> usize {
        self.buf.total_bytes()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.buf)
    }

    pub fn iter_rev(&self) -> RevIter<'_> {
        RevIter::new(&self.buf)
    }

    /// Forward iteration starting at the entry at `offset`.
    pub fn iter_from(&self, offset: usize) -> Result<Iter<'_>, ZipListError> {
        Iter::from_offset(&self.buf, offset)
    }

    /// Backward iteration starting at the entry at `offset`.
    pub fn iter_rev_from(&self, offset: usize) -> Result<RevIter<'_>, ZipListError> {
        RevIter::from_offset(&self.buf, offset)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    pub fn buffer(&self) -> &ListBuffer {
        &self.buf
    }
}

impl TryFrom<Vec<u8>> for ZipList {
    type Error = ZipListError;

    /// Adopts an encoded buffer after checking it end to end.
    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        navigator::validate(&bytes)?;
        Ok(ZipList {
            buf: ListBuffer::from_vec(bytes),
        })
    }
}

impl From<ZipList> for Vec<u8> {
    fn from(list: ZipList) -> Self {
        list.buf.into_vec()
    }
}
