//! Walking a list: stepping between entries, lookups by content and lazy iteration in both
//! directions.

use super::buffer::{read_u32, ListBuffer, END, HEADER_SIZE, MIN_SIZE};
use super::codec::{decode_entry, parse_integer, EntryView, Value};
use super::error::ZipListError;

/// An entry decoded during iteration, with its content borrowed from the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    pub view: EntryView,
    pub value: Value<'a>,
}

impl Entry<'_> {
    pub fn offset(&self) -> usize {
        self.view.offset
    }
}

/// Offset of the entry after the one at `offset`, or `None` when it is the last one. An offset
/// that is not the start of an entry is `OutOfBounds`.
pub fn next(buf: &ListBuffer, offset: usize) -> Result<Option<usize>, ZipListError> {
    let view = ensure_entry(buf, offset)?;
    Ok(following(buf, &view))
}

fn following(buf: &ListBuffer, view: &EntryView) -> Option<usize> {
    let end = view.end();
    if buf.is_end(end) {
        None
    } else {
        Some(end)
    }
}

/// Offset of the entry before the one at `offset`, or `None` when it is the first one. Stepping
/// back from the terminator lands on the last entry. Any other offset that is not the start of an
/// entry is `OutOfBounds`.
pub fn prev(buf: &ListBuffer, offset: usize) -> Result<Option<usize>, ZipListError> {
    if offset == buf.end_offset() {
        return Ok(buf.last_entry_offset());
    }
    let view = ensure_entry(buf, offset)?;
    preceding(&view)
}

fn preceding(view: &EntryView) -> Result<Option<usize>, ZipListError> {
    let offset = view.offset;
    if offset == ListBuffer::first_entry_offset() {
        return Ok(None);
    }
    if view.prev_len == 0 || view.prev_len > offset - HEADER_SIZE {
        return Err(ZipListError::MalformedEntry {
            offset,
            reason: "previous length points outside the entry region",
        });
    }
    Ok(Some(offset - view.prev_len))
}

/// Whether `offset` is where an entry starts, found by walking from the head.
pub fn is_entry_boundary(buf: &ListBuffer, offset: usize) -> Result<bool, ZipListError> {
    if offset > buf.end_offset() {
        return Ok(false);
    }
    // Anything past the tail entry can not be the start of one.
    if buf.is_empty() || offset > buf.tail_offset() {
        return Ok(false);
    }

    let mut cursor = Some(ListBuffer::first_entry_offset());
    while let Some(at) = cursor {
        if at == offset {
            return Ok(true);
        }
        if at > offset {
            return Ok(false);
        }
        cursor = following(buf, &decode_entry(buf.as_bytes(), at)?);
    }
    Ok(false)
}

/// Maps corruption at a caller supplied offset to `OutOfBounds`.
pub(crate) fn ensure_entry(buf: &ListBuffer, offset: usize) -> Result<EntryView, ZipListError> {
    match is_entry_boundary(buf, offset) {
        Ok(true) => decode_entry(buf.as_bytes(), offset),
        Ok(false) | Err(ZipListError::MalformedEntry { .. }) => {
            Err(ZipListError::OutOfBounds { offset })
        }
        Err(e) => Err(e),
    }
}

/// First entry, in forward order, whose content equals `content`.
pub fn find(buf: &ListBuffer, content: &[u8]) -> Result<Option<EntryView>, ZipListError> {
    find_from(buf, ListBuffer::first_entry_offset(), content, 0)
}

/// Like [`find`], but starting at `offset` and skipping `skip` entries after every entry it
/// compares, so that only every `skip + 1`th entry is a candidate.
///
/// Strings compare byte for byte. Integer entries compare numerically against `content` parsed as
/// an integer; the parse happens at most once, and only if an integer entry is reached.
pub fn find_from(
    buf: &ListBuffer,
    offset: usize,
    content: &[u8],
    skip: usize,
) -> Result<Option<EntryView>, ZipListError> {
    if offset == buf.end_offset() {
        return Ok(None);
    }
    ensure_entry(buf, offset)?;

    let bytes = buf.as_bytes();
    let mut target: Option<Option<i64>> = None;
    let mut skipped = 0;
    let mut cursor = Some(offset);

    while let Some(at) = cursor {
        let view = decode_entry(bytes, at)?;

        if skipped == 0 {
            let hit = match view.value(bytes) {
                Value::Str(s) => s == content,
                Value::Int(v) => *target.get_or_insert_with(|| parse_integer(content)) == Some(v),
            };
            if hit {
                return Ok(Some(view));
            }
            skipped = skip;
        } else {
            skipped -= 1;
        }

        cursor = following(buf, &view);
    }

    Ok(None)
}

/// Exact number of entries, walking the whole list.
pub fn count(buf: &ListBuffer) -> Result<usize, ZipListError> {
    Iter::new(buf).try_fold(0, |n, entry| entry.map(|_| n + 1))
}

/// Checks a raw buffer from end to end: header counters, every entry header, every previous
/// length link, the tail offset and the terminator.
pub fn validate(bytes: &[u8]) -> Result<(), ZipListError> {
    let malformed = |offset, reason| Err(ZipListError::MalformedEntry { offset, reason });

    if bytes.len() < MIN_SIZE {
        return malformed(0, "buffer shorter than header and terminator");
    }
    if read_u32(bytes, 0) as usize != bytes.len() {
        return malformed(0, "total_bytes does not match the buffer length");
    }
    if bytes[bytes.len() - 1] != END {
        return malformed(bytes.len() - 1, "missing terminator");
    }

    let end = bytes.len() - 1;
    let mut at = HEADER_SIZE;
    let mut prev_len = 0;
    let mut last = HEADER_SIZE;
    let mut entries: usize = 0;

    while at < end {
        let view = decode_entry(bytes, at)?;
        if view.prev_len != prev_len {
            return malformed(at, "previous length does not match the preceding entry");
        }
        prev_len = view.total_len();
        last = at;
        at = view.end();
        entries += 1;
    }

    if read_u32(bytes, 4) as usize != last {
        return malformed(4, "tail_offset does not point at the last entry");
    }

    let count = u16::from_be_bytes([bytes[8], bytes[9]]);
    if count < u16::MAX && usize::from(count) != entries {
        return malformed(8, "entry_count does not match the entries");
    }

    Ok(())
}

/// Forward iterator. Yields an error at most once, then stops.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    buf: &'a ListBuffer,
    cursor: Option<usize>,
}

impl<'a> Iter<'a> {
    pub fn new(buf: &'a ListBuffer) -> Self {
        let cursor = (!buf.is_empty()).then(ListBuffer::first_entry_offset);
        Self { buf, cursor }
    }

    /// Resumes from a previously seen entry offset. The terminator offset gives an empty
    /// iterator, any other offset must be the start of an entry.
    pub fn from_offset(buf: &'a ListBuffer, offset: usize) -> Result<Self, ZipListError> {
        let cursor = if offset == buf.end_offset() {
            None
        } else {
            Some(ensure_entry(buf, offset)?.offset)
        };
        Ok(Self { buf, cursor })
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<Entry<'a>, ZipListError>;

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.cursor.take()?;
        let bytes = self.buf.as_bytes();
        match decode_entry(bytes, at) {
            Ok(view) => {
                self.cursor = following(self.buf, &view);
                Some(Ok(Entry {
                    view,
                    value: view.value(bytes),
                }))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Backward iterator, from the tail towards the head.
#[derive(Debug, Clone)]
pub struct RevIter<'a> {
    buf: &'a ListBuffer,
    cursor: Option<usize>,
}

impl<'a> RevIter<'a> {
    pub fn new(buf: &'a ListBuffer) -> Self {
        Self {
            buf,
            cursor: buf.last_entry_offset(),
        }
    }

    /// Walks back from the entry at `offset`. The terminator offset starts at the tail.
    pub fn from_offset(buf: &'a ListBuffer, offset: usize) -> Result<Self, ZipListError> {
        let cursor = if offset == buf.end_offset() {
            buf.last_entry_offset()
        } else {
            Some(ensure_entry(buf, offset)?.offset)
        };
        Ok(Self { buf, cursor })
    }
}

impl<'a> Iterator for RevIter<'a> {
    type Item = Result<Entry<'a>, ZipListError>;

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.cursor.take()?;
        let bytes = self.buf.as_bytes();
        let view = match decode_entry(bytes, at) {
            Ok(view) => view,
            Err(e) => return Some(Err(e)),
        };
        match preceding(&view) {
            Ok(cursor) => self.cursor = cursor,
            Err(e) => return Some(Err(e)),
        }
        Some(Ok(Entry {
            view,
            value: view.value(bytes),
        }))
    }
}
