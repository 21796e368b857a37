//! Insertion and deletion of single entries.

use tracing::trace;

use super::buffer::ListBuffer;
use super::cascade::cascade;
use super::codec::{
    classify, decode_entry, encode_entry, entry_len, prev_len_width, write_prev_len,
    write_prev_len_wide, MAX_STRING_LEN,
};
use super::error::ZipListError;
use super::navigator::ensure_entry;

/// Inserts `content` so that it starts at `offset`, which must be the start of an existing entry
/// (the new entry goes in front of it) or the terminator (the new entry becomes the tail).
/// Returns the offset of the new entry, which is always `offset`.
pub fn insert(buf: &mut ListBuffer, offset: usize, content: &[u8]) -> Result<usize, ZipListError> {
    if content.len() > MAX_STRING_LEN {
        return Err(ZipListError::ContentTooLarge {
            len: content.len(),
        });
    }

    let at_end = offset == buf.end_offset();

    // Length of the entry that will precede the new one, and the successor's current
    // previous-length field width.
    let (prev_len, successor_field) = if at_end {
        let prev_len = match buf.last_entry_offset() {
            Some(tail) => decode_entry(buf.as_bytes(), tail)?.total_len(),
            None => 0,
        };
        (prev_len, None)
    } else {
        let successor = ensure_entry(buf, offset)?;
        (successor.prev_len, Some(successor.prev_len_width))
    };

    let (encoding, value) = classify(content);
    let req_len = entry_len(encoding, prev_len, value);

    let mut next_diff: isize = match successor_field {
        Some(width) => prev_len_width(req_len) as isize - width as isize,
        None => 0,
    };

    // A successor with a 5 byte field in front of a tiny entry would shrink the buffer overall.
    // Keep the wide field instead so that the move below never reads bytes a shrink dropped.
    let mut force_wide = false;
    if next_diff == -4 && req_len < 4 {
        next_diff = 0;
        force_wide = true;
    }

    let cur_len = buf.byte_len();
    let new_len = (cur_len + req_len) as isize + next_diff;
    if new_len as u64 > u64::from(u32::MAX) {
        return Err(ZipListError::ContentTooLarge {
            len: content.len(),
        });
    }

    // Everything that can fail happens before the buffer is touched, except the cascade, which
    // walks entries past `offset`. The old buffer is kept for that case.
    let mut entry = vec![0u8; req_len];
    encode_entry(&mut entry, 0, prev_len, encoding, value)?;
    let successor_is_tail = !at_end && offset == buf.tail_offset();
    let before = (next_diff != 0).then(|| buf.clone());

    trace!(offset, req_len, next_diff, force_wide, %encoding, "inserting entry");

    buf.resize(new_len as usize);

    if at_end {
        buf.set_tail_offset(offset);
    } else {
        // Move the successor and everything after it. When its field changes width the copy
        // starts `next_diff` bytes earlier (or later) so that the field is rewritten in place.
        let src = (offset as isize - next_diff) as usize;
        let count = (cur_len as isize - offset as isize - 1 + next_diff) as usize;
        let successor_at = offset + req_len;
        let bytes = buf.bytes_mut();
        bytes.copy_within(src..src + count, successor_at);

        if force_wide {
            write_prev_len_wide(bytes, successor_at, req_len);
        } else {
            write_prev_len(bytes, successor_at, req_len);
        }

        // The tail only moves by `next_diff` when the widened field is not inside the tail
        // entry itself.
        let mut tail = buf.tail_offset() + req_len;
        if !successor_is_tail {
            tail = (tail as isize + next_diff) as usize;
        }
        buf.set_tail_offset(tail);
    }

    buf.bytes_mut()[offset..offset + req_len].copy_from_slice(&entry);

    if let Some(before) = before {
        if let Err(e) = cascade(buf, offset + req_len) {
            *buf = before;
            return Err(e);
        }
    }

    buf.adjust_entry_count(1);

    Ok(offset)
}

/// Removes the entry at `offset`. Returns the offset now holding its successor, or the
/// terminator offset when the tail was removed.
pub fn delete(buf: &mut ListBuffer, offset: usize) -> Result<usize, ZipListError> {
    let entry = ensure_entry(buf, offset)?;
    let deleted = entry.total_len();
    let cur_len = buf.byte_len();
    let next_at = entry.end();

    let mut next_diff: isize = 0;
    let mut before = None;

    if buf.is_end(next_at) {
        // The predecessor becomes the tail. With no predecessor `prev_len` is 0 and the tail
        // falls back to the header size.
        buf.set_tail_offset(offset - entry.prev_len);
    } else {
        // The successor now follows the deleted entry's predecessor, so it inherits that
        // previous length. Its field may need a different width.
        let successor = decode_entry(buf.as_bytes(), next_at)?;
        let successor_is_tail = next_at == buf.tail_offset();
        next_diff = prev_len_width(entry.prev_len) as isize - successor.prev_len_width as isize;

        // Only the cascade below can fail once bytes move; keep the old buffer for it.
        if next_diff != 0 {
            before = Some(buf.clone());
        }

        let new_start = (next_at as isize - next_diff) as usize;
        write_prev_len(buf.bytes_mut(), new_start, entry.prev_len);

        let mut tail = buf.tail_offset() - deleted;
        if !successor_is_tail {
            tail = (tail as isize + next_diff) as usize;
        }
        buf.set_tail_offset(tail);

        buf.bytes_mut().copy_within(new_start..cur_len - 1, offset);
    }

    trace!(offset, deleted, next_diff, "deleting entry");

    buf.resize((cur_len as isize - deleted as isize + next_diff) as usize);

    if let Some(before) = before {
        if let Err(e) = cascade(buf, offset) {
            *buf = before;
            return Err(e);
        }
    }

    buf.adjust_entry_count(-1);

    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ziplist::buffer::HEADER_SIZE;
    use crate::ziplist::codec::{Encoding, Value};
    use crate::ziplist::navigator::{validate, Iter};

    fn items(buf: &ListBuffer) -> Vec<String> {
        Iter::new(buf)
            .map(|e| e.unwrap().value.to_string())
            .collect()
    }

    fn push_tail(buf: &mut ListBuffer, content: &[u8]) -> usize {
        let end = buf.end_offset();
        insert(buf, end, content).unwrap()
    }

    #[test]
    fn insert_into_empty_list() {
        let mut buf = ListBuffer::create();
        let at = push_tail(&mut buf, b"12");

        assert_eq!(at, HEADER_SIZE);
        assert_eq!(buf.entry_count(), 1);
        assert_eq!(buf.tail_offset(), HEADER_SIZE);

        // "12" parses as an integer, so it is stored as an immediate and renders back as "12".
        let view = decode_entry(buf.as_bytes(), at).unwrap();
        assert_eq!(view.encoding, Encoding::Immediate(12));
        assert_eq!(view.value(buf.as_bytes()).to_bytes(), "12");
        assert_eq!(validate(buf.as_bytes()), Ok(()));
    }

    #[test]
    fn insert_at_head_tail_and_middle() {
        let mut buf = ListBuffer::create();
        push_tail(&mut buf, b"b");
        push_tail(&mut buf, b"d");
        insert(&mut buf, HEADER_SIZE, b"a").unwrap();
        let d = buf.tail_offset();
        insert(&mut buf, d, b"c").unwrap();

        assert_eq!(items(&buf), ["a", "b", "c", "d"]);
        assert_eq!(buf.entry_count(), 4);
        assert_eq!(validate(buf.as_bytes()), Ok(()));
    }

    #[test]
    fn many_tail_pushes() {
        let mut buf = ListBuffer::create();
        for i in 0..300 {
            push_tail(&mut buf, format!("{}", (b'a' + (i % 26) as u8) as char).as_bytes());
        }

        assert_eq!(buf.entry_count(), 300);
        assert_eq!(validate(buf.as_bytes()), Ok(()));
        for (i, entry) in Iter::new(&buf).enumerate() {
            let entry = entry.unwrap();
            let expected = [b'a' + (i % 26) as u8];
            assert_eq!(entry.value, Value::Str(&expected));
        }
    }

    #[test]
    fn large_head_insert_widens_successors() {
        let mut buf = ListBuffer::create();
        for _ in 0..3 {
            push_tail(&mut buf, &[b'x'; 250]);
        }

        insert(&mut buf, HEADER_SIZE, &[b'y'; 300]).unwrap();

        let widths: Vec<usize> = Iter::new(&buf)
            .map(|e| e.unwrap().view.prev_len_width)
            .collect();
        assert_eq!(widths, [1, 5, 5, 5]);
        assert_eq!(validate(buf.as_bytes()), Ok(()));
    }

    #[test]
    fn small_insert_before_wide_field_keeps_it_wide() {
        // [a][b], with b's previous length stored in the 5 byte form.
        let mut buf = ListBuffer::create();
        push_tail(&mut buf, b"a");
        push_tail(&mut buf, b"b");
        let b = HEADER_SIZE + 3;
        let mut raw = buf.into_vec();
        let mut wide = [0u8; 5];
        write_prev_len_wide(&mut wide, 0, 3);
        raw.splice(b..b + 1, wide);
        let total = raw.len() as u32;
        raw[0..4].copy_from_slice(&total.to_be_bytes());
        let mut buf = ListBuffer::from_vec(raw);
        let len_before = buf.byte_len();

        // An immediate integer entry is 2 bytes, so narrowing b's field would shrink the buffer.
        insert(&mut buf, b, b"7").unwrap();

        assert_eq!(buf.byte_len(), len_before + 2);
        let successor = decode_entry(buf.as_bytes(), buf.tail_offset()).unwrap();
        assert_eq!((successor.prev_len_width, successor.prev_len), (5, 2));
        assert_eq!(items(&buf), ["a", "7", "b"]);
        assert_eq!(validate(buf.as_bytes()), Ok(()));
    }

    #[test]
    fn medium_insert_before_wide_field_narrows_it() {
        let mut buf = ListBuffer::create();
        push_tail(&mut buf, &[b'x'; 300]);
        push_tail(&mut buf, b"tail");
        let tail = buf.tail_offset();

        insert(&mut buf, tail, b"medium").unwrap();

        let successor = decode_entry(buf.as_bytes(), buf.tail_offset()).unwrap();
        assert_eq!(successor.prev_len_width, 1);
        assert_eq!(items(&buf)[1], "medium");
        assert_eq!(validate(buf.as_bytes()), Ok(()));
    }

    #[test]
    fn delete_head_middle_and_tail() {
        let mut buf = ListBuffer::create();
        for item in ["a", "b", "c", "d"] {
            push_tail(&mut buf, item.as_bytes());
        }

        assert_eq!(delete(&mut buf, HEADER_SIZE).unwrap(), HEADER_SIZE);
        assert_eq!(items(&buf), ["b", "c", "d"]);

        let c = HEADER_SIZE + 3;
        delete(&mut buf, c).unwrap();
        assert_eq!(items(&buf), ["b", "d"]);

        let tail = buf.tail_offset();
        assert_eq!(delete(&mut buf, tail).unwrap(), buf.end_offset());
        assert_eq!(items(&buf), ["b"]);
        assert_eq!(buf.tail_offset(), HEADER_SIZE);

        delete(&mut buf, HEADER_SIZE).unwrap();
        assert_eq!(buf, ListBuffer::create());
    }

    #[test]
    fn delete_propagates_previous_length() {
        // Entry lengths 3, 3, 304: deleting the head leaves the second entry first and the third
        // entry's field pointing at it.
        let mut buf = ListBuffer::create();
        push_tail(&mut buf, b"a");
        push_tail(&mut buf, b"b");
        push_tail(&mut buf, &[b'c'; 300]);

        delete(&mut buf, HEADER_SIZE).unwrap();

        let first = decode_entry(buf.as_bytes(), HEADER_SIZE).unwrap();
        let second = decode_entry(buf.as_bytes(), first.end()).unwrap();
        assert_eq!(first.prev_len, 0);
        assert_eq!(second.prev_len, first.total_len());
        assert_eq!(validate(buf.as_bytes()), Ok(()));
    }

    #[test]
    fn delete_widens_successor_field_and_cascades() {
        // [big][small][three 250 byte entries]: deleting "small" makes the first 250 byte
        // entry follow "big", needing a wide field, which grows it past the threshold in turn.
        let mut buf = ListBuffer::create();
        push_tail(&mut buf, &[b'b'; 300]);
        push_tail(&mut buf, b"s");
        for _ in 0..3 {
            push_tail(&mut buf, &[b'x'; 250]);
        }

        let small = decode_entry(buf.as_bytes(), HEADER_SIZE).unwrap().end();
        delete(&mut buf, small).unwrap();

        let widths: Vec<usize> = Iter::new(&buf)
            .map(|e| e.unwrap().view.prev_len_width)
            .collect();
        assert_eq!(widths, [1, 5, 5, 5]);
        assert_eq!(buf.entry_count(), 4);
        assert_eq!(validate(buf.as_bytes()), Ok(()));
    }

    #[test]
    fn delete_narrows_successor_field() {
        let mut buf = ListBuffer::create();
        push_tail(&mut buf, b"a");
        push_tail(&mut buf, &[b'b'; 300]);
        push_tail(&mut buf, b"c");

        let big = HEADER_SIZE + 3;
        delete(&mut buf, big).unwrap();

        let c = decode_entry(buf.as_bytes(), buf.tail_offset()).unwrap();
        assert_eq!((c.prev_len_width, c.prev_len), (1, 3));
        assert_eq!(items(&buf), ["a", "c"]);
        assert_eq!(validate(buf.as_bytes()), Ok(()));
    }

    #[test]
    fn failed_cascade_leaves_the_buffer_untouched() {
        // [hello][world] with the type byte of "world" broken, so a cascade that reaches it
        // fails halfway through the insert.
        let mut buf = ListBuffer::create();
        push_tail(&mut buf, b"hello");
        let world = push_tail(&mut buf, b"world");
        buf.bytes_mut()[world + 1] = 0x81;
        let before = buf.clone();

        assert!(matches!(
            insert(&mut buf, HEADER_SIZE, &[b'y'; 300]),
            Err(ZipListError::MalformedEntry { .. })
        ));
        assert_eq!(buf, before);

        // [big][s][x][world]: dropping "s" widens the field of "x", and the cascade after the
        // delete reaches the broken entry.
        let mut buf = ListBuffer::create();
        push_tail(&mut buf, &[b'b'; 300]);
        let small = push_tail(&mut buf, b"s");
        push_tail(&mut buf, b"x");
        let world = push_tail(&mut buf, b"world");
        buf.bytes_mut()[world + 1] = 0x81;
        let before = buf.clone();

        assert!(matches!(
            delete(&mut buf, small),
            Err(ZipListError::MalformedEntry { .. })
        ));
        assert_eq!(buf, before);
    }

    #[test]
    fn unaligned_offsets_are_rejected_untouched() {
        let mut buf = ListBuffer::create();
        push_tail(&mut buf, b"hello");
        push_tail(&mut buf, b"world");
        let before = buf.clone();

        let offset = HEADER_SIZE + 2;
        assert_eq!(
            insert(&mut buf, offset, b"x"),
            Err(ZipListError::OutOfBounds { offset })
        );
        assert_eq!(
            delete(&mut buf, offset),
            Err(ZipListError::OutOfBounds { offset })
        );
        let end = buf.end_offset();
        assert_eq!(
            delete(&mut buf, end),
            Err(ZipListError::OutOfBounds { offset: end })
        );
        assert_eq!(buf, before);
    }
}
