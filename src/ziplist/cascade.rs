use std::cmp::Ordering;

use tracing::{debug, trace};

use super::buffer::ListBuffer;
use super::codec::{decode_entry, prev_len_width, write_prev_len};
use super::error::ZipListError;

/// Brings previous-length fields back in line with the entries they follow, starting with the
/// successor of the entry at `start` and moving forward.
///
/// A field whose width has to change (1 to 5 bytes or back) shifts the rest of the buffer, which
/// changes the length of its own entry and may ripple into the next one. A field that only needs
/// a new value of the same width ends the walk, as does a field that is already correct. Returns
/// how many fields were rewritten.
pub fn cascade(buf: &mut ListBuffer, start: usize) -> Result<usize, ZipListError> {
    let mut rewritten = 0;
    let mut at = start;

    loop {
        let cur = decode_entry(buf.as_bytes(), at)?;
        let raw_len = cur.total_len();
        let next_at = cur.end();
        if buf.is_end(next_at) {
            break;
        }

        let next = decode_entry(buf.as_bytes(), next_at)?;
        if next.prev_len == raw_len {
            break;
        }

        let needed = prev_len_width(raw_len);
        let cur_len = buf.byte_len();
        let next_is_tail = buf.tail_offset() == next_at;

        match needed.cmp(&next.prev_len_width) {
            Ordering::Equal => {
                write_prev_len(buf.bytes_mut(), next_at, raw_len);
                rewritten += 1;
                break;
            }
            Ordering::Greater => {
                trace!(offset = next_at, prev_len = raw_len, "widening previous-length field");
                buf.resize(cur_len + 4);
                let bytes = buf.bytes_mut();
                bytes.copy_within(next_at + 1..cur_len - 1, next_at + 5);
                write_prev_len(bytes, next_at, raw_len);
                if !next_is_tail {
                    buf.set_tail_offset(buf.tail_offset() + 4);
                }
            }
            Ordering::Less => {
                trace!(offset = next_at, prev_len = raw_len, "narrowing previous-length field");
                let bytes = buf.bytes_mut();
                bytes.copy_within(next_at + 5..cur_len - 1, next_at + 1);
                write_prev_len(bytes, next_at, raw_len);
                buf.resize(cur_len - 4);
                if !next_is_tail {
                    buf.set_tail_offset(buf.tail_offset() - 4);
                }
            }
        }

        rewritten += 1;
        at = next_at;
    }

    if rewritten > 0 {
        debug!(start, rewritten, "cascade update");
    }
    Ok(rewritten)
}
