//! Encoding and decoding of a single entry: `[prev_len][type_len][content]`.
//!
//! Nothing in here knows where an entry sits in the list. Callers hand in the whole buffer and an
//! offset; bounds are checked against the `total_bytes` counter stored in the buffer header.

use std::fmt;

use bytes::Bytes;
use strum_macros::Display;

use super::buffer::{read_u32, write_u32, HEADER_SIZE};
use super::error::ZipListError;

/// First byte of a 5 byte previous-length field. Values below it fit in a single byte.
pub const BIG_PREV_LEN: u8 = 0xFE;

const STR_MASK: u8 = 0xC0;
const STR_06B: u8 = 0x00;
const STR_14B: u8 = 0x40;
const STR_32B: u8 = 0x80;
const INT_16B: u8 = 0xC0;
const INT_32B: u8 = 0xD0;
const INT_64B: u8 = 0xE0;
const INT_24B: u8 = 0xF0;
const INT_8B: u8 = 0xFE;
const INT_IMM_MIN: u8 = 0xF1;
const INT_IMM_MAX: u8 = 0xFD;

const STR_06B_MAX_LEN: usize = 0x3F;
const STR_14B_MAX_LEN: usize = 0x3FFF;

/// Longest string an entry can hold.
pub const MAX_STRING_LEN: usize = u32::MAX as usize;

const INT24_MIN: i64 = -(1 << 23);
const INT24_MAX: i64 = (1 << 23) - 1;

/// `i64::MIN` has 20 characters, nothing longer can parse.
const MAX_INTEGER_CHARS: usize = 20;

/// How an entry's content is laid out after its previous-length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Encoding {
    /// String up to 63 bytes, length in the low 6 bits of the type byte.
    StrShort,
    /// String up to 16383 bytes, length in 14 bits over two bytes.
    StrMid,
    /// String up to `u32::MAX` bytes, length in the 4 bytes after the type byte.
    StrLong,
    Int8,
    Int16,
    Int24,
    Int32,
    Int64,
    /// 0 through 12, kept in the type byte itself.
    Immediate(u8),
}

impl Encoding {
    /// Smallest integer encoding able to hold `value`. Immediates win over `Int8`.
    pub fn for_integer(value: i64) -> Self {
        match value {
            0..=12 => Self::Immediate(value as u8),
            v if i8::try_from(v).is_ok() => Self::Int8,
            v if i16::try_from(v).is_ok() => Self::Int16,
            INT24_MIN..=INT24_MAX => Self::Int24,
            v if i32::try_from(v).is_ok() => Self::Int32,
            _ => Self::Int64,
        }
    }

    pub fn for_string_len(len: usize) -> Self {
        if len <= STR_06B_MAX_LEN {
            Self::StrShort
        } else if len <= STR_14B_MAX_LEN {
            Self::StrMid
        } else {
            Self::StrLong
        }
    }

    pub fn is_string(self) -> bool {
        matches!(self, Self::StrShort | Self::StrMid | Self::StrLong)
    }

    /// Width of the type/length field.
    pub fn type_len_width(self) -> usize {
        match self {
            Self::StrMid => 2,
            Self::StrLong => 5,
            _ => 1,
        }
    }

    /// Width of the content. For strings that is the string length itself.
    pub fn content_width(self, string_len: usize) -> usize {
        match self {
            Self::StrShort | Self::StrMid | Self::StrLong => string_len,
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int24 => 3,
            Self::Int32 => 4,
            Self::Int64 => 8,
            Self::Immediate(_) => 0,
        }
    }
}

/// The decoded content of an entry, borrowed from the buffer when it is a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    Str(&'a [u8]),
    Int(i64),
}

impl Value<'_> {
    /// Raw bytes for strings, base 10 for integers.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Value::Str(s) => Bytes::copy_from_slice(s),
            Value::Int(v) => Bytes::from(v.to_string()),
        }
    }

    /// Whether this value is what `content` would be stored as.
    pub fn matches(&self, content: &[u8]) -> bool {
        match self {
            Value::Str(s) => *s == content,
            Value::Int(v) => parse_integer(content) == Some(*v),
        }
    }

    pub fn to_owned_value(&self) -> OwnedValue {
        match self {
            Value::Str(s) => OwnedValue::Str(Bytes::copy_from_slice(s)),
            Value::Int(v) => OwnedValue::Int(*v),
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", String::from_utf8_lossy(s)),
            Value::Int(v) => write!(f, "{}", v),
        }
    }
}

/// A value detached from the buffer it was read from, e.g. after the entry was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedValue {
    Str(Bytes),
    Int(i64),
}

impl OwnedValue {
    pub fn as_value(&self) -> Value<'_> {
        match self {
            OwnedValue::Str(s) => Value::Str(s),
            OwnedValue::Int(v) => Value::Int(*v),
        }
    }
}

impl From<OwnedValue> for Bytes {
    fn from(value: OwnedValue) -> Self {
        match value {
            OwnedValue::Str(s) => s,
            OwnedValue::Int(v) => Bytes::from(v.to_string()),
        }
    }
}

/// Parses `content` as a canonical base 10 `i64`: an optional `-`, no leading zeros (except for
/// `0` itself), no `+`, no whitespace.
pub fn parse_integer(content: &[u8]) -> Option<i64> {
    if content.is_empty() || content.len() > MAX_INTEGER_CHARS {
        return None;
    }
    if content == b"0" {
        return Some(0);
    }

    let (negative, digits) = match content.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, content),
    };

    match digits.first() {
        Some(b'1'..=b'9') => {}
        _ => return None,
    }

    let mut magnitude: u64 = 0;
    for &digit in digits {
        if !digit.is_ascii_digit() {
            return None;
        }
        magnitude = magnitude
            .checked_mul(10)?
            .checked_add(u64::from(digit - b'0'))?;
    }

    if negative {
        if magnitude == i64::MIN.unsigned_abs() {
            Some(i64::MIN)
        } else {
            i64::try_from(magnitude).ok().map(|v| -v)
        }
    } else {
        i64::try_from(magnitude).ok()
    }
}

/// Picks the encoding for `content`, trying the integer encodings first and falling back to a
/// string. The returned value is what will actually be written.
pub fn classify(content: &[u8]) -> (Encoding, Value<'_>) {
    match parse_integer(content) {
        Some(v) => (Encoding::for_integer(v), Value::Int(v)),
        None => (Encoding::for_string_len(content.len()), Value::Str(content)),
    }
}

pub fn choose_encoding(content: &[u8]) -> Encoding {
    classify(content).0
}

/// Bytes needed to store `prev_len` in a previous-length field.
pub fn prev_len_width(prev_len: usize) -> usize {
    if prev_len < BIG_PREV_LEN as usize {
        1
    } else {
        5
    }
}

/// Returns `(type_len field width, prev_len width + type_len width)` for an entry following an
/// entry of `prev_len` bytes.
///
/// The content length never changes either width: integer widths follow from the encoding, and
/// string encodings are already chosen by length. The previous-length field is the part that
/// varies per position, so that is what the total depends on.
pub fn header_width(encoding: Encoding, prev_len: usize) -> (usize, usize) {
    let type_len = encoding.type_len_width();
    (type_len, prev_len_width(prev_len) + type_len)
}

/// Total bytes an entry occupies.
pub fn entry_len(encoding: Encoding, prev_len: usize, value: Value<'_>) -> usize {
    let string_len = match value {
        Value::Str(s) => s.len(),
        Value::Int(_) => 0,
    };
    header_width(encoding, prev_len).1 + encoding.content_width(string_len)
}

/// Writes `prev_len` in the narrowest form. Returns the width written.
pub fn write_prev_len(buf: &mut [u8], offset: usize, prev_len: usize) -> usize {
    if prev_len_width(prev_len) == 1 {
        buf[offset] = prev_len as u8;
        1
    } else {
        write_prev_len_wide(buf, offset, prev_len)
    }
}

/// Writes `prev_len` in the 5 byte form, even when it would fit in one.
pub fn write_prev_len_wide(buf: &mut [u8], offset: usize, prev_len: usize) -> usize {
    buf[offset] = BIG_PREV_LEN;
    write_u32(buf, offset + 1, prev_len as u32);
    5
}

/// Reads the previous-length field at `offset`, returning `(width, value)`.
pub fn read_prev_len(buf: &[u8], offset: usize) -> Result<(usize, usize), ZipListError> {
    let limit = entries_end(buf, offset)?;
    match buf[offset] {
        b if b < BIG_PREV_LEN => Ok((1, b as usize)),
        BIG_PREV_LEN if offset + 5 <= limit => Ok((5, read_u32(buf, offset + 1) as usize)),
        BIG_PREV_LEN => Err(ZipListError::MalformedEntry {
            offset,
            reason: "previous-length field extends past end of buffer",
        }),
        _ => Err(ZipListError::MalformedEntry {
            offset,
            reason: "terminator found where an entry was expected",
        }),
    }
}

/// Writes a complete entry at `offset`. The buffer must already have room for it.
pub fn encode_entry(
    buf: &mut [u8],
    offset: usize,
    prev_len: usize,
    encoding: Encoding,
    value: Value<'_>,
) -> Result<usize, ZipListError> {
    let consistent = match value {
        Value::Str(s) => s.len() <= MAX_STRING_LEN && Encoding::for_string_len(s.len()) == encoding,
        Value::Int(v) => Encoding::for_integer(v) == encoding,
    };
    let string_len = match value {
        Value::Str(s) => s.len(),
        Value::Int(_) => 0,
    };
    let len = entry_len(encoding, prev_len, value);
    if !consistent || offset + len > buf.len() {
        return Err(ZipListError::EncodingOverflow { len: string_len });
    }

    let mut at = offset + write_prev_len(buf, offset, prev_len);

    match encoding {
        Encoding::StrShort => buf[at] = STR_06B | string_len as u8,
        Encoding::StrMid => {
            buf[at] = STR_14B | ((string_len >> 8) as u8 & 0x3F);
            buf[at + 1] = string_len as u8;
        }
        Encoding::StrLong => {
            buf[at] = STR_32B;
            write_u32(buf, at + 1, string_len as u32);
        }
        Encoding::Int8 => buf[at] = INT_8B,
        Encoding::Int16 => buf[at] = INT_16B,
        Encoding::Int24 => buf[at] = INT_24B,
        Encoding::Int32 => buf[at] = INT_32B,
        Encoding::Int64 => buf[at] = INT_64B,
        Encoding::Immediate(v) => buf[at] = INT_IMM_MIN + v,
    }
    at += encoding.type_len_width();

    match value {
        Value::Str(s) => buf[at..at + s.len()].copy_from_slice(s),
        Value::Int(v) => write_int(&mut buf[at..at + encoding.content_width(0)], encoding, v),
    }

    Ok(len)
}

fn write_int(dst: &mut [u8], encoding: Encoding, v: i64) {
    match encoding {
        Encoding::Int8 => dst.copy_from_slice(&(v as i8).to_be_bytes()),
        Encoding::Int16 => dst.copy_from_slice(&(v as i16).to_be_bytes()),
        Encoding::Int24 => dst.copy_from_slice(&(v as i32).to_be_bytes()[1..]),
        Encoding::Int32 => dst.copy_from_slice(&(v as i32).to_be_bytes()),
        Encoding::Int64 => dst.copy_from_slice(&v.to_be_bytes()),
        _ => {}
    }
}

fn read_int(content: &[u8], encoding: Encoding) -> i64 {
    match encoding {
        Encoding::Int8 => i64::from(content[0] as i8),
        Encoding::Int16 => i64::from(i16::from_be_bytes([content[0], content[1]])),
        // Shifting back down from the top of an i32 sign-extends the 24 bit value.
        Encoding::Int24 => i64::from(i32::from_be_bytes([content[0], content[1], content[2], 0]) >> 8),
        Encoding::Int32 => i64::from(i32::from_be_bytes([
            content[0], content[1], content[2], content[3],
        ])),
        Encoding::Int64 => {
            let mut raw = [0; 8];
            raw.copy_from_slice(&content[..8]);
            i64::from_be_bytes(raw)
        }
        Encoding::Immediate(v) => i64::from(v),
        Encoding::StrShort | Encoding::StrMid | Encoding::StrLong => 0,
    }
}

/// Offset-based description of one entry. Holds no reference into the buffer, so it stays valid
/// to keep around only as long as the buffer is not mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryView {
    pub offset: usize,
    pub prev_len_width: usize,
    pub prev_len: usize,
    pub type_len_width: usize,
    pub encoding: Encoding,
    pub content_len: usize,
}

impl EntryView {
    pub fn header_width(&self) -> usize {
        self.prev_len_width + self.type_len_width
    }

    pub fn content_offset(&self) -> usize {
        self.offset + self.header_width()
    }

    pub fn total_len(&self) -> usize {
        self.header_width() + self.content_len
    }

    /// Offset of the byte right after this entry.
    pub fn end(&self) -> usize {
        self.offset + self.total_len()
    }

    /// Reads the content. `buf` must be the buffer this view was decoded from.
    pub(crate) fn value<'a>(&self, buf: &'a [u8]) -> Value<'a> {
        let content = &buf[self.content_offset()..self.end()];
        if self.encoding.is_string() {
            Value::Str(content)
        } else {
            Value::Int(read_int(content, self.encoding))
        }
    }
}

/// Decodes the entry starting at `offset`.
pub fn decode_entry(buf: &[u8], offset: usize) -> Result<EntryView, ZipListError> {
    let limit = entries_end(buf, offset)?;
    let (prev_len_width, prev_len) = read_prev_len(buf, offset)?;

    let at = offset + prev_len_width;
    if at >= limit {
        return Err(ZipListError::MalformedEntry {
            offset,
            reason: "missing type/length field",
        });
    }

    let malformed = |reason| ZipListError::MalformedEntry { offset, reason };
    let tag = buf[at];
    let (encoding, content_len) = match tag & STR_MASK {
        STR_06B => (Encoding::StrShort, (tag & 0x3F) as usize),
        STR_14B => {
            if at + 2 > limit {
                return Err(malformed("string length extends past end of buffer"));
            }
            let len = (((tag & 0x3F) as usize) << 8) | buf[at + 1] as usize;
            (Encoding::StrMid, len)
        }
        STR_32B if tag == STR_32B => {
            if at + 5 > limit {
                return Err(malformed("string length extends past end of buffer"));
            }
            (Encoding::StrLong, read_u32(buf, at + 1) as usize)
        }
        _ => {
            let encoding = match tag {
                INT_8B => Encoding::Int8,
                INT_16B => Encoding::Int16,
                INT_24B => Encoding::Int24,
                INT_32B => Encoding::Int32,
                INT_64B => Encoding::Int64,
                INT_IMM_MIN..=INT_IMM_MAX => Encoding::Immediate(tag - INT_IMM_MIN),
                _ => return Err(malformed("unknown type/length pattern")),
            };
            (encoding, encoding.content_width(0))
        }
    };

    let view = EntryView {
        offset,
        prev_len_width,
        prev_len,
        type_len_width: encoding.type_len_width(),
        encoding,
        content_len,
    };

    if view.end() > limit {
        return Err(malformed("entry extends past end of buffer"));
    }

    Ok(view)
}

/// Position of the terminator according to the header, after checking that `offset` lies in the
/// entry region before it.
fn entries_end(buf: &[u8], offset: usize) -> Result<usize, ZipListError> {
    if buf.len() <= HEADER_SIZE {
        return Err(ZipListError::MalformedEntry {
            offset,
            reason: "buffer shorter than its header",
        });
    }
    let declared = read_u32(buf, 0) as usize;
    let limit = declared.min(buf.len()).saturating_sub(1);
    if offset < HEADER_SIZE || offset >= limit {
        return Err(ZipListError::MalformedEntry {
            offset,
            reason: "offset outside the entry region",
        });
    }
    Ok(limit)
}
