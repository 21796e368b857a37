// https://redis.io/docs/reference/protocol-spec

use std::fmt;
use std::io::Cursor;
use std::string::FromUtf8Error;

use bytes::{Buf, Bytes};
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("invalid frame data type: {0}")]
    InvalidDataType(u8),
    /// Invalid message encoding.
    #[error("{0}")]
    Other(crate::Error),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

impl Frame {
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        // The first byte in an RESP-serialized payload always identifies its type.
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => {
                let string = String::from_utf8(get_line(src)?.to_vec())?;
                Ok(Frame::Simple(string))
            }
            DataType::SimpleError => {
                let string = String::from_utf8(get_line(src)?.to_vec())?;
                Ok(Frame::Error(string))
            }
            DataType::Integer => Ok(Frame::Integer(get_number(src)?)),
            // $<length>\r\n<data>\r\n
            DataType::BulkString => match get_length(src)? {
                None => Ok(Frame::Null),
                Some(length) => Ok(Frame::Bulk(get_data(src, length)?)),
            },
            // !<length>\r\n<error>\r\n
            DataType::BulkError => match get_length(src)? {
                // NOTE: the protocol does not specify a way to represent a null bulk error
                None => Ok(Frame::Null),
                Some(length) => {
                    let msg = String::from_utf8(get_data(src, length)?.to_vec())?;
                    Ok(Frame::Error(msg))
                }
            },
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => match get_length(src)? {
                None => Ok(Frame::Null),
                Some(length) => {
                    let mut frames = Vec::with_capacity(length.min(1024));
                    for _ in 0..length {
                        frames.push(Self::parse(src)?);
                    }
                    Ok(Frame::Array(frames))
                }
            },
            DataType::Null => {
                get_line(src)?;
                Ok(Frame::Null)
            }
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes);
        bytes
    }

    fn write_to(&self, dst: &mut Vec<u8>) {
        match self {
            Frame::Simple(s) => {
                dst.push(u8::from(DataType::SimpleString));
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            Frame::Error(s) => {
                dst.push(u8::from(DataType::SimpleError));
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            Frame::Integer(i) => {
                dst.push(u8::from(DataType::Integer));
                dst.extend_from_slice(i.to_string().as_bytes());
                dst.extend_from_slice(CRLF);
            }
            Frame::Bulk(data) => {
                dst.push(u8::from(DataType::BulkString));
                dst.extend_from_slice(data.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                dst.extend_from_slice(data);
                dst.extend_from_slice(CRLF);
            }
            // RESP2 null bulk string, understood by every client.
            Frame::Null => dst.extend_from_slice(b"$-1\r\n"),
            Frame::Array(arr) => {
                dst.push(u8::from(DataType::Array));
                dst.extend_from_slice(arr.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                for frame in arr {
                    frame.write_to(dst);
                }
            }
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::Array(arr) => {
                write!(f, "*{}", arr.len())?;
                for frame in arr {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
        }
    }
}

/// Reads up to the next CRLF, leaving the cursor right after it.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf: &'a [u8] = src.get_ref();

    let end = buf
        .get(start..)
        .and_then(|rest| rest.windows(2).position(|window| window == CRLF))
        .map(|index| start + index)
        .ok_or(Error::Incomplete)?;

    src.set_position((end + CRLF.len()) as u64);

    Ok(&buf[start..end])
}

fn get_number(src: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let line = String::from_utf8(get_line(src)?.to_vec())?;
    line.parse::<i64>()
        .map_err(|e| Error::Other(Box::new(e)))
}

/// A length prefix, where `-1` stands for null.
fn get_length(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, Error> {
    match get_number(src)? {
        -1 => Ok(None),
        length if length < 0 => Err(format!("protocol error; invalid length {}", length).into()),
        length => Ok(Some(length as usize)),
    }
}

/// Reads exactly `length` bytes followed by CRLF. The payload may itself contain CRLF.
fn get_data(src: &mut Cursor<&[u8]>, length: usize) -> Result<Bytes, Error> {
    let start = src.position() as usize;
    let end = start + length;
    let buf = src.get_ref();

    if buf.len() < end + CRLF.len() {
        return Err(Error::Incomplete);
    }
    if &buf[end..end + CRLF.len()] != CRLF {
        return Err("protocol error; bulk payload is not terminated by CRLF".into());
    }

    let data = Bytes::copy_from_slice(&buf[start..end]);
    src.set_position((end + CRLF.len()) as u64);

    Ok(data)
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    BulkString,   // '$'
    SimpleError,  // '-'
    BulkError,    // '!'
    Integer,      // ':'
    Array,        // '*'
    Null,         // '_'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'!' => Ok(Self::BulkError),
            b'*' => Ok(Self::Array),
            b'_' => Ok(Self::Null),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::BulkError => b'!',
            DataType::Array => b'*',
            DataType::Null => b'_',
        }
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_src: FromUtf8Error) -> Error {
        "protocol error; invalid frame format".into()
    }
}

impl From<&str> for Error {
    fn from(src: &str) -> Error {
        src.to_string().into()
    }
}

impl From<String> for Error {
    fn from(src: String) -> Error {
        Error::Other(src.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &[u8]) -> Result<Frame, Error> {
        let mut cursor = Cursor::new(data);
        Frame::parse(&mut cursor)
    }

    #[test]
    fn parse_simple_string_frame() {
        assert!(matches!(parse(b"+OK\r\n"), Ok(Frame::Simple(ref s)) if s == "OK"));
    }

    #[test]
    fn parse_simple_error_frame() {
        assert!(matches!(
            parse(b"-Error message\r\n"),
            Ok(Frame::Error(ref s)) if s == "Error message"
        ));
    }

    #[test]
    fn parse_integer_frames() {
        assert!(matches!(parse(b":1000\r\n"), Ok(Frame::Integer(1000))));
        assert!(matches!(parse(b":-1000\r\n"), Ok(Frame::Integer(-1000))));
        assert!(matches!(parse(b":+1000\r\n"), Ok(Frame::Integer(1000))));
    }

    #[test]
    fn parse_bulk_string_frame() {
        assert!(matches!(
            parse(b"$6\r\nfoobar\r\n"),
            Ok(Frame::Bulk(ref b)) if b == &Bytes::from("foobar")
        ));
        assert!(matches!(
            parse(b"$0\r\n\r\n"),
            Ok(Frame::Bulk(ref b)) if b.is_empty()
        ));
        assert!(matches!(parse(b"$-1\r\n"), Ok(Frame::Null)));
    }

    #[test]
    fn parse_bulk_string_with_embedded_crlf() {
        assert!(matches!(
            parse(b"$8\r\nfoo\r\nbar\r\n"),
            Ok(Frame::Bulk(ref b)) if b == &Bytes::from("foo\r\nbar")
        ));
    }

    #[test]
    fn parse_partial_bulk_string_is_incomplete() {
        assert!(matches!(parse(b"$6\r\nfoo"), Err(Error::Incomplete)));
        assert!(matches!(parse(b"$6\r\nfoobar"), Err(Error::Incomplete)));
        assert!(matches!(parse(b"*2\r\n$1\r\na\r\n"), Err(Error::Incomplete)));
    }

    #[test]
    fn parse_bulk_error_frame() {
        assert!(matches!(
            parse(b"!6\r\nfoobar\r\n"),
            Ok(Frame::Error(ref s)) if s == "foobar"
        ));
        assert!(matches!(parse(b"!-1\r\n"), Ok(Frame::Null)));
    }

    #[test]
    fn parse_array_frame() {
        let frame = parse(b"*3\r\n$5\r\nhello\r\n$-1\r\n:7\r\n").unwrap();

        assert_eq!(
            frame,
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("hello")),
                Frame::Null,
                Frame::Integer(7),
            ])
        );
        assert!(matches!(parse(b"*0\r\n"), Ok(Frame::Array(ref a)) if a.is_empty()));
        assert!(matches!(parse(b"*-1\r\n"), Ok(Frame::Null)));
    }

    #[test]
    fn parse_unsupported_type() {
        assert!(matches!(parse(b"%1\r\n"), Err(Error::InvalidDataType(b'%'))));
    }

    #[test]
    fn serialize_frames() {
        let frame = Frame::Array(vec![
            Frame::Simple("OK".to_string()),
            Frame::Error("ERR nope".to_string()),
            Frame::Integer(-3),
            Frame::Bulk(Bytes::from("a\r\nb")),
            Frame::Null,
        ]);

        assert_eq!(
            frame.serialize(),
            b"*5\r\n+OK\r\n-ERR nope\r\n:-3\r\n$4\r\na\r\nb\r\n$-1\r\n".to_vec()
        );
    }
}
