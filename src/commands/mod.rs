pub mod client;
pub mod dbsize;
pub mod del;
pub mod executable;
pub mod exists;
pub mod keys;
pub mod lindex;
pub mod linsert;
pub mod llen;
pub mod lpop;
pub mod lpos;
pub mod lpush;
pub mod lrange;
pub mod memory;
pub mod object;
pub mod ping;
pub mod rpop;
pub mod rpush;
pub mod select;
pub mod type_;

use bytes::Bytes;
use std::{str, vec};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

use client::Client;
use dbsize::DBSize;
use del::Del;
use exists::Exists;
use keys::Keys;
use lindex::Lindex;
use linsert::Linsert;
use llen::Llen;
use lpop::Lpop;
use lpos::Lpos;
use lpush::Lpush;
use lrange::Lrange;
use memory::Memory;
use object::Object;
use ping::Ping;
use rpop::Rpop;
use rpush::Rpush;
use select::Select;
use type_::Type;

#[derive(Debug, PartialEq)]
pub enum Command {
    DBsize(DBSize),
    Del(Del),
    Exists(Exists),
    Keys(Keys),
    Lindex(Lindex),
    Linsert(Linsert),
    Llen(Llen),
    Lpop(Lpop),
    Lpos(Lpos),
    Lpush(Lpush),
    Lrange(Lrange),
    Memory(Memory),
    Object(Object),
    Rpop(Rpop),
    Rpush(Rpush),
    Type(Type),

    Client(Client),
    Ping(Ping),
    Select(Select),
}

impl Executable for Command {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match self {
            Command::Client(cmd) => cmd.exec(store),
            Command::DBsize(cmd) => cmd.exec(store),
            Command::Del(cmd) => cmd.exec(store),
            Command::Exists(cmd) => cmd.exec(store),
            Command::Keys(cmd) => cmd.exec(store),
            Command::Lindex(cmd) => cmd.exec(store),
            Command::Linsert(cmd) => cmd.exec(store),
            Command::Llen(cmd) => cmd.exec(store),
            Command::Lpop(cmd) => cmd.exec(store),
            Command::Lpos(cmd) => cmd.exec(store),
            Command::Lpush(cmd) => cmd.exec(store),
            Command::Lrange(cmd) => cmd.exec(store),
            Command::Memory(cmd) => cmd.exec(store),
            Command::Object(cmd) => cmd.exec(store),
            Command::Ping(cmd) => cmd.exec(store),
            Command::Rpop(cmd) => cmd.exec(store),
            Command::Rpush(cmd) => cmd.exec(store),
            Command::Select(cmd) => cmd.exec(store),
            Command::Type(cmd) => cmd.exec(store),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = Error;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the Redis server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                }
                .into())
            }
        };

        let parser = &mut CommandParser {
            parts: frames.into_iter(),
        };

        let command_name = parser.parse_command_name()?;

        match &command_name[..] {
            "client" => Client::try_from(parser).map(Command::Client),
            "dbsize" => DBSize::try_from(parser).map(Command::DBsize),
            "del" => Del::try_from(parser).map(Command::Del),
            "exists" => Exists::try_from(parser).map(Command::Exists),
            "keys" => Keys::try_from(parser).map(Command::Keys),
            "lindex" => Lindex::try_from(parser).map(Command::Lindex),
            "linsert" => Linsert::try_from(parser).map(Command::Linsert),
            "llen" => Llen::try_from(parser).map(Command::Llen),
            "lpop" => Lpop::try_from(parser).map(Command::Lpop),
            "lpos" => Lpos::try_from(parser).map(Command::Lpos),
            "lpush" => Lpush::try_from(parser).map(Command::Lpush),
            "lrange" => Lrange::try_from(parser).map(Command::Lrange),
            "memory" => Memory::try_from(parser).map(Command::Memory),
            "object" => Object::try_from(parser).map(Command::Object),
            "ping" => Ping::try_from(parser).map(Command::Ping),
            "rpop" => Rpop::try_from(parser).map(Command::Rpop),
            "rpush" => Rpush::try_from(parser).map(Command::Rpush),
            "select" => Select::try_from(parser).map(Command::Select),
            "type" => Type::try_from(parser).map(Command::Type),
            _ => Err(CommandParserError::UnknownCommand {
                command: command_name,
            }
            .into()),
        }
    }
}

pub struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self
            .parts
            .next()
            .ok_or(CommandParserError::EndOfStream)?;

        match command_name {
            Frame::Simple(s) => Ok(s.to_lowercase()),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_lowercase())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_string(&mut self) -> Result<String, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            // Both `Simple` and `Bulk` representation may be strings. Strings are parsed to UTF-8.
            // While errors are stored as strings, they are considered separate types.
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Integer(i) => Ok(i),
            Frame::Simple(string) => {
                string
                    .parse::<i64>()
                    .map_err(|_| CommandParserError::InvalidFrame {
                        expected: "parseable i64 frame".to_string(),
                        actual: Frame::Simple(string),
                    })
            }
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map_err(CommandParserError::InvalidUTF8String)?
                .parse::<i64>()
                .map_err(|_| CommandParserError::InvalidFrame {
                    expected: "parseable i64 frame".to_string(),
                    actual: Frame::Bulk(bytes),
                }),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "integer".to_string(),
                actual: frame,
            }),
        }
    }

    /// List elements are binary safe, so they are taken as raw bytes.
    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Fails if any argument is left over once a command has taken everything it accepts.
    fn finish(&mut self, command: &str) -> Result<(), CommandParserError> {
        match self.next_bytes() {
            Err(CommandParserError::EndOfStream) => Ok(()),
            Ok(extra) => Err(CommandParserError::InvalidCommandArgument {
                command: command.to_string(),
                argument: String::from_utf8_lossy(&extra).into_owned(),
            }),
            Err(err) => Err(err),
        }
    }

    /// Collects every remaining argument, requiring at least one.
    fn remaining_bytes(&mut self) -> Result<Vec<Bytes>, CommandParserError> {
        let mut values = vec![];

        loop {
            match self.next_bytes() {
                Ok(value) => values.push(value),
                Err(CommandParserError::EndOfStream) if !values.is_empty() => break,
                Err(err) => return Err(err),
            }
        }

        Ok(values)
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub(crate) enum CommandParserError {
    #[error("protocol error; invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("protocol error; unknown command {command}")]
    UnknownCommand { command: String },
    #[error("protocol error; invalid command argument {command} {argument}")]
    InvalidCommandArgument { command: String, argument: String },
    #[error("protocol error; invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("protocol error; attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}
