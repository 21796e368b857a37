use std::str::FromStr;

use bytes::Bytes;
use strum_macros::EnumString;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Inserts `element` in the list stored at `key` either before or after the reference value
/// `pivot`.
///
/// When `key` does not exist, it is considered an empty list and no operation is performed.
///
/// Ref: <https://redis.io/docs/latest/commands/linsert>
#[derive(Debug, PartialEq)]
pub struct Linsert {
    pub key: String,
    pub position: Position,
    pub pivot: Bytes,
    pub element: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Position {
    Before,
    After,
}

impl Executable for Linsert {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut state = store.lock();
        let list = match state.get_mut(&self.key) {
            Some(list) => list,
            None => return Ok(Frame::Integer(0)),
        };

        let pivot = match list.find(&self.pivot)? {
            Some(entry) => entry.offset,
            None => return Ok(Frame::Integer(-1)),
        };

        match self.position {
            Position::Before => list.insert_before(pivot, &self.element)?,
            Position::After => list.insert_after(pivot, &self.element)?,
        };

        Ok(Frame::Integer(list.len()? as i64))
    }
}

impl TryFrom<&mut CommandParser> for Linsert {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;

        let position = parser.next_string()?;
        let position = Position::from_str(&position).map_err(|_| {
            CommandParserError::InvalidCommandArgument {
                command: "LINSERT".to_string(),
                argument: position,
            }
        })?;

        let pivot = parser.next_bytes()?;
        let element = parser.next_bytes()?;

        Ok(Self {
            key,
            position,
            pivot,
            element,
        })
    }
}
