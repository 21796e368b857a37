use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Insert all the specified values at the tail of the list stored at `key`. If `key` does not
/// exist, it is created as empty list before performing the push operation.
///
/// Ref: <https://redis.io/docs/latest/commands/rpush>
#[derive(Debug, PartialEq)]
pub struct Rpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Rpush {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut state = store.lock();

        let list = state.list_mut(&self.key);
        let pushed = self
            .values
            .iter()
            .try_for_each(|value| list.push_tail(value).map(|_| ()));
        let len = list.len();

        state.remove_if_empty(&self.key);
        pushed?;

        Ok(Frame::Integer(len? as i64))
    }
}

impl TryFrom<&mut CommandParser> for Rpush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let values = parser.remaining_bytes()?;
        Ok(Self { key, values })
    }
}
