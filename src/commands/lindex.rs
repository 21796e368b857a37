use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the element at index `index` in the list stored at `key`. The index is zero-based;
/// negative indices designate elements starting at the tail of the list, `-1` being the last
/// element. When the value at `key` is not a list or the index is out of range, nil is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/lindex>
#[derive(Debug, PartialEq)]
pub struct Lindex {
    pub key: String,
    pub index: i64,
}

impl Executable for Lindex {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let state = store.lock();
        let list = match state.get(&self.key) {
            Some(list) => list,
            None => return Ok(Frame::Null),
        };

        let res = match list.index(self.index)? {
            Some(offset) => Frame::Bulk(list.get(offset)?.to_bytes()),
            None => Frame::Null,
        };

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Lindex {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let index = parser.next_integer()?;
        Ok(Self { key, index })
    }
}
