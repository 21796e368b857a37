use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes and returns the first element of the list stored at `key`.
///
/// Only the single element form is supported; a trailing `count` argument is rejected.
///
/// Ref: <https://redis.io/docs/latest/commands/lpop>
#[derive(Debug, PartialEq)]
pub struct Lpop {
    pub key: String,
}

impl Executable for Lpop {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        pop(store, &self.key, End::Head)
    }
}

impl TryFrom<&mut CommandParser> for Lpop {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish("LPOP")?;
        Ok(Self { key })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum End {
    Head,
    Tail,
}

/// Pops one element from an end of the list at `key`, dropping the key once the list is empty.
pub(crate) fn pop(store: Store, key: &str, end: End) -> Result<Frame, Error> {
    let mut state = store.lock();

    let list = match state.get_mut(key) {
        Some(list) => list,
        None => return Ok(Frame::Null),
    };

    let value = match end {
        End::Head => list.pop_head()?,
        End::Tail => list.pop_tail()?,
    };

    state.remove_if_empty(key);

    Ok(value.map_or(Frame::Null, |value| Frame::Bulk(Bytes::from(value))))
}
