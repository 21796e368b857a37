use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the specified elements of the list stored at `key`. The offsets `start` and `stop` are
/// zero-based indexes, both inclusive. They can also be negative numbers indicating offsets from
/// the end of the list.
///
/// Out of range indexes will not produce an error. If `start` is larger than the end of the list,
/// an empty list is returned. If `stop` is larger than the actual end of the list, it is treated
/// like the last element of the list.
///
/// Ref: <https://redis.io/docs/latest/commands/lrange>
#[derive(Debug, PartialEq)]
pub struct Lrange {
    pub key: String,
    pub start: i64,
    pub stop: i64,
}

impl Executable for Lrange {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let state = store.lock();
        let list = match state.get(&self.key) {
            Some(list) => list,
            None => return Ok(Frame::Array(vec![])),
        };

        let len = list.len()? as i64;
        let start = get_positive_index(len, self.start).max(0);
        let stop = get_positive_index(len, self.stop).min(len - 1);

        if start > stop {
            return Ok(Frame::Array(vec![]));
        }

        let items = list
            .iter()
            .skip(start as usize)
            .take((stop - start + 1) as usize)
            .map(|entry| entry.map(|e| Frame::Bulk(e.value.to_bytes())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Frame::Array(items))
    }
}

fn get_positive_index(len: i64, index: i64) -> i64 {
    if index >= 0 {
        index
    } else {
        len.saturating_add(index)
    }
}

impl TryFrom<&mut CommandParser> for Lrange {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let start = parser.next_integer()?;
        let stop = parser.next_integer()?;

        Ok(Self { key, start, stop })
    }
}
