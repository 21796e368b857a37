use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Insert all the specified values at the head of the list stored at `key`. If `key` does not
/// exist, it is created as empty list before performing the push operations.
///
/// Elements are inserted one after the other to the head of the list, from the leftmost element
/// to the rightmost element. So `LPUSH mylist a b c` results in a list containing `c` as first
/// element, `b` as second element and `a` as third element.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush>
#[derive(Debug, PartialEq)]
pub struct Lpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Lpush {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut state = store.lock();

        let list = state.list_mut(&self.key);
        let pushed = self
            .values
            .iter()
            .try_for_each(|value| list.push_head(value).map(|_| ()));
        let len = list.len();

        state.remove_if_empty(&self.key);
        pushed?;

        Ok(Frame::Integer(len? as i64))
    }
}

impl TryFrom<&mut CommandParser> for Lpush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let values = parser.remaining_bytes()?;
        Ok(Self { key, values })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::commands::{Command, CommandParserError};

    use super::*;

    #[test]
    fn push_multiple_values() {
        let store = Store::new();

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LPUSH")),
            Frame::Bulk(Bytes::from("mylist")),
            Frame::Bulk(Bytes::from("a")),
            Frame::Bulk(Bytes::from("b")),
            Frame::Bulk(Bytes::from("3")),
        ]);
        let cmd = Command::try_from(frame).unwrap();
        assert_eq!(
            cmd,
            Command::Lpush(Lpush {
                key: "mylist".to_string(),
                values: vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("3")],
            })
        );

        let res = cmd.exec(store.clone()).unwrap();
        assert_eq!(res, Frame::Integer(3));

        let state = store.lock();
        let items: Vec<Bytes> = state
            .get("mylist")
            .unwrap()
            .iter()
            .map(|e| e.unwrap().value.to_bytes())
            .collect();
        assert_eq!(
            items,
            vec![Bytes::from("3"), Bytes::from("b"), Bytes::from("a")]
        );
    }

    #[test]
    fn push_onto_existing_list() {
        let store = Store::new();
        store.lock().list_mut("mylist").push_tail(b"x").unwrap();

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LPUSH")),
            Frame::Bulk(Bytes::from("mylist")),
            Frame::Bulk(Bytes::from("y")),
        ]);
        let res = Command::try_from(frame).unwrap().exec(store.clone()).unwrap();

        assert_eq!(res, Frame::Integer(2));
    }

    #[test]
    fn missing_values() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LPUSH")),
            Frame::Bulk(Bytes::from("mylist")),
        ]);
        let err = Command::try_from(frame).err().unwrap();
        let err = err.downcast_ref::<CommandParserError>().unwrap();

        assert_eq!(*err, CommandParserError::EndOfStream);
    }
}
