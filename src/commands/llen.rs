use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the length of the list stored at `key`. If `key` does not exist, it is interpreted as
/// an empty list and 0 is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/llen>
#[derive(Debug, PartialEq)]
pub struct Llen {
    pub key: String,
}

impl Executable for Llen {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let state = store.lock();
        let len = match state.get(&self.key) {
            Some(list) => list.len()?,
            None => 0,
        };

        Ok(Frame::Integer(len as i64))
    }
}

impl TryFrom<&mut CommandParser> for Llen {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::commands::Command;

    use super::*;

    #[test]
    fn existing_and_missing_keys() {
        let store = Store::new();
        {
            let mut state = store.lock();
            let list = state.list_mut("mylist");
            list.push_tail(b"a").unwrap();
            list.push_tail(b"b").unwrap();
        }

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LLEN")),
            Frame::Bulk(Bytes::from("mylist")),
        ]);
        let cmd = Command::try_from(frame).unwrap();
        assert_eq!(
            cmd,
            Command::Llen(Llen {
                key: "mylist".to_string()
            })
        );
        assert_eq!(cmd.exec(store.clone()).unwrap(), Frame::Integer(2));

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LLEN")),
            Frame::Bulk(Bytes::from("other")),
        ]);
        let res = Command::try_from(frame).unwrap().exec(store).unwrap();
        assert_eq!(res, Frame::Integer(0));
    }
}
