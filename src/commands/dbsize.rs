use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the number of keys in the database.
///
/// Ref: <https://redis.io/docs/latest/commands/dbsize>
#[derive(Debug, PartialEq)]
pub struct DBSize;

impl Executable for DBSize {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let size = store.lock().size();
        Ok(Frame::Integer(size as i64))
    }
}

impl TryFrom<&mut CommandParser> for DBSize {
    type Error = Error;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::commands::Command;

    use super::*;

    #[test]
    fn counts_keys() {
        let store = Store::new();
        {
            let mut state = store.lock();
            state.list_mut("a").push_tail(b"1").unwrap();
            state.list_mut("b").push_tail(b"2").unwrap();
        }

        let frame = Frame::Array(vec![Frame::Bulk(Bytes::from("DBSIZE"))]);
        let cmd = Command::try_from(frame).unwrap();
        assert_eq!(cmd, Command::DBsize(DBSize));

        assert_eq!(cmd.exec(store).unwrap(), Frame::Integer(2));
    }
}
