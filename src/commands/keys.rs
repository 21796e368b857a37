use bytes::Bytes;
use glob_match::glob_match;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns all keys matching `pattern`.
///
/// Ref: <https://redis.io/docs/latest/commands/keys>
#[derive(Debug, PartialEq)]
pub struct Keys {
    pub pattern: String,
}

impl Executable for Keys {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let state = store.lock();

        let mut keys: Vec<&String> = state
            .keys()
            .filter(|key| glob_match(&self.pattern, key))
            .collect();
        keys.sort();

        let res = keys
            .into_iter()
            .map(|key| Frame::Bulk(Bytes::from(key.to_string())))
            .collect();

        Ok(Frame::Array(res))
    }
}

impl TryFrom<&mut CommandParser> for Keys {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let pattern = parser.next_string()?;
        Ok(Self { pattern })
    }
}
