use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the string representation of the type of the value stored at `key`.
///
/// **NOTE**: This server only stores lists, so the reply is either `list` or, when the key does
/// not exist, `none`.
///
/// Ref: <https://redis.io/docs/latest/commands/type/>
#[derive(Debug, PartialEq)]
pub struct Type {
    pub key: String,
}

impl Executable for Type {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let state = store.lock();
        let type_ = if state.exists(&self.key) {
            "list"
        } else {
            "none"
        };

        Ok(Frame::Simple(type_.to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Type {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
