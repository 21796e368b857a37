use crate::commands::executable::Executable;
use crate::commands::lpop::{pop, End};
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes and returns the last element of the list stored at `key`.
///
/// Ref: <https://redis.io/docs/latest/commands/rpop>
#[derive(Debug, PartialEq)]
pub struct Rpop {
    pub key: String,
}

impl Executable for Rpop {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        pop(store, &self.key, End::Tail)
    }
}

impl TryFrom<&mut CommandParser> for Rpop {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish("RPOP")?;
        Ok(Self { key })
    }
}
