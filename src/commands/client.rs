use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Client connection housekeeping, e.g. the `CLIENT SETINFO` clients send right after connecting.
/// Accepted and acknowledged without effect.
///
/// Ref: <https://redis.io/docs/latest/commands/client-setinfo>
#[derive(Debug, PartialEq)]
pub struct Client {
    pub sub_command: String,
}

impl Executable for Client {
    fn exec(self, _store: Store) -> Result<Frame, Error> {
        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Client {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let sub_command = parser.next_string()?.to_lowercase();

        // Arguments depend on the sub command and are not used.
        loop {
            match parser.next_bytes() {
                Ok(_) => continue,
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(Self { sub_command })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::commands::Command;

    use super::*;

    #[test]
    fn setinfo() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("CLIENT")),
            Frame::Bulk(Bytes::from("SETINFO")),
            Frame::Bulk(Bytes::from("LIB-NAME")),
            Frame::Bulk(Bytes::from("redis-rs")),
        ]);
        let cmd = Command::try_from(frame).unwrap();
        assert_eq!(
            cmd,
            Command::Client(Client {
                sub_command: "setinfo".to_string()
            })
        );

        assert_eq!(
            cmd.exec(Store::new()).unwrap(),
            Frame::Simple("OK".to_string())
        );
    }
}
