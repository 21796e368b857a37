use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::ziplist::{Entry, ZipListError};
use crate::Error;

/// Returns the index of matching elements inside a list. By default, when no options are given,
/// it scans the list from head to tail, looking for the first match of `element`.
///
/// - `RANK` selects which match to return, negative ranks scanning from the tail.
/// - `COUNT` returns up to that many matches as an array, `0` meaning all of them.
/// - `MAXLEN` compares at most that many elements, `0` meaning no limit.
///
/// Ref: <https://redis.io/docs/latest/commands/lpos>
#[derive(Debug, PartialEq)]
pub struct Lpos {
    pub key: String,
    pub element: Bytes,
    pub rank: i64,
    pub count: Option<usize>,
    pub maxlen: usize,
}

impl Executable for Lpos {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let state = store.lock();

        let wanted = match self.count {
            Some(0) => usize::MAX,
            Some(count) => count,
            None => 1,
        };
        let limit = match self.maxlen {
            0 => usize::MAX,
            maxlen => maxlen,
        };
        let skip = self.rank.unsigned_abs().saturating_sub(1) as usize;

        let positions = match state.get(&self.key) {
            None => vec![],
            Some(list) if self.rank > 0 => {
                scan(list.iter(), &self.element, skip, wanted, limit)?
            }
            Some(list) => {
                let last = list.len()?.saturating_sub(1);
                scan(list.iter_rev(), &self.element, skip, wanted, limit)?
                    .into_iter()
                    .map(|position| last - position)
                    .collect()
            }
        };

        let res = match self.count {
            Some(_) => Frame::Array(
                positions
                    .into_iter()
                    .map(|position| Frame::Integer(position as i64))
                    .collect(),
            ),
            None => positions
                .first()
                .map_or(Frame::Null, |&position| Frame::Integer(position as i64)),
        };

        Ok(res)
    }
}

/// Positions, in iteration order, of the matches after the first `skip` ones.
fn scan<'a>(
    entries: impl Iterator<Item = Result<Entry<'a>, ZipListError>>,
    element: &[u8],
    mut skip: usize,
    wanted: usize,
    limit: usize,
) -> Result<Vec<usize>, ZipListError> {
    let mut positions = vec![];

    for (position, entry) in entries.take(limit).enumerate() {
        if !entry?.value.matches(element) {
            continue;
        }
        if skip > 0 {
            skip -= 1;
            continue;
        }
        positions.push(position);
        if positions.len() == wanted {
            break;
        }
    }

    Ok(positions)
}

impl TryFrom<&mut CommandParser> for Lpos {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let element = parser.next_bytes()?;

        let mut lpos = Self {
            key,
            element,
            rank: 1,
            count: None,
            maxlen: 0,
        };

        loop {
            let option = match parser.next_string() {
                Ok(option) => option.to_uppercase(),
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            };

            let value = parser.next_integer()?;
            let invalid = || CommandParserError::InvalidCommandArgument {
                command: "LPOS".to_string(),
                argument: format!("{} {}", option, value),
            };

            match option.as_str() {
                "RANK" if value != 0 => lpos.rank = value,
                "COUNT" if value >= 0 => lpos.count = Some(value as usize),
                "MAXLEN" if value >= 0 => lpos.maxlen = value as usize,
                _ => return Err(invalid().into()),
            }
        }

        Ok(lpos)
    }
}
