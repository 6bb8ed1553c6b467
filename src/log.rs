//! Owning wrapper around a stroke log's raw bytes: validated header plus a
//! randomly seekable command stream.

use crate::command::{Command, decode_word};
use crate::core::CommandIndex;
use crate::error::{ReplaintError, ReplaintResult};
use crate::header::{HEADER_LEN, Header};

/// Byte stride of one command record in the stream.
pub const COMMAND_STRIDE: usize = 4;

/// A decoded stroke log: header plus random access into the command stream.
///
/// Commands are fixed-size records, so command `n` lives at byte offset
/// `HEADER_LEN + 4 * n` and the stream is seekable without parsing
/// predecessors.
#[derive(Clone, Debug)]
pub struct StrokeLog {
    header: Header,
    bytes: Vec<u8>,
}

impl StrokeLog {
    /// Decode a stroke log from its raw bytes.
    ///
    /// Fails with [`ReplaintError::Truncated`] when the buffer is shorter
    /// than the header, or shorter than the command stream the header
    /// declares. How the bytes got here (file, network, memory) is the
    /// caller's business.
    pub fn decode(bytes: Vec<u8>) -> ReplaintResult<Self> {
        let header = Header::parse(&bytes)?;
        let needed = HEADER_LEN + header.num_commands as usize * COMMAND_STRIDE;
        if bytes.len() < needed {
            return Err(ReplaintError::truncated(format!(
                "command stream needs {needed} bytes for {} commands, got {}",
                header.num_commands,
                bytes.len()
            )));
        }
        Ok(Self { header, bytes })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn num_commands(&self) -> u32 {
        self.header.num_commands
    }

    /// Decode the command at `index`, or `None` past the end of the stream.
    pub fn command(&self, index: CommandIndex) -> Option<Command> {
        if index.0 >= self.header.num_commands {
            return None;
        }
        let offset = HEADER_LEN + index.0 as usize * COMMAND_STRIDE;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[offset..offset + COMMAND_STRIDE]);
        Some(decode_word(i32::from_le_bytes(raw)))
    }

    /// Iterate all commands in stream order.
    pub fn commands(&self) -> impl Iterator<Item = Command> + '_ {
        (0..self.header.num_commands).filter_map(|i| self.command(CommandIndex(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_bytes(words: &[i32]) -> Vec<u8> {
        let mut b = vec![0u8; HEADER_LEN];
        b[0x20..0x24].copy_from_slice(&1.0f32.to_le_bytes());
        b[0x3C..0x40].copy_from_slice(&(words.len() as i32).to_le_bytes());
        for w in words {
            b.extend_from_slice(&w.to_le_bytes());
        }
        b
    }

    #[test]
    fn command_past_end_is_none_not_error() {
        let log = StrokeLog::decode(log_bytes(&[1])).unwrap();
        assert!(log.command(CommandIndex(0)).is_some());
        assert!(log.command(CommandIndex(1)).is_none());
        assert!(log.command(CommandIndex(u32::MAX)).is_none());
    }

    #[test]
    fn short_command_stream_is_truncated_error() {
        let mut bytes = log_bytes(&[1, 1, 1]);
        bytes.truncate(HEADER_LEN + 2 * COMMAND_STRIDE);
        let err = StrokeLog::decode(bytes).unwrap_err();
        assert!(matches!(err, ReplaintError::Truncated(_)));
    }

    #[test]
    fn trailing_bytes_beyond_stream_are_tolerated() {
        let mut bytes = log_bytes(&[1]);
        bytes.extend_from_slice(&[0xAB; 16]);
        assert!(StrokeLog::decode(bytes).is_ok());
    }

    #[test]
    fn iterator_visits_every_command() {
        let log = StrokeLog::decode(log_bytes(&[0, 1, 2, 3])).unwrap();
        assert_eq!(log.commands().count(), 4);
    }
}
