use std::io;

use thiserror::Error;

use crate::net::OutOfBounds;

/// Failure to decode one record or packet. The caller skips the rest of the
/// enclosing byte range and carries on.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBounds),
    #[error("entity {id} declared with unknown type {type_id:#x}")]
    UnknownEntityType { id: u16, type_id: u16 },
    #[error("update for unknown entity {0}")]
    UnknownEntity(u16),
    #[error("update for entity id 0")]
    ZeroEntityId,
    #[error("decompression failed: {0}")]
    Decompress(#[source] io::Error),
    #[error("terminator for unknown fragment stream")]
    MissingTerminator,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("not connected")]
    NotConnected,
    #[error("unknown server command {0:#04x}")]
    UnknownCommand(u8),
    #[error("unknown gamedata id {0:#04x}")]
    UnknownGamedata(u8),
}

impl From<OutOfBounds> for SessionError {
    fn from(err: OutOfBounds) -> Self {
        Self::Decode(DecodeError::OutOfBounds(err))
    }
}
