use thiserror::Error;

use crate::pdu::{Command, Status};

/// Errors surfaced by the codec, the handshake and session calls.
///
/// Framing and transport errors are fatal to the session that produced them.
/// `RequestTimeout` and `ClosedSession` are per-call outcomes; the session
/// itself may or may not survive, depending on what caused them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid command_length {0} (smaller than the 16-byte header)")]
    InvalidHeader(u32),

    #[error("command_length {0} exceeds the maximum frame size")]
    FrameTooLarge(u32),

    #[error("malformed PDU body: {0}")]
    MalformedBody(&'static str),

    #[error("unknown command id {0:#010x}")]
    UnknownCommand(u32),

    #[error("unsupported interface version {0:#04x}")]
    UnsupportedVersion(u8),

    #[error("unexpected {0} during handshake")]
    UnexpectedCommand(Command),

    #[error("sequence mismatch in handshake: sent {sent}, answered {answered}")]
    SequenceMismatch { sent: u32, answered: u32 },

    #[error("bind rejected by peer: {0}")]
    BindRejected(Status),

    #[error("request timed out")]
    RequestTimeout,

    #[error("session is closed")]
    ClosedSession,

    #[error("connection closed by peer")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
