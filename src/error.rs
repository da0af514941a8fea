use crate::codes::StandardResponseCode;
use std::io;
use thiserror::Error;

/// Top-level error split by recovery policy: protocol errors abort the
/// transaction but leave the session open, transport errors mark the
/// session suspect, validation errors never reach the wire.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or unexpected bytes from the device.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The responder returned a non-OK response code.
    #[error("device responded {} (0x{code:04x})", StandardResponseCode::name(*.code).unwrap_or("Unknown"))]
    Device { code: u16, params: Vec<u32> },

    /// The USB layer failed underneath the protocol.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The caller supplied something the registry rejects.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Caller-initiated cancel; `Cancel_Request` was issued.
    #[error("transaction cancelled by caller")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid container type 0x{0:04x}")]
    UnknownContainerKind(u16),

    #[error("container length {0} below the 12 byte header")]
    FrameTooShort(u32),

    #[error("container declared {declared} bytes, transfer carried {received}")]
    LengthMismatch { declared: u32, received: usize },

    #[error("needed {wanted} more bytes, got {got}")]
    ShortRead { wanted: usize, got: usize },

    #[error("expected container for transaction {expected}, got {got}")]
    TransactionMismatch { expected: u32, got: u32 },

    #[error("unexpected {got} container during {phase} phase")]
    UnexpectedContainer { got: &'static str, phase: &'static str },

    #[error("string missing trailing NUL code unit")]
    MalformedString,

    #[error("invalid UTF-16 in string")]
    InvalidUtf16,

    #[error("array of {count} elements does not fit in {remaining} bytes")]
    MalformedArray { count: u32, remaining: usize },

    #[error("dataset field `{0}` malformed")]
    MalformedDataset(&'static str),

    #[error("{0} trailing bytes after decode")]
    TrailingBytes(usize),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("endpoint stalled")]
    Stall,

    #[error("stall recovery failed: device status 0x{status:04x} after {polls} polls")]
    StallRecoveryFailed { status: u16, polls: u32 },

    #[error("transfer timed out")]
    Timeout,

    #[error("transfer cancelled")]
    Cancelled,

    #[error("device disconnected")]
    Disconnected,

    #[error("session failed; disconnect and reconnect")]
    SessionFailed,

    #[error("usb: {0}")]
    Usb(String),

    #[error("io: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    #[error("unknown property `{0}`")]
    UnknownProperty(String),

    #[error("unknown event `{0}`")]
    UnknownEvent(String),

    #[error("codec handle `{0}` not registered")]
    UnknownCodec(String),

    #[error("`{name}` is not a member of enum codec `{codec}`")]
    UnknownEnumName { codec: &'static str, name: String },

    #[error("operation takes at most {max} parameters, got {got}")]
    TooManyParameters { max: usize, got: usize },

    #[error("required parameter `{0}` missing")]
    MissingParameter(&'static str),

    #[error("operation `{0}` carries no data phase")]
    UnexpectedDataPhase(&'static str),

    #[error("operation `{0}` requires a data phase")]
    MissingDataPhase(&'static str),

    #[error("property `{0}` is read-only")]
    NotWritable(&'static str),

    #[error("codec `{codec}` cannot encode {got}")]
    TypeMismatch { codec: &'static str, got: &'static str },

    #[error("dataset field `{0}` missing from record")]
    MissingField(&'static str),

    #[error("offset {0} exceeds the 32-bit parameter range")]
    OffsetOutOfRange(u64),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        match e.kind() {
            // Cursor reads past the end of a payload surface here.
            io::ErrorKind::UnexpectedEof => {
                Error::Protocol(ProtocolError::ShortRead { wanted: 1, got: 0 })
            }
            _ => Error::Transport(TransportError::Io(e)),
        }
    }
}

impl Error {
    /// Non-OK response code as a `Device` error.
    pub fn device(code: u16, params: Vec<u32>) -> Error {
        Error::Device { code, params }
    }
}
