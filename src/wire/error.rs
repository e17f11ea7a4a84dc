use thiserror::Error;

/// Failure to parse a frame/message from raw bytes. Callers treat this the
/// same as any other malformed input: drop it silently (see the crate's
/// error-handling design notes); this type exists so the drop happens
/// through `?`/`match` instead of swallowing the reason into an `Option`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("buffer too short: need at least {need} bytes, got {got}")]
    TooShort { need: usize, got: usize },
    #[error("unsupported ethertype {0:#06x}")]
    UnsupportedEtherType(u16),
    #[error("unsupported ARP hardware/protocol type")]
    UnsupportedArpFamily,
}
