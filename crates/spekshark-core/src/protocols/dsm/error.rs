use thiserror::Error;

/// Errors returned by DSM packet reading and decoding.
///
/// Decoding itself never fails on byte values; the only failure mode is a
/// caller handing over something other than a complete 16-frame packet.
#[derive(Debug, Error)]
pub enum DsmError {
    #[error("packet must hold exactly {expected} frames, got {actual}")]
    WrongFrameCount { expected: usize, actual: usize },
    #[error("frame index {index} out of range ({len} frames)")]
    FrameOutOfRange { index: usize, len: usize },
}
