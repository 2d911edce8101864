//! Error types for stripe setup and checked operations

/// Error type for the checked (setup-time) API
///
/// The encode/decode hot paths never produce these; they are reported by
/// `StripeLayout`, `LossPattern` and `Decoder::new` before any block is
/// touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaidError {
    /// Invalid stripe geometry (data/parity block counts)
    InvalidParameters(String),
    /// Lost-block indices are unsorted, duplicated, out of range or empty
    InvalidLossPattern(String),
    /// More blocks lost than the parity can recover
    TooManyErasures { max: usize, actual: usize },
    /// Wrong number of blocks handed to an operation
    BlockCountMismatch { expected: usize, actual: usize },
    /// Block length is zero or not a multiple of the accumulator unit
    InvalidBlockSize { expected: usize, actual: usize },
    /// Blocks in one call differ in length
    InconsistentBlockSizes {
        first_size: usize,
        mismatched_idx: usize,
        mismatched_size: usize,
    },
    /// Caller-supplied decoder buffer is smaller than required
    BufferTooSmall { buffer: &'static str, needed: usize, actual: usize },
}

impl std::fmt::Display for RaidError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RaidError::InvalidParameters(msg) => write!(f, "Invalid parameters: {}", msg),
            RaidError::InvalidLossPattern(msg) => write!(f, "Invalid loss pattern: {}", msg),
            RaidError::TooManyErasures { max, actual } => {
                write!(f, "Too many erasures: max {} recoverable, got {}", max, actual)
            }
            RaidError::BlockCountMismatch { expected, actual } => {
                write!(f, "Expected {} blocks, got {}", expected, actual)
            }
            RaidError::InvalidBlockSize { expected, actual } => {
                write!(f, "Invalid block size: expected a multiple of {}, got {}", expected, actual)
            }
            RaidError::InconsistentBlockSizes {
                first_size,
                mismatched_idx,
                mismatched_size,
            } => write!(
                f,
                "Inconsistent block sizes: first block has {} bytes, block {} has {} bytes",
                first_size, mismatched_idx, mismatched_size
            ),
            RaidError::BufferTooSmall { buffer, needed, actual } => {
                write!(f, "{} buffer too small: need {} bytes, got {}", buffer, needed, actual)
            }
        }
    }
}

impl std::error::Error for RaidError {}
