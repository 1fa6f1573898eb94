use std::io;

/// Errors surfaced by the index build, codec, and persistence paths.
///
/// Ranking has no error of its own: a query term absent from the dictionary
/// contributes a zero score and is skipped.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A non-positive gap reached the gamma/delta encoder. DocIds within a
    /// posting list are strictly increasing, so this means the ordering
    /// invariant was violated upstream of the codec.
    #[error("cannot gap-encode a non-positive integer")]
    NonPositiveGap,

    /// A term exceeds the one-byte length prefix used by dictionary blocks.
    #[error("term too long for block coding: {0}")]
    TermTooLong(String),

    #[error("corrupt index data: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;
