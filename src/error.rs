//! Error type for archive operations.
//!
//! Every variant here is fatal for the archive being read or written;
//! recoverable oddities (ownership drift, unknown typeflags, ignored
//! multi-volume offsets) go to the [`WarningSink`](crate::WarningSink)
//! instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::field::BLOCK_SIZE;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TarError>;

/// A fatal archive error.
///
/// Offsets are byte positions of the start of the offending header
/// block within the archive stream.
#[derive(Debug, Error)]
pub enum TarError {
    /// The stream ended mid-block; tar data is always a whole number of
    /// 512 byte blocks.
    #[error("truncated archive: wanted a 512 byte block at offset {offset}, got {actual} bytes")]
    MalformedBlock {
        /// Position of the short block.
        offset: u64,
        /// How many bytes were actually available.
        actual: usize,
    },

    /// A header block failed both the signed and the unsigned checksum.
    #[error(
        "header checksum mismatch at offset {offset}: recorded {recorded}, \
         computed {unsigned} unsigned / {signed} signed"
    )]
    ChecksumMismatch {
        /// Position of the corrupt header.
        offset: u64,
        /// The checksum decoded from the block.
        recorded: u64,
        /// Recomputed unsigned sum.
        unsigned: u32,
        /// Recomputed signed sum.
        signed: i64,
        /// The raw block, kept for diagnostics.
        block: Box<[u8; BLOCK_SIZE]>,
    },

    /// The archive uses a header layout or member kind this crate does
    /// not support: pax extended headers, GNU long name/link members,
    /// or sparse files.
    #[error("unsupported archive format at offset {offset}: {reason}")]
    UnsupportedFormat {
        /// Position of the offending header.
        offset: u64,
        /// What was found.
        reason: String,
    },

    /// A checksummed-valid header carried a numeric field that is not
    /// octal.
    #[error("invalid {field} field in header at offset {offset}")]
    InvalidField {
        /// Position of the header.
        offset: u64,
        /// Name of the field that failed to decode.
        field: &'static str,
    },

    /// The caller asked the writer to archive an absolute or
    /// drive-rooted path.
    #[error("invalid archive path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected path.
        path: PathBuf,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A value does not fit in its fixed-width octal header field.
    #[error("value {value} does not fit in the {field} header field")]
    FieldOverflow {
        /// Name of the field.
        field: &'static str,
        /// The oversized value.
        value: u64,
    },

    /// An underlying I/O error.
    #[error(transparent)]
    Io(#[from] io::Error),
}
