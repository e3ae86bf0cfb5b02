//! A library for reading and writing classic TAR archives.
//!
//! This crate is a from-scratch codec for the three historical tar
//! header layouts: pre-POSIX v7, POSIX.1-1988 ustar and the old GNU
//! layout. The reader consumes any sequential byte stream in 512 byte
//! blocks, validating every header against both the signed and the
//! unsigned checksum convention (real producers disagree on which one
//! applies), and yields fully decoded members. The writer emits the
//! portable v7 subset.
//!
//! Anything the codec cannot represent faithfully fails loudly rather
//! than mis-parsing: pax extended headers, GNU long-name members and
//! sparse files are all hard errors. Tolerable oddities (unknown
//! typeflags, ownership drift between members, multi-volume
//! continuation offsets, a lone terminator block mid-stream) are
//! reported through an injected [`WarningSink`] and reading continues.
//!
//! Reading:
//!
//! ```no_run
//! use std::fs::File;
//! use tarlite::Archive;
//!
//! let mut ar = Archive::new(File::open("foo.tar").unwrap());
//! for entry in ar.entries().unwrap() {
//!     let entry = entry.unwrap();
//!     println!("{:?}: {} bytes", entry.path().unwrap(), entry.size());
//! }
//! ```
//!
//! Writing:
//!
//! ```
//! use tarlite::Builder;
//!
//! let mut ar = Builder::new(Vec::new());
//! ar.append_data("hello.txt", 0o644, 0, b"hello\n").unwrap();
//! let bytes = ar.into_inner().unwrap();
//! assert_eq!(bytes.len() % 512, 0);
//! ```

#![deny(missing_docs)]

mod archive;
mod builder;
pub mod checksum;
mod entry;
mod entry_type;
mod error;
mod field;
mod header;
mod warn;

pub use crate::archive::{Archive, Entries};
pub use crate::builder::Builder;
pub use crate::checksum::BlockCheck;
pub use crate::entry::Entry;
pub use crate::entry_type::EntryType;
pub use crate::error::{Result, TarError};
pub use crate::field::BLOCK_SIZE;
pub use crate::header::{Header, HeaderFormat};
pub use crate::warn::{LogSink, WarningSink};
