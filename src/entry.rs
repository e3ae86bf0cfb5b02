//! A decoded member of an archive.

use std::borrow::Cow;
use std::path::Path;

use crate::error::Result;
use crate::header::Header;

/// One member of an archive: its decoded header and its content.
///
/// The content holds exactly `header.size()` bytes; the zero padding
/// that block-aligns the member on disk is discarded by the reader and
/// never appears here.
#[derive(Clone, Debug)]
pub struct Entry {
    header: Header,
    data: Vec<u8>,
}

impl Entry {
    pub(crate) fn new(header: Header, data: Vec<u8>) -> Entry {
        debug_assert_eq!(header.size() as usize, data.len());
        Entry { header, data }
    }

    /// The decoded header of this member.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The member path as raw bytes; see [`Header::path_bytes`].
    pub fn path_bytes(&self) -> Cow<[u8]> {
        self.header.path_bytes()
    }

    /// The member path, if representable on this platform.
    pub fn path(&self) -> Result<Cow<Path>> {
        self.header.path()
    }

    /// Content length in bytes.
    pub fn size(&self) -> u64 {
        self.header.size()
    }

    /// The member content.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the entry, returning its content.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
