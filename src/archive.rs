//! Reading archives from a byte stream.

use std::cmp;
use std::io::{self, Read};

use crate::entry::Entry;
use crate::error::{Result, TarError};
use crate::field::BLOCK_SIZE;
use crate::header::Header;
use crate::warn::{LogSink, WarningSink};

/// A tar archive read from a sequential byte stream.
///
/// The reader owns the stream cursor for the duration of one pass: it
/// pulls 512 byte blocks, decodes and checksum-validates each header,
/// reads the declared content length and discards the padding that
/// block-aligns it, and stops after two consecutive terminator blocks.
/// No seeking is required.
///
/// Recoverable oddities are reported to the warning sink (the [`log`]
/// crate by default); see [`WarningSink`].
pub struct Archive<R, S = LogSink> {
    obj: R,
    pos: u64,
    warnings: S,
}

impl<R: Read> Archive<R> {
    /// Creates a new archive reader over `obj`, logging warnings via
    /// [`log::warn!`].
    pub fn new(obj: R) -> Archive<R> {
        Archive::with_warning_sink(obj, LogSink)
    }
}

impl<R: Read, S: WarningSink> Archive<R, S> {
    /// Creates a new archive reader that reports warnings to `sink`.
    ///
    /// `&mut Vec<String>` implements [`WarningSink`], which is handy
    /// for capturing diagnostics in tests.
    pub fn with_warning_sink(obj: R, sink: S) -> Archive<R, S> {
        Archive {
            obj,
            pos: 0,
            warnings: sink,
        }
    }

    /// Unwraps this reader, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.obj
    }

    /// Constructs an iterator over the members of this archive.
    ///
    /// Each item is a fully decoded [`Entry`]; the iterator fuses on
    /// the first fatal error.
    pub fn entries(&mut self) -> Result<Entries<'_, R, S>> {
        if self.pos != 0 {
            return Err(TarError::Io(io::Error::new(
                io::ErrorKind::Other,
                "cannot call entries unless archive is at position 0",
            )));
        }
        Ok(Entries {
            archive: self,
            terminators: 0,
            lone_terminator: 0,
            owner: None,
            done: false,
        })
    }

    /// Reads exactly one block, failing on a truncated stream.
    fn read_block(&mut self) -> Result<[u8; BLOCK_SIZE]> {
        let mut block = [0u8; BLOCK_SIZE];
        let mut read = 0;
        while read < BLOCK_SIZE {
            match self.obj.read(&mut block[read..]) {
                Ok(0) => {
                    return Err(TarError::MalformedBlock {
                        offset: self.pos,
                        actual: read,
                    })
                }
                Ok(n) => read += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.pos += BLOCK_SIZE as u64;
        Ok(block)
    }

    fn warn(&mut self, message: String) {
        self.warnings.warn(&message);
    }
}

/// An iterator over the members of an archive.
///
/// Members must be consumed in order; the underlying stream is shared
/// and sequential. Per-pass state (the terminator counter and the
/// first-seen ownership used for drift warnings) lives here and is
/// discarded when the iterator is dropped.
pub struct Entries<'a, R, S = LogSink> {
    archive: &'a mut Archive<R, S>,
    terminators: u8,
    lone_terminator: u64,
    owner: Option<(u64, u64)>,
    done: bool,
}

impl<R: Read, S: WarningSink> Entries<'_, R, S> {
    fn next_entry(&mut self) -> Result<Option<Entry>> {
        loop {
            let offset = self.archive.pos;
            let block = self.archive.read_block()?;

            let header = match Header::decode(&block, offset)? {
                Some(header) => header,
                None => {
                    self.terminators += 1;
                    if self.terminators == 2 {
                        return Ok(None);
                    }
                    self.lone_terminator = offset;
                    continue;
                }
            };

            // A terminator followed by more data is an anomaly worth
            // flagging, but plenty of concatenated archives exist in
            // the wild, so keep reading.
            if self.terminators == 1 {
                self.terminators = 0;
                self.archive.warn(format!(
                    "lone terminator block at offset {} followed by more data; continuing",
                    self.lone_terminator
                ));
            }

            let path = String::from_utf8_lossy(&header.path_bytes()).into_owned();

            match self.owner {
                None => self.owner = Some((header.uid(), header.gid())),
                Some((uid, gid)) if (uid, gid) != (header.uid(), header.gid()) => {
                    self.archive.warn(format!(
                        "`{}` is owned by {}:{}, but this archive started with {}:{}",
                        path,
                        header.uid(),
                        header.gid(),
                        uid,
                        gid
                    ));
                }
                Some(_) => {}
            }

            if !header.entry_type().is_known() {
                self.archive.warn(format!(
                    "unknown typeflag {:?} for `{}`; reading it as a regular file",
                    header.entry_type().as_byte() as char,
                    path
                ));
            }

            if let Some(volume_offset) = header.volume_offset() {
                if volume_offset > 0 {
                    self.archive.warn(format!(
                        "`{}` is a multi-volume continuation (offset {}); \
                         reading it as a complete member",
                        path, volume_offset
                    ));
                }
            }

            // Content is read exactly; the zero padding up to the next
            // block boundary is pulled off the stream and dropped.
            // Directory headers already decoded with size 0.
            let size = header.size();
            let mut data = Vec::with_capacity(cmp::min(size, 128 * 1024) as usize);
            let mut remaining = size;
            while remaining > 0 {
                let block = self.archive.read_block()?;
                let take = cmp::min(BLOCK_SIZE as u64, remaining) as usize;
                data.extend_from_slice(&block[..take]);
                remaining -= take as u64;
            }

            return Ok(Some(Entry::new(header, data)));
        }
    }
}

impl<R: Read, S: WarningSink> Iterator for Entries<'_, R, S> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Result<Entry>> {
        if self.done {
            return None;
        }
        match self.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
