//! Writing archives to a byte stream.

use std::cmp;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use filetime::FileTime;

use crate::error::{Result, TarError};
use crate::field::BLOCK_SIZE;
use crate::header::Header;

/// A structure for building archives.
///
/// Members are written in the order they are appended: header block,
/// content, zero padding to the next block boundary. [`finish`] (called
/// automatically on drop) terminates the archive with 1024 zero bytes.
///
/// The writer emits the portable v7 header subset only, so member
/// names are limited to 100 bytes; archives it produces are readable
/// by every tar implementation.
///
/// [`finish`]: Builder::finish
pub struct Builder<W: Write> {
    obj: Option<W>,
    finished: bool,
}

impl<W: Write> Builder<W> {
    /// Creates a new archive builder with the underlying object as the
    /// destination of all data written.
    pub fn new(obj: W) -> Builder<W> {
        Builder {
            obj: Some(obj),
            finished: false,
        }
    }

    fn inner(&mut self) -> &mut W {
        self.obj.as_mut().unwrap()
    }

    /// Appends a member described by `header` with the given content.
    ///
    /// The header's declared size must equal `data.len()`; producing an
    /// archive whose headers lie about content lengths would corrupt
    /// every member that follows.
    pub fn append(&mut self, header: &Header, data: &[u8]) -> Result<()> {
        if header.size() != data.len() as u64 {
            return Err(TarError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "header size does not match content length",
            )));
        }
        let block = header.encode()?;
        let dst = self.inner();
        dst.write_all(&block)?;
        dst.write_all(data)?;

        let remainder = data.len() % BLOCK_SIZE;
        if remainder != 0 {
            dst.write_all(&[0u8; BLOCK_SIZE][remainder..])?;
        }
        Ok(())
    }

    /// Appends a regular file member with the given content, owned by
    /// uid/gid 0.
    pub fn append_data<P: AsRef<Path>>(
        &mut self,
        path: P,
        mode: u32,
        mtime: u64,
        data: &[u8],
    ) -> Result<()> {
        let header = Header::new_file(path.as_ref(), data.len() as u64, mode, 0, 0, mtime)?;
        self.append(&header, data)
    }

    /// Appends a file from the local filesystem under the name `path`,
    /// taking mode, ownership and mtime from its metadata.
    pub fn append_file<P: AsRef<Path>>(&mut self, path: P, file: &mut fs::File) -> Result<()> {
        let meta = file.metadata()?;
        let mut data = Vec::with_capacity(cmp::min(meta.len(), 128 * 1024) as usize);
        file.read_to_end(&mut data)?;
        let header = header_from_metadata(path.as_ref(), &meta, data.len() as u64)?;
        self.append(&header, &data)
    }

    /// Appends the file or directory at `src_path` under the name
    /// `path`.
    pub fn append_path_with_name<P, Q>(&mut self, src_path: P, path: Q) -> Result<()>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let src_path = src_path.as_ref();
        let meta = fs::metadata(src_path)?;
        if meta.is_dir() {
            let header = header_from_metadata(path.as_ref(), &meta, 0)?;
            self.append(&header, &[])
        } else {
            self.append_file(path.as_ref(), &mut fs::File::open(src_path)?)
        }
    }

    /// Appends the file or directory at `path` under its own name.
    pub fn append_path<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.append_path_with_name(path.as_ref(), path.as_ref())
    }

    /// Finish writing this archive, emitting the two terminator blocks.
    ///
    /// Idempotent; also invoked on drop. In most situations
    /// [`into_inner`](Builder::into_inner) should be preferred so that
    /// write errors surface.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.inner().write_all(&[0u8; BLOCK_SIZE * 2])?;
        self.inner().flush()?;
        Ok(())
    }

    /// Finishes the archive if necessary and returns the underlying
    /// writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.finish()?;
        Ok(self.obj.take().unwrap())
    }
}

impl<W: Write> Drop for Builder<W> {
    fn drop(&mut self) {
        if self.obj.is_some() {
            let _ = self.finish();
        }
    }
}

fn header_from_metadata(path: &Path, meta: &fs::Metadata, len: u64) -> Result<Header> {
    let mtime = cmp::max(FileTime::from_last_modification_time(meta).unix_seconds(), 0) as u64;
    let (mode, uid, gid) = owner_fields(meta);
    if meta.is_dir() {
        Header::new_directory(path, mode, uid, gid, mtime)
    } else if is_regular(meta) {
        Header::new_file(path, len, mode, uid, gid, mtime)
    } else {
        Err(TarError::InvalidPath {
            path: path.to_path_buf(),
            reason: "only regular files and directories can be archived",
        })
    }
}

#[cfg(unix)]
fn owner_fields(meta: &fs::Metadata) -> (u32, u64, u64) {
    use std::os::unix::fs::MetadataExt;
    ((meta.mode() & 0o7777) as u32, meta.uid() as u64, meta.gid() as u64)
}

#[cfg(not(unix))]
fn owner_fields(meta: &fs::Metadata) -> (u32, u64, u64) {
    // There is no concept of a mode off Unix, so approximate.
    let mode = if meta.is_dir() { 0o755 } else { 0o644 };
    (mode, 0, 0)
}

#[cfg(unix)]
fn is_regular(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    meta.mode() & (libc::S_IFMT as u32) == libc::S_IFREG as u32
}

#[cfg(not(unix))]
fn is_regular(meta: &fs::Metadata) -> bool {
    meta.file_type().is_file()
}
