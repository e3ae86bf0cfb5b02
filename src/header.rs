//! Decoding and encoding of 512 byte header blocks.

use std::borrow::Cow;
use std::path::Path;

use crate::checksum::{self, BlockCheck};
use crate::entry_type::EntryType;
use crate::error::{Result, TarError};
use crate::field::{self, BLOCK_SIZE};

/// Which of the three historical header layouts a block uses.
///
/// Later formats (pax, GNU extended, star) are deliberately absent:
/// headers carrying them are rejected at decode time rather than
/// mis-parsed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HeaderFormat {
    /// Pre-POSIX layout; nothing past the linkname field is meaningful.
    V7,
    /// POSIX.1-1988 ustar, with owner names, device numbers and the
    /// path prefix field.
    Ustar,
    /// The layout written by old GNU tar, overlaying the prefix field
    /// with timestamps and sparse-file bookkeeping.
    OldGnu,
}

/// A decoded header block.
///
/// Immutable once decoded; one `Header` describes exactly one member of
/// an archive. The fields present depend on [`HeaderFormat`]: accessors
/// for ustar/old-GNU extension fields return `None` on v7 headers.
#[derive(Clone, Debug)]
pub struct Header {
    name: Vec<u8>,
    mode: u32,
    uid: u64,
    gid: u64,
    size: u64,
    mtime: u64,
    entry_type: EntryType,
    linkname: Vec<u8>,
    format: HeaderFormat,
    uname: Option<Vec<u8>>,
    gname: Option<Vec<u8>>,
    devmajor: Option<u64>,
    devminor: Option<u64>,
    prefix: Vec<u8>,
    atime: Option<u64>,
    ctime: Option<u64>,
    volume_offset: Option<u64>,
}

impl Header {
    /// Decodes one block at byte position `offset` of the archive.
    ///
    /// Returns `Ok(None)` for a terminator block (512 zero bytes).
    /// Fails with [`TarError::UnsupportedFormat`] on sparse members,
    /// pax extended headers and GNU long-name members, and with
    /// [`TarError::ChecksumMismatch`] when neither the signed nor the
    /// unsigned checksum matches.
    pub fn decode(block: &[u8], offset: u64) -> Result<Option<Header>> {
        let block: &[u8; BLOCK_SIZE] =
            block
                .try_into()
                .map_err(|_| TarError::MalformedBlock {
                    offset,
                    actual: block.len(),
                })?;

        let format = detect_format(block);
        let entry_type = EntryType::new(block[field::TYPEFLAG]);

        if format == HeaderFormat::OldGnu && is_sparse_header(block) {
            return Err(TarError::UnsupportedFormat {
                offset,
                reason: "sparse file members cannot be reconstructed".to_string(),
            });
        }
        if entry_type.is_sparse() {
            return Err(TarError::UnsupportedFormat {
                offset,
                reason: format!("sparse member (typeflag {:?})", block[field::TYPEFLAG] as char),
            });
        }
        if entry_type.is_pax() {
            return Err(TarError::UnsupportedFormat {
                offset,
                reason: "pax extended headers are not supported".to_string(),
            });
        }
        if entry_type.is_gnu_longname() {
            return Err(TarError::UnsupportedFormat {
                offset,
                reason: "GNU long name/link members are not supported".to_string(),
            });
        }

        match checksum::classify(block) {
            BlockCheck::Zero => return Ok(None),
            BlockCheck::Valid => {}
            BlockCheck::Invalid {
                recorded,
                unsigned,
                signed,
            } => {
                return Err(TarError::ChecksumMismatch {
                    offset,
                    recorded,
                    unsigned,
                    signed,
                    block: Box::new(*block),
                })
            }
        }

        let numeric = |range, name| {
            field::octal_from(field::field(block, range, field::NUMERIC))
                .map_err(|()| TarError::InvalidField {
                    offset,
                    field: name,
                })
        };

        // Directories carry no content no matter what the size field
        // says, and some producers leave garbage there.
        let size = if entry_type.is_dir() {
            0
        } else {
            numeric(field::SIZE, "size")?
        };

        let text = |range| field::field(block, range, field::TEXT).to_vec();

        let mut header = Header {
            name: text(field::NAME),
            mode: numeric(field::MODE, "mode")? as u32,
            uid: numeric(field::UID, "uid")?,
            gid: numeric(field::GID, "gid")?,
            size,
            mtime: numeric(field::MTIME, "mtime")?,
            entry_type,
            linkname: text(field::LINKNAME),
            format,
            uname: None,
            gname: None,
            devmajor: None,
            devminor: None,
            prefix: Vec::new(),
            atime: None,
            ctime: None,
            volume_offset: None,
        };

        // Anything past byte 257 is semantically absent on v7 headers.
        if header.format == HeaderFormat::V7 {
            return Ok(Some(header));
        }

        header.uname = Some(text(field::UNAME));
        header.gname = Some(text(field::GNAME));
        header.devmajor = Some(numeric(field::DEVMAJOR, "devmajor")?);
        header.devminor = Some(numeric(field::DEVMINOR, "devminor")?);

        match header.format {
            HeaderFormat::Ustar => {
                header.prefix = text(field::PREFIX);
            }
            HeaderFormat::OldGnu => {
                // Informational timestamps; old GNU tar sometimes
                // leaves them blank or unparsable, which is tolerated.
                let lenient =
                    |range| field::octal_from(field::field(block, range, field::NUMERIC)).ok();
                header.atime = lenient(field::GNU_ATIME);
                header.ctime = lenient(field::GNU_CTIME);
                header.volume_offset = lenient(field::GNU_OFFSET);
            }
            HeaderFormat::V7 => unreachable!(),
        }

        Ok(Some(header))
    }

    /// Creates a v7 header for a regular file.
    ///
    /// `path` names the member inside the archive; absolute and
    /// drive-rooted paths are rejected, as are names that do not fit
    /// the 100 byte v7 name field.
    pub fn new_file(path: &Path, size: u64, mode: u32, uid: u64, gid: u64, mtime: u64) -> Result<Header> {
        Header::new(path, size, mode, uid, gid, mtime, EntryType::file())
    }

    /// Creates a v7 header for a directory. The size field is always
    /// encoded as zero.
    pub fn new_directory(path: &Path, mode: u32, uid: u64, gid: u64, mtime: u64) -> Result<Header> {
        Header::new(path, 0, mode, uid, gid, mtime, EntryType::dir())
    }

    fn new(
        path: &Path,
        size: u64,
        mode: u32,
        uid: u64,
        gid: u64,
        mtime: u64,
        entry_type: EntryType,
    ) -> Result<Header> {
        let name = relative_path_bytes(path)?;
        if name.len() > field::NAME.len() {
            return Err(TarError::InvalidPath {
                path: path.to_path_buf(),
                reason: "name does not fit in the 100 byte v7 name field",
            });
        }
        Ok(Header {
            name,
            mode: mode & 0o7777,
            uid,
            gid,
            size,
            mtime,
            entry_type,
            linkname: Vec::new(),
            format: HeaderFormat::V7,
            uname: None,
            gname: None,
            devmajor: None,
            devminor: None,
            prefix: Vec::new(),
            atime: None,
            ctime: None,
            volume_offset: None,
        })
    }

    /// Serializes this header into a checksummed 512 byte block.
    ///
    /// Only the v7 subset is written; see the crate documentation for
    /// the rationale. Absolute and drive-rooted member paths are
    /// rejected here as well as at construction, so a header decoded
    /// from one archive cannot smuggle one into another.
    pub fn encode(&self) -> Result<[u8; BLOCK_SIZE]> {
        let path = self.path_bytes();
        if is_rooted(&path) {
            return Err(TarError::InvalidPath {
                path: String::from_utf8_lossy(&path).into_owned().into(),
                reason: "absolute and drive-rooted paths cannot be archived",
            });
        }
        let mut block = [0u8; BLOCK_SIZE];
        block[field::NAME][..self.name.len()].copy_from_slice(&self.name);

        let mut put = |range: std::ops::Range<usize>, value: u64, name| {
            if value > field::octal_max(range.len()) {
                return Err(TarError::FieldOverflow { field: name, value });
            }
            field::octal_into(&mut block[range], value);
            Ok(())
        };
        put(field::MODE, self.mode as u64, "mode")?;
        put(field::UID, self.uid, "uid")?;
        put(field::GID, self.gid, "gid")?;
        put(field::SIZE, self.size, "size")?;
        put(field::MTIME, self.mtime, "mtime")?;

        block[field::TYPEFLAG] = self.entry_type.as_byte();

        // The sum is computed with the checksum field counted as
        // spaces, then recorded as six octal digits, NUL, space.
        let sum = checksum::compute(&block);
        let digits = format!("{:06o}\0 ", sum);
        block[field::CHKSUM].copy_from_slice(digits.as_bytes());
        Ok(block)
    }

    /// The member path as raw bytes.
    ///
    /// For ustar headers this joins the prefix and name fields with a
    /// `/`. Backslashes are normalized to forward slashes.
    pub fn path_bytes(&self) -> Cow<[u8]> {
        if self.prefix.is_empty() && !self.name.contains(&b'\\') {
            Cow::Borrowed(&self.name)
        } else {
            let mut bytes = Vec::with_capacity(self.prefix.len() + 1 + self.name.len());
            if !self.prefix.is_empty() {
                bytes.extend(self.prefix.iter().map(noslash));
                bytes.push(b'/');
            }
            bytes.extend(self.name.iter().map(noslash));
            Cow::Owned(bytes)
        }
    }

    /// The member path, if representable on this platform.
    pub fn path(&self) -> Result<Cow<Path>> {
        bytes2path(self.path_bytes())
    }

    /// The permission bits of this member.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// The owning user id.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// The owning group id.
    pub fn gid(&self) -> u64 {
        self.gid
    }

    /// Content length in bytes. Always 0 for directories.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Modification time, seconds since the Unix epoch.
    pub fn mtime(&self) -> u64 {
        self.mtime
    }

    /// The kind of member this header describes.
    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// Which header layout the block used.
    pub fn format(&self) -> HeaderFormat {
        self.format
    }

    /// The link target for hard links and symlinks, if present.
    pub fn link_name_bytes(&self) -> Option<&[u8]> {
        if self.linkname.is_empty() {
            None
        } else {
            Some(&self.linkname)
        }
    }

    /// The owner's user name. `None` on v7 headers.
    pub fn username_bytes(&self) -> Option<&[u8]> {
        self.uname.as_deref()
    }

    /// The owner's group name. `None` on v7 headers.
    pub fn groupname_bytes(&self) -> Option<&[u8]> {
        self.gname.as_deref()
    }

    /// The device major number. `None` on v7 headers.
    pub fn device_major(&self) -> Option<u64> {
        self.devmajor
    }

    /// The device minor number. `None` on v7 headers.
    pub fn device_minor(&self) -> Option<u64> {
        self.devminor
    }

    /// Access time, recorded only by old GNU tar.
    pub fn atime(&self) -> Option<u64> {
        self.atime
    }

    /// Change time, recorded only by old GNU tar.
    pub fn ctime(&self) -> Option<u64> {
        self.ctime
    }

    /// Multi-volume continuation offset, recorded only by old GNU tar.
    /// A nonzero value means the member started on a previous volume.
    pub fn volume_offset(&self) -> Option<u64> {
        self.volume_offset
    }
}

fn detect_format(block: &[u8; BLOCK_SIZE]) -> HeaderFormat {
    let magic = &block[field::MAGIC];
    let version = &block[field::VERSION];
    if magic == b"ustar\0" {
        HeaderFormat::Ustar
    } else if magic == b"ustar " && version == b" \0" {
        HeaderFormat::OldGnu
    } else {
        HeaderFormat::V7
    }
}

/// Any populated sparse machinery marks a header this crate cannot
/// faithfully read: descriptor slots, the extension flag, or a real
/// (unpacked) size differing from zero.
fn is_sparse_header(block: &[u8; BLOCK_SIZE]) -> bool {
    if block[field::GNU_SPARSE].iter().any(|b| *b != 0) {
        return true;
    }
    if block[field::GNU_ISEXTENDED] != 0 {
        return true;
    }
    field::octal_from(field::field(block, field::GNU_REALSIZE, field::NUMERIC)) != Ok(0)
}

/// Byte-level rootedness test, applied to paths that came off the wire
/// and so never went through [`relative_path_bytes`]. Catches Unix
/// absolute paths, backslash-rooted paths and `C:`-style drive prefixes
/// regardless of the host platform.
fn is_rooted(path: &[u8]) -> bool {
    match path {
        [b'/', ..] | [b'\\', ..] => true,
        [drive, b':', ..] => drive.is_ascii_alphabetic(),
        _ => false,
    }
}

fn noslash(b: &u8) -> u8 {
    if *b == b'\\' {
        b'/'
    } else {
        *b
    }
}

/// Converts an archive path to the bytes stored in a header, rejecting
/// absolute and drive-rooted paths.
pub(crate) fn relative_path_bytes(path: &Path) -> Result<Vec<u8>> {
    use std::path::Component;
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir => {
                return Err(TarError::InvalidPath {
                    path: path.to_path_buf(),
                    reason: "absolute and drive-rooted paths cannot be archived",
                })
            }
            _ => {}
        }
    }
    path2bytes(path)
}

#[cfg(unix)]
fn path2bytes(path: &Path) -> Result<Vec<u8>> {
    use std::os::unix::prelude::*;
    Ok(path.as_os_str().as_bytes().to_vec())
}

#[cfg(not(unix))]
fn path2bytes(path: &Path) -> Result<Vec<u8>> {
    let s = path.to_str().ok_or_else(|| TarError::InvalidPath {
        path: path.to_path_buf(),
        reason: "path is not valid unicode",
    })?;
    Ok(s.bytes().map(|b| if b == b'\\' { b'/' } else { b }).collect())
}

#[cfg(unix)]
pub(crate) fn bytes2path(bytes: Cow<[u8]>) -> Result<Cow<Path>> {
    use std::ffi::{OsStr, OsString};
    use std::os::unix::prelude::*;
    use std::path::PathBuf;
    Ok(match bytes {
        Cow::Borrowed(bytes) => Cow::Borrowed(Path::new(OsStr::from_bytes(bytes))),
        Cow::Owned(bytes) => Cow::Owned(PathBuf::from(OsString::from_vec(bytes))),
    })
}

#[cfg(not(unix))]
pub(crate) fn bytes2path(bytes: Cow<[u8]>) -> Result<Cow<Path>> {
    use std::io;
    use std::path::PathBuf;
    match std::str::from_utf8(&bytes) {
        Ok(s) => Ok(Cow::Owned(PathBuf::from(s))),
        Err(_) => Err(TarError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "member path is not valid unicode",
        ))),
    }
}
