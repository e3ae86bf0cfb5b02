// See https://en.wikipedia.org/wiki/Tar_%28computing%29#UStar_format
/// Indicates the kind of member described by a header.
///
/// Each decoded [`Header`](crate::Header) exposes one of these through
/// its `entry_type` method. Only regular files and directories carry
/// meaning for the codec; link flags are classified so callers can
/// inspect them, and everything else that is not outright rejected is
/// read as a regular file (with a warning) so that its content is
/// still consumed correctly.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EntryType {
    byte: u8,
}

impl EntryType {
    /// Creates an entry type from the raw typeflag byte.
    pub fn new(byte: u8) -> EntryType {
        EntryType { byte }
    }

    /// The entry type of a regular file, `'0'`.
    pub fn file() -> EntryType {
        EntryType::new(b'0')
    }

    /// The entry type of a directory, `'5'`.
    pub fn dir() -> EntryType {
        EntryType::new(b'5')
    }

    /// Returns whether this is a regular file.
    ///
    /// Pre-POSIX archives use a NUL typeflag for regular files, so both
    /// spellings are accepted.
    pub fn is_file(&self) -> bool {
        self.byte == 0 || self.byte == b'0'
    }

    /// Returns whether this is a hard link.
    pub fn is_hard_link(&self) -> bool {
        self.byte == b'1'
    }

    /// Returns whether this is a symlink.
    pub fn is_symlink(&self) -> bool {
        self.byte == b'2'
    }

    /// Returns whether this is a directory.
    pub fn is_dir(&self) -> bool {
        self.byte == b'5'
    }

    /// Returns whether this is a GNU sparse file, which this crate
    /// refuses to read.
    pub fn is_sparse(&self) -> bool {
        self.byte == b'S'
    }

    /// Returns whether this is a GNU long-name or long-link member
    /// (`'L'` / `'K'`), which this crate refuses to read.
    pub fn is_gnu_longname(&self) -> bool {
        self.byte == b'L' || self.byte == b'K'
    }

    /// Returns whether this is a pax extended header (`'x'` local or
    /// `'g'` global), which this crate refuses to read.
    pub fn is_pax(&self) -> bool {
        self.byte == b'x' || self.byte == b'g'
    }

    /// Returns whether the flag is one the codec gives meaning to:
    /// regular files and directories. Everything else that is not
    /// outright rejected (links, devices, FIFOs, vendor flags) is read
    /// as a regular file, with a warning.
    pub fn is_known(&self) -> bool {
        matches!(self.byte, 0 | b'0' | b'5')
    }

    /// Returns the raw typeflag byte.
    pub fn as_byte(&self) -> u8 {
        self.byte
    }
}

#[cfg(test)]
mod tests {
    use super::EntryType;

    #[test]
    fn nul_and_zero_are_files() {
        assert!(EntryType::new(0).is_file());
        assert!(EntryType::new(b'0').is_file());
        assert!(!EntryType::new(b'5').is_file());
    }

    #[test]
    fn rejection_probes() {
        assert!(EntryType::new(b'S').is_sparse());
        assert!(EntryType::new(b'L').is_gnu_longname());
        assert!(EntryType::new(b'K').is_gnu_longname());
        assert!(EntryType::new(b'x').is_pax());
        assert!(EntryType::new(b'g').is_pax());
    }

    #[test]
    fn known_flags() {
        for b in [0, b'0', b'5'] {
            assert!(EntryType::new(b).is_known());
        }
        // Links, devices and FIFOs carry no meaning here and must
        // surface through the warning path.
        for b in [b'1', b'2', b'3', b'4', b'6', b'7', b'D', b'S'] {
            assert!(!EntryType::new(b).is_known());
        }
    }
}
