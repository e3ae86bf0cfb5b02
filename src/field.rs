//! Fixed-width header fields.
//!
//! Every tar header is a 512 byte block carved into fixed-width fields.
//! Textual fields are padded with NULs, numeric fields are ASCII octal
//! padded with NULs or spaces depending on which program wrote the
//! archive. This module holds the block layout plus the two primitives
//! everything else is built from: a bounded terminator scan and the
//! octal codec.

use std::ops::Range;

/// Size of a single tar block. Headers and content are block aligned.
pub const BLOCK_SIZE: usize = 512;

/// Fields shared by all three header layouts.
pub const NAME: Range<usize> = 0..100;
pub const MODE: Range<usize> = 100..108;
pub const UID: Range<usize> = 108..116;
pub const GID: Range<usize> = 116..124;
pub const SIZE: Range<usize> = 124..136;
pub const MTIME: Range<usize> = 136..148;
pub const CHKSUM: Range<usize> = 148..156;
pub const TYPEFLAG: usize = 156;
pub const LINKNAME: Range<usize> = 157..257;

/// Format discriminant bytes. Everything at or past byte 257 is only
/// meaningful for ustar and old-GNU headers.
pub const MAGIC: Range<usize> = 257..263;
pub const VERSION: Range<usize> = 263..265;

/// Extension fields shared by ustar and old-GNU.
pub const UNAME: Range<usize> = 265..297;
pub const GNAME: Range<usize> = 297..329;
pub const DEVMAJOR: Range<usize> = 329..337;
pub const DEVMINOR: Range<usize> = 337..345;

/// ustar only.
pub const PREFIX: Range<usize> = 345..500;

/// Old-GNU only; these overlay the ustar prefix field.
pub const GNU_ATIME: Range<usize> = 345..357;
pub const GNU_CTIME: Range<usize> = 357..369;
pub const GNU_OFFSET: Range<usize> = 369..381;
pub const GNU_SPARSE: Range<usize> = 386..482;
pub const GNU_ISEXTENDED: usize = 482;
pub const GNU_REALSIZE: Range<usize> = 483..495;

/// Terminator set for free-text fields.
pub const TEXT: &[u8] = &[0];

/// Terminator set for numeric fields; tar pads octal with either.
pub const NUMERIC: &[u8] = &[0, b' '];

/// Returns the bytes of `range` within `block`, stopping at (and
/// excluding) the first byte found in `terminators`.
pub fn field<'a>(block: &'a [u8], range: Range<usize>, terminators: &[u8]) -> &'a [u8] {
    let raw = &block[range];
    match raw.iter().position(|b| terminators.contains(b)) {
        Some(i) => &raw[..i],
        None => raw,
    }
}

/// Decodes an extracted numeric field as octal.
///
/// An empty field (nothing but padding) decodes as 0; several historic
/// producers leave unused numeric fields blank.
pub fn octal_from(bytes: &[u8]) -> Result<u64, ()> {
    let num = std::str::from_utf8(bytes).map_err(drop)?;
    let num = num.trim();
    if num.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(num, 8).map_err(drop)
}

/// Encodes `value` into `dst` as right-aligned octal, left-padded with
/// ASCII zeros, leaving the final byte as a NUL terminator.
///
/// The caller is responsible for checking that the value fits; excess
/// high-order digits are silently dropped.
pub fn octal_into(dst: &mut [u8], value: u64) {
    let o = format!("{:o}", value);
    let digits = o.bytes().rev().chain(std::iter::repeat(b'0'));
    if let Some((last, rest)) = dst.split_last_mut() {
        *last = 0;
        for (slot, digit) in rest.iter_mut().rev().zip(digits) {
            *slot = digit;
        }
    }
}

/// Largest value an `n`-digit octal field can hold.
pub fn octal_max(field_len: usize) -> u64 {
    // one byte of the field is the terminator
    8u64.pow((field_len - 1) as u32) - 1
}
