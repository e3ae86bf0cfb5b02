//! Header block checksums.
//!
//! The checksum recorded in a header is the byte sum of the whole block
//! with the eight checksum bytes themselves counted as ASCII spaces.
//! Historic implementations disagreed on whether the bytes are summed as
//! signed or unsigned values, so validation accepts either sum. A block
//! of 512 zero bytes is not a checksum failure; it is the end-of-archive
//! terminator and is classified before any recomputation happens.

use crate::field::{self, BLOCK_SIZE, CHKSUM};

/// Outcome of validating one 512 byte block.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockCheck {
    /// The block is entirely zero bytes, i.e. an archive terminator.
    Zero,
    /// The recorded checksum matches the signed or the unsigned sum.
    Valid,
    /// Neither sum matches; the block is corrupt or not a tar header.
    Invalid {
        /// The checksum decoded from the block, 0 if undecodable.
        recorded: u64,
        /// Recomputed sum over unsigned byte values.
        unsigned: u32,
        /// Recomputed sum over sign-extended byte values.
        signed: i64,
    },
}

/// Classifies `block` as a terminator, a checksum-valid header or a
/// corrupt block.
pub fn classify(block: &[u8; BLOCK_SIZE]) -> BlockCheck {
    // The terminator test runs over the raw block, before the checksum
    // field is redacted to spaces.
    if block.iter().all(|b| *b == 0) {
        return BlockCheck::Zero;
    }

    let (unsigned, signed) = sums(block);
    let recorded = field::octal_from(field::field(block, CHKSUM, field::NUMERIC));

    match recorded {
        Ok(n) if n == unsigned as u64 || n as i64 == signed => BlockCheck::Valid,
        Ok(n) => BlockCheck::Invalid {
            recorded: n,
            unsigned,
            signed,
        },
        Err(()) => BlockCheck::Invalid {
            recorded: 0,
            unsigned,
            signed,
        },
    }
}

/// The unsigned checksum of `block`, as written by the encoder.
pub fn compute(block: &[u8; BLOCK_SIZE]) -> u32 {
    sums(block).0
}

fn sums(block: &[u8; BLOCK_SIZE]) -> (u32, i64) {
    let mut unsigned = 0u32;
    let mut signed = 0i64;
    for (i, b) in block.iter().enumerate() {
        let b = if CHKSUM.contains(&i) { b' ' } else { *b };
        unsigned += b as u32;
        signed += (b as i8) as i64;
    }
    (unsigned, signed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(block: &mut [u8; BLOCK_SIZE]) {
        let sum = compute(block);
        block[CHKSUM].copy_from_slice(format!("{:06o}\0 ", sum).as_bytes());
    }

    #[test]
    fn zero_block_is_terminator() {
        assert_eq!(classify(&[0; BLOCK_SIZE]), BlockCheck::Zero);
    }

    #[test]
    fn zero_block_beats_checksum_decode() {
        // An all-zero block would otherwise decode a checksum of 0
        // against a nonzero space-adjusted sum.
        let block = [0u8; BLOCK_SIZE];
        assert_ne!(classify(&block), BlockCheck::Valid);
        assert_eq!(classify(&block), BlockCheck::Zero);
    }

    #[test]
    fn stamped_header_is_valid() {
        let mut block = [0u8; BLOCK_SIZE];
        block[..4].copy_from_slice(b"name");
        stamp(&mut block);
        assert_eq!(classify(&block), BlockCheck::Valid);
    }

    #[test]
    fn flipped_byte_is_detected() {
        let mut block = [0u8; BLOCK_SIZE];
        block[..4].copy_from_slice(b"name");
        stamp(&mut block);
        block[0] ^= 0x01;
        assert!(matches!(classify(&block), BlockCheck::Invalid { .. }));
    }

    #[test]
    fn signed_sum_is_accepted() {
        // Bytes >= 0x80 sum differently under sign extension; a header
        // checksummed by a signed producer must still validate.
        let mut block = [0u8; BLOCK_SIZE];
        block[0] = 0xff;
        block[1] = 0xfe;
        // The sums are invariant to the checksum field itself (it is
        // counted as spaces), so stamping the signed sum is safe.
        let (unsigned, signed) = sums(&block);
        assert_ne!(unsigned as i64, signed);
        block[CHKSUM].copy_from_slice(format!("{:06o}\0 ", signed).as_bytes());
        assert_eq!(classify(&block), BlockCheck::Valid);
    }

    #[test]
    fn garbage_checksum_field_is_invalid() {
        let mut block = [0u8; BLOCK_SIZE];
        block[CHKSUM].copy_from_slice(b"notoctal");
        assert!(matches!(classify(&block), BlockCheck::Invalid { .. }));
    }
}
