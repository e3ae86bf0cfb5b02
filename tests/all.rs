use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;

use tarlite::{Archive, Builder, EntryType, Header, HeaderFormat, TarError, BLOCK_SIZE};

macro_rules! t {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(e) => panic!("{} returned {}", stringify!($e), e),
        }
    };
}

const CHKSUM: std::ops::Range<usize> = 148..156;

/// Builds a raw v7-style header block by hand, with a correct unsigned
/// checksum, so the reader can be exercised without the writer.
fn raw_header(name: &[u8], size_field: &[u8], typeflag: u8) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    block[..name.len()].copy_from_slice(name);
    block[100..108].copy_from_slice(b"0000644\0");
    block[108..116].copy_from_slice(b"0000000\0");
    block[116..124].copy_from_slice(b"0000000\0");
    block[124..124 + size_field.len()].copy_from_slice(size_field);
    block[136..148].copy_from_slice(b"00000000000\0");
    block[156] = typeflag;
    stamp(&mut block);
    block
}

fn stamp(block: &mut [u8; BLOCK_SIZE]) {
    let sum: u32 = block
        .iter()
        .enumerate()
        .map(|(i, b)| if CHKSUM.contains(&i) { b' ' as u32 } else { *b as u32 })
        .sum();
    block[CHKSUM].copy_from_slice(format!("{:06o}\0 ", sum).as_bytes());
}

fn padded(content: &[u8]) -> Vec<u8> {
    let mut out = content.to_vec();
    out.resize((content.len() + BLOCK_SIZE - 1) / BLOCK_SIZE * BLOCK_SIZE, 0);
    out
}

fn terminated(mut stream: Vec<u8>) -> Vec<u8> {
    stream.extend_from_slice(&[0u8; BLOCK_SIZE * 2]);
    stream
}

#[test]
fn single_file_stream() {
    let mut stream = raw_header(b"hello.txt", b"00000000005\0", b'0').to_vec();
    stream.extend_from_slice(&padded(b"hello"));
    let stream = terminated(stream);

    let mut ar = Archive::new(Cursor::new(stream));
    let mut entries = t!(ar.entries());

    let entry = t!(entries.next().unwrap());
    assert_eq!(&*entry.path_bytes(), b"hello.txt");
    assert_eq!(entry.size(), 5);
    assert_eq!(entry.data(), b"hello");
    assert_eq!(entry.header().format(), HeaderFormat::V7);

    assert!(entries.next().is_none());
    // fused after the terminators
    assert!(entries.next().is_none());
}

#[test]
fn write_then_read_back() {
    let mut ar = Builder::new(Vec::new());
    t!(ar.append_data("a.txt", 0o644, 946684800, b"abc"));
    t!(ar.append_data("b.txt", 0o600, 946684800, b""));
    let bytes = t!(ar.into_inner());

    // two headers, one padded content block for a.txt, no content
    // block for the empty b.txt, two terminator blocks
    assert_eq!(bytes.len(), 2 * 512 + 512 + 1024);

    let mut ar = Archive::new(Cursor::new(bytes));
    let mut entries = t!(ar.entries());

    let a = t!(entries.next().unwrap());
    assert_eq!(&*a.path_bytes(), b"a.txt");
    assert_eq!(a.size(), 3);
    assert_eq!(a.data(), b"abc");
    assert_eq!(a.header().mode(), 0o644);
    assert_eq!(a.header().mtime(), 946684800);
    assert_eq!(a.header().entry_type(), EntryType::file());

    let b = t!(entries.next().unwrap());
    assert_eq!(&*b.path_bytes(), b"b.txt");
    assert_eq!(b.size(), 0);
    assert_eq!(b.data(), b"");

    assert!(entries.next().is_none());
}

#[test]
fn directory_size_field_is_ignored() {
    // Some producers leave garbage in a directory's size field; the
    // reader must not try to consume content blocks for it.
    let mut stream = raw_header(b"dir/", b"?!?!?!?!", b'5').to_vec();
    stream.extend_from_slice(&raw_header(b"after", b"00000000000\0", b'0'));
    let stream = terminated(stream);

    let mut ar = Archive::new(Cursor::new(stream));
    let mut entries = t!(ar.entries());

    let dir = t!(entries.next().unwrap());
    assert!(dir.header().entry_type().is_dir());
    assert_eq!(dir.size(), 0);
    assert_eq!(dir.data(), b"");

    let after = t!(entries.next().unwrap());
    assert_eq!(&*after.path_bytes(), b"after");
    assert!(entries.next().is_none());
}

#[test]
fn sparse_member_is_fatal() {
    let stream = terminated(raw_header(b"sparse", b"00000000005\0", b'S').to_vec());
    let mut ar = Archive::new(Cursor::new(stream));
    let mut entries = t!(ar.entries());
    match entries.next().unwrap() {
        Err(TarError::UnsupportedFormat { offset: 0, .. }) => {}
        other => panic!("expected UnsupportedFormat, got {:?}", other.map(|_| ())),
    }
    // fatal errors fuse the iterator
    assert!(entries.next().is_none());
}

#[test]
fn corrupt_checksum_is_fatal() {
    let mut block = raw_header(b"x", b"00000000000\0", b'0');
    block[0] ^= 0x20;
    let stream = terminated(block.to_vec());

    let mut ar = Archive::new(Cursor::new(stream));
    let mut entries = t!(ar.entries());
    assert!(matches!(
        entries.next().unwrap(),
        Err(TarError::ChecksumMismatch { offset: 0, .. })
    ));
    assert!(entries.next().is_none());
}

#[test]
fn truncated_stream_is_fatal() {
    // A header promising 5 bytes of content with no content block.
    let stream = raw_header(b"short", b"00000000005\0", b'0').to_vec();
    let mut ar = Archive::new(Cursor::new(stream));
    let mut entries = t!(ar.entries());
    assert!(matches!(
        entries.next().unwrap(),
        Err(TarError::MalformedBlock { offset: 512, actual: 0 })
    ));
}

#[test]
fn lone_terminator_is_a_warning_not_an_error() {
    let mut stream = raw_header(b"one", b"00000000000\0", b'0').to_vec();
    stream.extend_from_slice(&[0u8; BLOCK_SIZE]);
    stream.extend_from_slice(&raw_header(b"two", b"00000000000\0", b'0'));
    let stream = terminated(stream);

    let mut warnings: Vec<String> = Vec::new();
    {
        let mut ar = Archive::with_warning_sink(Cursor::new(stream), &mut warnings);
        let mut entries = t!(ar.entries());
        assert_eq!(&*t!(entries.next().unwrap()).path_bytes(), b"one");
        assert_eq!(&*t!(entries.next().unwrap()).path_bytes(), b"two");
        assert!(entries.next().is_none());
    }
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("lone terminator"), "{}", warnings[0]);
}

#[test]
fn ownership_drift_is_flagged() {
    let mut first = raw_header(b"mine", b"00000000000\0", b'0');
    first[108..116].copy_from_slice(b"0000765\0");
    stamp(&mut first);
    let mut second = raw_header(b"theirs", b"00000000000\0", b'0');
    second[108..116].copy_from_slice(b"0001000\0");
    stamp(&mut second);

    let mut stream = first.to_vec();
    stream.extend_from_slice(&second);
    let stream = terminated(stream);

    let mut warnings: Vec<String> = Vec::new();
    {
        let mut ar = Archive::with_warning_sink(Cursor::new(stream), &mut warnings);
        assert_eq!(t!(ar.entries()).count(), 2);
    }
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("theirs"), "{}", warnings[0]);
}

#[test]
fn unknown_typeflag_reads_as_regular_file() {
    // Both a vendor flag and a symlink: neither carries meaning for
    // this codec, so each member is consumed as a regular file and
    // flagged.
    let mut stream = raw_header(b"odd", b"00000000004\0", b'Z').to_vec();
    stream.extend_from_slice(&padded(b"data"));
    stream.extend_from_slice(&raw_header(b"link", b"00000000000\0", b'2'));
    let stream = terminated(stream);

    let mut warnings: Vec<String> = Vec::new();
    {
        let mut ar = Archive::with_warning_sink(Cursor::new(stream), &mut warnings);
        let mut entries = t!(ar.entries());
        let entry = t!(entries.next().unwrap());
        assert_eq!(entry.data(), b"data");
        let link = t!(entries.next().unwrap());
        assert!(link.header().entry_type().is_symlink());
        assert_eq!(link.data(), b"");
        assert!(entries.next().is_none());
    }
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].contains("typeflag"), "{}", warnings[0]);
    assert!(warnings[1].contains("`link`"), "{}", warnings[1]);
}

#[test]
fn multi_volume_offset_is_flagged_and_ignored() {
    let mut block = raw_header(b"vol", b"00000000003\0", b'0');
    block[257..263].copy_from_slice(b"ustar ");
    block[263..265].copy_from_slice(b" \0");
    // old-GNU continuation offset at byte 369
    block[369..381].copy_from_slice(b"00000000100\0");
    stamp(&mut block);

    let mut stream = block.to_vec();
    stream.extend_from_slice(&padded(b"abc"));
    let stream = terminated(stream);

    let mut warnings: Vec<String> = Vec::new();
    {
        let mut ar = Archive::with_warning_sink(Cursor::new(stream), &mut warnings);
        let mut entries = t!(ar.entries());
        let entry = t!(entries.next().unwrap());
        assert_eq!(entry.header().format(), HeaderFormat::OldGnu);
        assert_eq!(entry.header().volume_offset(), Some(0o100));
        assert_eq!(entry.data(), b"abc");
        assert!(entries.next().is_none());
    }
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("multi-volume"), "{}", warnings[0]);
}

#[test]
fn entries_requires_position_zero() {
    let stream = terminated(Vec::new());
    let mut ar = Archive::new(Cursor::new(stream));
    {
        let mut entries = t!(ar.entries());
        assert!(entries.next().is_none());
    }
    assert!(ar.entries().is_err());
}

#[test]
fn append_rejects_absolute_paths() {
    let mut ar = Builder::new(Vec::new());
    match ar.append_data("/etc/passwd", 0o644, 0, b"") {
        Err(TarError::InvalidPath { .. }) => {}
        other => panic!("expected InvalidPath, got {:?}", other),
    }
}

#[test]
fn append_rejects_decoded_absolute_paths() {
    // Headers that came from another archive skip the constructor
    // validation, so rewriting one with an absolute name must still
    // fail before anything is written.
    let stream = terminated(raw_header(b"/etc/passwd", b"00000000000\0", b'0').to_vec());
    let mut ar = Archive::new(Cursor::new(stream));
    let entry = t!(t!(ar.entries()).next().unwrap());

    let mut out = Builder::new(Vec::new());
    match out.append(entry.header(), entry.data()) {
        Err(TarError::InvalidPath { .. }) => {}
        other => panic!("expected InvalidPath, got {:?}", other),
    }
    assert_eq!(t!(out.into_inner()), vec![0u8; 1024]);
}

#[test]
fn append_rejects_mismatched_sizes() {
    let header = t!(Header::new_file(Path::new("f"), 10, 0o644, 0, 0, 0));
    let mut ar = Builder::new(Vec::new());
    assert!(ar.append(&header, b"only4").is_err());
}

#[test]
fn writing_files_from_disk() {
    let td = t!(tempfile::tempdir());
    let path = td.path().join("test");
    t!(t!(File::create(&path)).write_all(b"test"));

    let mut ar = Builder::new(Vec::new());
    t!(ar.append_file("test2", &mut t!(File::open(&path))));
    let bytes = t!(ar.into_inner());

    let mut ar = Archive::new(Cursor::new(bytes));
    let mut entries = t!(ar.entries());
    let f = t!(entries.next().unwrap());
    assert_eq!(&*f.path_bytes(), b"test2");
    assert_eq!(f.size(), 4);
    assert_eq!(f.data(), b"test");
    assert!(entries.next().is_none());
}

#[test]
fn writing_directories_from_disk() {
    let td = t!(tempfile::tempdir());
    let dir = td.path().join("sub");
    t!(std::fs::create_dir(&dir));

    let mut ar = Builder::new(Vec::new());
    t!(ar.append_path_with_name(&dir, "sub"));
    let bytes = t!(ar.into_inner());

    let mut ar = Archive::new(Cursor::new(bytes));
    let mut entries = t!(ar.entries());
    let d = t!(entries.next().unwrap());
    assert!(d.header().entry_type().is_dir());
    assert_eq!(d.size(), 0);
    assert!(entries.next().is_none());
}

#[test]
fn finish_happens_on_drop() {
    let mut out = Vec::new();
    {
        let mut ar = Builder::new(&mut out);
        t!(ar.append_data("x", 0o644, 0, b"x"));
    }
    // header + content block + terminators
    assert_eq!(out.len(), 512 + 512 + 1024);
    assert!(out[1024..].iter().all(|b| *b == 0));
}

#[test]
fn empty_archive_is_just_terminators() {
    let ar = Builder::new(Vec::new());
    let bytes = t!(ar.into_inner());
    assert_eq!(bytes, vec![0u8; 1024]);

    let mut ar = Archive::new(Cursor::new(bytes));
    assert!(t!(ar.entries()).next().is_none());
}
