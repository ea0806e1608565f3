use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};

use zip_core::result::ZipError;
use zip_core::{
    Config, EntryOptions, LocalFileHeader, RawValues, ZipStructure, read_chunk, read_structure,
    write_chunk, write_large_chunk, write_large_chunk_with_config,
};

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[test]
fn read_and_write_on_a_real_file() {
    let mut file = tempfile::tempfile().unwrap();
    let data = pattern(1024);
    assert_eq!(write_chunk(&mut file, &data).unwrap(), 1024);

    file.seek(SeekFrom::Start(100)).unwrap();
    assert_eq!(read_chunk(&mut file, 24).unwrap(), &data[100..124]);

    file.seek(SeekFrom::Start(1000)).unwrap();
    match read_chunk(&mut file, 100) {
        Err(ZipError::UnreadableFile(err)) => {
            assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
        }
        other => panic!("expected a short read, got {other:?}"),
    }
}

#[test]
fn read_only_handle_is_unwritable() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut read_only = File::open(file.path()).unwrap();
    let err = write_chunk(&mut read_only, b"data").unwrap_err();
    assert!(matches!(err, ZipError::UnwritableFile { written: 0, .. }));
}

#[test]
fn write_only_handle_is_unreadable() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"some bytes").unwrap();
    let mut write_only = OpenOptions::new().write(true).open(file.path()).unwrap();
    let err = read_chunk(&mut write_only, 4).unwrap_err();
    assert!(matches!(err, ZipError::UnreadableFile(_)));
}

#[test]
fn large_writes_are_split() {
    let config = Config::default().large_write_chunk_size(100);
    let data = pattern(1024 * 5 + 7);
    let mut file = tempfile::tempfile().unwrap();
    assert_eq!(
        write_large_chunk_with_config(&mut file, &data, &config).unwrap(),
        data.len() as u64
    );
    file.seek(SeekFrom::Start(0)).unwrap();
    assert_eq!(read_chunk(&mut file, data.len()).unwrap(), data);

    let mut small = tempfile::tempfile().unwrap();
    assert_eq!(write_large_chunk(&mut small, &data[..1024]).unwrap(), 1024);
}

#[test]
fn structures_on_a_real_file() {
    let raw = RawValues {
        crc32: 3,
        compressed_size: 4,
        uncompressed_size: 4,
    };
    let header = LocalFileHeader::new("on-disk.bin", &EntryOptions::default(), raw).unwrap();
    let mut file = tempfile::tempfile().unwrap();
    write_chunk(&mut file, &[0; 17]).unwrap();
    assert_eq!(header.write(&mut file).unwrap(), header.encoded_len());

    assert_eq!(read_structure::<LocalFileHeader, _>(&mut file, 17), Some(header));
    assert_eq!(read_structure::<LocalFileHeader, _>(&mut file, 0), None);
    assert_eq!(read_structure::<LocalFileHeader, _>(&mut file, 1 << 20), None);
}
