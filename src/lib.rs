//! Building blocks for reading and writing ZIP archives
//!
//! This crate covers what every archive operation is built on:
//!
//! * the records that describe an entry ([`LocalFileHeader`], [`CentralDirectoryStructure`],
//!   [`DataDescriptor`]) and a single codec ([`ZipStructure`]) that reads and writes them,
//! * resolution of ZIP64 extended information against the classic 32-bit fields,
//! * [`Entry`], the assembled view of one archive member,
//! * CRC-32 checksums and chunked reads and writes on any byte store.
//!
//! Walking directories, driving compression codecs and rewriting whole archives is left to
//! higher layers.
//!
//! ```
//! use zip_core::{CentralDirectoryStructure, Entry, EntryOptions, LocalFileHeader, RawValues};
//!
//! let options = EntryOptions::default();
//! let raw = RawValues { crc32: zip_core::crc32(0, b"hello"), compressed_size: 5, uncompressed_size: 5 };
//! let local = LocalFileHeader::new("hello.txt", &options, raw)?;
//! let central = CentralDirectoryStructure::new(&local, &options, raw, 0, b"")?;
//! let entry = Entry::new(central, local, None, None).unwrap();
//! assert_eq!(entry.path(), "hello.txt");
//! assert_eq!(entry.uncompressed_size(), 5);
//! # Ok::<(), zip_core::result::ZipError>(())
//! ```
//!
//! | Feature | Enables                                                   |
//! |---------|-----------------------------------------------------------|
//! | `time`  | conversions between [`DateTime`] and `time::OffsetDateTime` |
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod spec;

mod chunked;
mod config;
mod cp437;
mod crc32;
mod entry;
pub mod extra_fields;
pub mod result;
mod structures;
mod types;

pub use crate::chunked::{
    read_chunk, write_chunk, write_large_chunk, write_large_chunk_with_config,
};
pub use crate::config::{Config, DEFAULT_LARGE_WRITE_CHUNK_SIZE};
pub use crate::cp437::decode_cp437;
pub use crate::crc32::{Crc32Reader, crc32, crc32_delegate};
pub use crate::entry::Entry;
pub use crate::spec::{
    Block, CENTRAL_DIRECTORY_HEADER_SIGNATURE, DATA_DESCRIPTOR_SIGNATURE,
    LOCAL_FILE_HEADER_SIGNATURE, Magic, ZIP64_BYTES_THR, ZipStructure, read_structure,
};
pub use crate::structures::*;
pub use crate::types::{
    CompressionMethod, DateTime, EntryOptions, EntryType, RawValues, System,
    external_file_attributes,
};
