//! One archive member, assembled from the records that describe it

use std::borrow::Cow;
use std::hash::{Hash, Hasher};
use std::io::{Read, Seek};

use crate::cp437::decode_path;
use crate::spec::ZipStructure;
use crate::structures::{
    CentralDirectoryStructure, LocalFileHeader, Zip64DataDescriptor, ZipDataDescriptor,
};
use crate::types::{CompressionMethod, DateTime, EntryType, System, dos, ffi};

/// A fully decoded entry.
///
/// Sizes and checksum are resolved across the central directory, the ZIP64 record and any data
/// descriptor, so callers don't need to know which of them carries the real values.
///
/// Two entries are equal when they have the same path, local header CRC and local header offset.
/// Comments, extra field padding and other cosmetic differences are ignored.
#[derive(Clone, Debug)]
pub struct Entry {
    central_directory_structure: CentralDirectoryStructure,
    local_file_header: LocalFileHeader,
    data_descriptor: Option<ZipDataDescriptor>,
    zip64_data_descriptor: Option<Zip64DataDescriptor>,
}

impl Entry {
    /// Assemble an entry from already decoded records. Encrypted entries are rejected.
    pub fn new(
        central_directory_structure: CentralDirectoryStructure,
        local_file_header: LocalFileHeader,
        data_descriptor: Option<ZipDataDescriptor>,
        zip64_data_descriptor: Option<Zip64DataDescriptor>,
    ) -> Option<Self> {
        if central_directory_structure.is_encrypted() || local_file_header.is_encrypted() {
            log::debug!(
                "rejecting encrypted entry {}",
                decode_path(
                    &central_directory_structure.file_name,
                    central_directory_structure.uses_utf8_path_encoding()
                )
            );
            return None;
        }
        let entry = Self {
            central_directory_structure,
            local_file_header,
            data_descriptor,
            zip64_data_descriptor,
        };
        if entry.local_end().is_none() {
            log::debug!("rejecting entry {} extending past u64::MAX", entry.path());
            return None;
        }
        Some(entry)
    }

    /// Read the local header a central directory record points at, and the data descriptor
    /// after the payload if the entry has one.
    pub fn read<R: Read + Seek + ?Sized>(
        reader: &mut R,
        central_directory_structure: CentralDirectoryStructure,
    ) -> Option<Self> {
        let cds = &central_directory_structure;
        let header_start = cds.effective_relative_offset_of_local_header();
        let local_file_header = LocalFileHeader::read_at(reader, header_start)?;

        let (mut data_descriptor, mut zip64_data_descriptor) = (None, None);
        if cds.uses_data_descriptor() {
            let payload_size = if cds.compression_method() == CompressionMethod::Stored {
                cds.effective_uncompressed_size()
            } else {
                cds.effective_compressed_size()
            };
            let descriptor_start = header_start
                .checked_add(local_file_header.header_size())?
                .checked_add(payload_size)?;
            if cds.is_zip64() {
                zip64_data_descriptor = Zip64DataDescriptor::read_at(reader, descriptor_start);
            } else {
                data_descriptor = ZipDataDescriptor::read_at(reader, descriptor_start);
            }
        }

        Self::new(
            central_directory_structure,
            local_file_header,
            data_descriptor,
            zip64_data_descriptor,
        )
    }

    pub const fn central_directory_structure(&self) -> &CentralDirectoryStructure {
        &self.central_directory_structure
    }

    pub const fn local_file_header(&self) -> &LocalFileHeader {
        &self.local_file_header
    }

    pub const fn data_descriptor(&self) -> Option<&ZipDataDescriptor> {
        self.data_descriptor.as_ref()
    }

    pub const fn zip64_data_descriptor(&self) -> Option<&Zip64DataDescriptor> {
        self.zip64_data_descriptor.as_ref()
    }

    /// The file name as stored, before any decoding.
    pub fn raw_path(&self) -> &[u8] {
        &self.central_directory_structure.file_name
    }

    /// The file name, decoded as UTF-8 when flagged and as CP437 otherwise.
    pub fn path(&self) -> Cow<'_, str> {
        decode_path(
            &self.central_directory_structure.file_name,
            self.central_directory_structure.uses_utf8_path_encoding(),
        )
    }

    pub fn is_zip64(&self) -> bool {
        self.central_directory_structure.is_zip64()
    }

    pub const fn compression_method(&self) -> CompressionMethod {
        self.central_directory_structure.compression_method()
    }

    pub fn is_compressed(&self) -> bool {
        self.compression_method() != CompressionMethod::Stored
    }

    pub const fn last_modified(&self) -> DateTime {
        DateTime::from_msdos(
            self.central_directory_structure.last_mod_file_date,
            self.central_directory_structure.last_mod_file_time,
        )
    }

    /// CRC-32 of the uncompressed payload.
    pub fn checksum(&self) -> u32 {
        let cds = &self.central_directory_structure;
        if !cds.uses_data_descriptor() {
            return cds.crc32;
        }
        self.zip64_data_descriptor
            .map(|descriptor| descriptor.crc32)
            .or(self.data_descriptor.map(|descriptor| descriptor.crc32))
            .unwrap_or(cds.crc32)
    }

    pub fn compressed_size(&self) -> u64 {
        let cds = &self.central_directory_structure;
        if self.is_zip64() {
            self.zip64_data_descriptor
                .map(|descriptor| descriptor.compressed_size)
                .unwrap_or_else(|| cds.effective_compressed_size())
        } else {
            self.data_descriptor
                .map(|descriptor| descriptor.compressed_size)
                .unwrap_or(cds.compressed_size)
                .into()
        }
    }

    pub fn uncompressed_size(&self) -> u64 {
        let cds = &self.central_directory_structure;
        if self.is_zip64() {
            self.zip64_data_descriptor
                .map(|descriptor| descriptor.uncompressed_size)
                .unwrap_or_else(|| cds.effective_uncompressed_size())
        } else {
            self.data_descriptor
                .map(|descriptor| descriptor.uncompressed_size)
                .unwrap_or(cds.uncompressed_size)
                .into()
        }
    }

    pub fn header_start(&self) -> u64 {
        self.central_directory_structure
            .effective_relative_offset_of_local_header()
    }

    /// Offset of the first payload byte.
    pub fn data_offset(&self) -> u64 {
        self.header_start() + self.local_file_header.header_size()
    }

    /// Bytes this entry occupies from its local header to the end of its data descriptor.
    pub fn local_size(&self) -> u64 {
        self.local_file_header.header_size() + self.payload_size() + self.descriptor_size()
    }

    fn payload_size(&self) -> u64 {
        if self.is_compressed() {
            self.compressed_size()
        } else {
            self.uncompressed_size()
        }
    }

    /// Only the descriptor matching the entry's width counts.
    fn descriptor_size(&self) -> u64 {
        let size = if self.is_zip64() {
            self.zip64_data_descriptor
                .map_or(0, |_| Zip64DataDescriptor::FIXED_SIZE)
        } else {
            self.data_descriptor
                .map_or(0, |_| ZipDataDescriptor::FIXED_SIZE)
        };
        size as u64
    }

    /// End of the entry's local records. `None` if it doesn't fit in a `u64`, which
    /// [`Entry::new`] rejects, so the unchecked sums above can't overflow.
    fn local_end(&self) -> Option<u64> {
        self.header_start()
            .checked_add(self.local_file_header.header_size())?
            .checked_add(self.payload_size())?
            .checked_add(self.descriptor_size())
    }

    /// Whether the entry is a file, a directory or a symlink.
    ///
    /// Unix and macOS entries are classified by their mode, MS-DOS entries by their directory
    /// attribute; a trailing `/` marks a directory when neither says otherwise.
    pub fn entry_type(&self) -> EntryType {
        let cds = &self.central_directory_structure;
        let trailing_slash = cds.file_name.last() == Some(&b'/');
        let by_name = if trailing_slash {
            EntryType::Directory
        } else {
            EntryType::File
        };
        match cds.system() {
            system if system.stores_unix_mode() => {
                EntryType::from_mode(cds.external_file_attributes >> 16).unwrap_or(by_name)
            }
            System::Dos if cds.external_file_attributes & dos::DIRECTORY != 0 => {
                EntryType::Directory
            }
            _ => by_name,
        }
    }

    /// Full POSIX mode, including the file type bits, if the originating system records one.
    pub fn unix_mode(&self) -> Option<u32> {
        let cds = &self.central_directory_structure;
        let attributes = cds.external_file_attributes;
        match cds.system() {
            system if system.stores_unix_mode() => match attributes >> 16 {
                0 => None,
                mode => Some(mode),
            },
            System::Dos => {
                let mut mode = if attributes & dos::DIRECTORY != 0 {
                    ffi::S_IFDIR | 0o0775
                } else {
                    ffi::S_IFREG | 0o0664
                };
                if attributes & dos::READ_ONLY != 0 {
                    mode &= !0o0222;
                }
                Some(mode)
            }
            _ => None,
        }
    }

    /// Permission bits (`0o7777` mask), falling back to the entry type's default.
    pub fn permissions(&self) -> u16 {
        match self.unix_mode().map(|mode| (mode & 0o7777) as u16) {
            Some(permissions) if permissions != 0 => permissions,
            _ => self.entry_type().default_permissions(),
        }
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.path() == other.path()
            && self.local_file_header.crc32 == other.local_file_header.crc32
            && self.header_start() == other.header_start()
    }
}

impl Eq for Entry {}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path().hash(state);
        self.local_file_header.crc32.hash(state);
        self.header_start().hash(state);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spec;
    use crate::types::{EntryOptions, RawValues};
    use std::io::Cursor;

    fn records(
        name: &str,
        options: &EntryOptions,
        raw: RawValues,
        header_start: u64,
    ) -> (LocalFileHeader, CentralDirectoryStructure) {
        let local = LocalFileHeader::new(name, options, raw).unwrap();
        let central =
            CentralDirectoryStructure::new(&local, options, raw, header_start, b"").unwrap();
        (local, central)
    }

    fn entry(name: &str, options: &EntryOptions) -> Entry {
        let raw = RawValues {
            crc32: 0xcafebabe,
            compressed_size: 10,
            uncompressed_size: 30,
        };
        let (local, central) = records(name, options, raw, 0);
        Entry::new(central, local, None, None).unwrap()
    }

    #[test]
    fn plain_entry() {
        let entry = entry("docs/readme.txt", &EntryOptions::default());
        assert_eq!(entry.path(), "docs/readme.txt");
        assert_eq!(entry.raw_path(), b"docs/readme.txt");
        assert_eq!(entry.checksum(), 0xcafebabe);
        assert_eq!(entry.compressed_size(), 10);
        assert_eq!(entry.uncompressed_size(), 30);
        assert!(entry.is_compressed());
        assert!(!entry.is_zip64());
        assert_eq!(entry.entry_type(), EntryType::File);
        assert_eq!(entry.permissions(), 0o644);
        assert_eq!(entry.unix_mode(), Some(0o100644));
        assert_eq!(entry.data_offset(), 30 + 15);
        assert_eq!(entry.local_size(), 30 + 15 + 10);
    }

    #[test]
    fn stored_payload_uses_uncompressed_size() {
        let options = EntryOptions::default().compression_method(CompressionMethod::Stored);
        let entry = entry("a", &options);
        assert!(!entry.is_compressed());
        assert_eq!(entry.local_size(), 30 + 1 + 30);
    }

    #[test]
    fn encrypted_entries_are_rejected() {
        let (local, mut central) =
            records("secret", &EntryOptions::default(), RawValues::default(), 0);
        assert!(Entry::new(central.clone(), local.clone(), None, None).is_some());
        central.general_purpose_bit_flag |= spec::FLAG_ENCRYPTED;
        assert!(Entry::new(central.clone(), local.clone(), None, None).is_none());

        let (mut local, central) =
            records("secret", &EntryOptions::default(), RawValues::default(), 0);
        local.general_purpose_bit_flag |= spec::FLAG_ENCRYPTED;
        assert!(Entry::new(central, local, None, None).is_none());
    }

    #[test]
    fn descriptor_values_win() {
        let options = EntryOptions::default().data_descriptor(true);
        let raw = RawValues {
            crc32: 5,
            compressed_size: 6,
            uncompressed_size: 7,
        };
        let (local, central) = records("streamed", &options, raw, 0);
        let entry = Entry::new(
            central,
            local,
            Some(ZipDataDescriptor::new(50, 60, 70)),
            None,
        )
        .unwrap();
        assert_eq!(entry.checksum(), 50);
        assert_eq!(entry.compressed_size(), 60);
        assert_eq!(entry.uncompressed_size(), 70);
        assert_eq!(entry.local_size(), 30 + 8 + 60 + 16);
    }

    #[test]
    fn zip64_descriptor_is_authoritative() {
        let options = EntryOptions::default().data_descriptor(true).large_file(true);
        let raw = RawValues {
            crc32: 5,
            compressed_size: 6,
            uncompressed_size: 7,
        };
        let (local, central) = records("both", &options, raw, 0);
        let entry = Entry::new(
            central,
            local,
            Some(ZipDataDescriptor::new(1, 2, 3)),
            Some(Zip64DataDescriptor::new(10, 0x1_0000_0000, 0x2_0000_0000)),
        )
        .unwrap();
        assert!(entry.is_zip64());
        assert_eq!(entry.checksum(), 10);
        assert_eq!(entry.compressed_size(), 0x1_0000_0000);
        assert_eq!(entry.uncompressed_size(), 0x2_0000_0000);
        assert_eq!(entry.local_size(), 30 + 4 + 20 + 0x1_0000_0000 + 24);
    }

    #[test]
    fn checksum_ignores_descriptor_without_flag() {
        let (local, central) = records(
            "flagless",
            &EntryOptions::default(),
            RawValues {
                crc32: 9,
                ..Default::default()
            },
            0,
        );
        let entry = Entry::new(
            central,
            local,
            Some(ZipDataDescriptor::new(1, 2, 3)),
            None,
        )
        .unwrap();
        assert_eq!(entry.checksum(), 9);
    }

    #[test]
    fn entry_types() {
        let dir = EntryOptions::default().entry_type(EntryType::Directory);
        // Unix mode beats the missing trailing slash.
        assert_eq!(entry("dir", &dir).entry_type(), EntryType::Directory);
        assert_eq!(entry("dir", &dir).permissions(), 0o755);

        let link = EntryOptions::default().entry_type(EntryType::Symlink);
        assert_eq!(entry("link", &link).entry_type(), EntryType::Symlink);

        let unknown = EntryOptions::default().system(System::Unknown);
        assert_eq!(entry("dir/", &unknown).entry_type(), EntryType::Directory);
        assert_eq!(entry("dir", &unknown).entry_type(), EntryType::File);
        assert_eq!(entry("dir", &unknown).unix_mode(), None);
        assert_eq!(entry("dir/", &unknown).permissions(), 0o755);
    }

    #[test]
    fn dos_attributes() {
        let msdos = EntryOptions::default().system(System::Dos);
        let dir = entry("folder", &msdos.entry_type(EntryType::Directory));
        assert_eq!(dir.entry_type(), EntryType::Directory);
        assert_eq!(dir.unix_mode(), Some(ffi::S_IFDIR | 0o775));

        let read_only = entry("file", &msdos.unix_permissions(0o444));
        assert_eq!(read_only.entry_type(), EntryType::File);
        assert_eq!(read_only.permissions(), 0o444);
        assert_eq!(entry("file", &msdos).permissions(), 0o664);
    }

    #[test]
    fn cp437_and_utf8_paths() {
        let (local, mut central) =
            records("x", &EntryOptions::default(), RawValues::default(), 0);
        central.file_name = Box::new([0x82, b'.', b't', b'x', b't']);
        central.file_name_length = 5;
        let entry = Entry::new(central, local.clone(), None, None).unwrap();
        assert_eq!(entry.path(), "\u{e9}.txt");

        let (local, central) = records(
            "\u{e9}.txt",
            &EntryOptions::default(),
            RawValues::default(),
            0,
        );
        let entry = Entry::new(central, local, None, None).unwrap();
        assert_eq!(entry.path(), "\u{e9}.txt");
    }

    #[test]
    fn equality_ignores_cosmetics() {
        let raw = RawValues {
            crc32: 77,
            compressed_size: 1,
            uncompressed_size: 1,
        };
        let (local, central) = records("same", &EntryOptions::default(), raw, 100);
        let a = Entry::new(central.clone(), local.clone(), None, None).unwrap();

        let mut commented = central.clone();
        commented.file_comment = b"a comment".to_vec().into_boxed_slice();
        commented.file_comment_length = 9;
        let mut padded = local.clone();
        padded.extra_field = vec![0; 3].into_boxed_slice();
        padded.extra_field_length = 3;
        let b = Entry::new(commented, padded, None, None).unwrap();
        assert_eq!(a, b);

        let moved = Entry::new(central.relocated(200).unwrap(), local, None, None).unwrap();
        assert_ne!(a, moved);
    }

    #[test]
    fn read_probes_descriptor() {
        let options = EntryOptions::default()
            .compression_method(CompressionMethod::Stored)
            .data_descriptor(true);
        let payload = b"hello, world";
        let raw = RawValues {
            crc32: crate::crc32::crc32(0, payload),
            compressed_size: payload.len() as u64,
            uncompressed_size: payload.len() as u64,
        };
        let (local, central) = records("hello.txt", &options, raw, 4);

        let mut store = Vec::new();
        store.extend_from_slice(b"junk");
        store.extend_from_slice(&local.encode());
        store.extend_from_slice(payload);
        store.extend_from_slice(&ZipDataDescriptor::new(raw.crc32, 12, 12).encode());

        let entry = Entry::read(&mut Cursor::new(&store), central.clone()).unwrap();
        assert_eq!(entry.data_descriptor(), Some(&ZipDataDescriptor::new(raw.crc32, 12, 12)));
        assert_eq!(entry.zip64_data_descriptor(), None);
        assert_eq!(entry.checksum(), raw.crc32);
        assert_eq!(entry.local_size() as usize, store.len() - 4);

        // Descriptor without its signature.
        store.truncate(store.len() - 16);
        store.extend_from_slice(&[0; 16]);
        let entry = Entry::read(&mut Cursor::new(&store), central).unwrap();
        assert_eq!(entry.data_descriptor(), None);
        assert_eq!(entry.checksum(), raw.crc32);
    }

    #[test]
    fn classic_descriptor_not_counted_for_zip64_entry() {
        let options = EntryOptions::default().data_descriptor(true).large_file(true);
        let raw = RawValues {
            crc32: 5,
            compressed_size: 6,
            uncompressed_size: 7,
        };
        let (local, central) = records("wide", &options, raw, 0);
        let entry = Entry::new(
            central,
            local,
            Some(ZipDataDescriptor::new(5, 6, 7)),
            None,
        )
        .unwrap();
        assert!(entry.is_zip64());
        assert_eq!(entry.local_size(), 30 + 4 + 20 + 6);
    }

    #[test]
    fn oversized_descriptor_is_rejected() {
        let options = EntryOptions::default()
            .compression_method(CompressionMethod::Stored)
            .data_descriptor(true)
            .large_file(true);
        let payload = b"tiny";
        let raw = RawValues {
            crc32: crate::crc32::crc32(0, payload),
            compressed_size: payload.len() as u64,
            uncompressed_size: payload.len() as u64,
        };
        let (local, central) = records("huge", &options, raw, 0);

        let mut store = local.encode();
        store.extend_from_slice(payload);
        store.extend_from_slice(&Zip64DataDescriptor::new(1, u64::MAX, u64::MAX).encode());
        assert!(Entry::read(&mut Cursor::new(&store), central).is_none());
    }

    #[test]
    fn offset_past_u64_max_is_rejected() {
        let (local, central) = records("end", &EntryOptions::default(), RawValues::default(), 0);
        let near_end = central.relocated(u64::MAX - 4).unwrap();
        assert_eq!(near_end.effective_relative_offset_of_local_header(), u64::MAX - 4);
        assert!(Entry::new(near_end, local.clone(), None, None).is_none());

        let fits = central.relocated(u64::MAX - 33).unwrap();
        let entry = Entry::new(fits, local, None, None).unwrap();
        assert_eq!(entry.data_offset(), u64::MAX);
    }

    #[test]
    fn read_missing_local_header() {
        let (_, central) = records("gone", &EntryOptions::default(), RawValues::default(), 0);
        assert!(Entry::read(&mut Cursor::new(vec![0u8; 64]), central).is_none());
    }
}
