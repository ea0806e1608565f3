/*
Local file header
      local file header signature     4 bytes  (0x04034b50)
      version needed to extract       2 bytes
      general purpose bit flag        2 bytes
      compression method              2 bytes
      last mod file time              2 bytes
      last mod file date              2 bytes
      crc-32                          4 bytes
      compressed size                 4 bytes
      uncompressed size               4 bytes
      file name length                2 bytes
      extra field length              2 bytes
      file name (variable size)
      extra field (variable size)
*/

use crate::extra_fields::{Zip64ExtendedInformation, Zip64Field, resolve_effective};
use crate::result::{ZipResult, invalid};
use crate::spec::{self, Magic, ZipStructure};
use crate::types::{CompressionMethod, DateTime, EntryOptions, RawValues};

#[derive(Copy, Clone, Debug)]
#[repr(packed)]
pub struct ZipLocalEntryBlock {
    pub magic: Magic,
    pub version_needed_to_extract: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
}

impl_block!(
    ZipLocalEntryBlock,
    spec::LOCAL_FILE_HEADER_SIGNATURE,
    [
        (magic, Magic),
        (version_needed_to_extract, u16),
        (flags, u16),
        (compression_method, u16),
        (last_mod_time, u16),
        (last_mod_date, u16),
        (crc32, u32),
        (compressed_size, u32),
        (uncompressed_size, u32),
        (file_name_length, u16),
        (extra_field_length, u16),
    ]
);

/// The record immediately preceding an entry's payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocalFileHeader {
    pub version_needed_to_extract: u16,
    pub general_purpose_bit_flag: u16,
    pub compression_method: u16,
    pub last_mod_file_time: u16,
    pub last_mod_file_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
    pub file_name: Box<[u8]>,
    pub extra_field: Box<[u8]>,
}

impl LocalFileHeader {
    /// Synthesize the local header of a new entry.
    ///
    /// With a data descriptor the CRC and sizes are written as zero. Sizes that don't fit in 32
    /// bits (or `large_file`) add a ZIP64 record carrying both sizes.
    pub fn new(name: &str, options: &EntryOptions, raw_values: RawValues) -> ZipResult<Self> {
        let (crc32, compressed, uncompressed) = if options.uses_data_descriptor {
            (0, 0, 0)
        } else {
            (
                raw_values.crc32,
                raw_values.compressed_size,
                raw_values.uncompressed_size,
            )
        };
        let zip64 =
            Zip64ExtendedInformation::local_header(uncompressed, compressed, options.large_file);

        let extra = zip64.map(|zip64| zip64.serialize()).unwrap_or_default();

        let Ok(file_name_length) = u16::try_from(name.len()) else {
            invalid!("File name is too long")
        };
        let Ok(extra_field_length) = u16::try_from(extra.len()) else {
            invalid!("Extra data field is too large")
        };

        let mut flags = 0;
        if !name.is_ascii() {
            flags |= spec::FLAG_UTF8;
        }
        if options.uses_data_descriptor {
            flags |= spec::FLAG_DATA_DESCRIPTOR;
        }
        let (compressed_size, uncompressed_size) = match zip64 {
            Some(_) => (u32::MAX, u32::MAX),
            None => (compressed as u32, uncompressed as u32),
        };

        Ok(Self {
            version_needed_to_extract: if zip64.is_some() {
                spec::ZIP64_VERSION_NEEDED
            } else {
                spec::DEFAULT_VERSION_NEEDED
            },
            general_purpose_bit_flag: flags,
            compression_method: options.compression_method.to_u16(),
            last_mod_file_time: options.last_modified_time.timepart(),
            last_mod_file_date: options.last_modified_time.datepart(),
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
            file_name: name.as_bytes().into(),
            extra_field: extra,
        })
    }

    pub const fn is_encrypted(&self) -> bool {
        self.general_purpose_bit_flag & spec::FLAG_ENCRYPTED != 0
    }

    pub const fn uses_data_descriptor(&self) -> bool {
        self.general_purpose_bit_flag & spec::FLAG_DATA_DESCRIPTOR != 0
    }

    pub const fn uses_utf8_path_encoding(&self) -> bool {
        self.general_purpose_bit_flag & spec::FLAG_UTF8 != 0
    }

    pub const fn compression_method(&self) -> CompressionMethod {
        CompressionMethod::from_u16(self.compression_method)
    }

    pub const fn last_modified(&self) -> DateTime {
        DateTime::from_msdos(self.last_mod_file_date, self.last_mod_file_time)
    }

    /// The ZIP64 record, decoded according to which size fields are saturated.
    pub fn zip64_extended_information(&self) -> Option<Zip64ExtendedInformation> {
        let mut fields = Vec::with_capacity(2);
        if self.uncompressed_size == u32::MAX {
            fields.push(Zip64Field::UncompressedSize);
        }
        if self.compressed_size == u32::MAX {
            fields.push(Zip64Field::CompressedSize);
        }
        Zip64ExtendedInformation::parse(&self.extra_field, &fields)
    }

    pub fn effective_compressed_size(&self) -> u64 {
        resolve_effective(
            self.compressed_size.into(),
            self.zip64_extended_information()
                .and_then(|zip64| zip64.compressed_size),
        )
    }

    pub fn effective_uncompressed_size(&self) -> u64 {
        resolve_effective(
            self.uncompressed_size.into(),
            self.zip64_extended_information()
                .and_then(|zip64| zip64.uncompressed_size),
        )
    }

    /// Bytes between the start of this header and the start of the payload.
    pub fn header_size(&self) -> u64 {
        Self::FIXED_SIZE as u64
            + u64::from(self.file_name_length)
            + u64::from(self.extra_field_length)
    }
}

impl ZipStructure for LocalFileHeader {
    type Block = ZipLocalEntryBlock;

    fn variable_lengths(block: &ZipLocalEntryBlock) -> Vec<usize> {
        vec![
            usize::from(block.file_name_length),
            usize::from(block.extra_field_length),
        ]
    }

    fn from_parts(block: ZipLocalEntryBlock, variable: Vec<Box<[u8]>>) -> Option<Self> {
        let [file_name, extra_field] = <[Box<[u8]>; 2]>::try_from(variable).ok()?;
        let ZipLocalEntryBlock {
            // magic,
            version_needed_to_extract,
            flags,
            compression_method,
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
            ..
        } = block;
        Some(Self {
            version_needed_to_extract,
            general_purpose_bit_flag: flags,
            compression_method,
            last_mod_file_time: last_mod_time,
            last_mod_file_date: last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
            file_name,
            extra_field,
        })
    }

    fn block(&self) -> ZipLocalEntryBlock {
        ZipLocalEntryBlock {
            magic: spec::LOCAL_FILE_HEADER_SIGNATURE,
            version_needed_to_extract: self.version_needed_to_extract,
            flags: self.general_purpose_bit_flag,
            compression_method: self.compression_method,
            last_mod_time: self.last_mod_file_time,
            last_mod_date: self.last_mod_file_date,
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            file_name_length: self.file_name_length,
            extra_field_length: self.extra_field_length,
        }
    }

    fn variable_blocks(&self) -> Vec<&[u8]> {
        vec![&self.file_name, &self.extra_field]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::spec::Block;

    fn sample() -> LocalFileHeader {
        LocalFileHeader::new(
            "test.txt",
            &EntryOptions::default(),
            RawValues {
                crc32: 0x3610a686,
                compressed_size: 7,
                uncompressed_size: 5,
            },
        )
        .unwrap()
    }

    #[test]
    fn fixed_size() {
        assert_eq!(LocalFileHeader::FIXED_SIZE, 30);
    }

    #[test]
    fn encode_layout() {
        let header = sample();
        let bytes = header.encode();
        assert_eq!(bytes.len(), 30 + 8);
        assert_eq!(&bytes[..4], b"PK\x03\x04");
        assert_eq!(&bytes[4..6], &[20, 0]);
        assert_eq!(&bytes[14..18], &0x3610a686u32.to_le_bytes());
        assert_eq!(&bytes[18..22], &7u32.to_le_bytes());
        assert_eq!(&bytes[22..26], &5u32.to_le_bytes());
        assert_eq!(&bytes[26..28], &8u16.to_le_bytes());
        assert_eq!(&bytes[30..], b"test.txt");
        assert_eq!(header.header_size(), 38);
    }

    #[test]
    fn round_trip() {
        let header = sample();
        assert_eq!(LocalFileHeader::from_bytes(&header.encode()), Some(header));
    }

    #[test]
    fn wrong_signature() {
        let mut bytes = sample().encode();
        bytes[3] = 0x02;
        assert_eq!(LocalFileHeader::from_bytes(&bytes), None);
        assert_eq!(ZipLocalEntryBlock::interpret(&bytes[..30]).map(|b| b.magic()), None);
    }

    #[test]
    fn data_descriptor_zeroes_values() {
        let header = LocalFileHeader::new(
            "stream.bin",
            &EntryOptions::default().data_descriptor(true),
            RawValues {
                crc32: 1,
                compressed_size: 2,
                uncompressed_size: 3,
            },
        )
        .unwrap();
        assert!(header.uses_data_descriptor());
        assert_eq!(header.crc32, 0);
        assert_eq!(header.compressed_size, 0);
        assert_eq!(header.uncompressed_size, 0);
    }

    #[test]
    fn large_sizes_use_zip64() {
        let raw = RawValues {
            crc32: 0,
            compressed_size: 0x1_2345_6789,
            uncompressed_size: 0x2_0000_0000,
        };
        let header = LocalFileHeader::new("big", &EntryOptions::default(), raw).unwrap();
        assert_eq!(header.version_needed_to_extract, 45);
        assert_eq!(header.compressed_size, u32::MAX);
        assert_eq!(header.uncompressed_size, u32::MAX);
        assert_eq!(header.extra_field_length, 20);
        assert_eq!(header.effective_compressed_size(), 0x1_2345_6789);
        assert_eq!(header.effective_uncompressed_size(), 0x2_0000_0000);

        let decoded = LocalFileHeader::from_bytes(&header.encode()).unwrap();
        assert_eq!(decoded.effective_uncompressed_size(), 0x2_0000_0000);
    }

    #[test]
    fn non_ascii_name_sets_utf8_flag() {
        let header = LocalFileHeader::new(
            "\u{00e9}t\u{00e9}.txt",
            &EntryOptions::default(),
            RawValues::default(),
        )
        .unwrap();
        assert!(header.uses_utf8_path_encoding());
        assert!(!sample().uses_utf8_path_encoding());
    }

    #[test]
    fn oversized_name_is_rejected() {
        let name = "a".repeat(usize::from(u16::MAX) + 1);
        assert!(
            LocalFileHeader::new(&name, &EntryOptions::default(), RawValues::default()).is_err()
        );
    }
}
