use crate::extra_fields::{Zip64ExtendedInformation, Zip64Field, contains_tag, resolve_effective};
use crate::result::{ZipResult, invalid};
use crate::spec::{self, Magic, ZipStructure};
use crate::types::{CompressionMethod, DEFAULT_VERSION, EntryOptions, RawValues, System};

use super::LocalFileHeader;

#[derive(Copy, Clone, Debug)]
#[repr(packed)]
pub struct ZipCentralEntryBlock {
    pub magic: Magic,
    pub version_made_by: u16,
    pub version_to_extract: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_length: u16,
    pub extra_field_length: u16,
    pub file_comment_length: u16,
    pub disk_number: u16,
    pub internal_file_attributes: u16,
    pub external_file_attributes: u32,
    pub offset: u32,
}

impl_block!(
    ZipCentralEntryBlock,
    spec::CENTRAL_DIRECTORY_HEADER_SIGNATURE,
    [
        (magic, Magic),
        (version_made_by, u16),
        (version_to_extract, u16),
        (flags, u16),
        (compression_method, u16),
        (last_mod_time, u16),
        (last_mod_date, u16),
        (crc32, u32),
        (compressed_size, u32),
        (uncompressed_size, u32),
        (file_name_length, u16),
        (extra_field_length, u16),
        (file_comment_length, u16),
        (disk_number, u16),
        (internal_file_attributes, u16),
        (external_file_attributes, u32),
        (offset, u32),
    ]
);

/// A record of the central directory.
///
/// This is the authoritative description of an entry: when it disagrees with the local header,
/// readers should believe this one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CentralDirectoryStructure {
    pub version_made_by: u16,
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
    pub file_comment_length: u16,
    pub disk_number_start: u16,
    pub internal_file_attributes: u16,
    pub external_file_attributes: u32,
    pub relative_offset_of_local_header: u32,
    pub file_name: Box<[u8]>,
    pub extra_field: Box<[u8]>,
    pub file_comment: Box<[u8]>,
}

impl CentralDirectoryStructure {
    /// Describe an entry whose local header was written at `header_start`.
    ///
    /// `raw_values` are the final CRC and sizes, which the local header may not carry when it
    /// is followed by a data descriptor.
    pub fn new(
        local: &LocalFileHeader,
        options: &EntryOptions,
        raw_values: RawValues,
        header_start: u64,
        comment: &[u8],
    ) -> ZipResult<Self> {
        let Ok(file_comment_length) = u16::try_from(comment.len()) else {
            invalid!("File comment is too long")
        };
        let version_made_by =
            (u16::from(u8::from(options.system)) << 8) | u16::from(DEFAULT_VERSION);
        let mut cds = Self {
            version_made_by,
            version_needed_to_extract: local.version_needed_to_extract,
            general_purpose_bit_flag: local.general_purpose_bit_flag,
            compression_method: local.compression_method,
            last_mod_file_time: local.last_mod_file_time,
            last_mod_file_date: local.last_mod_file_date,
            crc32: raw_values.crc32,
            compressed_size: 0,
            uncompressed_size: 0,
            file_name_length: local.file_name_length,
            extra_field_length: 0,
            file_comment_length,
            disk_number_start: 0,
            internal_file_attributes: 0,
            external_file_attributes: options.external_file_attributes(),
            relative_offset_of_local_header: 0,
            file_name: local.file_name.clone(),
            extra_field: Box::default(),
            file_comment: comment.into(),
        };
        cds.set_values(
            raw_values.uncompressed_size,
            raw_values.compressed_size,
            header_start,
            None,
            &local.extra_field,
        )?;
        Ok(cds)
    }

    /// A copy of this record pointing at a local header moved to `header_start`.
    ///
    /// The ZIP64 record is rebuilt, so the offset is promoted or demoted as needed.
    pub fn relocated(&self, header_start: u64) -> ZipResult<Self> {
        let mut cds = self.clone();
        let disk_number = self
            .zip64_extended_information()
            .and_then(|zip64| zip64.disk_number_start);
        cds.set_values(
            self.effective_uncompressed_size(),
            self.effective_compressed_size(),
            header_start,
            disk_number,
            &self.extra_field,
        )?;
        Ok(cds)
    }

    fn set_values(
        &mut self,
        uncompressed_size: u64,
        compressed_size: u64,
        header_start: u64,
        disk_number: Option<u32>,
        extra_field: &[u8],
    ) -> ZipResult<()> {
        let mut zip64 = Zip64ExtendedInformation::central_header(
            uncompressed_size,
            compressed_size,
            header_start,
        );
        if let Some(disk_number) = disk_number {
            zip64.get_or_insert_default().disk_number_start = Some(disk_number);
        }

        let mut extra = Vec::with_capacity(extra_field.len() + 32);
        if let Some(zip64) = &zip64 {
            extra.extend_from_slice(&zip64.serialize());
        }
        extra.extend_from_slice(&Zip64ExtendedInformation::strip_from(extra_field));
        let Ok(extra_field_length) = u16::try_from(extra.len()) else {
            invalid!("Extra data field is too large")
        };

        let saturate = |value: u64| value.min(spec::ZIP64_BYTES_THR) as u32;
        self.uncompressed_size = saturate(uncompressed_size);
        self.compressed_size = saturate(compressed_size);
        self.relative_offset_of_local_header = saturate(header_start);
        if disk_number.is_some() {
            self.disk_number_start = spec::ZIP64_DISK_THR;
        }
        if zip64.is_some() {
            self.version_needed_to_extract =
                self.version_needed_to_extract.max(spec::ZIP64_VERSION_NEEDED);
        }
        self.extra_field_length = extra_field_length;
        self.extra_field = extra.into_boxed_slice();
        Ok(())
    }

    pub const fn uses_data_descriptor(&self) -> bool {
        self.general_purpose_bit_flag & spec::FLAG_DATA_DESCRIPTOR != 0
    }

    pub const fn uses_utf8_path_encoding(&self) -> bool {
        self.general_purpose_bit_flag & spec::FLAG_UTF8 != 0
    }

    pub const fn is_encrypted(&self) -> bool {
        self.general_purpose_bit_flag & spec::FLAG_ENCRYPTED != 0
    }

    /// Some writers add a ZIP64 record without raising the version needed, so both are checked.
    pub fn is_zip64(&self) -> bool {
        (self.version_needed_to_extract & 0xff) >= spec::ZIP64_VERSION_NEEDED
            || contains_tag(&self.extra_field, spec::ZIP64_EXTRA_FIELD_TAG)
    }

    /// Host system that created the entry.
    pub fn system(&self) -> System {
        System::from((self.version_made_by >> 8) as u8)
    }

    pub const fn compression_method(&self) -> CompressionMethod {
        CompressionMethod::from_u16(self.compression_method)
    }

    pub fn zip64_extended_information(&self) -> Option<Zip64ExtendedInformation> {
        let mut fields = Vec::with_capacity(4);
        if self.uncompressed_size == u32::MAX {
            fields.push(Zip64Field::UncompressedSize);
        }
        if self.compressed_size == u32::MAX {
            fields.push(Zip64Field::CompressedSize);
        }
        if self.relative_offset_of_local_header == u32::MAX {
            fields.push(Zip64Field::RelativeOffsetOfLocalHeader);
        }
        if self.disk_number_start == spec::ZIP64_DISK_THR {
            fields.push(Zip64Field::DiskNumberStart);
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

    pub fn effective_relative_offset_of_local_header(&self) -> u64 {
        resolve_effective(
            self.relative_offset_of_local_header.into(),
            self.zip64_extended_information()
                .and_then(|zip64| zip64.relative_offset_of_local_header),
        )
    }

    pub fn effective_disk_number_start(&self) -> u32 {
        resolve_effective(
            self.disk_number_start.into(),
            self.zip64_extended_information()
                .and_then(|zip64| zip64.disk_number_start)
                .map(u64::from),
        ) as u32
    }
}

impl ZipStructure for CentralDirectoryStructure {
    type Block = ZipCentralEntryBlock;

    fn variable_lengths(block: &ZipCentralEntryBlock) -> Vec<usize> {
        vec![
            usize::from(block.file_name_length),
            usize::from(block.extra_field_length),
            usize::from(block.file_comment_length),
        ]
    }

    fn from_parts(block: ZipCentralEntryBlock, variable: Vec<Box<[u8]>>) -> Option<Self> {
        let [file_name, extra_field, file_comment] =
            <[Box<[u8]>; 3]>::try_from(variable).ok()?;
        let ZipCentralEntryBlock {
            // magic,
            version_made_by,
            version_to_extract,
            flags,
            compression_method,
            last_mod_time,
            last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
            file_comment_length,
            disk_number,
            internal_file_attributes,
            external_file_attributes,
            offset,
            ..
        } = block;
        Some(Self {
            version_made_by,
            version_needed_to_extract: version_to_extract,
            general_purpose_bit_flag: flags,
            compression_method,
            last_mod_file_time: last_mod_time,
            last_mod_file_date: last_mod_date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
            file_comment_length,
            disk_number_start: disk_number,
            internal_file_attributes,
            external_file_attributes,
            relative_offset_of_local_header: offset,
            file_name,
            extra_field,
            file_comment,
        })
    }

    fn block(&self) -> ZipCentralEntryBlock {
        ZipCentralEntryBlock {
            magic: spec::CENTRAL_DIRECTORY_HEADER_SIGNATURE,
            version_made_by: self.version_made_by,
            version_to_extract: self.version_needed_to_extract,
            flags: self.general_purpose_bit_flag,
            compression_method: self.compression_method,
            last_mod_time: self.last_mod_file_time,
            last_mod_date: self.last_mod_file_date,
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            file_name_length: self.file_name_length,
            extra_field_length: self.extra_field_length,
            file_comment_length: self.file_comment_length,
            disk_number: self.disk_number_start,
            internal_file_attributes: self.internal_file_attributes,
            external_file_attributes: self.external_file_attributes,
            offset: self.relative_offset_of_local_header,
        }
    }

    fn variable_blocks(&self) -> Vec<&[u8]> {
        vec![&self.file_name, &self.extra_field, &self.file_comment]
    }
}
