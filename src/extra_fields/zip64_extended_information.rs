//! 4.5.3 -Zip64 Extended Information Extra Field (0x0001)
//!
//! | Value                  | Size    | Description                                  |
//! | ---------------------- | ------- | -------------------------------------------- |
//! | `0x0001`               | 2 bytes | Tag for this "extra" block type              |
//! | Size                   | 2 bytes | Size of this "extra" block                   |
//! | Original Size          | 8 bytes | Original uncompressed file size              |
//! | Compressed Size        | 8 bytes | Size of compressed data                      |
//! | Relative Header Offset | 8 bytes | Offset of local header record                |
//! | Disk Start Number      | 4 bytes | Number of the disk on which this file starts |
//!
//! A field is only present when its classic counterpart in the host header is saturated, and
//! the block doesn't say which ones it carries. Decoding therefore needs the list of promoted
//! fields from the host; the values then appear in the fixed order above.

use super::ExtraFieldIter;
use crate::spec::{ZIP64_BYTES_THR, ZIP64_EXTRA_FIELD_TAG};

/// One of the values a ZIP64 block may carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Zip64Field {
    UncompressedSize,
    CompressedSize,
    RelativeOffsetOfLocalHeader,
    DiskNumberStart,
}

impl Zip64Field {
    /// File order of the fields.
    pub const ORDER: [Zip64Field; 4] = [
        Zip64Field::UncompressedSize,
        Zip64Field::CompressedSize,
        Zip64Field::RelativeOffsetOfLocalHeader,
        Zip64Field::DiskNumberStart,
    ];

    /// Encoded width in bytes.
    pub const fn size(self) -> usize {
        match self {
            Zip64Field::DiskNumberStart => size_of::<u32>(),
            _ => size_of::<u64>(),
        }
    }
}

/// Zip64 extended information extra field
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Zip64ExtendedInformation {
    pub uncompressed_size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub relative_offset_of_local_header: Option<u64>,
    pub disk_number_start: Option<u32>,
}

impl Zip64ExtendedInformation {
    /// Find the ZIP64 record in `extra_field` and decode the `fields` the host promoted.
    ///
    /// The order of `fields` doesn't matter. Fields that don't fit in the payload are left
    /// unset. Returns `None` if there is no well-formed ZIP64 record.
    pub fn parse(extra_field: &[u8], fields: &[Zip64Field]) -> Option<Self> {
        let (_, payload) =
            ExtraFieldIter::new(extra_field).find(|(tag, _)| *tag == ZIP64_EXTRA_FIELD_TAG)?;
        Some(Self::from_payload(payload, fields))
    }

    fn from_payload(mut payload: &[u8], fields: &[Zip64Field]) -> Self {
        let mut info = Self::default();
        for field in Zip64Field::ORDER.into_iter().filter(|f| fields.contains(f)) {
            let Some((value, rest)) = payload.split_at_checked(field.size()) else {
                break;
            };
            payload = rest;
            match field {
                Zip64Field::UncompressedSize => info.uncompressed_size = Some(le_u64(value)),
                Zip64Field::CompressedSize => info.compressed_size = Some(le_u64(value)),
                Zip64Field::RelativeOffsetOfLocalHeader => {
                    info.relative_offset_of_local_header = Some(le_u64(value));
                }
                Zip64Field::DiskNumberStart => {
                    info.disk_number_start = Some(le_u64(value) as u32);
                }
            }
        }
        info
    }

    /// The record a local header needs: it MUST carry both sizes once either is too large.
    pub fn local_header(uncompressed_size: u64, compressed_size: u64, force: bool) -> Option<Self> {
        let should_add_size =
            force || uncompressed_size >= ZIP64_BYTES_THR || compressed_size >= ZIP64_BYTES_THR;
        should_add_size.then_some(Self {
            uncompressed_size: Some(uncompressed_size),
            compressed_size: Some(compressed_size),
            ..Self::default()
        })
    }

    /// The record a central directory header needs: only the values that don't fit in 32 bits.
    pub fn central_header(
        uncompressed_size: u64,
        compressed_size: u64,
        header_start: u64,
    ) -> Option<Self> {
        let promote = |value: u64| (value >= ZIP64_BYTES_THR).then_some(value);
        let info = Self {
            uncompressed_size: promote(uncompressed_size),
            compressed_size: promote(compressed_size),
            relative_offset_of_local_header: promote(header_start),
            disk_number_start: None,
        };
        (info != Self::default()).then_some(info)
    }

    /// Payload size, excluding the tag and size fields.
    pub fn data_size(&self) -> u16 {
        let eight = size_of::<u64>() as u16;
        let mut size = 0;
        for present in [
            self.uncompressed_size.is_some(),
            self.compressed_size.is_some(),
            self.relative_offset_of_local_header.is_some(),
        ] {
            if present {
                size += eight;
            }
        }
        if self.disk_number_start.is_some() {
            size += size_of::<u32>() as u16;
        }
        size
    }

    /// Get the full size of the block
    pub fn full_size(&self) -> usize {
        usize::from(self.data_size()) + 2 * size_of::<u16>()
    }

    /// Serialize the block
    pub fn serialize(&self) -> Box<[u8]> {
        let mut ret = Vec::with_capacity(self.full_size());
        ret.extend(ZIP64_EXTRA_FIELD_TAG.to_le_bytes());
        ret.extend(self.data_size().to_le_bytes());
        for value in [
            self.uncompressed_size,
            self.compressed_size,
            self.relative_offset_of_local_header,
        ]
        .into_iter()
        .flatten()
        {
            ret.extend(value.to_le_bytes());
        }
        if let Some(disk_number_start) = self.disk_number_start {
            ret.extend(disk_number_start.to_le_bytes());
        }
        debug_assert_eq!(ret.len(), self.full_size());
        ret.into_boxed_slice()
    }

    /// Copy of `extra_field` without any ZIP64 records. Trailing padding is kept.
    pub fn strip_from(extra_field: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(extra_field.len());
        let mut consumed = 0;
        for (tag, payload) in ExtraFieldIter::new(extra_field) {
            let record_len = payload.len() + 2 * size_of::<u16>();
            if tag != ZIP64_EXTRA_FIELD_TAG {
                out.extend_from_slice(&extra_field[consumed..consumed + record_len]);
            }
            consumed += record_len;
        }
        out.extend_from_slice(&extra_field[consumed..]);
        out
    }
}

/// Picks the ZIP64 value over the classic one, unless it is missing or zero.
pub fn resolve_effective(classic: u64, extended: Option<u64>) -> u64 {
    match extended {
        Some(value) if value != 0 => value,
        _ => classic,
    }
}

fn le_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}
