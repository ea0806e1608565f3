#![macro_use]
//! Signatures, limits and the codec shared by every on-disk record
//!
//! A record is a fixed-size little-endian prefix (a [`Block`]) followed by zero or more byte
//! blocks whose lengths are fields of that prefix. [`ZipStructure`] holds the one algorithm for
//! reading such a record: read the prefix, check the signature, read the variable blocks. Any
//! mismatch or short read makes the decoder return `None`, which lets callers probe a position
//! without treating "nothing here" as an error.

use crate::chunked::{read_chunk, write_chunk};
use crate::result::ZipResult;
use std::io::prelude::*;
use std::io::SeekFrom;

pub type Magic = u32;

pub const LOCAL_FILE_HEADER_SIGNATURE: Magic = 0x04034b50;
pub const CENTRAL_DIRECTORY_HEADER_SIGNATURE: Magic = 0x02014b50;
pub const DATA_DESCRIPTOR_SIGNATURE: Magic = 0x08074b50;

/// Tag of the ZIP64 extended information extra field.
pub const ZIP64_EXTRA_FIELD_TAG: u16 = 0x0001;

/// Classic size and offset fields holding this value have been promoted to ZIP64.
pub const ZIP64_BYTES_THR: u64 = u32::MAX as u64;
/// Same as [`ZIP64_BYTES_THR`] for the 16-bit disk number.
pub const ZIP64_DISK_THR: u16 = u16::MAX;

/// Lowest version needed to extract (major * 10 + minor) that implies ZIP64.
pub const ZIP64_VERSION_NEEDED: u16 = 45;
pub const DEFAULT_VERSION_NEEDED: u16 = 20;

/// General purpose bit flag: entry is encrypted.
pub const FLAG_ENCRYPTED: u16 = 1 << 0;
/// General purpose bit flag: CRC and sizes follow the payload in a data descriptor.
pub const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;
/// General purpose bit flag: file name and comment are UTF-8.
pub const FLAG_UTF8: u16 = 1 << 11;

/// A fixed-layout, packed record prefix stored little-endian on disk.
pub trait Block: Sized + Copy {
    /// Leading signature every valid record carries.
    const MAGIC: Magic;

    fn magic(self) -> Magic;

    /// Convert every field from its on-disk little-endian representation.
    fn from_le(self) -> Self;

    /// Convert every field into its on-disk little-endian representation.
    fn to_le(self) -> Self;

    fn deserialize(block: &[u8]) -> Self {
        assert_eq!(block.len(), size_of::<Self>());
        let block_ptr: *const Self = block.as_ptr().cast();
        unsafe { block_ptr.read_unaligned() }
    }

    fn serialize(self) -> Box<[u8]> {
        let mut out_block = vec![0u8; size_of::<Self>()];
        let out_ptr: *mut Self = out_block.as_mut_ptr().cast();
        unsafe {
            out_ptr.write_unaligned(self);
        }
        out_block.into_boxed_slice()
    }

    /// Decode a prefix, or `None` if the length or the signature is wrong.
    fn interpret(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != size_of::<Self>() {
            return None;
        }
        let block = Self::deserialize(bytes).from_le();
        if block.magic() != Self::MAGIC {
            log::trace!(
                "expected signature {:#010x}, found {:#010x}",
                Self::MAGIC,
                block.magic()
            );
            return None;
        }
        Some(block)
    }

    fn encode(self) -> Box<[u8]> {
        self.to_le().serialize()
    }
}

/// Implements [`Block`] for a `#[repr(packed)]` struct whose first field is `magic`.
macro_rules! impl_block {
    ($name:ident, $signature:expr, [$(($field:ident, $type:ty)),+ $(,)?]) => {
        impl crate::spec::Block for $name {
            const MAGIC: crate::spec::Magic = $signature;

            #[inline(always)]
            fn magic(self) -> crate::spec::Magic {
                self.magic
            }

            #[inline(always)]
            fn from_le(mut self) -> Self {
                $(self.$field = <$type>::from_le(self.$field);)+
                self
            }

            #[inline(always)]
            fn to_le(mut self) -> Self {
                $(self.$field = <$type>::to_le(self.$field);)+
                self
            }
        }
    };
}

/// A record made of a [`Block`] prefix and the variable-length blocks it declares.
pub trait ZipStructure: Sized {
    type Block: Block;

    /// Size of the fixed prefix on disk.
    const FIXED_SIZE: usize = size_of::<Self::Block>();

    /// Lengths of the trailing blocks, in file order, as declared by the prefix.
    fn variable_lengths(block: &Self::Block) -> Vec<usize>;

    /// Assemble the record from a validated prefix and its trailing blocks.
    fn from_parts(block: Self::Block, variable: Vec<Box<[u8]>>) -> Option<Self>;

    /// The prefix describing this record, in native byte order.
    fn block(&self) -> Self::Block;

    /// The trailing blocks, in file order.
    fn variable_blocks(&self) -> Vec<&[u8]>;

    /// Decode a record at the reader's current position.
    fn read<R: Read + ?Sized>(reader: &mut R) -> Option<Self> {
        let fixed = read_chunk(reader, Self::FIXED_SIZE).ok()?;
        let block = Self::Block::interpret(&fixed)?;
        let variable = Self::variable_lengths(&block)
            .into_iter()
            .map(|len| read_chunk(reader, len).ok().map(Vec::into_boxed_slice))
            .collect::<Option<Vec<_>>>()?;
        Self::from_parts(block, variable)
    }

    /// Decode a record starting at `offset`.
    fn read_at<R: Read + Seek + ?Sized>(reader: &mut R, offset: u64) -> Option<Self> {
        reader.seek(SeekFrom::Start(offset)).ok()?;
        Self::read(reader)
    }

    /// Decode a record from the start of `bytes`.
    fn from_bytes(mut bytes: &[u8]) -> Option<Self> {
        Self::read(&mut bytes)
    }

    /// Exact on-disk bytes: the prefix followed by the trailing blocks, without padding.
    fn encode(&self) -> Vec<u8> {
        let block = self.block().encode();
        let variable = self.variable_blocks();
        let mut out =
            Vec::with_capacity(block.len() + variable.iter().map(|v| v.len()).sum::<usize>());
        out.extend_from_slice(&block);
        for field in variable {
            out.extend_from_slice(field);
        }
        out
    }

    /// Number of bytes [`ZipStructure::encode`] produces.
    fn encoded_len(&self) -> usize {
        Self::FIXED_SIZE + self.variable_blocks().iter().map(|v| v.len()).sum::<usize>()
    }

    /// Write the encoded record at the writer's current position.
    fn write<W: Write + ?Sized>(&self, writer: &mut W) -> ZipResult<usize> {
        write_chunk(writer, &self.encode())
    }
}

/// Decode a `T` at `offset`, or `None` if there isn't one.
pub fn read_structure<T: ZipStructure, R: Read + Seek + ?Sized>(
    reader: &mut R,
    offset: u64,
) -> Option<T> {
    T::read_at(reader, offset)
}
