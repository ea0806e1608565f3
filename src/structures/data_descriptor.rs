//! Data descriptors follow the payload of entries written before their sizes were known.
//!
//! The classic form stores the sizes in 32 bits and the ZIP64 form in 64 bits. Both start with
//! a signature; entries whose descriptor omits it are treated as having none.

use crate::spec::{self, Magic, ZipStructure};

#[derive(Copy, Clone, Debug)]
#[repr(packed)]
pub struct DataDescriptorBlock32 {
    pub magic: Magic,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl_block!(
    DataDescriptorBlock32,
    spec::DATA_DESCRIPTOR_SIGNATURE,
    [
        (magic, Magic),
        (crc32, u32),
        (compressed_size, u32),
        (uncompressed_size, u32),
    ]
);

#[derive(Copy, Clone, Debug)]
#[repr(packed)]
pub struct DataDescriptorBlock64 {
    pub magic: Magic,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

impl_block!(
    DataDescriptorBlock64,
    spec::DATA_DESCRIPTOR_SIGNATURE,
    [
        (magic, Magic),
        (crc32, u32),
        (compressed_size, u64),
        (uncompressed_size, u64),
    ]
);

/// CRC and sizes stored after an entry's payload, with sizes of width `T`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DataDescriptor<T> {
    pub crc32: u32,
    pub compressed_size: T,
    pub uncompressed_size: T,
}

pub type ZipDataDescriptor = DataDescriptor<u32>;
pub type Zip64DataDescriptor = DataDescriptor<u64>;

impl<T> DataDescriptor<T> {
    pub const fn new(crc32: u32, compressed_size: T, uncompressed_size: T) -> Self {
        Self {
            crc32,
            compressed_size,
            uncompressed_size,
        }
    }
}

macro_rules! impl_data_descriptor {
    ($width:ty, $block:ident) => {
        impl ZipStructure for DataDescriptor<$width> {
            type Block = $block;

            fn variable_lengths(_block: &$block) -> Vec<usize> {
                Vec::new()
            }

            fn from_parts(block: $block, _variable: Vec<Box<[u8]>>) -> Option<Self> {
                let $block {
                    crc32,
                    compressed_size,
                    uncompressed_size,
                    ..
                } = block;
                Some(Self::new(crc32, compressed_size, uncompressed_size))
            }

            fn block(&self) -> $block {
                $block {
                    magic: spec::DATA_DESCRIPTOR_SIGNATURE,
                    crc32: self.crc32,
                    compressed_size: self.compressed_size,
                    uncompressed_size: self.uncompressed_size,
                }
            }

            fn variable_blocks(&self) -> Vec<&[u8]> {
                Vec::new()
            }
        }
    };
}

impl_data_descriptor!(u32, DataDescriptorBlock32);
impl_data_descriptor!(u64, DataDescriptorBlock64);
