//! Types for extra fields
//!
//! An extra field block is a sequence of `(tag: u16, size: u16, payload: [u8; size])` records.
//! Some writers pad the block with fewer than four trailing bytes; those are ignored.

mod zip64_extended_information;

pub use zip64_extended_information::*;

/// Iterator over the `(tag, payload)` records of an extra field block.
///
/// Iteration ends at the first record whose declared size runs past the end of the block.
#[derive(Debug, Clone)]
pub struct ExtraFieldIter<'a> {
    rest: &'a [u8],
}

impl<'a> ExtraFieldIter<'a> {
    pub const fn new(extra_field: &'a [u8]) -> Self {
        Self { rest: extra_field }
    }
}

const RECORD_HEADER_SIZE: usize = 2 * size_of::<u16>();

impl<'a> Iterator for ExtraFieldIter<'a> {
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.len() < RECORD_HEADER_SIZE {
            return None;
        }
        let tag = u16::from_le_bytes([self.rest[0], self.rest[1]]);
        let size = usize::from(u16::from_le_bytes([self.rest[2], self.rest[3]]));
        let end = RECORD_HEADER_SIZE + size;
        let Some(payload) = self.rest.get(RECORD_HEADER_SIZE..end) else {
            log::warn!(
                "extra field {tag:#06x} declares {size} bytes but only {} remain",
                self.rest.len() - RECORD_HEADER_SIZE
            );
            self.rest = &[];
            return None;
        };
        self.rest = &self.rest[end..];
        Some((tag, payload))
    }
}

/// Whether `extra_field` contains a record tagged `tag`.
pub fn contains_tag(extra_field: &[u8], tag: u16) -> bool {
    ExtraFieldIter::new(extra_field).any(|(t, _)| t == tag)
}
