//! CRC-32 as used by ZIP (IEEE 802.3 polynomial, reflected, same as zlib)
//!
//! Every function takes a running checksum so a payload can be hashed piecewise:
//! `crc32(crc32(0, a), b) == crc32(0, [a, b].concat())`. Start a fresh computation with `0`.

use std::io;
use std::io::prelude::*;

const POLYNOMIAL: u32 = 0xedb8_8320;

static CRC32_TABLE: [u32; 256] = make_table();

const fn make_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { POLYNOMIAL ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// Table-driven CRC-32 of `data`, continuing from `checksum`.
pub fn crc32(checksum: u32, data: &[u8]) -> u32 {
    let mut crc = !checksum;
    for &byte in data {
        crc = CRC32_TABLE[((crc ^ u32::from(byte)) & 0xff) as usize] ^ (crc >> 8);
    }
    !crc
}

/// The same checksum computed by [`crc32fast`], which picks a SIMD kernel when available.
pub fn crc32_delegate(checksum: u32, data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(checksum);
    hasher.update(data);
    hasher.finalize()
}

/// Reader that validates the CRC32 when it reaches the EOF.
#[derive(Debug)]
pub struct Crc32Reader<R> {
    inner: R,
    checksum: u32,
    expected: u32,
}

impl<R> Crc32Reader<R> {
    /// Get a new Crc32Reader which checks the inner reader against `expected`.
    pub const fn new(inner: R, expected: u32) -> Self {
        Crc32Reader {
            inner,
            checksum: 0,
            expected,
        }
    }

    /// Checksum of the bytes read so far.
    pub const fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Crc32Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        /* An empty buffer still pulls from the source so that i/o errors surface. */
        if buf.is_empty() {
            return self.inner.read(buf);
        }

        let count = self.inner.read(buf)?;
        if count == 0 {
            if self.checksum != self.expected {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "Invalid checksum: expected {:#010x}, got {:#010x}",
                        self.expected, self.checksum
                    ),
                ));
            }
            return Ok(0);
        }
        self.checksum = crc32(self.checksum, &buf[..count]);
        Ok(count)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Deterministic filler so the comparisons cover more than hand-picked strings.
    fn pseudo_random(len: usize, mut state: u32) -> Vec<u8> {
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn known_values() {
        assert_eq!(crc32(0, b""), 0);
        assert_eq!(crc32(0, b"1234"), 0x9be3e0a3);
        assert_eq!(crc32(0, b"123456789"), 0xcbf43926);
        assert_eq!(
            crc32(0, b"The quick brown fox jumps over the lazy dog"),
            0x414fa339
        );
    }

    #[test]
    fn table_matches_delegate() {
        for (len, seed) in [(0, 1), (1, 2), (7, 3), (64, 4), (1000, 5), (65_537, 6)] {
            let data = pseudo_random(len, seed);
            assert_eq!(crc32(0, &data), crc32_delegate(0, &data), "len {len}");
            assert_eq!(
                crc32(0xdead_beef, &data),
                crc32_delegate(0xdead_beef, &data),
                "len {len}"
            );
        }
    }

    #[test]
    fn checksums_compose() {
        let data = pseudo_random(4096, 42);
        let whole = crc32(0, &data);
        for split in [0, 1, 100, 2048, 4095, 4096] {
            let (a, b) = data.split_at(split);
            assert_eq!(crc32(crc32(0, a), b), whole, "split at {split}");
            assert_eq!(crc32_delegate(crc32(0, a), b), whole, "split at {split}");
        }
    }

    #[test]
    fn test_empty_reader() {
        let data: &[u8] = b"";
        let mut buf = [0; 1];

        let mut reader = Crc32Reader::new(data, 0);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);

        let mut reader = Crc32Reader::new(data, 1);
        assert!(
            reader
                .read(&mut buf)
                .unwrap_err()
                .to_string()
                .contains("Invalid checksum")
        );
    }

    #[test]
    fn test_byte_by_byte() {
        let data: &[u8] = b"1234";
        let mut buf = [0; 1];

        let mut reader = Crc32Reader::new(data, 0x9be3e0a3);
        for _ in 0..4 {
            assert_eq!(reader.read(&mut buf).unwrap(), 1);
        }
        assert_eq!(reader.checksum(), 0x9be3e0a3);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        // Can keep reading 0 bytes after the end
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_zero_read() {
        let data: &[u8] = b"1234";
        let mut buf = [0; 5];

        let mut reader = Crc32Reader::new(data, 0x9be3e0a3);
        assert_eq!(reader.read(&mut buf[..0]).unwrap(), 0);
        assert_eq!(reader.read(&mut buf).unwrap(), 4);
    }
}
