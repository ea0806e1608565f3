//! Bounded reads and writes at the current position of a byte store
//!
//! The store is positioned by the caller; nothing here seeks, buffers or retries. A store that
//! hands back fewer bytes than asked for (or takes fewer than offered) is a hard failure, since a
//! truncated header or payload leaves the archive inconsistent.

use std::io::{Read, Write};

use crate::config::Config;
use crate::result::{ZipError, ZipResult};

/// Reads exactly `len` bytes from the current position.
///
/// A read error (including [`std::io::ErrorKind::Interrupted`]) or reaching the end of the
/// store early yields [`ZipError::UnreadableFile`].
pub fn read_chunk<R: Read + ?Sized>(reader: &mut R, len: usize) -> ZipResult<Vec<u8>> {
    let mut chunk = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        match reader.read(&mut chunk[filled..]) {
            Ok(0) => return Err(ZipError::short_read(len, filled)),
            Ok(count) => filled += count,
            Err(err) => return Err(ZipError::UnreadableFile(err)),
        }
    }
    Ok(chunk)
}

/// Writes all of `data` at the current position and returns the number of bytes written.
///
/// A write error or a store that stops accepting bytes yields [`ZipError::UnwritableFile`]
/// carrying the count that did make it out.
pub fn write_chunk<W: Write + ?Sized>(writer: &mut W, data: &[u8]) -> ZipResult<usize> {
    let mut written = 0;
    while written < data.len() {
        match writer.write(&data[written..]) {
            Ok(0) => return Err(ZipError::short_write(data.len(), written as u64)),
            Ok(count) => written += count,
            Err(source) => {
                return Err(ZipError::UnwritableFile {
                    written: written as u64,
                    source,
                });
            }
        }
    }
    Ok(written)
}

/// Writes `data` in pieces of at most [`DEFAULT_LARGE_WRITE_CHUNK_SIZE`] bytes.
///
/// [`DEFAULT_LARGE_WRITE_CHUNK_SIZE`]: crate::config::DEFAULT_LARGE_WRITE_CHUNK_SIZE
pub fn write_large_chunk<W: Write + ?Sized>(writer: &mut W, data: &[u8]) -> ZipResult<u64> {
    write_large_chunk_with_config(writer, data, &Config::default())
}

/// Writes `data` in pieces of at most `config.large_write_chunk_size` bytes.
///
/// From the caller's side this behaves like [`write_chunk`]: the total is returned on success,
/// and a failing piece aborts the write with the running total of bytes already written.
pub fn write_large_chunk_with_config<W: Write + ?Sized>(
    writer: &mut W,
    data: &[u8],
    config: &Config,
) -> ZipResult<u64> {
    let mut total: u64 = 0;
    for piece in data.chunks(config.large_write_chunk_size.max(1)) {
        match write_chunk(writer, piece) {
            Ok(count) => total += count as u64,
            Err(ZipError::UnwritableFile { written, source }) => {
                return Err(ZipError::UnwritableFile {
                    written: total + written,
                    source,
                });
            }
            Err(err) => return Err(err),
        }
    }
    Ok(total)
}
