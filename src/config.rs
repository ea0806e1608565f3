/// Size of the pieces [`write_large_chunk`](crate::chunked::write_large_chunk) hands to the
/// store, 32 MiB.
pub const DEFAULT_LARGE_WRITE_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// Tunables for the chunked I/O helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Config {
    /// Upper bound on the bytes passed to a single write by the large-write path.
    pub large_write_chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            large_write_chunk_size: DEFAULT_LARGE_WRITE_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Sets the piece size of the large-write path. Zero is treated as one.
    #[must_use]
    pub const fn large_write_chunk_size(mut self, size: usize) -> Self {
        self.large_write_chunk_size = if size == 0 { 1 } else { size };
        self
    }
}
