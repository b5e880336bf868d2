//! Persistent storage abstraction
//!
//! The firmware backs this with an I2C EEPROM; host tests use
//! [`MemStorage`]. Addressing is byte-granular over a fixed-size image of
//! 33 units of 256 bytes (one global unit plus 32 profile slots).

/// Total image size: one 256-byte global unit plus 32 profile units.
pub const STORAGE_SIZE: usize = 33 * 256;

/// Largest write issued in a single storage call. Matches the EEPROM page
/// size; backends still split unaligned writes at page boundaries.
pub const WRITE_CHUNK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Access past the end of the image.
    OutOfBounds,
    /// The backing bus reported a failure.
    Bus,
}

/// Byte-addressable persistent storage.
pub trait Storage {
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Writes `data` at `addr`. Callers keep `data.len() <= WRITE_CHUNK`.
    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), StorageError>;
}

/// In-memory storage backend for host tests and tooling.
pub struct MemStorage {
    pub data: [u8; STORAGE_SIZE],
    /// Largest single write seen, for asserting chunking behavior.
    pub max_write_len: usize,
    /// When set, every write fails. Lets tests exercise error paths.
    pub fail_writes: bool,
}

impl MemStorage {
    /// Blank (all `0xFF`) image, like an erased EEPROM.
    pub fn new() -> Self {
        Self {
            data: [0xFF; STORAGE_SIZE],
            max_write_len: 0,
            fail_writes: false,
        }
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemStorage {
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), StorageError> {
        let addr = addr as usize;
        let end = addr.checked_add(buf.len()).ok_or(StorageError::OutOfBounds)?;
        if end > STORAGE_SIZE {
            return Err(StorageError::OutOfBounds);
        }
        buf.copy_from_slice(&self.data[addr..end]);
        Ok(())
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Bus);
        }
        let addr = addr as usize;
        let end = addr.checked_add(data.len()).ok_or(StorageError::OutOfBounds)?;
        if end > STORAGE_SIZE {
            return Err(StorageError::OutOfBounds);
        }
        self.data[addr..end].copy_from_slice(data);
        self.max_write_len = self.max_write_len.max(data.len());
        Ok(())
    }
}
