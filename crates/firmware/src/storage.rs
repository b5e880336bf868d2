//! Configuration storage backend (joystick unit)
//!
//! Drives the board's I2C EEPROM behind the `Storage` trait from
//! `joylink-core`: 16-bit addressing, page writes of at most 64 bytes,
//! a fixed settle delay after every write cycle.

use embassy_rp::i2c;
use embassy_rp::peripherals::I2C0;
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{block_for, Duration};
use embedded_hal::i2c::I2c;
use portable_atomic::Ordering;

use joylink_core::config::{ConfigStore, Storage, StorageError, STORAGE_SIZE};

use crate::channels::{ReloadNotifier, STORAGE_FATAL};
use crate::config::{EEPROM_I2C_ADDR, EEPROM_PAGE_SIZE, EEPROM_WRITE_SETTLE_MS};

pub type BoardStorage = EepromStorage<i2c::I2c<'static, I2C0, i2c::Blocking>>;
pub type BoardConfigStore = ConfigStore<BoardStorage, ReloadNotifier>;

/// The one config store, shared between the exchange task and whatever
/// front end mutates the configuration.
pub static CONFIG: Mutex<ThreadModeRawMutex, Option<BoardConfigStore>> = Mutex::new(None);

pub struct EepromStorage<B> {
    bus: B,
    addr: u8,
}

impl<B: I2c> EepromStorage<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            addr: EEPROM_I2C_ADDR,
        }
    }

    fn check_bounds(addr: u32, len: usize) -> Result<(), StorageError> {
        if addr as usize + len > STORAGE_SIZE {
            return Err(StorageError::OutOfBounds);
        }
        Ok(())
    }

    /// A failing bus leaves the persisted image untrustworthy; flag it for
    /// the supervisor, which escalates to a system reset.
    fn bus_error() -> StorageError {
        STORAGE_FATAL.store(true, Ordering::Relaxed);
        StorageError::Bus
    }
}

impl<B: I2c> Storage for EepromStorage<B> {
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), StorageError> {
        Self::check_bounds(addr, buf.len())?;
        let pointer = (addr as u16).to_be_bytes();
        self.bus
            .write_read(self.addr, &pointer, buf)
            .map_err(|_| Self::bus_error())
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<(), StorageError> {
        Self::check_bounds(addr, data.len())?;
        let mut offset = 0;
        while offset < data.len() {
            let at = addr as usize + offset;
            // Never cross a page boundary within one write cycle.
            let page_room = EEPROM_PAGE_SIZE - (at % EEPROM_PAGE_SIZE);
            let len = page_room.min(data.len() - offset);

            let mut frame = [0u8; 2 + EEPROM_PAGE_SIZE];
            frame[..2].copy_from_slice(&(at as u16).to_be_bytes());
            frame[2..2 + len].copy_from_slice(&data[offset..offset + len]);
            self.bus
                .write(self.addr, &frame[..2 + len])
                .map_err(|_| Self::bus_error())?;
            block_for(Duration::from_millis(EEPROM_WRITE_SETTLE_MS));
            offset += len;
        }
        Ok(())
    }
}
