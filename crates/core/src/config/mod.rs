//! Configuration model and persistence
//!
//! Two records are persisted: one [`GlobalConfig`] (board-level switch and
//! calibration tables) and up to 32 [`Profile`] slots. The store keeps the
//! global record and the currently loaded profile in memory and writes
//! every mutation through to storage at fixed field offsets, so a power
//! loss between mutations never leaves a half-written record.

mod layout;
mod storage;
mod store;
mod types;

pub use storage::{MemStorage, Storage, StorageError, STORAGE_SIZE, WRITE_CHUNK};
pub use store::{ChangeKind, ChangeSink, ConfigError, ConfigStore, ProfileSummary};
pub use types::{
    AnalogSource, AxisCalibration, GlobalConfig, PortSwitch, Profile, ProfileKind, SwitchKind,
    NUM_AXES, NUM_PORTS, NUM_SLOTS,
};
