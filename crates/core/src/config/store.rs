//! Configuration store
//!
//! Wraps a [`Storage`] backend with the typed records and the mutation
//! operations the user interface exposes. Every operation validates its
//! arguments before touching memory or storage, so a rejected call leaves
//! both untouched. Successful mutations that affect the running exchange
//! cycle notify the [`ChangeSink`] so the firmware can recompile its
//! per-cycle data (or swap tasks on a role change).
//!
//! The firmware serializes all calls through one mutex; the store itself
//! is single-threaded.

use super::layout::{self, GLOBAL_LEN, PROFILE_LEN};
use super::storage::{Storage, StorageError, STORAGE_SIZE, WRITE_CHUNK};
use super::types::{
    AnalogSource, GlobalConfig, Profile, ProfileKind, SwitchKind, NUM_AXES, NUM_PORTS, NUM_SLOTS,
};
use crate::debounce::BuddyButton;
use heapless::{String, Vec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChangeKind {
    /// Active profile or global tables changed; recompile and carry on.
    Content,
    /// The active profile's kind changed; the exchange task must be
    /// replaced with one matching the new role.
    RoleSwitch,
}

/// Receives change notifications after successful mutations.
pub trait ChangeSink {
    fn notify(&self, change: ChangeKind);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    Storage(StorageError),
    SlotOutOfRange,
    SlotInactive,
    SlotOccupied,
    SameSlot,
    AxisOutOfRange,
    PortOutOfRange,
    PortInUse,
    ChannelOutOfRange,
    CalibrationOutOfRange,
    NameTooLong,
    InvalidImage,
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        ConfigError::Storage(e)
    }
}

/// Slot listing entry for the user interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub slot: u8,
    pub kind: ProfileKind,
    pub name: String<15>,
}

pub struct ConfigStore<S: Storage, N: ChangeSink> {
    storage: S,
    sink: N,
    global: GlobalConfig,
    profile: Profile,
}

fn write_chunked<S: Storage>(storage: &mut S, addr: u32, data: &[u8]) -> Result<(), StorageError> {
    for (i, chunk) in data.chunks(WRITE_CHUNK).enumerate() {
        storage.write(addr + (i * WRITE_CHUNK) as u32, chunk)?;
    }
    Ok(())
}

impl<S: Storage, N: ChangeSink> ConfigStore<S, N> {
    /// Opens the store, seeding defaults on a blank image (missing
    /// sentinel). Loads the global record and the current profile.
    pub fn open(mut storage: S, sink: N) -> Result<Self, ConfigError> {
        let mut sentinel = [0u8; 4];
        storage.read(0, &mut sentinel)?;
        if u32::from_le_bytes(sentinel) != layout::INIT_SENTINEL {
            let global = GlobalConfig::default();
            let profile = Profile::default();
            write_chunked(
                &mut storage,
                layout::profile_addr(0),
                &layout::encode_profile(&profile),
            )?;
            write_chunked(&mut storage, 0, &layout::encode_global(&global))?;
            return Ok(Self {
                storage,
                sink,
                global,
                profile,
            });
        }

        let mut gbuf = [0u8; GLOBAL_LEN];
        storage.read(0, &mut gbuf)?;
        let global = layout::decode_global(&gbuf);
        let mut pbuf = [0u8; PROFILE_LEN];
        storage.read(layout::profile_addr(global.current_slot), &mut pbuf)?;
        let profile = layout::decode_profile(&pbuf);
        Ok(Self {
            storage,
            sink,
            global,
            profile,
        })
    }

    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn active_profile(&self) -> &Profile {
        &self.profile
    }

    pub fn current_slot(&self) -> u8 {
        self.global.current_slot
    }

    pub fn first_free_slot(&self) -> Option<u8> {
        (0..NUM_SLOTS as u8).find(|s| self.global.active_slots & (1 << s) == 0)
    }

    /// Lists all active slots with their kind and name.
    pub fn profiles(&mut self) -> Result<Vec<ProfileSummary, NUM_SLOTS>, ConfigError> {
        let mut out = Vec::new();
        for slot in 0..NUM_SLOTS as u8 {
            if self.global.active_slots & (1 << slot) == 0 {
                continue;
            }
            let mut pbuf = [0u8; PROFILE_LEN];
            self.storage.read(layout::profile_addr(slot), &mut pbuf)?;
            let p = layout::decode_profile(&pbuf);
            // Capacity equals the slot count, push cannot fail.
            let _ = out.push(ProfileSummary {
                slot,
                kind: p.kind,
                name: p.name,
            });
        }
        Ok(out)
    }

    fn require_active(&self, slot: u8) -> Result<(), ConfigError> {
        if slot as usize >= NUM_SLOTS {
            return Err(ConfigError::SlotOutOfRange);
        }
        if self.global.active_slots & (1 << slot) == 0 {
            return Err(ConfigError::SlotInactive);
        }
        Ok(())
    }

    fn require_free(&self, slot: u8) -> Result<(), ConfigError> {
        if slot as usize >= NUM_SLOTS {
            return Err(ConfigError::SlotOutOfRange);
        }
        if self.global.active_slots & (1 << slot) != 0 {
            return Err(ConfigError::SlotOccupied);
        }
        Ok(())
    }

    fn persist_global_field(&mut self, off: usize, len: usize) -> Result<(), ConfigError> {
        let buf = layout::encode_global(&self.global);
        write_chunked(&mut self.storage, off as u32, &buf[off..off + len])?;
        Ok(())
    }

    fn persist_profile_field(&mut self, off: usize, len: usize) -> Result<(), ConfigError> {
        let buf = layout::encode_profile(&self.profile);
        let base = layout::profile_addr(self.global.current_slot);
        write_chunked(&mut self.storage, base + off as u32, &buf[off..off + len])?;
        Ok(())
    }

    fn load_inner(&mut self, slot: u8) -> Result<(), ConfigError> {
        let mut pbuf = [0u8; PROFILE_LEN];
        self.storage.read(layout::profile_addr(slot), &mut pbuf)?;
        let profile = layout::decode_profile(&pbuf);
        let role_switch = profile.kind != self.profile.kind;
        self.global.current_slot = slot;
        self.profile = profile;
        self.persist_global_field(layout::G_CURRENT_SLOT, 1)?;
        self.sink.notify(if role_switch {
            ChangeKind::RoleSwitch
        } else {
            ChangeKind::Content
        });
        Ok(())
    }

    /// Makes `slot` the current profile. Loading the already-current slot
    /// is accepted and still forces a recompile.
    pub fn load(&mut self, slot: u8) -> Result<(), ConfigError> {
        self.require_active(slot)?;
        self.load_inner(slot)
    }

    /// Creates a fresh profile of `kind` in a free slot. Does not switch
    /// to it.
    pub fn create_profile(&mut self, kind: ProfileKind, slot: u8, name: &str) -> Result<(), ConfigError> {
        self.require_free(slot)?;
        let mut profile = Profile {
            kind,
            ..Profile::default()
        };
        profile.name.clear();
        profile
            .name
            .push_str(name)
            .map_err(|_| ConfigError::NameTooLong)?;
        write_chunked(
            &mut self.storage,
            layout::profile_addr(slot),
            &layout::encode_profile(&profile),
        )?;
        self.global.active_slots |= 1 << slot;
        self.persist_global_field(layout::G_ACTIVE_SLOTS, 4)?;
        Ok(())
    }

    /// Deletes `slot`. If that empties the slot mask, slot 0 is re-seeded
    /// with the default profile so at least one profile always exists.
    /// Deleting the current slot switches to the first remaining one.
    pub fn delete_profile(&mut self, slot: u8) -> Result<(), ConfigError> {
        self.require_active(slot)?;
        self.global.active_slots &= !(1 << slot);
        if self.global.active_slots == 0 {
            write_chunked(
                &mut self.storage,
                layout::profile_addr(0),
                &layout::encode_profile(&Profile::default()),
            )?;
            self.global.active_slots = 1;
        }
        self.persist_global_field(layout::G_ACTIVE_SLOTS, 4)?;
        if slot == self.global.current_slot {
            let next = self.global.active_slots.trailing_zeros() as u8;
            self.load_inner(next)?;
        }
        Ok(())
    }

    pub fn copy_profile(&mut self, src: u8, dst: u8) -> Result<(), ConfigError> {
        if src == dst {
            return Err(ConfigError::SameSlot);
        }
        self.require_active(src)?;
        self.require_free(dst)?;
        let mut pbuf = [0u8; PROFILE_LEN];
        self.storage.read(layout::profile_addr(src), &mut pbuf)?;
        write_chunked(&mut self.storage, layout::profile_addr(dst), &pbuf)?;
        self.global.active_slots |= 1 << dst;
        self.persist_global_field(layout::G_ACTIVE_SLOTS, 4)?;
        Ok(())
    }

    /// Like copy, but frees the source slot. Moving the current slot
    /// follows it to the destination without a reload.
    pub fn move_profile(&mut self, src: u8, dst: u8) -> Result<(), ConfigError> {
        if src == dst {
            return Err(ConfigError::SameSlot);
        }
        self.require_active(src)?;
        self.require_free(dst)?;
        let mut pbuf = [0u8; PROFILE_LEN];
        self.storage.read(layout::profile_addr(src), &mut pbuf)?;
        write_chunked(&mut self.storage, layout::profile_addr(dst), &pbuf)?;
        self.global.active_slots |= 1 << dst;
        self.global.active_slots &= !(1 << src);
        self.persist_global_field(layout::G_ACTIVE_SLOTS, 4)?;
        if src == self.global.current_slot {
            self.global.current_slot = dst;
            self.persist_global_field(layout::G_CURRENT_SLOT, 1)?;
        }
        Ok(())
    }

    pub fn rename_active(&mut self, name: &str) -> Result<(), ConfigError> {
        if name.len() > 15 {
            return Err(ConfigError::NameTooLong);
        }
        self.profile.name.clear();
        // Length was checked above.
        let _ = self.profile.name.push_str(name);
        self.persist_profile_field(layout::P_NAME, layout::P_NAME_LEN)?;
        self.sink.notify(ChangeKind::Content);
        Ok(())
    }

    pub fn set_axis_source(&mut self, axis: usize, source: AnalogSource) -> Result<(), ConfigError> {
        if axis >= NUM_AXES {
            return Err(ConfigError::AxisOutOfRange);
        }
        match source {
            AnalogSource::Local(n) | AnalogSource::Remote(n) if n as usize >= NUM_AXES => {
                return Err(ConfigError::ChannelOutOfRange)
            }
            _ => {}
        }
        self.profile.sources[axis] = source;
        self.persist_profile_field(layout::P_SOURCES, NUM_AXES)?;
        self.sink.notify(ChangeKind::Content);
        Ok(())
    }

    pub fn set_deadzone(&mut self, input_axis: usize, deadzone: u8) -> Result<(), ConfigError> {
        if input_axis >= NUM_AXES {
            return Err(ConfigError::AxisOutOfRange);
        }
        self.profile.deadzone[input_axis] = deadzone;
        self.persist_profile_field(layout::P_DEADZONE, NUM_AXES)?;
        self.sink.notify(ChangeKind::Content);
        Ok(())
    }

    /// Assigns a digital port to a buddy button. A port already claimed by
    /// another button of this profile is rejected.
    pub fn set_buddy_port(&mut self, button: BuddyButton, port: Option<u8>) -> Result<(), ConfigError> {
        if let Some(p) = port {
            if p as usize >= NUM_PORTS {
                return Err(ConfigError::PortOutOfRange);
            }
            for (i, assigned) in self.profile.buddy_ports.iter().enumerate() {
                if i != button.index() && *assigned == Some(p) {
                    return Err(ConfigError::PortInUse);
                }
            }
        }
        self.profile.buddy_ports[button.index()] = port;
        self.persist_profile_field(layout::P_BUDDY_PORTS, NUM_AXES)?;
        self.sink.notify(ChangeKind::Content);
        Ok(())
    }

    pub fn set_teacher_port(&mut self, port: Option<u8>) -> Result<(), ConfigError> {
        if let Some(p) = port {
            if p as usize >= NUM_PORTS {
                return Err(ConfigError::PortOutOfRange);
            }
        }
        self.profile.teacher_port = port;
        self.persist_profile_field(layout::P_TEACHER_PORT, 1)?;
        self.sink.notify(ChangeKind::Content);
        Ok(())
    }

    fn check_calibration(midpoint: u16, margin: u16) -> Result<(), ConfigError> {
        if midpoint <= 500 || midpoint >= 3594 || margin <= 100 || margin >= 2047 {
            return Err(ConfigError::CalibrationOutOfRange);
        }
        Ok(())
    }

    pub fn set_input_calibration(
        &mut self,
        axis: usize,
        midpoint: u16,
        margin: u16,
        inverted: bool,
    ) -> Result<(), ConfigError> {
        if axis >= NUM_AXES {
            return Err(ConfigError::AxisOutOfRange);
        }
        Self::check_calibration(midpoint, margin)?;
        let cal = &mut self.global.input_cal[axis];
        cal.midpoint = midpoint;
        cal.margin = margin;
        cal.inverted = inverted;
        self.persist_global_field(layout::G_IN_MIDPOINT, 2 * NUM_AXES)?;
        self.persist_global_field(layout::G_IN_MARGIN, 2 * NUM_AXES)?;
        self.persist_global_field(layout::G_IN_INVERTED, NUM_AXES)?;
        self.sink.notify(ChangeKind::Content);
        Ok(())
    }

    pub fn set_output_calibration(
        &mut self,
        axis: usize,
        midpoint: u16,
        margin: u16,
        inverted: bool,
    ) -> Result<(), ConfigError> {
        if axis >= NUM_AXES {
            return Err(ConfigError::AxisOutOfRange);
        }
        Self::check_calibration(midpoint, margin)?;
        let cal = &mut self.global.output_cal[axis];
        cal.midpoint = midpoint;
        cal.margin = margin;
        cal.inverted = inverted;
        self.persist_global_field(layout::G_OUT_MIDPOINT, 2 * NUM_AXES)?;
        self.persist_global_field(layout::G_OUT_MARGIN, 2 * NUM_AXES)?;
        self.persist_global_field(layout::G_OUT_INVERTED, NUM_AXES)?;
        self.sink.notify(ChangeKind::Content);
        Ok(())
    }

    /// Reconfigures a digital port. The second channel only exists for
    /// three-position switches and is forced unused otherwise.
    pub fn set_switch(
        &mut self,
        port: u8,
        kind: SwitchKind,
        ch1: Option<u8>,
        ch2: Option<u8>,
    ) -> Result<(), ConfigError> {
        if port as usize >= NUM_PORTS {
            return Err(ConfigError::PortOutOfRange);
        }
        for ch in [ch1, ch2].into_iter().flatten() {
            if ch >= 24 {
                return Err(ConfigError::ChannelOutOfRange);
            }
        }
        let ch2 = if kind == SwitchKind::ThreePosition {
            ch2
        } else {
            None
        };
        let sw = &mut self.global.switches[port as usize];
        sw.kind = kind;
        sw.ch1 = ch1;
        sw.ch2 = ch2;
        self.persist_global_field(layout::G_SWITCH_KINDS, NUM_PORTS)?;
        self.persist_global_field(layout::G_SWITCH_CH1, NUM_PORTS)?;
        self.persist_global_field(layout::G_SWITCH_CH2, NUM_PORTS)?;
        self.sink.notify(ChangeKind::Content);
        Ok(())
    }

    /// Routes an output axis to a physical analog channel. Channel 0 is
    /// hardwired on the remote board and cannot be reassigned.
    pub fn set_axis_channel(&mut self, axis: usize, channel: u8) -> Result<(), ConfigError> {
        if axis >= NUM_AXES {
            return Err(ConfigError::AxisOutOfRange);
        }
        if !(1..=3).contains(&channel) {
            return Err(ConfigError::ChannelOutOfRange);
        }
        self.global.axis_channels[axis] = channel;
        self.persist_global_field(layout::G_AXIS_CHANNELS, NUM_AXES)?;
        self.sink.notify(ChangeKind::Content);
        Ok(())
    }

    /// Reads the whole storage image into `buf` (`STORAGE_SIZE` bytes).
    pub fn backup_into(&mut self, buf: &mut [u8]) -> Result<(), ConfigError> {
        if buf.len() != STORAGE_SIZE {
            return Err(ConfigError::InvalidImage);
        }
        for (i, chunk) in buf.chunks_mut(WRITE_CHUNK).enumerate() {
            self.storage.read((i * WRITE_CHUNK) as u32, chunk)?;
        }
        Ok(())
    }

    /// Replaces the whole storage image and reloads from it. The image
    /// must carry the sentinel and a consistent slot mask.
    pub fn restore_backup(&mut self, image: &[u8]) -> Result<(), ConfigError> {
        if image.len() != STORAGE_SIZE {
            return Err(ConfigError::InvalidImage);
        }
        let mut gbuf = [0u8; GLOBAL_LEN];
        gbuf.copy_from_slice(&image[..GLOBAL_LEN]);
        let global = layout::decode_global(&gbuf);
        let sentinel = u32::from_le_bytes([image[0], image[1], image[2], image[3]]);
        if sentinel != layout::INIT_SENTINEL
            || global.active_slots == 0
            || global.current_slot as usize >= NUM_SLOTS
            || global.active_slots & (1 << global.current_slot) == 0
        {
            return Err(ConfigError::InvalidImage);
        }
        write_chunked(&mut self.storage, 0, image)?;

        let base = layout::profile_addr(global.current_slot) as usize;
        let mut pbuf = [0u8; PROFILE_LEN];
        pbuf.copy_from_slice(&image[base..base + PROFILE_LEN]);
        let profile = layout::decode_profile(&pbuf);
        let role_switch = profile.kind != self.profile.kind;
        self.global = global;
        self.profile = profile;
        self.sink.notify(if role_switch {
            ChangeKind::RoleSwitch
        } else {
            ChangeKind::Content
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemStorage;
    use core::cell::RefCell;

    struct RecordingSink {
        events: RefCell<Vec<ChangeKind, 32>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                events: RefCell::new(Vec::new()),
            }
        }
    }

    impl ChangeSink for RecordingSink {
        fn notify(&self, change: ChangeKind) {
            let _ = self.events.borrow_mut().push(change);
        }
    }

    fn open_default() -> ConfigStore<MemStorage, RecordingSink> {
        ConfigStore::open(MemStorage::new(), RecordingSink::new()).unwrap()
    }

    #[test]
    fn blank_storage_is_seeded_with_defaults() {
        let store = open_default();
        assert_eq!(store.global().active_slots, 1);
        assert_eq!(store.current_slot(), 0);
        assert_eq!(store.active_profile().name.as_str(), "Default");
        assert_eq!(
            &store.storage.data[0..4],
            &layout::INIT_SENTINEL.to_le_bytes()
        );
    }

    #[test]
    fn mutations_survive_reopen() {
        let mut store = open_default();
        store.set_deadzone(2, 12).unwrap();
        store.set_axis_channel(0, 3).unwrap();
        store.rename_active("Crane A").unwrap();

        let storage = store.storage;
        let store = ConfigStore::open(storage, RecordingSink::new()).unwrap();
        assert_eq!(store.active_profile().deadzone[2], 12);
        assert_eq!(store.global().axis_channels[0], 3);
        assert_eq!(store.active_profile().name.as_str(), "Crane A");
    }

    #[test]
    fn all_writes_stay_within_chunk_size() {
        let mut store = open_default();
        store.create_profile(ProfileKind::RemoteUnit, 1, "Two").unwrap();
        store.set_switch(0, SwitchKind::TwoPosition, Some(3), None).unwrap();
        store.set_input_calibration(0, 2100, 1900, true).unwrap();
        let mut image = [0u8; STORAGE_SIZE];
        store.backup_into(&mut image).unwrap();
        store.restore_backup(&image).unwrap();
        assert!(store.storage.max_write_len <= WRITE_CHUNK);
    }

    #[test]
    fn create_load_delete_flow() {
        let mut store = open_default();
        assert_eq!(store.first_free_slot(), Some(1));
        store.create_profile(ProfileKind::RemoteUnit, 1, "Crane B").unwrap();
        // Creating does not switch slots.
        assert_eq!(store.current_slot(), 0);
        assert!(store.sink.events.borrow().is_empty());

        store.load(1).unwrap();
        assert_eq!(store.current_slot(), 1);
        assert_eq!(store.active_profile().name.as_str(), "Crane B");
        assert_eq!(store.sink.events.borrow().as_slice(), &[ChangeKind::Content]);

        // Deleting the current slot falls back to the first active one.
        store.delete_profile(1).unwrap();
        assert_eq!(store.current_slot(), 0);
        assert_eq!(store.global().active_slots, 1);
        assert_eq!(store.active_profile().name.as_str(), "Default");
    }

    #[test]
    fn deleting_the_last_slot_reseeds_slot_zero() {
        let mut store = open_default();
        store.rename_active("Custom").unwrap();
        store.delete_profile(0).unwrap();
        assert_eq!(store.global().active_slots, 1);
        assert_eq!(store.current_slot(), 0);
        assert_eq!(store.active_profile().name.as_str(), "Default");
    }

    #[test]
    fn copy_and_move_respect_slot_states() {
        let mut store = open_default();
        assert_eq!(store.copy_profile(0, 0), Err(ConfigError::SameSlot));
        assert_eq!(store.copy_profile(2, 3), Err(ConfigError::SlotInactive));
        store.copy_profile(0, 2).unwrap();
        assert_eq!(store.copy_profile(0, 2), Err(ConfigError::SlotOccupied));

        // Moving the current slot follows it without a reload.
        store.sink.events.borrow_mut().clear();
        store.move_profile(0, 5).unwrap();
        assert_eq!(store.current_slot(), 5);
        assert_eq!(store.global().active_slots, (1 << 5) | (1 << 2));
        assert!(store.sink.events.borrow().is_empty());

        let names: Vec<_, 32> = store.profiles().unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].slot, 2);
        assert_eq!(names[1].slot, 5);
    }

    #[test]
    fn duplicate_buddy_port_is_rejected_without_mutation() {
        let mut store = open_default();
        store.set_buddy_port(BuddyButton::B1, Some(3)).unwrap();
        let before = store.active_profile().clone();
        store.sink.events.borrow_mut().clear();

        assert_eq!(
            store.set_buddy_port(BuddyButton::B2, Some(3)),
            Err(ConfigError::PortInUse)
        );
        assert_eq!(store.active_profile(), &before);
        assert!(store.sink.events.borrow().is_empty());

        // Re-assigning the same button is fine.
        store.set_buddy_port(BuddyButton::B1, Some(3)).unwrap();
        store.set_buddy_port(BuddyButton::B1, None).unwrap();
        store.set_buddy_port(BuddyButton::B2, Some(3)).unwrap();
    }

    #[test]
    fn calibration_bounds_are_exclusive() {
        let mut store = open_default();
        for (mid, margin) in [(500, 1000), (3594, 1000), (1000, 100), (1000, 2047)] {
            assert_eq!(
                store.set_input_calibration(0, mid, margin, false),
                Err(ConfigError::CalibrationOutOfRange)
            );
        }
        assert_eq!(store.global().input_cal[0].midpoint, 2047);
        store.set_input_calibration(0, 501, 101, false).unwrap();
        store.set_output_calibration(3, 3593, 2046, true).unwrap();
        assert_eq!(store.global().output_cal[3].midpoint, 3593);
        assert!(store.global().output_cal[3].inverted);
    }

    #[test]
    fn non_three_position_switch_drops_second_channel() {
        let mut store = open_default();
        store
            .set_switch(4, SwitchKind::MomentaryTwoPosition, Some(8), Some(9))
            .unwrap();
        assert_eq!(store.global().switches[4].ch1, Some(8));
        assert_eq!(store.global().switches[4].ch2, None);

        store
            .set_switch(4, SwitchKind::ThreePosition, Some(8), Some(9))
            .unwrap();
        assert_eq!(store.global().switches[4].ch2, Some(9));
    }

    #[test]
    fn axis_channel_zero_is_reserved() {
        let mut store = open_default();
        assert_eq!(
            store.set_axis_channel(1, 0),
            Err(ConfigError::ChannelOutOfRange)
        );
        assert_eq!(
            store.set_axis_channel(1, 4),
            Err(ConfigError::ChannelOutOfRange)
        );
        store.set_axis_channel(1, 2).unwrap();
    }

    #[test]
    fn backup_restores_into_a_fresh_store() {
        let mut store = open_default();
        store.rename_active("Rig 7").unwrap();
        store.set_deadzone(0, 9).unwrap();
        store.create_profile(ProfileKind::RemoteUnit, 4, "Spare").unwrap();
        let mut image = [0u8; STORAGE_SIZE];
        store.backup_into(&mut image).unwrap();

        let mut other = open_default();
        other.restore_backup(&image).unwrap();
        assert_eq!(other.global(), store.global());
        assert_eq!(other.active_profile(), store.active_profile());
        assert_eq!(other.profiles().unwrap(), store.profiles().unwrap());
    }

    #[test]
    fn corrupt_backup_image_is_rejected() {
        let mut store = open_default();
        let mut image = [0u8; STORAGE_SIZE];
        store.backup_into(&mut image).unwrap();

        let mut no_sentinel = image;
        no_sentinel[0] ^= 0xFF;
        assert_eq!(store.restore_backup(&no_sentinel), Err(ConfigError::InvalidImage));

        let mut empty_mask = image;
        empty_mask[layout::G_ACTIVE_SLOTS..layout::G_ACTIVE_SLOTS + 4].fill(0);
        assert_eq!(store.restore_backup(&empty_mask), Err(ConfigError::InvalidImage));

        assert_eq!(store.restore_backup(&image[1..]), Err(ConfigError::InvalidImage));
    }

    #[test]
    fn storage_failure_propagates() {
        let mut store = open_default();
        store.storage.fail_writes = true;
        assert_eq!(
            store.set_deadzone(0, 5),
            Err(ConfigError::Storage(StorageError::Bus))
        );
    }
}
