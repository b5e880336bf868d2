//! Unit-to-unit link layer
//!
//! The joystick unit (master) and remote unit (slave) exchange one 10-byte
//! frame per cycle over a four-wire serial link. Both directions carry the
//! same frame format; each side keeps its previous picture of the other
//! when a frame fails its checksum.

mod crc;
mod frame;
pub mod slave;

pub use crc::crc8;
pub use frame::{pack, unpack, validate, IoState, FRAME_LEN};
pub use slave::{LinkPins, LinkStatus, SlaveTransfer};
