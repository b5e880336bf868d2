//! Hardware configuration for the JoyLink units
//! RP2040 (Raspberry Pi Pico) on both ends of the link

// ===================================================================
// Task Cadences
// ===================================================================

pub const BUTTON_POLL_MS: u64 = 2; // Debounce poll period
pub const EXCHANGE_PERIOD_MS: u64 = 4; // One frame exchange per period
pub const SUPERVISOR_PERIOD_MS: u64 = 250; // Watchdog feed period

// ===================================================================
// Debounce Hold Times
// ===================================================================

pub const BUDDY_HOLD_MS: u64 = 50; // Buddy buttons
pub const ENCODER_HOLD_MS: u64 = 1; // Encoder phases and push button

// ===================================================================
// Event Queues
// ===================================================================

pub const EVENT_QUEUE_DEPTH: usize = 32; // Producers drop on overflow

// ===================================================================
// Task Liveness (checked once per supervisor period)
// ===================================================================

pub const MIN_BUTTON_TICKS_PER_WINDOW: u32 = 60; // Of ~125 expected
pub const MIN_EXCHANGE_TICKS_PER_WINDOW: u32 = 30; // Of ~62 expected
pub const WATCHDOG_TIMEOUT_MS: u64 = 800;
pub const STARTUP_GRACE_WINDOWS: u32 = 4; // Skip checks for the first second

// ===================================================================
// Link
// ===================================================================

pub const LINK_BAUDRATE: u32 = 100_000; // Master SPI clock
pub const SLAVE_TRANSFER_TIMEOUT_MS: u64 = 10; // Per-transfer deadline
pub const MAX_LINK_ERRORS: u32 = 25; // Consecutive failures before reset

// ===================================================================
// EEPROM (configuration storage, joystick unit only)
// ===================================================================

pub const EEPROM_I2C_ADDR: u8 = 0x50;
pub const EEPROM_PAGE_SIZE: usize = 64;
pub const EEPROM_WRITE_SETTLE_MS: u64 = 5;

// ===================================================================
// GPIO Pin Assignments - Joystick Unit
// ===================================================================

pub const BUDDY_BTN_PINS: [u8; 4] = [2, 3, 4, 5]; // Active-low, pull-up
pub const ENC_PHASE1_PIN: u8 = 6;
pub const ENC_PHASE2_PIN: u8 = 7;
pub const ENC_PUSH_PIN: u8 = 8;

pub const LED_GREEN_PINS: [u8; 4] = [9, 10, 11, 12]; // Buddy indicators
pub const LED_RED_PINS: [u8; 4] = [13, 14, 15, 20];

// Link (SPI0, joystick unit is the master)
pub const LINK_MISO_PIN: u8 = 16;
pub const LINK_CS_PIN: u8 = 17;
pub const LINK_SCK_PIN: u8 = 18;
pub const LINK_MOSI_PIN: u8 = 19;

// EEPROM (I2C0)
pub const EEPROM_SDA_PIN: u8 = 0;
pub const EEPROM_SCL_PIN: u8 = 1;

// Sense lines
pub const REMOTE_SENSE_PIN: u8 = 21; // High while the remote cable is up
pub const VBUS_SENSE_PIN: u8 = 24; // High while powered over USB

// Joystick axes (the four ADC-capable pins)
pub const AXIS_PINS: [u8; 4] = [26, 27, 28, 29];

// ===================================================================
// GPIO Pin Assignments - Remote Unit
// ===================================================================

// Link lines (same header, the remote is the slave)
pub const REMOTE_MISO_PIN: u8 = 16;
pub const REMOTE_CS_PIN: u8 = 17;
pub const REMOTE_SCK_PIN: u8 = 18;
pub const REMOTE_MOSI_PIN: u8 = 19;

// Open-drain digital channels wired on this board revision; the frame
// carries 24 but only these are brought out.
pub const REMOTE_DIGITAL_PINS: [u8; 14] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13];

// Analog outputs (PWM A channels of four distinct slices)
pub const REMOTE_ANALOG_OUT_PINS: [u8; 4] = [14, 20, 22, 24];

// Analog telemetry inputs
pub const REMOTE_TELEMETRY_PINS: [u8; 4] = [26, 27, 28, 29];
