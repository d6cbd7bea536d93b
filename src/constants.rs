use std::time::Duration;

/// Speeds tried in order when opening the adapter. The bootloader and the
/// application firmware do not agree on a default rate.
pub const BAUD_RATES: [u32; 3] = [57600, 1_000_000, 115200];

/// Acknowledge, sent per command and per chunk.
pub const ACK: u8 = 0x0C;
/// Negative acknowledge, the adapter rejected a chunk.
pub const NAK: u8 = 0x07;
/// Erase complete. Same byte as `NAK` on the wire, only valid after an erase command.
pub const ERASE_DONE: u8 = 0x07;
pub const VERSION_TERMINATOR: u8 = b'\n';
pub const COMMAND_TERMINATOR: u8 = b'\r';

pub(crate) const SERIAL_TIMEOUT: Duration = Duration::from_millis(5);
pub(crate) const VERSION_READ_SIZE: usize = 8;
pub(crate) const BULK_READ_SIZE: usize = 32;

pub const DEFAULT_READ_DELAY: u8 = 75;
pub const DEFAULT_WRITE_DELAY: u8 = 150;
pub const DEFAULT_CHUNK_SIZE: usize = 16;

pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(3);
pub const READ_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(2);
pub const ACK_TIMEOUT: Duration = Duration::from_secs(2);
pub const CHUNK_TIMEOUT: Duration = Duration::from_secs(3);
pub const RETRY_DELAY: Duration = Duration::from_millis(400);
pub const TRAILING_ACK_DRAIN: Duration = Duration::from_millis(75);
pub const ERASE_SETTLE: Duration = Duration::from_millis(20);

/// Wire protocol version spoken by this client
pub const WIRE_VERSION: &str = "v1.0.0";
