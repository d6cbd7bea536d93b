use std::time::Duration;

use crate::constants::{
    ACK_TIMEOUT, BAUD_RATES, CHUNK_TIMEOUT, DEFAULT_CHUNK_SIZE, DEFAULT_READ_DELAY,
    DEFAULT_WRITE_DELAY, ERASE_SETTLE, HANDSHAKE_TIMEOUT, READ_INACTIVITY_TIMEOUT, RETRY_DELAY,
    TRAILING_ACK_DRAIN,
};

pub mod command;
pub(crate) mod reader;
pub(crate) mod session;
pub mod version;
pub(crate) mod writer;

/// Tunables of the adapter link. The pin delays are forwarded to the
/// firmware; higher values are slower but more tolerant of worn chips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterParams {
    pub read_delay: u8,
    pub write_delay: u8,

    /// Speeds tried in order when opening, one attempt each
    pub baud_rates: Vec<u32>,
    pub retry_delay: Duration,
    /// Upper bound for the adapter to announce its version
    pub handshake_timeout: Duration,

    /// Longest gap without data while streaming a read
    pub read_timeout: Duration,
    /// Wait for the ack of a write command or the end of an erase
    pub ack_timeout: Duration,
    /// Wait for the ack of the previous chunk before sending the next
    pub chunk_timeout: Duration,
    pub chunk_size: usize,
    /// Time given to the listener to collect trailing acks
    pub drain_delay: Duration,
    pub erase_settle: Duration,
}

impl Default for AdapterParams {
    fn default() -> Self {
        AdapterParams {
            read_delay: DEFAULT_READ_DELAY,
            write_delay: DEFAULT_WRITE_DELAY,
            baud_rates: BAUD_RATES.to_vec(),
            retry_delay: RETRY_DELAY,
            handshake_timeout: HANDSHAKE_TIMEOUT,
            read_timeout: READ_INACTIVITY_TIMEOUT,
            ack_timeout: ACK_TIMEOUT,
            chunk_timeout: CHUNK_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            drain_delay: TRAILING_ACK_DRAIN,
            erase_settle: ERASE_SETTLE,
        }
    }
}
