use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::constants::COMMAND_TERMINATOR;
use crate::error::{EepError, EepResult};
use crate::interface::DeviceInterface;
use crate::targets::ChipProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
    Erase,
}

impl Operation {
    pub fn code(&self) -> char {
        match self {
            Operation::Read => 'r',
            Operation::Write => 'w',
            Operation::Erase => 'e',
        }
    }
}

/// One request line: `<op>,<chip>,<size>,<org>,<delay>\r`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub op: Operation,
    pub chip: u8,
    pub size: u16,
    pub org: u8,
    /// Pin delay forwarded to the adapter firmware
    pub delay: u8,
}

impl Command {
    pub fn new(op: Operation, profile: ChipProfile, delay: u8) -> Self {
        Command {
            op,
            chip: profile.chip,
            size: profile.size,
            org: profile.org,
            delay,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}{}",
            self.op.code(),
            self.chip,
            self.size,
            self.org,
            self.delay,
            COMMAND_TERMINATOR as char
        )
    }
}

/// Write the command in a single call. A partial write is never retried.
pub fn send_command(device: &mut dyn DeviceInterface, command: &Command) -> EepResult<()> {
    let bytes = command.encode();
    debug!("Sending command {:?}", command.to_string());

    let written = device.send(&bytes)?;
    if written != bytes.len() {
        return Err(EepError::ShortWrite {
            written,
            expected: bytes.len(),
        });
    }

    Ok(())
}

/// Read single bytes until `expected` shows up, discarding anything else.
/// Returns `false` when `timeout` runs out first.
pub fn wait_for_byte(
    device: &mut dyn DeviceInterface,
    expected: u8,
    timeout: Duration,
) -> EepResult<bool> {
    let start = Instant::now();
    let mut buffer = [0u8; 1];

    loop {
        let n = device.receive(&mut buffer)?;
        if start.elapsed() > timeout {
            return Ok(false);
        }
        if n == 0 {
            continue;
        }
        if buffer[0] == expected {
            return Ok(true);
        }
        trace!("Skipping byte {:#04x} while waiting for {:#04x}", buffer[0], expected);
    }
}
