pub mod ports;
pub mod serialport;

use std::time::Duration;

use crate::error::EepResult;

/// Byte level access to the adapter. Read timeouts are not errors, a read
/// that times out returns 0 bytes.
pub trait DeviceInterface: Send {
    /// Write bytes to the adapter, returns how many were accepted
    fn send(&mut self, bytes: &[u8]) -> EepResult<usize>;

    /// Read whatever is available into `buffer`, waiting at most the configured timeout
    fn receive(&mut self, buffer: &mut [u8]) -> EepResult<usize>;

    /// Discard bytes received but not yet read
    fn flush_input(&mut self) -> EepResult<()>;

    /// Discard bytes written but not yet transmitted
    fn flush_output(&mut self) -> EepResult<()>;

    /// Set the per read timeout
    fn set_timeout(&mut self, timeout: Duration) -> EepResult<()>;

    /// Second handle to the same device, used by the write listener
    fn try_clone(&self) -> EepResult<Box<dyn DeviceInterface>>;
}

/// Opens a device at a given baud rate (8 data bits, no parity, 1 stop bit)
pub trait Connector: Send + Sync {
    fn connect(&self, port: &str, baud: u32) -> EepResult<Box<dyn DeviceInterface>>;
}
