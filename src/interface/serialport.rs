use serialport::{ClearBuffer, DataBits, Parity, StopBits};
use tracing::trace;

use super::{Connector, DeviceInterface};
use crate::constants::SERIAL_TIMEOUT;

use crate::error::{EepError, EepResult};
use std::io::{Read, Write};
use std::time::Duration;

pub type BaudRate = u32;
/// Serial port device_interface layer
pub struct SerialPortDevice {
    pub serial_port: Box<dyn serialport::SerialPort>,
}

impl SerialPortDevice {
    pub fn new(port: &str, baud: BaudRate) -> EepResult<SerialPortDevice> {
        let serial_port = serialport::new(port, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(SERIAL_TIMEOUT)
            .open()
            .map_err(|e| open_error(port, e))?;

        Ok(SerialPortDevice { serial_port })
    }
}

/// Only the caller knows which port was missing
fn open_error(port: &str, e: serialport::Error) -> EepError {
    match e.kind() {
        serialport::ErrorKind::NoDevice
        | serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => {
            EepError::PortNotFound(port.to_owned())
        }
        _ => EepError::from(e),
    }
}

impl DeviceInterface for SerialPortDevice {
    fn send(&mut self, bytes: &[u8]) -> EepResult<usize> {
        let written = self.serial_port.write(bytes)?;
        trace!("Sent bytes {:?}", &bytes[..written]);
        Ok(written)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> EepResult<usize> {
        let size = self
            .serial_port
            .read(buffer)
            // Timeout error is fine, just continue
            .or_else(|e| {
                if e.kind() == std::io::ErrorKind::TimedOut {
                    Ok(0)
                } else {
                    Err(e)
                }
            })?;

        if size > 0 {
            trace!("Received bytes {:?}", &buffer[..size]);
        }
        Ok(size)
    }

    fn flush_input(&mut self) -> EepResult<()> {
        self.serial_port.clear(ClearBuffer::Input).map_err(|e| {
            EepError::TransportIo(format!("Failed to flush receive buffer, {}", e))
        })
    }

    fn flush_output(&mut self) -> EepResult<()> {
        self.serial_port
            .clear(ClearBuffer::Output)
            .map_err(|e| EepError::TransportIo(format!("Failed to flush send buffer, {}", e)))
    }

    fn set_timeout(&mut self, timeout: Duration) -> EepResult<()> {
        self.serial_port.set_timeout(timeout)?;
        Ok(())
    }

    fn try_clone(&self) -> EepResult<Box<dyn DeviceInterface>> {
        let serial_port = self.serial_port.try_clone()?;
        Ok(Box::new(SerialPortDevice { serial_port }))
    }
}

/// Opens real serial ports through the `serialport` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialPortConnector;

impl Connector for SerialPortConnector {
    fn connect(&self, port: &str, baud: u32) -> EepResult<Box<dyn DeviceInterface>> {
        Ok(Box::new(SerialPortDevice::new(port, baud)?))
    }
}
