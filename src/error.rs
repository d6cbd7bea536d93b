use thiserror::Error;

#[derive(Error, Debug)]
pub enum EepError {
    #[error("No serial ports found")]
    NoPortsFound,

    #[error("Serial port not found: {0}")]
    PortNotFound(String),

    #[error("Got no response from adapter")]
    HandshakeTimeout,

    #[error("Failed to write all bytes to port ({written} of {expected})")]
    ShortWrite { written: usize, expected: usize },

    #[error("Timeout reading eeprom after {received} of {expected} bytes")]
    ReadTimeout { received: usize, expected: usize },

    #[error("Timeout waiting for ack from adapter")]
    WriteAckTimeout,

    #[error("Got an unexpected ack from adapter")]
    UnexpectedAck,

    #[error("Got nak from adapter, device rejected chunk")]
    NegativeAck,

    #[error("Timeout waiting for erase to complete")]
    EraseTimeout,

    #[error("Invalid payload of {len} bytes for chunk size {chunk}")]
    InvalidPayload { len: usize, chunk: usize },

    #[error("Adapter is not connected")]
    NotConnected,

    #[error("Transport error: {0}")]
    TransportIo(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<serialport::Error> for EepError {
    fn from(e: serialport::Error) -> Self {
        EepError::TransportIo(format!("{:?}", e))
    }
}

impl From<std::io::Error> for EepError {
    fn from(e: std::io::Error) -> Self {
        EepError::TransportIo(format!("{:?}", e))
    }
}

pub type EepResult<T> = std::result::Result<T, EepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialport_errors_are_transport_errors() {
        let err = EepError::from(serialport::Error::new(
            serialport::ErrorKind::NoDevice,
            "device went away",
        ));
        assert!(matches!(err, EepError::TransportIo(msg) if msg.contains("device went away")));
    }
}
