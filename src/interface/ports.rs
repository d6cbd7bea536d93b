//! Serial port discovery

use std::fmt::Write;

use serialport::{SerialPortInfo, SerialPortType};

use crate::error::{EepError, EepResult};

/// Result of a port scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortListing {
    /// Tree drawn, human readable description of every detected port
    pub summary: String,

    /// Ports exposing USB identity, the only ones the adapter can be on
    pub ports: Vec<String>,
}

/// Scan the system for serial ports
pub fn list_ports() -> EepResult<PortListing> {
    let ports = serialport::available_ports().map_err(|e| {
        EepError::Configuration(format!("Could not get available ports. Err {:?}", e))
    })?;

    describe_ports(&ports)
}

/// Build the listing for an already enumerated set of ports
pub fn describe_ports(ports: &[SerialPortInfo]) -> EepResult<PortListing> {
    if ports.is_empty() {
        return Err(EepError::NoPortsFound);
    }

    let mut listing = PortListing {
        summary: String::from("detected ports:\n"),
        ports: Vec::new(),
    };

    for (i, port) in ports.iter().enumerate() {
        let last = i + 1 == ports.len();
        let (prefix, junction) = if last { (" ", "┗") } else { ("┃", "┣") };

        // Writing into a String can't fail
        let _ = writeln!(listing.summary, "  {} {}", junction, port.port_name);
        if let SerialPortType::UsbPort(info) = &port.port_type {
            let _ = writeln!(
                listing.summary,
                "  {}  ┣ USB ID: {:04x}:{:04x}",
                prefix, info.vid, info.pid
            );
            let _ = writeln!(
                listing.summary,
                "  {}  ┗ USB serial: {}",
                prefix,
                info.serial_number.as_deref().unwrap_or("")
            );
            listing.ports.push(port.port_name.clone());
        }
    }

    Ok(listing)
}
