use std::time::Instant;

use tracing::{debug, info, warn};

use super::AdapterParams;
use super::version::{self, VersionCheck};
use crate::constants::{SERIAL_TIMEOUT, VERSION_READ_SIZE, VERSION_TERMINATOR};
use crate::error::{EepError, EepResult};
use crate::interface::{Connector, DeviceInterface};
use crate::observer::Observer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Connecting,
    Handshaking,
    Ready,
    Failed,
}

/// An open, handshaken link to the adapter
pub(crate) struct Session {
    pub port: String,
    pub baud: u32,
    pub adapter_version: String,
    pub device: Box<dyn DeviceInterface>,
}

/// Walk the baud ladder until the adapter answers with its version line
pub(crate) fn open_session(
    connector: &dyn Connector,
    port: &str,
    client_version: &str,
    params: &AdapterParams,
    observer: &dyn Observer,
    state: &mut SessionState,
) -> EepResult<Session> {
    let Some(first) = params.baud_rates.first() else {
        *state = SessionState::Failed;
        return Err(EepError::Configuration("No baud rates to try".into()));
    };

    observer.on_message(&format!(
        "Open adapter on {:?} {}kbp/s",
        port,
        first / 1000
    ));

    let mut last_err = EepError::HandshakeTimeout;
    for (attempt, &baud) in params.baud_rates.iter().enumerate() {
        if attempt > 0 {
            observer.on_message(&format!("Trying {}kbp/s", baud / 1000));
            std::thread::sleep(params.retry_delay);
        }

        match handshake(connector, port, baud, client_version, params, observer, state) {
            Ok(session) => {
                *state = SessionState::Ready;
                info!("Adapter {} ready on {} at {} baud", session.adapter_version, port, baud);
                return Ok(session);
            }
            Err(e) => {
                warn!("Attempt {} at {} baud failed: {}", attempt + 1, baud, e);
                last_err = e;
            }
        }
    }

    *state = SessionState::Failed;
    Err(last_err)
}

fn handshake(
    connector: &dyn Connector,
    port: &str,
    baud: u32,
    client_version: &str,
    params: &AdapterParams,
    observer: &dyn Observer,
    state: &mut SessionState,
) -> EepResult<Session> {
    *state = SessionState::Connecting;
    debug!("Connecting to {} at {} baud", port, baud);

    // Dropping the device on any error below closes the half open port
    let mut device = connector.connect(port, baud)?;
    device.flush_input()?;
    device.flush_output()?;
    device.set_timeout(SERIAL_TIMEOUT)?;

    *state = SessionState::Handshaking;
    let adapter_version = read_version(device.as_mut(), params)?;
    debug!("Adapter reports wire version {:?}", adapter_version);

    match version::check(client_version, &adapter_version) {
        VersionCheck::AdapterNewer => observer.on_message(&format!(
            "USB adapter is running newer wire version ({}). Please update the client",
            adapter_version
        )),
        VersionCheck::AdapterOlder => observer.on_message(&format!(
            "USB adapter is running older wire version ({}). Please update adapter firmware",
            adapter_version
        )),
        VersionCheck::Same => {}
    }

    Ok(Session {
        port: port.to_owned(),
        baud,
        adapter_version,
        device,
    })
}

/// Collect bytes up to the first `\n`
pub(crate) fn read_version(
    device: &mut dyn DeviceInterface,
    params: &AdapterParams,
) -> EepResult<String> {
    let start = Instant::now();
    let mut version = Vec::new();
    let mut buffer = [0u8; VERSION_READ_SIZE];

    loop {
        let n = device.receive(&mut buffer)?;
        if start.elapsed() > params.handshake_timeout {
            return Err(EepError::HandshakeTimeout);
        }

        for &b in &buffer[..n] {
            if b == VERSION_TERMINATOR {
                return Ok(String::from_utf8_lossy(&version).trim().to_string());
            }
            version.push(b);
        }
    }
}
