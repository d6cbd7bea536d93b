use std::sync::Arc;

use constants::{ACK, ERASE_DONE};
use error::{EepError, EepResult};
use interface::serialport::SerialPortConnector;
use interface::{Connector, DeviceInterface};
use observer::{Hooks, Observer};
use protocols::command::{Command, Operation, send_command, wait_for_byte};
use protocols::session::{Session, open_session};
use protocols::{reader, writer};
use tracing::debug;

pub use interface::ports::{PortListing, list_ports};
pub use protocols::AdapterParams;
pub use protocols::session::SessionState;
pub use targets::{ChipProfile, Target};

pub mod constants;
pub mod error;
pub mod interface;
pub mod observer;
pub mod protocols;
pub mod targets;
pub mod util;

/// Client for the EEPROM programmer adapter. Holds at most one open
/// session; every data operation needs `open` to have succeeded first.
pub struct Adapter {
    params: AdapterParams,
    connector: Box<dyn Connector>,
    hooks: Arc<Hooks>,
    session: Option<Session>,
    state: SessionState,
}

impl Adapter {
    /// Adapter on real serial ports with the given pin delays
    pub fn new(read_delay: u8, write_delay: u8) -> Self {
        Self::from_params(AdapterParams {
            read_delay,
            write_delay,
            ..Default::default()
        })
    }

    pub fn from_params(params: AdapterParams) -> Self {
        Self::with_connector(params, SerialPortConnector)
    }

    pub fn with_connector(params: AdapterParams, connector: impl Connector + 'static) -> Self {
        Adapter {
            params,
            connector: Box::new(connector),
            hooks: Arc::new(Hooks::default()),
            session: None,
            state: SessionState::Closed,
        }
    }

    pub fn params(&self) -> &AdapterParams {
        &self.params
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn port_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.port.as_str())
    }

    pub fn baud_rate(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.baud)
    }

    /// Version line the adapter announced during the handshake
    pub fn adapter_version(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.adapter_version.as_str())
    }

    pub fn on_progress(&mut self, f: impl Fn(f64) + Send + Sync + 'static) -> &mut Self {
        self.hooks.set_progress(Arc::new(f));
        self
    }

    pub fn on_message(&mut self, f: impl Fn(&str) + Send + Sync + 'static) -> &mut Self {
        self.hooks.set_message(Arc::new(f));
        self
    }

    pub fn on_error(&mut self, f: impl Fn(&EepError) + Send + Sync + 'static) -> &mut Self {
        self.hooks.set_error(Arc::new(f));
        self
    }

    /// Route progress, messages and errors to a single observer
    pub fn observer(&mut self, observer: Arc<dyn Observer>) -> &mut Self {
        self.hooks.set_observer(observer);
        self
    }

    /// Connect and handshake, trying every configured baud rate in turn.
    /// `client_version` is the wire version this client speaks.
    pub fn open(&mut self, port: &str, client_version: &str) -> EepResult<()> {
        self.close()?;

        let result = open_session(
            self.connector.as_ref(),
            port,
            client_version,
            &self.params,
            self.hooks.as_ref(),
            &mut self.state,
        );
        let session = self.report(result)?;
        self.session = Some(session);
        Ok(())
    }

    /// Drop the session and release the port. Closing twice is fine.
    pub fn close(&mut self) -> EepResult<()> {
        if let Some(session) = self.session.take() {
            debug!("Closing adapter on {}", session.port);
        }
        self.state = SessionState::Closed;
        Ok(())
    }

    /// Read the full CIM EEPROM
    pub fn read_cim(&mut self) -> EepResult<Vec<u8>> {
        self.read(ChipProfile::CIM)
    }

    /// Read the full MIU EEPROM
    pub fn read_miu(&mut self) -> EepResult<Vec<u8>> {
        self.read(ChipProfile::MIU)
    }

    /// Write a full 512 byte CIM image
    pub fn write_cim(&mut self, data: &[u8]) -> EepResult<()> {
        self.write(ChipProfile::CIM, data)
    }

    pub fn erase_cim(&mut self) -> EepResult<()> {
        self.erase(ChipProfile::CIM)
    }

    pub fn read(&mut self, profile: ChipProfile) -> EepResult<Vec<u8>> {
        let result = self.do_read(profile);
        self.report(result)
    }

    pub fn write(&mut self, profile: ChipProfile, data: &[u8]) -> EepResult<()> {
        let result = self.do_write(profile, data);
        self.report(result)
    }

    pub fn erase(&mut self, profile: ChipProfile) -> EepResult<()> {
        let result = self.do_erase(profile);
        self.report(result)
    }

    fn do_read(&mut self, profile: ChipProfile) -> EepResult<Vec<u8>> {
        let delay = self.params.read_delay;
        let inactivity = self.params.read_timeout;
        let hooks = Arc::clone(&self.hooks);
        let device = self.device()?;

        device.flush_input()?;
        device.flush_output()?;
        send_command(device, &Command::new(Operation::Read, profile, delay))?;
        reader::read_bytes(device, profile.byte_len(), inactivity, hooks.as_ref())
    }

    fn do_write(&mut self, profile: ChipProfile, data: &[u8]) -> EepResult<()> {
        if data.len() != profile.byte_len() {
            return Err(EepError::InvalidPayload {
                len: data.len(),
                chunk: self.params.chunk_size,
            });
        }

        let params = self.params.clone();
        let hooks: Arc<dyn Observer> = self.hooks.clone();
        let device = self.device()?;

        // A late ack from an earlier transfer must not pass for the command ack
        device.flush_input()?;
        device.flush_output()?;
        send_command(device, &Command::new(Operation::Write, profile, params.write_delay))?;
        if !wait_for_byte(device, ACK, params.ack_timeout)? {
            return Err(EepError::WriteAckTimeout);
        }

        writer::write_bytes(
            device,
            data,
            params.chunk_size,
            params.chunk_timeout,
            params.drain_delay,
            hooks,
        )
    }

    /// The erase command carries a size of one; the adapter answers with the
    /// erase-done byte once the whole chip is cleared.
    fn do_erase(&mut self, profile: ChipProfile) -> EepResult<()> {
        let delay = self.params.write_delay;
        let timeout = self.params.ack_timeout;
        let settle = self.params.erase_settle;
        let device = self.device()?;

        let command = Command {
            size: 1,
            ..Command::new(Operation::Erase, profile, delay)
        };

        device.flush_input()?;
        device.flush_output()?;
        send_command(device, &command)?;
        if !wait_for_byte(device, ERASE_DONE, timeout)? {
            return Err(EepError::EraseTimeout);
        }

        std::thread::sleep(settle);
        device.flush_input()
    }

    fn device(&mut self) -> EepResult<&mut dyn DeviceInterface> {
        match self.session.as_mut() {
            Some(session) => Ok(session.device.as_mut()),
            None => Err(EepError::NotConnected),
        }
    }

    fn report<T>(&self, result: EepResult<T>) -> EepResult<T> {
        if let Err(e) = &result {
            self.hooks.on_error(e);
        }
        result
    }
}
