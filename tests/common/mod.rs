//! In memory stand-in for the adapter firmware

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use eepman::AdapterParams;
use eepman::constants::{ACK, ERASE_DONE, NAK};
use eepman::error::{EepError, EepResult};
use eepman::interface::{Connector, DeviceInterface};

pub const SIM_PORT: &str = "/dev/ttySIM0";

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub version: String,
    /// Only this speed gets an answer, `None` answers at any speed
    pub responsive_baud: Option<u32>,
    /// Ack the `w` command line before taking chunks
    pub ack_command: bool,
    pub ack_chunks: bool,
    pub double_ack: bool,
    pub nak_chunk: Option<usize>,
    pub chunk_size: usize,
    /// Stop streaming a read after this many bytes
    pub stall_after: Option<usize>,
    pub erase_done: bool,
    /// Reads fail once the first chunk byte arrives
    pub unplug_during_write: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            version: "v1.0.0".into(),
            responsive_baud: None,
            ack_command: true,
            ack_chunks: true,
            double_ack: false,
            nak_chunk: None,
            chunk_size: 16,
            stall_after: None,
            erase_done: true,
            unplug_during_write: false,
        }
    }
}

enum Mode {
    Idle,
    Writing {
        offset: usize,
        expected: usize,
        chunk: Vec<u8>,
    },
}

pub struct SimState {
    pub config: SimConfig,
    pub memory: Vec<u8>,
    pub connects: Vec<u32>,
    pub commands: Vec<String>,
    pub chunks: Vec<Vec<u8>>,
    /// Chunks that started arriving while an ack was still unread
    pub violations: usize,
    announced: bool,
    unplugged: bool,
    unread_acks: usize,
    outbound: VecDeque<u8>,
    line: Vec<u8>,
    mode: Mode,
}

impl SimState {
    fn push(&mut self, byte: u8) {
        if byte == ACK {
            self.unread_acks += 1;
        }
        self.outbound.push_back(byte);
    }

    fn execute(&mut self, line: &str) {
        self.commands.push(line.to_string());
        let fields: Vec<&str> = line.split(',').collect();
        let [op, _chip, size, org, _delay] = fields[..] else {
            return;
        };
        let size: usize = size.parse().unwrap_or(0);
        let org: usize = org.parse().unwrap_or(8);
        let bytes = size * org / 8;

        match op {
            "r" => {
                let limit = self.config.stall_after.unwrap_or(bytes).min(bytes);
                let data: Vec<u8> = self.memory[..limit].to_vec();
                for b in data {
                    self.push(b);
                }
            }
            "w" => {
                if self.config.ack_command {
                    self.push(ACK);
                }
                self.mode = Mode::Writing {
                    offset: 0,
                    expected: bytes,
                    chunk: Vec::new(),
                };
            }
            "e" => {
                self.memory.fill(0xFF);
                if self.config.erase_done {
                    self.push(ERASE_DONE);
                }
            }
            _ => {}
        }
    }

    fn accept(&mut self, byte: u8) {
        let chunk_size = self.config.chunk_size;
        let mut finished = None;

        if matches!(self.mode, Mode::Idle) {
            if byte == b'\r' {
                let line = String::from_utf8_lossy(&self.line).to_string();
                self.line.clear();
                self.execute(&line);
            } else {
                self.line.push(byte);
            }
            return;
        }

        if let Mode::Writing {
            offset,
            expected,
            chunk,
        } = &mut self.mode
        {
            if self.config.unplug_during_write {
                self.unplugged = true;
            }
            if chunk.is_empty() && self.unread_acks > 0 {
                self.violations += 1;
            }
            chunk.push(byte);
            if chunk.len() == chunk_size {
                let data = std::mem::take(chunk);
                let start = *offset;
                *offset += chunk_size;
                finished = Some((start, data, *offset >= *expected));
            }
        }

        if let Some((start, data, last)) = finished {
            let index = self.chunks.len();
            self.memory[start..start + data.len()].copy_from_slice(&data);
            self.chunks.push(data);

            if self.config.nak_chunk == Some(index) {
                self.push(NAK);
            } else if self.config.ack_chunks {
                self.push(ACK);
                if self.config.double_ack {
                    self.push(ACK);
                }
            }
            if last {
                self.mode = Mode::Idle;
            }
        }
    }
}

/// Shared handle: the test keeps one to inspect, the adapter gets a clone as its connector
#[derive(Clone)]
pub struct SimulatedAdapter(Arc<Mutex<SimState>>);

impl SimulatedAdapter {
    pub fn new(config: SimConfig) -> Self {
        let memory = (0..512).map(|i| (i * 7 % 251) as u8).collect();
        SimulatedAdapter(Arc::new(Mutex::new(SimState {
            config,
            memory,
            connects: Vec::new(),
            commands: Vec::new(),
            chunks: Vec::new(),
            violations: 0,
            announced: false,
            unplugged: false,
            unread_acks: 0,
            outbound: VecDeque::new(),
            line: Vec::new(),
            mode: Mode::Idle,
        })))
    }

    pub fn state(&self) -> MutexGuard<'_, SimState> {
        self.0.lock().unwrap()
    }

    /// Queue bytes the firmware sent on its own, like a late ack
    pub fn inject(&self, bytes: &[u8]) {
        let mut state = self.state();
        for &b in bytes {
            state.push(b);
        }
    }
}

impl Connector for SimulatedAdapter {
    fn connect(&self, port: &str, baud: u32) -> EepResult<Box<dyn DeviceInterface>> {
        if port != SIM_PORT {
            return Err(EepError::PortNotFound(port.to_string()));
        }

        let mut state = self.state();
        state.connects.push(baud);
        state.announced = false;
        state.outbound.clear();
        let live = state.config.responsive_baud.is_none_or(|b| b == baud);

        Ok(Box::new(SimLink {
            state: Arc::clone(&self.0),
            live,
        }))
    }
}

#[derive(Clone)]
struct SimLink {
    state: Arc<Mutex<SimState>>,
    /// Opened at a speed the firmware does not understand
    live: bool,
}

impl DeviceInterface for SimLink {
    fn send(&mut self, bytes: &[u8]) -> EepResult<usize> {
        if self.live {
            let mut state = self.state.lock().unwrap();
            for &b in bytes {
                state.accept(b);
            }
        }
        Ok(bytes.len())
    }

    fn receive(&mut self, buffer: &mut [u8]) -> EepResult<usize> {
        let mut n = 0;
        if self.live {
            let mut state = self.state.lock().unwrap();
            if state.unplugged {
                return Err(EepError::TransportIo("device unplugged".into()));
            }
            if !state.announced {
                state.announced = true;
                let version = format!("{}\r\n", state.config.version);
                state.outbound.extend(version.bytes());
            }
            while n < buffer.len() {
                let Some(b) = state.outbound.pop_front() else {
                    break;
                };
                if b == ACK {
                    state.unread_acks = state.unread_acks.saturating_sub(1);
                }
                buffer[n] = b;
                n += 1;
            }
        }

        if n == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(n)
    }

    fn flush_input(&mut self) -> EepResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.announced {
            state.outbound.clear();
            state.unread_acks = 0;
        }
        Ok(())
    }

    fn flush_output(&mut self) -> EepResult<()> {
        Ok(())
    }

    fn set_timeout(&mut self, _timeout: Duration) -> EepResult<()> {
        Ok(())
    }

    fn try_clone(&self) -> EepResult<Box<dyn DeviceInterface>> {
        Ok(Box::new(self.clone()))
    }
}

/// Timeouts short enough for tests
pub fn fast_params() -> AdapterParams {
    AdapterParams {
        retry_delay: Duration::ZERO,
        handshake_timeout: Duration::from_millis(150),
        read_timeout: Duration::from_millis(200),
        ack_timeout: Duration::from_millis(300),
        chunk_timeout: Duration::from_millis(300),
        drain_delay: Duration::from_millis(20),
        erase_settle: Duration::from_millis(1),
        ..Default::default()
    }
}
