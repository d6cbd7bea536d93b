use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use eepman::{
    Adapter, AdapterParams, ChipProfile, Target,
    constants::{DEFAULT_READ_DELAY, DEFAULT_WRITE_DELAY, WIRE_VERSION},
    error::{EepError, EepResult},
    list_ports,
    util::ProgressBarObserver,
};
use tracing::info;

const DUMP_COLUMNS: usize = 25;

#[derive(Args, Debug, Clone)]
pub(crate) struct ConnectionOptions {
    /// Serial port, defaults to the first USB serial port found
    #[clap(short, long)]
    port: Option<String>,

    /// Module the eeprom belongs to
    #[clap(short, long, value_enum, default_value_t = Target::Cim)]
    target: Target,

    /// Chip type, overrides the target's
    #[clap(short, long)]
    chip: Option<u8>,

    /// Chip size in words, overrides the target's
    #[clap(short, long)]
    size: Option<u16>,

    /// Chip organization (8 or 16), overrides the target's
    #[clap(short, long)]
    org: Option<u8>,

    /// Read pin delay sent to the adapter
    #[clap(long, default_value_t = DEFAULT_READ_DELAY)]
    read_delay: u8,

    /// Write pin delay sent to the adapter
    #[clap(long, default_value_t = DEFAULT_WRITE_DELAY)]
    write_delay: u8,

    /// Give up a read after this many milliseconds without data
    #[clap(long, default_value_t = 5000)]
    read_timeout: u64,

    /// Wire version to announce, compared with the adapter firmware
    #[clap(long, default_value_t = WIRE_VERSION.to_string())]
    wire_version: String,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ReadOptions {
    #[command(flatten)]
    connection: ConnectionOptions,

    /// Output file, "-" for stdout
    filename: String,

    /// XOR every byte of the output with this hex value
    #[clap(short, long, value_parser = parse_hex_byte, default_value = "00")]
    xor: u8,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct WriteOptions {
    #[command(flatten)]
    connection: ConnectionOptions,

    /// Binary image to write
    filename: PathBuf,

    /// Erase the chip before writing
    #[clap(short, long, default_value_t = false)]
    erase: bool,
}

impl ConnectionOptions {
    fn profile(&self) -> EepResult<ChipProfile> {
        let base = self.target.profile();
        ChipProfile::new(
            self.chip.unwrap_or(base.chip),
            self.size.unwrap_or(base.size),
            self.org.unwrap_or(base.org),
        )
    }

    fn open(&self) -> EepResult<Adapter> {
        let port = match &self.port {
            Some(port) => port.clone(),
            None => first_usb_port()?,
        };

        let mut adapter = Adapter::from_params(AdapterParams {
            read_delay: self.read_delay,
            write_delay: self.write_delay,
            read_timeout: Duration::from_millis(self.read_timeout),
            ..Default::default()
        });
        adapter.open(&port, &self.wire_version)?;

        Ok(adapter)
    }
}

fn parse_hex_byte(value: &str) -> Result<u8, String> {
    let digits = value.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(digits, 16).map_err(|e| format!("invalid hex byte {:?}: {}", value, e))
}

fn first_usb_port() -> EepResult<String> {
    let listing = list_ports()?;
    listing.ports.into_iter().next().ok_or_else(|| {
        EepError::PortNotFound("no USB serial port detected, try specifying --port".into())
    })
}

pub(crate) fn handle_ports() -> EepResult<()> {
    let listing = list_ports()?;
    print!("{}", listing.summary);
    Ok(())
}

pub(crate) fn handle_read(opts: ReadOptions) -> EepResult<()> {
    let profile = opts.connection.profile()?;
    let mut adapter = opts.connection.open()?;

    info!(
        "Reading {} bytes from type: {}, org: {}",
        profile.byte_len(),
        profile.chip,
        profile.org
    );
    let progress = Arc::new(ProgressBarObserver::new(profile.byte_len(), "reading"));
    adapter.observer(progress.clone());

    let start = Instant::now();
    let mut bin = adapter.read(profile)?;
    progress.finish();
    adapter.close()?;
    info!("Read took {:?}", start.elapsed());

    for b in bin.iter_mut() {
        *b ^= opts.xor;
    }

    if opts.filename == "-" {
        print!("{}", hex_dump(&bin, profile.org));
        return Ok(());
    }

    std::fs::write(&opts.filename, &bin).map_err(|e| {
        EepError::Configuration(format!("Failed to write {}: {}", opts.filename, e))
    })?;
    info!("Wrote {} bytes to {}", bin.len(), opts.filename);

    Ok(())
}

pub(crate) fn handle_write(opts: WriteOptions) -> EepResult<()> {
    let profile = opts.connection.profile()?;
    let bin = std::fs::read(&opts.filename).map_err(|e| {
        EepError::Configuration(format!("Failed to read {}: {}", opts.filename.display(), e))
    })?;

    let mut adapter = opts.connection.open()?;
    if opts.erase {
        info!("Erasing eeprom type: {}, org: {}", profile.chip, profile.org);
        adapter.erase(profile)?;
    }

    let progress = Arc::new(ProgressBarObserver::new(bin.len(), "writing"));
    adapter.observer(progress.clone());

    let start = Instant::now();
    adapter.write(profile, &bin)?;
    progress.finish();
    adapter.close()?;
    info!("Write took {:?}", start.elapsed());

    Ok(())
}

pub(crate) fn handle_erase(opts: ConnectionOptions) -> EepResult<()> {
    let profile = opts.profile()?;
    let mut adapter = opts.open()?;

    info!("Erasing eeprom type: {}, org: {}", profile.chip, profile.org);
    adapter.erase(profile)?;
    adapter.close()?;
    info!("Eeprom erased");

    Ok(())
}

/// Hex bytes for 8 bit chips, big endian words read as UTF-16 text for 16 bit ones
fn hex_dump(bin: &[u8], org: u8) -> String {
    let cells: Vec<String> = if org == 16 {
        let words = bin
            .chunks_exact(2)
            .map(|w| u16::from_be_bytes([w[0], w[1]]));
        char::decode_utf16(words)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER).to_string())
            .collect()
    } else {
        bin.iter().map(|b| format!("{:02X}", b)).collect()
    };

    let mut out = String::new();
    for line in cells.chunks(DUMP_COLUMNS) {
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}
