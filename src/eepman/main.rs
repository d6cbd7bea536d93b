use clap::{Parser, Subcommand};
use eepman::error::EepResult;
use program::{ConnectionOptions, ReadOptions, WriteOptions};

mod program;

#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
struct Cli {
    /// Log protocol details
    #[clap(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// List serial ports the adapter may be connected to
    #[command(name = "ports", alias = "l")]
    Ports,

    /// Read eeprom, use "-" as filename to dump to stdout
    #[command(name = "read", alias = "r")]
    Read(ReadOptions),

    /// Write eeprom content from a binary file
    #[command(name = "write", alias = "w")]
    Write(WriteOptions),

    /// Erase eeprom
    #[command(name = "erase", alias = "e")]
    Erase(ConnectionOptions),
}

fn main() -> EepResult<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Command::Ports => program::handle_ports()?,
        Command::Read(opts) => program::handle_read(opts)?,
        Command::Write(opts) => program::handle_write(opts)?,
        Command::Erase(opts) => program::handle_erase(opts)?,
    }

    Ok(())
}
