use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a payload and print the wire bytes (no port needed).
    Encode(EncodeArgs),
    /// Encode a payload and write it to a serial port.
    Send(SendArgs),
    /// Print delimited packets received on a serial port.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// What to put on the wire.
#[derive(Subcommand, Debug)]
pub enum PayloadCommand {
    /// Integer array as 4-character sign/magnitude tokens.
    Ints(IntsArgs),
    /// Single integer as 4 big-endian bytes.
    Int(IntArgs),
    /// ASCII text.
    Text(TextArgs),
}

impl PayloadCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            PayloadCommand::Ints(_) => "ints",
            PayloadCommand::Int(_) => "int",
            PayloadCommand::Text(_) => "text",
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct FramingArgs {
    /// Bytes written before the payload.
    #[arg(long)]
    pub head: Option<String>,
    /// Bytes written after the payload.
    #[arg(long)]
    pub tail: Option<String>,
}

impl FramingArgs {
    pub fn head_bytes(&self) -> Option<&[u8]> {
        self.head.as_deref().map(str::as_bytes)
    }

    pub fn tail_bytes(&self) -> Option<&[u8]> {
        self.tail.as_deref().map(str::as_bytes)
    }
}

#[derive(Args, Debug)]
pub struct IntsArgs {
    /// Values in -999..=999, comma- or space-separated. A list that starts
    /// with a negative value must use spaces: `-5 3`.
    #[arg(
        required = true,
        num_args = 1..,
        value_delimiter = ',',
        allow_negative_numbers = true
    )]
    pub values: Vec<i32>,
    /// Emit wider tokens for values beyond 3 digits instead of failing.
    #[arg(long)]
    pub allow_overflow: bool,
    #[command(flatten)]
    pub framing: FramingArgs,
}

#[derive(Args, Debug)]
pub struct IntArgs {
    /// Value to send.
    #[arg(allow_negative_numbers = true)]
    pub value: i32,
    #[command(flatten)]
    pub framing: FramingArgs,
}

#[derive(Args, Debug)]
pub struct TextArgs {
    /// ASCII payload.
    pub payload: String,
    #[command(flatten)]
    pub framing: FramingArgs,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(subcommand)]
    pub payload: PayloadCommand,
}

#[derive(Args, Debug)]
pub struct PortArgs {
    /// Serial device (e.g. /dev/ttyUSB0, COM3).
    #[arg(long, short = 'p', env = "UARTFRAME_PORT")]
    pub port: String,
    /// Baud rate.
    #[arg(long, short = 'b', default_value = "115200", env = "UARTFRAME_BAUD")]
    pub baud: u32,
    /// Read timeout (e.g. 500ms, 5s, 1m). Omit to block indefinitely.
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub port: PortArgs,
    #[command(subcommand)]
    pub payload: PayloadCommand,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Head marker (one ASCII character).
    #[arg(long, default_value = "@")]
    pub head: String,
    /// Tail marker (one ASCII character).
    #[arg(long, default_value = "#")]
    pub tail: String,
    /// Exit after receiving N packets.
    #[arg(long)]
    pub count: Option<usize>,
    /// Keep payloads as raw bytes instead of decoding ASCII.
    #[arg(long)]
    pub raw: bool,
    /// Report empty frames as errors instead of skipping them.
    #[arg(long)]
    pub strict_empty: bool,
    /// Maximum payload size in bytes.
    #[arg(long)]
    pub max_payload: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else if let Some(num) = input.strip_suffix('m') {
        (num, "m")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| CliError::new(USAGE, format!("duration too large: {input}"))),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}

pub fn parse_marker(name: &str, input: &str) -> CliResult<u8> {
    match input.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(CliError::new(
            USAGE,
            format!("--{name} must be exactly one ASCII character, got {input:?}"),
        )),
    }
}
