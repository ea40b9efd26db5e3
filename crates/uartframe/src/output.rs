use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use uartframe_frame::Packet;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct WireOutput<'a> {
    kind: &'a str,
    size: usize,
    hex: String,
    ascii: String,
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    port: &'a str,
    kind: &'static str,
    payload_size: usize,
    payload: String,
    hex: String,
    timestamp: String,
}

pub fn print_wire(kind: &str, wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = WireOutput {
                kind,
                size: wire.len(),
                hex: hex(wire),
                ascii: ascii_preview(wire),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "SIZE", "HEX", "ASCII"])
                .add_row(vec![
                    kind.to_string(),
                    wire.len().to_string(),
                    hex(wire),
                    ascii_preview(wire),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "kind={} size={} hex={} ascii={}",
                kind,
                wire.len(),
                hex(wire),
                ascii_preview(wire)
            );
        }
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_packet(packet: &Packet, port: &str, format: OutputFormat) {
    let kind = match packet {
        Packet::Text(_) => "text",
        Packet::Raw(_) => "raw",
    };
    let bytes = packet.as_bytes();

    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                port,
                kind,
                payload_size: bytes.len(),
                payload: payload_preview(packet),
                hex: hex(bytes),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "KIND", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    port.to_string(),
                    kind.to_string(),
                    bytes.len().to_string(),
                    payload_preview(packet),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "port={} kind={} size={} payload={}",
                port,
                kind,
                bytes.len(),
                payload_preview(packet)
            );
        }
        OutputFormat::Raw => {
            print_raw(bytes);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn ascii_preview(data: &[u8]) -> String {
    data.iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                char::from(b)
            } else {
                '.'
            }
        })
        .collect()
}

fn payload_preview(packet: &Packet) -> String {
    match packet {
        Packet::Text(text) => text.clone(),
        Packet::Raw(bytes) => format!("<binary {} bytes>", bytes.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
