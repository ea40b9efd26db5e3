use tracing::info;
use uartframe_frame::{FrameConfig, OverflowPolicy, SerialLink};
use uartframe_transport::{ByteStream, SerialStream};

use crate::cmd::encode::encode_payload;
use crate::cmd::{parse_duration, PayloadCommand, SendArgs};
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_wire, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = args.port.timeout.as_deref().map(parse_duration).transpose()?;
    let wire = encode_payload(&args.payload)?;

    let stream = SerialStream::open(&args.port.port, args.port.baud, timeout)
        .map_err(|err| transport_error("open failed", err))?;
    let mut link = SerialLink::with_config(stream, link_config(&args.payload));

    send_payload(&mut link, &args.payload).map_err(|err| frame_error("send failed", err))?;
    link.close()
        .map_err(|err| frame_error("close failed", err))?;

    info!(port = %args.port.port, bytes = wire.len(), "payload sent");
    print_wire(args.payload.kind(), &wire, format);
    Ok(SUCCESS)
}

fn link_config(payload: &PayloadCommand) -> FrameConfig {
    let overflow = match payload {
        PayloadCommand::Ints(args) if args.allow_overflow => OverflowPolicy::Extend,
        _ => OverflowPolicy::Reject,
    };
    FrameConfig {
        overflow,
        ..FrameConfig::default()
    }
}

fn send_payload<S: ByteStream>(
    link: &mut SerialLink<S>,
    payload: &PayloadCommand,
) -> uartframe_frame::Result<()> {
    match payload {
        PayloadCommand::Ints(args) => link.send_int_array(
            &args.values,
            args.framing.head_bytes(),
            args.framing.tail_bytes(),
        ),
        PayloadCommand::Int(args) => link.send_scalar_int(
            args.value,
            args.framing.head_bytes(),
            args.framing.tail_bytes(),
        ),
        PayloadCommand::Text(args) => link.send_text(
            &args.payload,
            args.framing.head.as_deref(),
            args.framing.tail.as_deref(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use uartframe_transport::MemoryStream;

    use super::*;
    use crate::cmd::{FramingArgs, IntArgs, IntsArgs, TextArgs};

    fn sent(payload: PayloadCommand) -> Vec<u8> {
        let mut link = SerialLink::with_config(MemoryStream::new(), link_config(&payload));
        send_payload(&mut link, &payload).unwrap();
        link.get_mut().take_written()
    }

    #[test]
    fn link_output_matches_offline_encoding() {
        let payloads = vec![
            PayloadCommand::Ints(IntsArgs {
                values: vec![5, -12, 999],
                allow_overflow: false,
                framing: FramingArgs {
                    head: Some("@".to_string()),
                    tail: Some("#".to_string()),
                },
            }),
            PayloadCommand::Int(IntArgs {
                value: 258,
                framing: FramingArgs::default(),
            }),
            PayloadCommand::Text(TextArgs {
                payload: "OK".to_string(),
                framing: FramingArgs {
                    head: Some("<<".to_string()),
                    tail: Some(">>".to_string()),
                },
            }),
        ];

        for payload in payloads {
            let offline = encode_payload(&payload).unwrap();
            assert_eq!(sent(payload), offline);
        }
    }

    #[test]
    fn overflow_flag_reaches_link() {
        let payload = PayloadCommand::Ints(IntsArgs {
            values: vec![-1000],
            allow_overflow: true,
            framing: FramingArgs::default(),
        });
        assert_eq!(sent(payload), b"01000");
    }
}
