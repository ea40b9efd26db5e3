use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uartframe_frame::{EmptyFramePolicy, FrameConfig, FrameError, Packet, SerialLink};
use uartframe_transport::{ByteStream, SerialStream};

use crate::cmd::{parse_duration, parse_marker, ListenArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_packet, OutputFormat};

/// Poll interval so Ctrl-C is noticed while the line is idle.
const IDLE_POLL: Duration = Duration::from_millis(500);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = listen_config(&args)?;
    let timeout = match args.port.timeout.as_deref() {
        Some(input) => parse_duration(input)?,
        None => IDLE_POLL,
    };

    let stream = SerialStream::open(&args.port.port, args.port.baud, Some(timeout))
        .map_err(|err| transport_error("open failed", err))?;
    let mut link = SerialLink::with_config(stream, config);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    info!(port = %args.port.port, baud = args.port.baud, "listening for packets");
    let port = args.port.port.clone();
    let received = receive_packets(&mut link, &running, args.count, !args.raw, |packet| {
        print_packet(packet, &port, format)
    })?;
    debug!(received, "listen finished");

    link.close()
        .map_err(|err| frame_error("close failed", err))?;
    Ok(SUCCESS)
}

fn listen_config(args: &ListenArgs) -> CliResult<FrameConfig> {
    let head = parse_marker("head", &args.head)?;
    let tail = parse_marker("tail", &args.tail)?;
    if head == tail {
        return Err(CliError::new(USAGE, "--head and --tail must differ"));
    }

    let mut config = FrameConfig::with_markers(head, tail);
    if args.strict_empty {
        config.empty_frame = EmptyFramePolicy::Reject;
    }
    if let Some(max) = args.max_payload {
        if max == 0 {
            return Err(CliError::new(USAGE, "--max-payload must be greater than zero"));
        }
        config.max_payload_size = max;
    }
    Ok(config)
}

/// Read packets until `count` is reached, the stream ends, or `running` clears.
///
/// Bad packets are logged and skipped; transport failures end the loop with
/// an error.
fn receive_packets<S, F>(
    link: &mut SerialLink<S>,
    running: &AtomicBool,
    count: Option<usize>,
    decode_ascii: bool,
    mut on_packet: F,
) -> CliResult<usize>
where
    S: ByteStream,
    F: FnMut(&Packet),
{
    let mut received = 0usize;

    while running.load(Ordering::SeqCst) {
        match link.read_packet(decode_ascii) {
            Ok(Some(packet)) => {
                on_packet(&packet);
                received = received.saturating_add(1);
                if count.is_some_and(|count| received >= count) {
                    break;
                }
            }
            Ok(None) => debug!("empty frame skipped"),
            Err(FrameError::Timeout) => continue,
            Err(FrameError::ConnectionClosed) => {
                info!("stream closed");
                break;
            }
            Err(
                err @ (FrameError::Decoding { .. }
                | FrameError::PayloadTooLarge { .. }
                | FrameError::MalformedFrame),
            ) => warn!(%err, "dropping packet"),
            Err(err) => return Err(frame_error("receive failed", err)),
        }
    }

    Ok(received)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use uartframe_transport::{ByteSource, MemoryStream, TransportError};

    use super::*;
    use crate::cmd::PortArgs;
    use crate::exit::TRANSPORT_ERROR;

    fn args(head: &str, tail: &str) -> ListenArgs {
        ListenArgs {
            port: PortArgs {
                port: "/dev/null".to_string(),
                baud: 115_200,
                timeout: None,
            },
            head: head.to_string(),
            tail: tail.to_string(),
            count: None,
            raw: false,
            strict_empty: false,
            max_payload: None,
        }
    }

    fn collect(wire: &[u8], config: FrameConfig, count: Option<usize>) -> CliResult<Vec<Packet>> {
        let stream = MemoryStream::with_input(wire).close_on_drain();
        let mut link = SerialLink::with_config(stream, config);
        let running = AtomicBool::new(true);
        let mut packets = Vec::new();
        receive_packets(&mut link, &running, count, true, |p| packets.push(p.clone()))?;
        Ok(packets)
    }

    #[test]
    fn listen_config_rejects_equal_markers() {
        assert_eq!(listen_config(&args("@", "@")).unwrap_err().code, USAGE);
        assert_eq!(listen_config(&args("ab", "#")).unwrap_err().code, USAGE);

        let config = listen_config(&args("<", ">")).unwrap();
        assert_eq!((config.head, config.tail), (b'<', b'>'));
    }

    #[test]
    fn listen_config_rejects_zero_max_payload() {
        let mut zero = args("@", "#");
        zero.max_payload = Some(0);
        assert_eq!(listen_config(&zero).unwrap_err().code, USAGE);

        let mut small = args("@", "#");
        small.max_payload = Some(8);
        assert_eq!(listen_config(&small).unwrap().max_payload_size, 8);
    }

    #[test]
    fn oversized_frame_leaves_no_fragments() {
        let config = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let packets = collect(b"@TOOLONG#@ok#", config, None).unwrap();
        assert_eq!(packets, vec![Packet::from("ok")]);
    }

    #[test]
    fn receives_until_stream_closes() {
        let packets = collect(b"@one#@#@AAA@two#", FrameConfig::default(), None).unwrap();
        assert_eq!(packets, vec![Packet::from("one"), Packet::from("two")]);
    }

    #[test]
    fn stops_after_count() {
        let packets = collect(b"@a#@b#@c#", FrameConfig::default(), Some(2)).unwrap();
        assert_eq!(packets, vec![Packet::from("a"), Packet::from("b")]);
    }

    #[test]
    fn bad_packets_are_skipped() {
        let config = FrameConfig {
            empty_frame: EmptyFramePolicy::Reject,
            ..FrameConfig::default()
        };
        let packets = collect(b"@#@\xff#@ok#", config, None).unwrap();
        assert_eq!(packets, vec![Packet::from("ok")]);
    }

    #[test]
    fn stopped_flag_ends_loop_immediately() {
        let mut link = SerialLink::new(MemoryStream::with_input(b"@x#"));
        let running = AtomicBool::new(false);
        let received = receive_packets(&mut link, &running, None, true, |_| {}).unwrap();
        assert_eq!(received, 0);
    }

    struct FaultyLine;

    impl ByteSource for FaultyLine {
        fn read_byte(&mut self) -> uartframe_transport::Result<Option<u8>> {
            Err(TransportError::Open {
                port: "line".to_string(),
                source: std::io::Error::other("unplugged"),
            })
        }
    }

    impl ByteStream for FaultyLine {
        fn write_bytes(&mut self, _bytes: &[u8]) -> uartframe_transport::Result<()> {
            Ok(())
        }

        fn close(&mut self) -> uartframe_transport::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn transport_failure_is_fatal() {
        let mut link = SerialLink::new(FaultyLine);
        let running = AtomicBool::new(true);
        let err = receive_packets(&mut link, &running, None, true, |_| {}).unwrap_err();
        assert_eq!(err.code, TRANSPORT_ERROR);
    }
}
