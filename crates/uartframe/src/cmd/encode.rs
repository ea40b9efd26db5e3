use bytes::BytesMut;
use uartframe_frame::{put_int_array, put_scalar_int, put_text, OverflowPolicy};

use crate::cmd::{EncodeArgs, PayloadCommand};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_wire, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = encode_payload(&args.payload)?;
    print_wire(args.payload.kind(), &wire, format);
    Ok(SUCCESS)
}

/// Encode a CLI payload into wire bytes.
pub fn encode_payload(payload: &PayloadCommand) -> CliResult<Vec<u8>> {
    let mut dst = BytesMut::new();
    match payload {
        PayloadCommand::Ints(args) => {
            let overflow = if args.allow_overflow {
                OverflowPolicy::Extend
            } else {
                OverflowPolicy::Reject
            };
            put_int_array(
                &mut dst,
                &args.values,
                args.framing.head_bytes(),
                args.framing.tail_bytes(),
                overflow,
            )
            .map_err(|err| frame_error("encode failed", err))?;
        }
        PayloadCommand::Int(args) => {
            put_scalar_int(
                &mut dst,
                args.value,
                args.framing.head_bytes(),
                args.framing.tail_bytes(),
            );
        }
        PayloadCommand::Text(args) => {
            put_text(
                &mut dst,
                &args.payload,
                args.framing.head.as_deref(),
                args.framing.tail.as_deref(),
            )
            .map_err(|err| frame_error("encode failed", err))?;
        }
    }
    Ok(dst.to_vec())
}
