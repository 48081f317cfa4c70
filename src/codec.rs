//! Wire framing for the 16-byte envelope header.
//!
//! Every PDU travels as `command_length | command_id | command_status |
//! sequence_number`, all big-endian `u32`, followed by `command_length - 16`
//! bytes of body. [`SmppCodec`] splits a byte stream into [`Frame`]s and
//! writes them back; it never interprets the body. `command_length` is always
//! derived from the body on encode, so a frame cannot lie about its own size
//! on the way out.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::Error;
use crate::pdu::{Command, Status};

/// Hard ceiling on `command_length`. The largest legal 3.4 PDU (a
/// `message_payload` TLV plus fixed fields) stays well under this; anything
/// bigger means a desynchronized or hostile stream.
pub const MAX_FRAME_LEN: u32 = 128 * 1024;

/// Envelope header length in bytes.
pub const HEADER_LEN: usize = 16;

/// One decoded envelope: the three header fields that survive past framing
/// plus the raw, unparsed body.
///
/// Requests carry [`Status::Ok`] in the status word per the protocol; only
/// responses use it for real. The body stays as [`Bytes`] so frames can be
/// routed and correlated without paying for a decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub status: Status,
    pub sequence: u32,
    pub body: Bytes,
}

impl Frame {
    /// A request envelope. The status word of a request is always zero.
    pub fn request(command: Command, sequence: u32, body: Bytes) -> Frame {
        Frame { command, status: Status::Ok, sequence, body }
    }

    /// A response envelope echoing the request's sequence number.
    pub fn response(command: Command, status: Status, sequence: u32, body: Bytes) -> Frame {
        Frame { command, status, sequence, body }
    }

    /// True when bit 31 of the command id is set.
    pub fn is_response(&self) -> bool {
        self.command.is_response()
    }

    /// Size of this frame on the wire, header included.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.body.len()
    }
}

/// [`Decoder`]/[`Encoder`] pair for envelope frames, for use with
/// `tokio_util`'s `FramedRead`/`FramedWrite`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmppCodec;

impl SmppCodec {
    pub fn new() -> SmppCodec {
        SmppCodec
    }
}

impl Decoder for SmppCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, Error> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]);
        if length < HEADER_LEN as u32 {
            return Err(Error::InvalidHeader(length));
        }
        if length > MAX_FRAME_LEN {
            return Err(Error::FrameTooLarge(length));
        }

        let length = length as usize;
        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        let mut header = src.split_to(HEADER_LEN);
        header.advance(4);
        let command = Command::from(header.get_u32());
        let status = Status::from(header.get_u32());
        let sequence = header.get_u32();
        let body = src.split_to(length - HEADER_LEN).freeze();

        Ok(Some(Frame { command, status, sequence, body }))
    }
}

impl Encoder<Frame> for SmppCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Error> {
        dst.reserve(frame.encoded_len());
        dst.put_u32(frame.encoded_len() as u32);
        dst.put_u32(frame.command.into());
        dst.put_u32(frame.status.into());
        dst.put_u32(frame.sequence);
        dst.put_slice(&frame.body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(codec: &mut SmppCodec, buf: &mut BytesMut) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(frame) = codec.decode(buf).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn round_trip() {
        let mut codec = SmppCodec::new();
        let frame = Frame::response(
            Command::SubmitSmResp,
            Status::InvalidDestAddress,
            77,
            Bytes::from_static(b"msg-001\0"),
        );

        let mut buf = BytesMut::new();
        codec.encode(frame.clone(), &mut buf).unwrap();
        assert_eq!(&buf[..4], &24u32.to_be_bytes());

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_header_waits_for_more() {
        let mut codec = SmppCodec::new();
        let mut buf = BytesMut::from(&[0u8; 7][..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(buf.len(), 7);
    }

    #[test]
    fn partial_body_waits_for_more() {
        let mut codec = SmppCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(
                Frame::request(Command::EnquireLink, 5, Bytes::new()),
                &mut buf,
            )
            .unwrap();
        codec
            .encode(
                Frame::request(Command::SubmitSm, 6, Bytes::from_static(b"abcdef")),
                &mut buf,
            )
            .unwrap();

        // Feed everything except the last byte of the second frame.
        let tail = buf.split_off(buf.len() - 1);
        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, Command::EnquireLink);

        buf.unsplit(tail);
        let frames = decode_all(&mut codec, &mut buf);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].sequence, 6);
        assert_eq!(frames[0].body, Bytes::from_static(b"abcdef"));
    }

    #[test]
    fn length_below_header_is_rejected() {
        let mut codec = SmppCodec::new();
        let mut buf = BytesMut::new();
        buf.put_u32(9);
        buf.put_u32(Command::EnquireLink.into());
        buf.put_u32(0);
        buf.put_u32(1);

        match codec.decode(&mut buf) {
            Err(Error::InvalidHeader(9)) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn oversized_length_is_rejected() {
        let mut codec = SmppCodec::new();
        let mut buf = BytesMut::new();
        buf.put_u32(MAX_FRAME_LEN + 1);
        buf.put_u32(Command::SubmitSm.into());
        buf.put_u32(0);
        buf.put_u32(2);

        match codec.decode(&mut buf) {
            Err(Error::FrameTooLarge(n)) => assert_eq!(n, MAX_FRAME_LEN + 1),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn reserved_command_ids_survive_framing() {
        let mut codec = SmppCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(
                Frame::request(Command::from(0x0000_00AAu32), 9, Bytes::new()),
                &mut buf,
            )
            .unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.command, Command::Reserved(0xAA));
        assert!(!decoded.is_response());
    }
}
