//! Typed PDU bodies layered over the envelope codec.
//!
//! The codec only frames headers and raw bodies; this module gives bodies
//! their shape. Decoding happens where a body is consumed (in a pool worker
//! for inbound requests, at the `send` call site for responses), so a
//! malformed business body never takes the session's event loop down with it.

mod bind;
mod command;
mod data;
mod sm;
mod status;
mod tlv;

pub use bind::{
    BindFields, BindReceiver, BindReceiverResp, BindRespFields, BindTransceiver,
    BindTransceiverResp, BindTransmitter, BindTransmitterResp,
};
pub use command::Command;
pub use data::{DataSm, DataSmResp};
pub use sm::{
    DeliverSm, DeliverSmResp, DeliveryReceipt, EsmClass, MessageType, MessagingMode,
    RegisteredDelivery, SubmitSm, SubmitSmResp,
};
pub use status::Status;
pub use tlv::{tags, TlvMap};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// The interface revision this engine speaks natively.
pub const INTERFACE_VERSION: u8 = 0x34;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenericNack;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unbind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnbindResp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnquireLink;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnquireLinkResp;

/// A decoded PDU body paired with its command id.
///
/// Catalog ids without a body type here (query_sm, replace_sm, cancel_sm,
/// submit_multi, outbind, alert_notification) are recognized on the wire but
/// rejected as unsupported when they arrive as requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pdu {
    GenericNack(GenericNack),
    BindReceiver(BindReceiver),
    BindReceiverResp(BindReceiverResp),
    BindTransmitter(BindTransmitter),
    BindTransmitterResp(BindTransmitterResp),
    BindTransceiver(BindTransceiver),
    BindTransceiverResp(BindTransceiverResp),
    Unbind(Unbind),
    UnbindResp(UnbindResp),
    EnquireLink(EnquireLink),
    EnquireLinkResp(EnquireLinkResp),
    SubmitSm(SubmitSm),
    SubmitSmResp(SubmitSmResp),
    DeliverSm(DeliverSm),
    DeliverSmResp(DeliverSmResp),
    DataSm(DataSm),
    DataSmResp(DataSmResp),
}

impl Pdu {
    pub fn command(&self) -> Command {
        match self {
            Pdu::GenericNack(_) => Command::GenericNack,
            Pdu::BindReceiver(_) => Command::BindReceiver,
            Pdu::BindReceiverResp(_) => Command::BindReceiverResp,
            Pdu::BindTransmitter(_) => Command::BindTransmitter,
            Pdu::BindTransmitterResp(_) => Command::BindTransmitterResp,
            Pdu::BindTransceiver(_) => Command::BindTransceiver,
            Pdu::BindTransceiverResp(_) => Command::BindTransceiverResp,
            Pdu::Unbind(_) => Command::Unbind,
            Pdu::UnbindResp(_) => Command::UnbindResp,
            Pdu::EnquireLink(_) => Command::EnquireLink,
            Pdu::EnquireLinkResp(_) => Command::EnquireLinkResp,
            Pdu::SubmitSm(_) => Command::SubmitSm,
            Pdu::SubmitSmResp(_) => Command::SubmitSmResp,
            Pdu::DeliverSm(_) => Command::DeliverSm,
            Pdu::DeliverSmResp(_) => Command::DeliverSmResp,
            Pdu::DataSm(_) => Command::DataSm,
            Pdu::DataSmResp(_) => Command::DataSmResp,
        }
    }

    /// Encodes the body against the negotiated interface version. Optional
    /// parameters are dropped below 3.4.
    pub fn to_body(&self, version: u8) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            Pdu::GenericNack(_)
            | Pdu::Unbind(_)
            | Pdu::UnbindResp(_)
            | Pdu::EnquireLink(_)
            | Pdu::EnquireLinkResp(_) => {}
            Pdu::BindReceiver(p) => p.0.write(&mut buf),
            Pdu::BindTransmitter(p) => p.0.write(&mut buf),
            Pdu::BindTransceiver(p) => p.0.write(&mut buf),
            Pdu::BindReceiverResp(p) => p.0.write(&mut buf),
            Pdu::BindTransmitterResp(p) => p.0.write(&mut buf),
            Pdu::BindTransceiverResp(p) => p.0.write(&mut buf),
            Pdu::SubmitSm(p) => p.write(&mut buf, version),
            Pdu::SubmitSmResp(p) => p.write(&mut buf, version),
            Pdu::DeliverSm(p) => p.write(&mut buf, version),
            Pdu::DeliverSmResp(p) => p.write(&mut buf, version),
            Pdu::DataSm(p) => p.write(&mut buf),
            Pdu::DataSmResp(p) => p.write(&mut buf),
        }
        buf.freeze()
    }

    /// Decodes a body for a known command id. Optional parameters are read
    /// whenever trailing bytes are present, whatever version was negotiated;
    /// peers are not uniformly strict about this.
    pub fn from_body(command: Command, mut body: Bytes) -> Result<Pdu> {
        let buf = &mut body;
        Ok(match command {
            Command::GenericNack => Pdu::GenericNack(GenericNack),
            Command::BindReceiver => Pdu::BindReceiver(BindReceiver(BindFields::read(buf)?)),
            Command::BindTransmitter => {
                Pdu::BindTransmitter(BindTransmitter(BindFields::read(buf)?))
            }
            Command::BindTransceiver => {
                Pdu::BindTransceiver(BindTransceiver(BindFields::read(buf)?))
            }
            Command::BindReceiverResp => {
                Pdu::BindReceiverResp(BindReceiverResp(BindRespFields::read(buf)?))
            }
            Command::BindTransmitterResp => {
                Pdu::BindTransmitterResp(BindTransmitterResp(BindRespFields::read(buf)?))
            }
            Command::BindTransceiverResp => {
                Pdu::BindTransceiverResp(BindTransceiverResp(BindRespFields::read(buf)?))
            }
            Command::Unbind => Pdu::Unbind(Unbind),
            Command::UnbindResp => Pdu::UnbindResp(UnbindResp),
            Command::EnquireLink => Pdu::EnquireLink(EnquireLink),
            Command::EnquireLinkResp => Pdu::EnquireLinkResp(EnquireLinkResp),
            Command::SubmitSm => Pdu::SubmitSm(SubmitSm::read(buf)?),
            Command::SubmitSmResp => Pdu::SubmitSmResp(SubmitSmResp::read(buf)?),
            Command::DeliverSm => Pdu::DeliverSm(DeliverSm::read(buf)?),
            Command::DeliverSmResp => Pdu::DeliverSmResp(DeliverSmResp::read(buf)?),
            Command::DataSm => Pdu::DataSm(DataSm::read(buf)?),
            Command::DataSmResp => Pdu::DataSmResp(DataSmResp::read(buf)?),
            other => return Err(Error::UnknownCommand(u32::from(other))),
        })
    }

    /// The default paired response for a request PDU. `None` for PDUs that
    /// are already responses.
    pub fn make_response(&self) -> Option<Pdu> {
        Pdu::default_response(self.command())
    }

    /// Same pairing keyed by command id, for requests whose body never
    /// decoded.
    pub(crate) fn default_response(command: Command) -> Option<Pdu> {
        Some(match command {
            Command::BindReceiver => Pdu::BindReceiverResp(BindReceiverResp::default()),
            Command::BindTransmitter => Pdu::BindTransmitterResp(BindTransmitterResp::default()),
            Command::BindTransceiver => Pdu::BindTransceiverResp(BindTransceiverResp::default()),
            Command::Unbind => Pdu::UnbindResp(UnbindResp),
            Command::EnquireLink => Pdu::EnquireLinkResp(EnquireLinkResp),
            Command::SubmitSm => Pdu::SubmitSmResp(SubmitSmResp::default()),
            Command::DeliverSm => Pdu::DeliverSmResp(DeliverSmResp::default()),
            Command::DataSm => Pdu::DataSmResp(DataSmResp::default()),
            _ => return None,
        })
    }
}

/// Reads a 0x00-terminated string. Bytes are taken as-is; invalid UTF-8 is
/// replaced rather than rejected, since identities on real links are not
/// always clean.
pub(crate) fn get_cstring(buf: &mut Bytes) -> Result<String> {
    match buf.iter().position(|b| *b == 0) {
        Some(n) => {
            let raw = buf.split_to(n);
            buf.advance(1);
            Ok(String::from_utf8_lossy(&raw).into_owned())
        }
        None => Err(Error::MalformedBody("unterminated c-string")),
    }
}

pub(crate) fn put_cstring(buf: &mut BytesMut, s: &str) {
    buf.put_slice(s.as_bytes());
    buf.put_u8(0);
}

pub(crate) fn get_u8(buf: &mut Bytes) -> Result<u8> {
    if !buf.has_remaining() {
        return Err(Error::MalformedBody("truncated body"));
    }
    Ok(buf.get_u8())
}
