use std::fmt;

use num_enum::{FromPrimitive, IntoPrimitive};

/// The bit that distinguishes a response id from its request id.
pub(crate) const RESPONSE_BIT: u32 = 0x8000_0000;

/// SMPP v3.4 command identifiers.
///
/// Unlisted ids decode as `Reserved` and stay representable so they can be
/// echoed back in a generic_nack instead of failing the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum Command {
    GenericNack = 0x8000_0000,
    BindReceiver = 0x0000_0001,
    BindReceiverResp = 0x8000_0001,
    BindTransmitter = 0x0000_0002,
    BindTransmitterResp = 0x8000_0002,
    QuerySm = 0x0000_0003,
    QuerySmResp = 0x8000_0003,
    SubmitSm = 0x0000_0004,
    SubmitSmResp = 0x8000_0004,
    DeliverSm = 0x0000_0005,
    DeliverSmResp = 0x8000_0005,
    Unbind = 0x0000_0006,
    UnbindResp = 0x8000_0006,
    ReplaceSm = 0x0000_0007,
    ReplaceSmResp = 0x8000_0007,
    CancelSm = 0x0000_0008,
    CancelSmResp = 0x8000_0008,
    BindTransceiver = 0x0000_0009,
    BindTransceiverResp = 0x8000_0009,
    Outbind = 0x0000_000B,
    EnquireLink = 0x0000_0015,
    EnquireLinkResp = 0x8000_0015,
    SubmitMulti = 0x0000_0021,
    SubmitMultiResp = 0x8000_0021,
    AlertNotification = 0x0000_0102,
    DataSm = 0x0000_0103,
    DataSmResp = 0x8000_0103,
    #[num_enum(catch_all)]
    Reserved(u32),
}

impl Command {
    pub fn is_response(self) -> bool {
        u32::from(self) & RESPONSE_BIT != 0
    }

    pub fn is_request(self) -> bool {
        !self.is_response()
    }

    /// The paired response id (request id with bit 31 set).
    pub fn response(self) -> Command {
        Command::from(u32::from(self) | RESPONSE_BIT)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::GenericNack => "generic_nack",
            Command::BindReceiver => "bind_receiver",
            Command::BindReceiverResp => "bind_receiver_resp",
            Command::BindTransmitter => "bind_transmitter",
            Command::BindTransmitterResp => "bind_transmitter_resp",
            Command::QuerySm => "query_sm",
            Command::QuerySmResp => "query_sm_resp",
            Command::SubmitSm => "submit_sm",
            Command::SubmitSmResp => "submit_sm_resp",
            Command::DeliverSm => "deliver_sm",
            Command::DeliverSmResp => "deliver_sm_resp",
            Command::Unbind => "unbind",
            Command::UnbindResp => "unbind_resp",
            Command::ReplaceSm => "replace_sm",
            Command::ReplaceSmResp => "replace_sm_resp",
            Command::CancelSm => "cancel_sm",
            Command::CancelSmResp => "cancel_sm_resp",
            Command::BindTransceiver => "bind_transceiver",
            Command::BindTransceiverResp => "bind_transceiver_resp",
            Command::Outbind => "outbind",
            Command::EnquireLink => "enquire_link",
            Command::EnquireLinkResp => "enquire_link_resp",
            Command::SubmitMulti => "submit_multi",
            Command::SubmitMultiResp => "submit_multi_resp",
            Command::AlertNotification => "alert_notification",
            Command::DataSm => "data_sm",
            Command::DataSmResp => "data_sm_resp",
            Command::Reserved(id) => return write!(f, "reserved({id:#010x})"),
        };
        f.write_str(name)
    }
}
