use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_enum::{FromPrimitive, IntoPrimitive};

use super::{get_cstring, get_u8, put_cstring, TlvMap};
use crate::error::{Error, Result};

/// Messaging mode, bits 0-1 of esm_class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessagingMode {
    #[default]
    Default,
    Datagram,
    Forward,
    StoreAndForward,
}

impl MessagingMode {
    fn from_bits(b: u8) -> Self {
        match b & 0x03 {
            0x00 => MessagingMode::Default,
            0x01 => MessagingMode::Datagram,
            0x02 => MessagingMode::Forward,
            _ => MessagingMode::StoreAndForward,
        }
    }

    fn bits(self) -> u8 {
        match self {
            MessagingMode::Default => 0x00,
            MessagingMode::Datagram => 0x01,
            MessagingMode::Forward => 0x02,
            MessagingMode::StoreAndForward => 0x03,
        }
    }
}

/// Message type, bits 2-5 of esm_class. Values outside the catalog are kept
/// raw in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum MessageType {
    Default = 0x00,
    DeliveryReceipt = 0x04,
    DeliveryAck = 0x08,
    ManualUserAck = 0x10,
    ConversationAbort = 0x18,
    IntermediateNotice = 0x20,
    #[num_enum(catch_all)]
    Other(u8),
}

// Hand-written: num_enum's `catch_all` rejects the derived `#[default]` marker.
impl Default for MessageType {
    fn default() -> Self {
        MessageType::Default
    }
}

/// Decomposed esm_class octet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EsmClass {
    pub mode: MessagingMode,
    pub message_type: MessageType,
    pub udhi: bool,
    pub reply_path: bool,
}

impl EsmClass {
    pub fn from_byte(b: u8) -> Self {
        EsmClass {
            mode: MessagingMode::from_bits(b),
            message_type: MessageType::from(b & 0x3C),
            udhi: b & 0x40 != 0,
            reply_path: b & 0x80 != 0,
        }
    }

    pub fn to_byte(self) -> u8 {
        let mut b = self.mode.bits() | u8::from(self.message_type);
        if self.udhi {
            b |= 0x40;
        }
        if self.reply_path {
            b |= 0x80;
        }
        b
    }
}

/// Delivery receipt request, bits 0-1 of registered_delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum DeliveryReceipt {
    None = 0x00,
    Always = 0x01,
    OnFailure = 0x02,
    #[num_enum(catch_all)]
    Other(u8),
}

impl Default for DeliveryReceipt {
    fn default() -> Self {
        DeliveryReceipt::None
    }
}

/// Decomposed registered_delivery octet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisteredDelivery {
    pub receipt: DeliveryReceipt,
    pub delivery_ack: bool,
    pub user_ack: bool,
    pub intermediate: bool,
}

impl RegisteredDelivery {
    pub fn from_byte(b: u8) -> Self {
        RegisteredDelivery {
            receipt: DeliveryReceipt::from(b & 0x03),
            delivery_ack: b & 0x04 != 0,
            user_ack: b & 0x08 != 0,
            intermediate: b & 0x10 != 0,
        }
    }

    pub fn to_byte(self) -> u8 {
        let mut b = u8::from(self.receipt) & 0x03;
        if self.delivery_ack {
            b |= 0x04;
        }
        if self.user_ack {
            b |= 0x08;
        }
        if self.intermediate {
            b |= 0x10;
        }
        b
    }
}

impl fmt::Display for EsmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.to_byte())
    }
}

// submit_sm and deliver_sm share one wire layout; only the command id and the
// direction of travel differ.
macro_rules! short_message_body {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            pub service_type: String,
            pub source_addr_ton: u8,
            pub source_addr_npi: u8,
            pub source_addr: String,
            pub dest_addr_ton: u8,
            pub dest_addr_npi: u8,
            pub dest_addr: String,
            pub esm_class: EsmClass,
            pub protocol_id: u8,
            pub priority_flag: u8,
            pub schedule_delivery_time: String,
            pub validity_period: String,
            pub registered_delivery: RegisteredDelivery,
            pub replace_if_present: bool,
            pub data_coding: u8,
            pub sm_default_msg_id: u8,
            pub short_message: Vec<u8>,
            pub tlvs: TlvMap,
        }

        impl $name {
            pub(crate) fn read(buf: &mut Bytes) -> Result<Self> {
                let service_type = get_cstring(buf)?;
                let source_addr_ton = get_u8(buf)?;
                let source_addr_npi = get_u8(buf)?;
                let source_addr = get_cstring(buf)?;
                let dest_addr_ton = get_u8(buf)?;
                let dest_addr_npi = get_u8(buf)?;
                let dest_addr = get_cstring(buf)?;
                let esm_class = EsmClass::from_byte(get_u8(buf)?);
                let protocol_id = get_u8(buf)?;
                let priority_flag = get_u8(buf)?;
                let schedule_delivery_time = get_cstring(buf)?;
                let validity_period = get_cstring(buf)?;
                let registered_delivery = RegisteredDelivery::from_byte(get_u8(buf)?);
                let replace_if_present = get_u8(buf)? != 0;
                let data_coding = get_u8(buf)?;
                let sm_default_msg_id = get_u8(buf)?;
                let sm_length = get_u8(buf)? as usize;
                if buf.remaining() < sm_length {
                    return Err(Error::MalformedBody("truncated short_message"));
                }
                let short_message = buf.copy_to_bytes(sm_length).to_vec();
                let tlvs = TlvMap::read_from(buf)?;
                Ok($name {
                    service_type,
                    source_addr_ton,
                    source_addr_npi,
                    source_addr,
                    dest_addr_ton,
                    dest_addr_npi,
                    dest_addr,
                    esm_class,
                    protocol_id,
                    priority_flag,
                    schedule_delivery_time,
                    validity_period,
                    registered_delivery,
                    replace_if_present,
                    data_coding,
                    sm_default_msg_id,
                    short_message,
                    tlvs,
                })
            }

            pub(crate) fn write(&self, buf: &mut BytesMut, version: u8) {
                put_cstring(buf, &self.service_type);
                buf.put_u8(self.source_addr_ton);
                buf.put_u8(self.source_addr_npi);
                put_cstring(buf, &self.source_addr);
                buf.put_u8(self.dest_addr_ton);
                buf.put_u8(self.dest_addr_npi);
                put_cstring(buf, &self.dest_addr);
                buf.put_u8(self.esm_class.to_byte());
                buf.put_u8(self.protocol_id);
                buf.put_u8(self.priority_flag);
                put_cstring(buf, &self.schedule_delivery_time);
                put_cstring(buf, &self.validity_period);
                buf.put_u8(self.registered_delivery.to_byte());
                buf.put_u8(u8::from(self.replace_if_present));
                buf.put_u8(self.data_coding);
                buf.put_u8(self.sm_default_msg_id);
                // sm_length is a single octet
                let n = self.short_message.len().min(255);
                buf.put_u8(n as u8);
                buf.put_slice(&self.short_message[..n]);
                if version >= 0x34 {
                    self.tlvs.write_to(buf);
                }
            }
        }
    };
}

short_message_body! {
    /// submit_sm body: an ESME handing a short message to the message center.
    SubmitSm
}

short_message_body! {
    /// deliver_sm body: the message center delivering a short message (or a
    /// delivery receipt) to an ESME.
    DeliverSm
}

macro_rules! message_id_resp_body {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            pub message_id: String,
            pub tlvs: TlvMap,
        }

        impl $name {
            pub(crate) fn read(buf: &mut Bytes) -> Result<Self> {
                Ok($name {
                    message_id: get_cstring(buf)?,
                    tlvs: TlvMap::read_from(buf)?,
                })
            }

            pub(crate) fn write(&self, buf: &mut BytesMut, version: u8) {
                put_cstring(buf, &self.message_id);
                if version >= 0x34 {
                    self.tlvs.write_to(buf);
                }
            }
        }
    };
}

message_id_resp_body! {
    /// submit_sm_resp body: the message id assigned by the message center.
    SubmitSmResp
}

message_id_resp_body! {
    /// deliver_sm_resp body. The message id is conventionally empty.
    DeliverSmResp
}
