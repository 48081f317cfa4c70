use bytes::{BufMut, Bytes, BytesMut};

use super::sm::{EsmClass, RegisteredDelivery};
use super::{get_cstring, get_u8, put_cstring, TlvMap};
use crate::error::Result;

/// data_sm body. Unlike submit_sm/deliver_sm it carries no inline
/// short_message; payload travels in the 0x0424 optional parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSm {
    pub service_type: String,
    pub source_addr_ton: u8,
    pub source_addr_npi: u8,
    pub source_addr: String,
    pub dest_addr_ton: u8,
    pub dest_addr_npi: u8,
    pub dest_addr: String,
    pub esm_class: EsmClass,
    pub registered_delivery: RegisteredDelivery,
    pub data_coding: u8,
    pub tlvs: TlvMap,
}

impl DataSm {
    pub(crate) fn read(buf: &mut Bytes) -> Result<Self> {
        Ok(DataSm {
            service_type: get_cstring(buf)?,
            source_addr_ton: get_u8(buf)?,
            source_addr_npi: get_u8(buf)?,
            source_addr: get_cstring(buf)?,
            dest_addr_ton: get_u8(buf)?,
            dest_addr_npi: get_u8(buf)?,
            dest_addr: get_cstring(buf)?,
            esm_class: EsmClass::from_byte(get_u8(buf)?),
            registered_delivery: RegisteredDelivery::from_byte(get_u8(buf)?),
            data_coding: get_u8(buf)?,
            tlvs: TlvMap::read_from(buf)?,
        })
    }

    pub(crate) fn write(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.service_type);
        buf.put_u8(self.source_addr_ton);
        buf.put_u8(self.source_addr_npi);
        put_cstring(buf, &self.source_addr);
        buf.put_u8(self.dest_addr_ton);
        buf.put_u8(self.dest_addr_npi);
        put_cstring(buf, &self.dest_addr);
        buf.put_u8(self.esm_class.to_byte());
        buf.put_u8(self.registered_delivery.to_byte());
        buf.put_u8(self.data_coding);
        self.tlvs.write_to(buf);
    }
}

/// data_sm_resp body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSmResp {
    pub message_id: String,
    pub tlvs: TlvMap,
}

impl DataSmResp {
    pub(crate) fn read(buf: &mut Bytes) -> Result<Self> {
        Ok(DataSmResp {
            message_id: get_cstring(buf)?,
            tlvs: TlvMap::read_from(buf)?,
        })
    }

    pub(crate) fn write(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.message_id);
        self.tlvs.write_to(buf);
    }
}
