use bytes::{BufMut, Bytes, BytesMut};

use super::{get_cstring, get_u8, put_cstring, tags, TlvMap, INTERFACE_VERSION};
use crate::error::Result;

/// Mandatory fields shared by the three bind request variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindFields {
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub interface_version: u8,
    pub addr_ton: u8,
    pub addr_npi: u8,
    pub address_range: String,
}

impl Default for BindFields {
    fn default() -> Self {
        BindFields {
            system_id: String::new(),
            password: String::new(),
            system_type: String::new(),
            interface_version: INTERFACE_VERSION,
            addr_ton: 0,
            addr_npi: 0,
            address_range: String::new(),
        }
    }
}

impl BindFields {
    pub(crate) fn read(buf: &mut Bytes) -> Result<Self> {
        Ok(BindFields {
            system_id: get_cstring(buf)?,
            password: get_cstring(buf)?,
            system_type: get_cstring(buf)?,
            interface_version: get_u8(buf)?,
            addr_ton: get_u8(buf)?,
            addr_npi: get_u8(buf)?,
            address_range: get_cstring(buf)?,
        })
    }

    pub(crate) fn write(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.system_id);
        put_cstring(buf, &self.password);
        put_cstring(buf, &self.system_type);
        buf.put_u8(self.interface_version);
        buf.put_u8(self.addr_ton);
        buf.put_u8(self.addr_npi);
        put_cstring(buf, &self.address_range);
    }
}

/// Bind response body: the answering side's system id plus optional
/// parameters (sc_interface_version when 3.4 is in play).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindRespFields {
    pub system_id: String,
    pub tlvs: TlvMap,
}

impl BindRespFields {
    /// Interface version advertised via the 0x0210 optional parameter.
    pub fn sc_interface_version(&self) -> Option<u8> {
        self.tlvs.get_u8(tags::SC_INTERFACE_VERSION)
    }

    pub(crate) fn read(buf: &mut Bytes) -> Result<Self> {
        Ok(BindRespFields {
            system_id: get_cstring(buf)?,
            tlvs: TlvMap::read_from(buf)?,
        })
    }

    pub(crate) fn write(&self, buf: &mut BytesMut) {
        put_cstring(buf, &self.system_id);
        self.tlvs.write_to(buf);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReceiver(pub BindFields);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindTransmitter(pub BindFields);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindTransceiver(pub BindFields);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReceiverResp(pub BindRespFields);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindTransmitterResp(pub BindRespFields);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindTransceiverResp(pub BindRespFields);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn bind_fields_round_trip() {
        let fields = BindFields {
            system_id: "esme01".into(),
            password: "secret".into(),
            system_type: "SMS".into(),
            interface_version: 0x34,
            addr_ton: 1,
            addr_npi: 1,
            address_range: "^49".into(),
        };

        let mut buf = BytesMut::new();
        fields.write(&mut buf);
        let mut wire = buf.freeze();
        let decoded = BindFields::read(&mut wire).unwrap();

        assert_eq!(decoded, fields);
        assert!(wire.is_empty());
    }

    #[test]
    fn empty_strings_encode_as_lone_terminators() {
        let fields = BindFields::default();
        let mut buf = BytesMut::new();
        fields.write(&mut buf);
        // 4 empty c-strings and 3 single-byte fields
        assert_eq!(buf.len(), 7);

        let mut wire = buf.freeze();
        let decoded = BindFields::read(&mut wire).unwrap();
        assert_eq!(decoded.interface_version, INTERFACE_VERSION);
        assert_eq!(decoded.system_id, "");
    }

    #[test]
    fn truncated_bind_body_rejected() {
        let mut wire = Bytes::from_static(b"esme01\x00secret\x00");
        assert!(matches!(
            BindFields::read(&mut wire),
            Err(Error::MalformedBody(_))
        ));
    }

    #[test]
    fn resp_version_tlv() {
        let mut resp = BindRespFields {
            system_id: "smsc".into(),
            tlvs: TlvMap::new(),
        };
        resp.tlvs.insert_u8(tags::SC_INTERFACE_VERSION, 0x34);

        let mut buf = BytesMut::new();
        resp.write(&mut buf);
        let mut wire = buf.freeze();
        let decoded = BindRespFields::read(&mut wire).unwrap();

        assert_eq!(decoded.system_id, "smsc");
        assert_eq!(decoded.sc_interface_version(), Some(0x34));
    }

    #[test]
    fn resp_without_tlvs() {
        let resp = BindRespFields {
            system_id: "smsc".into(),
            tlvs: TlvMap::new(),
        };

        let mut buf = BytesMut::new();
        resp.write(&mut buf);
        assert_eq!(buf.len(), 5);

        let mut wire = buf.freeze();
        let decoded = BindRespFields::read(&mut wire).unwrap();
        assert_eq!(decoded.sc_interface_version(), None);
    }
}
