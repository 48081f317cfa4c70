use std::collections::BTreeMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Well-known optional parameter tags.
pub mod tags {
    pub const RECEIPTED_MESSAGE_ID: u16 = 0x001E;
    pub const USER_MESSAGE_REFERENCE: u16 = 0x0204;
    pub const SOURCE_PORT: u16 = 0x020A;
    pub const DESTINATION_PORT: u16 = 0x020B;
    pub const SAR_MSG_REF_NUM: u16 = 0x020C;
    pub const SAR_TOTAL_SEGMENTS: u16 = 0x020E;
    pub const SAR_SEGMENT_SEQNUM: u16 = 0x020F;
    pub const SC_INTERFACE_VERSION: u16 = 0x0210;
    pub const MESSAGE_PAYLOAD: u16 = 0x0424;
    pub const MESSAGE_STATE: u16 = 0x0427;
}

/// Optional parameters trailing a PDU's mandatory fields.
///
/// Tags are kept opaque: unknown ones read in and write back out unchanged.
/// The ordered map makes encoding deterministic, which the wire format does
/// not require but tests and traces appreciate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvMap(BTreeMap<u16, Bytes>);

impl TlvMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, tag: u16) -> Option<&Bytes> {
        self.0.get(&tag)
    }

    /// Inserts a value, replacing any previous one under the same tag.
    /// Values longer than the length word can describe are truncated to
    /// `u16::MAX` bytes.
    pub fn insert(&mut self, tag: u16, value: impl Into<Bytes>) -> Option<Bytes> {
        let mut value = value.into();
        value.truncate(u16::MAX as usize);
        self.0.insert(tag, value)
    }

    pub fn remove(&mut self, tag: u16) -> Option<Bytes> {
        self.0.remove(&tag)
    }

    /// First byte of the value, for single-octet parameters such as
    /// sc_interface_version.
    pub fn get_u8(&self, tag: u16) -> Option<u8> {
        self.0.get(&tag).and_then(|v| v.first().copied())
    }

    pub fn insert_u8(&mut self, tag: u16, value: u8) {
        self.insert(tag, Bytes::copy_from_slice(&[value]));
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Bytes)> {
        self.0.iter().map(|(tag, value)| (*tag, value))
    }

    /// Reads `tag, length, value` triples until the buffer is exhausted.
    pub(crate) fn read_from(buf: &mut Bytes) -> Result<Self> {
        let mut map = BTreeMap::new();
        while buf.has_remaining() {
            if buf.remaining() < 4 {
                return Err(Error::MalformedBody("truncated optional parameter header"));
            }
            let tag = buf.get_u16();
            let len = buf.get_u16() as usize;
            if buf.remaining() < len {
                return Err(Error::MalformedBody("truncated optional parameter value"));
            }
            map.insert(tag, buf.copy_to_bytes(len));
        }
        Ok(TlvMap(map))
    }

    pub(crate) fn write_to(&self, buf: &mut BytesMut) {
        // insert caps values at u16::MAX, so the length cast is lossless.
        for (tag, value) in &self.0 {
            buf.put_u16(*tag);
            buf.put_u16(value.len() as u16);
            buf.put_slice(value);
        }
    }
}

impl FromIterator<(u16, Bytes)> for TlvMap {
    fn from_iter<I: IntoIterator<Item = (u16, Bytes)>>(iter: I) -> Self {
        let mut map = TlvMap::new();
        for (tag, value) in iter {
            map.insert(tag, value);
        }
        map
    }
}
