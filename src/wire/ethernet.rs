//! Minimal Ethernet II framing: just enough of RFC 894 to carry IPv4 and
//! ARP payloads between [`crate::network_interface::NetworkInterface`]s.
//! Plays the "codec collaborator" role the spec assumes is provided
//! externally (see the crate's external-interfaces design notes).

use super::error::WireError;

pub type MacAddress = [u8; 6];

pub const BROADCAST: MacAddress = [0xFF; 6];

pub const TYPE_IPV4: u16 = 0x0800;
pub const TYPE_ARP: u16 = 0x0806;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: MacAddress,
    pub src: MacAddress,
    pub ethertype: u16,
}

pub const HEADER_LEN: usize = 14;

impl EthernetHeader {
    pub fn parse(bytes: &[u8]) -> Result<(Self, &[u8]), WireError> {
        if bytes.len() < HEADER_LEN {
            return Err(WireError::TooShort {
                need: HEADER_LEN,
                got: bytes.len(),
            });
        }
        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&bytes[0..6]);
        src.copy_from_slice(&bytes[6..12]);
        let ethertype = u16::from_be_bytes([bytes[12], bytes[13]]);
        Ok((
            EthernetHeader { dst, src, ethertype },
            &bytes[HEADER_LEN..],
        ))
    }

    pub fn serialize_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.dst);
        out.extend_from_slice(&self.src);
        out.extend_from_slice(&self.ethertype.to_be_bytes());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub header: EthernetHeader,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    pub fn new(dst: MacAddress, src: MacAddress, ethertype: u16, payload: Vec<u8>) -> Self {
        EthernetFrame {
            header: EthernetHeader { dst, src, ethertype },
            payload,
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, WireError> {
        let (header, rest) = EthernetHeader::parse(bytes)?;
        Ok(EthernetFrame {
            header,
            payload: rest.to_vec(),
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len());
        self.header.serialize_into(&mut out);
        out.extend_from_slice(&self.payload);
        out
    }
}
