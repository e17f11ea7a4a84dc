//! ARP (RFC 826), restricted to the Ethernet/IPv4 pairing this stack
//! actually uses: hardware type 1, protocol type 0x0800, hw-len 6,
//! proto-len 4.

use super::error::WireError;
use super::ethernet::MacAddress;

pub const OPCODE_REQUEST: u16 = 1;
pub const OPCODE_REPLY: u16 = 2;

const HTYPE_ETHERNET: u16 = 1;
const PTYPE_IPV4: u16 = 0x0800;
const HLEN_ETHERNET: u8 = 6;
const PLEN_IPV4: u8 = 4;

pub const WIRE_LEN: usize = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpMessage {
    pub opcode: u16,
    pub sender_mac: MacAddress,
    pub sender_ip: u32,
    pub target_mac: MacAddress,
    pub target_ip: u32,
}

impl ArpMessage {
    pub fn request(sender_mac: MacAddress, sender_ip: u32, target_ip: u32) -> Self {
        ArpMessage {
            opcode: OPCODE_REQUEST,
            sender_mac,
            sender_ip,
            target_mac: [0; 6],
            target_ip,
        }
    }

    pub fn reply(sender_mac: MacAddress, sender_ip: u32, target_mac: MacAddress, target_ip: u32) -> Self {
        ArpMessage {
            opcode: OPCODE_REPLY,
            sender_mac,
            sender_ip,
            target_mac,
            target_ip,
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < WIRE_LEN {
            return Err(WireError::TooShort {
                need: WIRE_LEN,
                got: bytes.len(),
            });
        }
        let htype = u16::from_be_bytes([bytes[0], bytes[1]]);
        let ptype = u16::from_be_bytes([bytes[2], bytes[3]]);
        let hlen = bytes[4];
        let plen = bytes[5];
        if htype != HTYPE_ETHERNET || ptype != PTYPE_IPV4 || hlen != HLEN_ETHERNET || plen != PLEN_IPV4 {
            return Err(WireError::UnsupportedArpFamily);
        }
        let opcode = u16::from_be_bytes([bytes[6], bytes[7]]);
        let mut sender_mac = [0u8; 6];
        sender_mac.copy_from_slice(&bytes[8..14]);
        let sender_ip = u32::from_be_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]);
        let mut target_mac = [0u8; 6];
        target_mac.copy_from_slice(&bytes[18..24]);
        let target_ip = u32::from_be_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);
        Ok(ArpMessage {
            opcode,
            sender_mac,
            sender_ip,
            target_mac,
            target_ip,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(WIRE_LEN);
        out.extend_from_slice(&HTYPE_ETHERNET.to_be_bytes());
        out.extend_from_slice(&PTYPE_IPV4.to_be_bytes());
        out.push(HLEN_ETHERNET);
        out.push(PLEN_IPV4);
        out.extend_from_slice(&self.opcode.to_be_bytes());
        out.extend_from_slice(&self.sender_mac);
        out.extend_from_slice(&self.sender_ip.to_be_bytes());
        out.extend_from_slice(&self.target_mac);
        out.extend_from_slice(&self.target_ip.to_be_bytes());
        out
    }
}
