//! IPv4 datagrams. Parsing and checksum computation are delegated to
//! `etherparse`, the teacher's own dependency for this concern (see
//! `tcp::connection::Connection` in the original `binoyjayan-tcp-rs`
//! source, which builds/writes `etherparse::Ipv4Header` the same way).

use etherparse::{Ipv4Header, Ipv4HeaderSlice};

use crate::wire::WireError;

#[derive(Debug, Clone, PartialEq)]
pub struct Ipv4Datagram {
    pub header: Ipv4Header,
    pub payload: Vec<u8>,
}

impl Ipv4Datagram {
    pub fn new(header: Ipv4Header, payload: Vec<u8>) -> Self {
        Ipv4Datagram { header, payload }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, WireError> {
        let slice = Ipv4HeaderSlice::from_slice(bytes).map_err(|_| WireError::TooShort {
            need: 20,
            got: bytes.len(),
        })?;
        let header = slice.to_header();
        let header_len = slice.slice().len();
        Ok(Ipv4Datagram {
            header,
            payload: bytes[header_len..].to_vec(),
        })
    }

    pub fn destination(&self) -> u32 {
        u32::from_be_bytes(self.header.destination)
    }

    pub fn source(&self) -> u32 {
        u32::from_be_bytes(self.header.source)
    }

    pub fn ttl(&self) -> u8 {
        self.header.time_to_live
    }

    /// Decrement TTL by one and recompute the header checksum. Caller must
    /// have already checked `ttl() > 1`.
    pub fn decrement_ttl_and_recompute_checksum(&mut self) {
        self.header.time_to_live -= 1;
        self.compute_checksum();
    }

    /// Recompute the header checksum in place against the header's current
    /// fields. This is the egress-only checksum recompute the spec calls
    /// for (ingress checksums are never verified); it must not disturb any
    /// other header field (identification, flags, fragment offset,
    /// DSCP/ECN) the way rebuilding the header from scratch would.
    pub fn compute_checksum(&mut self) {
        self.header.header_checksum = self.header.calc_header_checksum();
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header.header_len() as usize + self.payload.len());
        self.header
            .write(&mut out)
            .expect("in-memory Vec writes never fail");
        out.extend_from_slice(&self.payload);
        out
    }
}
