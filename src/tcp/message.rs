//! The abstract messages a [`crate::tcp::sender::TcpSender`] and
//! [`crate::tcp::receiver::TcpReceiver`] exchange. These are not wire bytes;
//! the on-the-wire TCP segment format is outside this crate's scope, the
//! same way the spec treats Ethernet/IPv4/ARP framing as a collaborator's
//! job (see `crate::wire`).

use crate::wrap32::Wrap32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSenderMessage {
    pub seqno: Wrap32,
    pub syn: bool,
    pub payload: Vec<u8>,
    pub fin: bool,
}

impl TcpSenderMessage {
    pub fn sequence_length(&self) -> u64 {
        self.syn as u64 + self.payload.len() as u64 + self.fin as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpReceiverMessage {
    pub ackno: Option<Wrap32>,
    pub window_size: u16,
}
