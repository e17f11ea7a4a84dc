//! Turns inbound segments into an ackno + advertised window, feeding their
//! payloads through a [`Reassembler`] into the inbound [`ByteStream`].

use crate::byte_stream::Writer;
use crate::reassembler::Reassembler;
use crate::tcp::config::MAX_RWND;
use crate::tcp::message::{TcpReceiverMessage, TcpSenderMessage};
use crate::wrap32::Wrap32;

#[derive(Debug, Default)]
pub struct TcpReceiver {
    isn: Option<Wrap32>,
    ackno: Wrap32,
    fin_seqno: Option<Wrap32>,
}

impl TcpReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receive(
        &mut self,
        message: TcpSenderMessage,
        reassembler: &mut Reassembler,
        inbound_stream: &mut Writer,
    ) {
        if let Some(isn) = self.isn {
            if message.seqno == isn {
                // Stale retransmission of the original SYN; ignore.
                return;
            }
        }

        if message.syn {
            let isn = message.seqno;
            self.isn = Some(isn);
            self.ackno = isn + message.sequence_length();
            reassembler.insert(0, &message.payload, message.fin, inbound_stream);
        } else if let Some(isn) = self.isn {
            let stream_index = message
                .seqno
                .unwrap(isn, inbound_stream.bytes_pushed())
                .wrapping_sub(1);
            reassembler.insert(stream_index, &message.payload, message.fin, inbound_stream);
            self.ackno = Wrap32::wrap(inbound_stream.bytes_pushed() + 1, isn);
        } else {
            // No SYN seen yet; nothing we can do with this segment.
            return;
        }

        if message.fin {
            if let Some(isn) = self.isn {
                let _ = isn;
                self.fin_seqno = Some(message.seqno + (message.sequence_length() - 1));
            }
        }

        if self.fin_seqno == Some(self.ackno) {
            self.ackno = self.ackno + 1;
            inbound_stream.close();
        }
    }

    pub fn send(&self, inbound_stream: &Writer) -> TcpReceiverMessage {
        let window_size = (inbound_stream.available_capacity() as u64).min(MAX_RWND as u64) as u16;
        TcpReceiverMessage {
            ackno: self.isn.map(|_| self.ackno),
            window_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::byte_stream::ByteStream;

    fn msg(seqno: u32, syn: bool, payload: &[u8], fin: bool) -> TcpSenderMessage {
        TcpSenderMessage {
            seqno: Wrap32::new(seqno),
            syn,
            payload: payload.to_vec(),
            fin,
        }
    }

    #[test]
    fn syn_then_payload_then_fin_closes_stream() {
        let mut stream = ByteStream::new(64);
        let mut reassembler = Reassembler::new();
        let mut receiver = TcpReceiver::new();

        {
            let mut w = stream.writer();
            receiver.receive(msg(0, true, b"", false), &mut reassembler, &mut w);
        }
        let ack = receiver.send(&stream.writer());
        assert_eq!(ack.ackno, Some(Wrap32::new(1)));

        {
            let mut w = stream.writer();
            receiver.receive(msg(1, false, b"hi", true), &mut reassembler, &mut w);
        }
        assert!(stream.writer().is_closed());
        let ack = receiver.send(&stream.writer());
        assert_eq!(ack.ackno, Some(Wrap32::new(4)));
    }

    #[test]
    fn duplicate_syn_with_same_isn_is_ignored() {
        let mut stream = ByteStream::new(64);
        let mut reassembler = Reassembler::new();
        let mut receiver = TcpReceiver::new();
        let mut w = stream.writer();
        receiver.receive(msg(0, true, b"", false), &mut reassembler, &mut w);
        let first_ack = receiver.send(&w);
        receiver.receive(msg(0, true, b"", false), &mut reassembler, &mut w);
        let second_ack = receiver.send(&w);
        assert_eq!(first_ack, second_ack);
    }

    #[test]
    fn no_ackno_before_syn_seen() {
        let stream_capacity = 64;
        let mut stream = ByteStream::new(stream_capacity);
        let receiver = TcpReceiver::new();
        let ack = receiver.send(&stream.writer());
        assert_eq!(ack.ackno, None);
        assert_eq!(ack.window_size as usize, stream_capacity);
    }

    #[test]
    fn window_size_caps_at_max_rwnd() {
        let mut stream = ByteStream::new(u32::MAX as usize + 10);
        let receiver = TcpReceiver::new();
        let ack = receiver.send(&stream.writer());
        assert_eq!(ack.window_size, MAX_RWND);
    }
}
