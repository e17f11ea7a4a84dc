//! Segmentation, retransmission and RTO back-off. The outstanding and
//! not-yet-sent segments share one `VecDeque`, split by `next_segment`,
//! one of the two representations the design notes call out as
//! equally correct (the other being two separate queues); this mirrors
//! the original C++ `segments_`/`next_segment_` pair directly.

use std::collections::VecDeque;

use rand::Rng;
use tracing::debug;

use crate::byte_stream::Reader;
use crate::tcp::config::MAX_PAYLOAD_SIZE;
use crate::tcp::message::{TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::timer::Timer;
use crate::wrap32::Wrap32;

/// Drain up to `len` bytes from a reader into a freshly allocated buffer.
fn read_from(reader: &mut Reader, len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        let chunk = reader.peek();
        if chunk.is_empty() {
            break;
        }
        let take = (len - out.len()).min(chunk.len());
        out.extend_from_slice(&chunk[..take]);
        reader.pop(take);
    }
    out
}

#[derive(Debug)]
pub struct TcpSender {
    isn: Wrap32,
    timer: Timer,

    absolute_seqno: u64,
    pre_unwrapped_ackno: u64,

    remaining_window_size: u64,
    window_is_zero: bool,
    can_use_magic: bool,

    pre_segment_has_fin: bool,
    available_to_send_fin: bool,

    retransmit_flag: bool,
    sequence_numbers_in_flight: u64,
    consecutive_retransmissions: u64,

    segments: VecDeque<TcpSenderMessage>,
    next_segment: usize,
}

impl TcpSender {
    pub fn new(initial_rto_ms: u64, fixed_isn: Option<Wrap32>) -> Self {
        let isn = fixed_isn.unwrap_or_else(|| Wrap32::new(rand::thread_rng().gen()));
        TcpSender {
            isn,
            timer: Timer::new(initial_rto_ms),
            absolute_seqno: 0,
            pre_unwrapped_ackno: 0,
            // The as-yet-unsent SYN occupies the first window byte.
            remaining_window_size: 1,
            window_is_zero: false,
            can_use_magic: false,
            pre_segment_has_fin: false,
            available_to_send_fin: false,
            retransmit_flag: false,
            sequence_numbers_in_flight: 0,
            consecutive_retransmissions: 0,
            segments: VecDeque::new(),
            next_segment: 0,
        }
    }

    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.sequence_numbers_in_flight
    }

    pub fn consecutive_retransmissions(&self) -> u64 {
        self.consecutive_retransmissions
    }

    fn has_outstanding_segment(&self) -> bool {
        self.next_segment != 0
    }

    fn has_queued_segment(&self) -> bool {
        self.next_segment != self.segments.len()
    }

    /// Read bytes from `outbound_stream` and build as many segments as the
    /// current window allows.
    pub fn push(&mut self, outbound_stream: &mut Reader) {
        let mut window_size = self.remaining_window_size;
        if window_size == 0 && self.can_use_magic {
            self.can_use_magic = false;
            window_size = 1;
        }

        while window_size > 0 {
            let mut syn = false;
            if self.absolute_seqno == 0 {
                window_size -= 1;
                syn = true;
            }

            let payload_len = (MAX_PAYLOAD_SIZE as u64)
                .min(window_size)
                .min(outbound_stream.bytes_buffered() as u64) as usize;
            let payload = read_from(outbound_stream, payload_len);
            if !payload.is_empty() {
                window_size -= payload.len() as u64;
            }

            let mut fin = false;
            if window_size > 0 && outbound_stream.is_finished() && !self.pre_segment_has_fin {
                fin = true;
                self.pre_segment_has_fin = true;
                window_size -= 1;
            }

            let sequence_length = syn as u64 + payload.len() as u64 + fin as u64;
            if sequence_length == 0 {
                return;
            }

            let mut stop_after_this_segment = false;
            if fin && !self.available_to_send_fin {
                self.pre_segment_has_fin = false;
                if payload.is_empty() && !syn {
                    return;
                }
                fin = false;
                stop_after_this_segment = true;
            }

            let msg = TcpSenderMessage {
                seqno: Wrap32::wrap(self.absolute_seqno, self.isn),
                syn,
                payload,
                fin,
            };
            let sequence_length = msg.sequence_length();
            self.absolute_seqno += sequence_length;
            self.sequence_numbers_in_flight += sequence_length;
            self.segments.push_back(msg);
            self.remaining_window_size = window_size;

            if stop_after_this_segment {
                return;
            }
        }
    }

    /// A segment to transmit now, if any: a pending retransmit takes
    /// priority over the next freshly-queued segment.
    pub fn maybe_send(&mut self) -> Option<TcpSenderMessage> {
        if self.retransmit_flag && self.has_outstanding_segment() {
            self.timer.run();
            self.retransmit_flag = false;
            return self.segments.front().cloned();
        }
        if self.has_queued_segment() {
            self.timer.run();
            let msg = self.segments[self.next_segment].clone();
            self.next_segment += 1;
            return Some(msg);
        }
        None
    }

    pub fn receive(&mut self, msg: &TcpReceiverMessage) {
        let unwrapped_ackno = match msg.ackno {
            Some(ackno) => ackno.unwrap(self.isn, self.absolute_seqno),
            None => 0,
        };

        if unwrapped_ackno > self.absolute_seqno {
            return;
        }

        self.available_to_send_fin =
            msg.window_size as u64 + unwrapped_ackno > self.absolute_seqno;
        if msg.window_size == 0 {
            self.available_to_send_fin = unwrapped_ackno >= self.absolute_seqno;
            self.can_use_magic = true;
        }

        self.remaining_window_size =
            unwrapped_ackno + msg.window_size as u64 - self.absolute_seqno;
        self.window_is_zero = self.remaining_window_size == 0;

        if self.pre_unwrapped_ackno < unwrapped_ackno {
            self.receive_new_ack(unwrapped_ackno);
        }
    }

    fn receive_new_ack(&mut self, new_unwrapped_ackno: u64) {
        self.timer.set_rto_by_factor(0);
        if self.has_outstanding_segment() {
            self.timer.restart();
        }
        self.consecutive_retransmissions = 0;
        self.pre_unwrapped_ackno = new_unwrapped_ackno;
        self.remove_acked_segments(new_unwrapped_ackno);
    }

    fn remove_acked_segments(&mut self, unwrapped_ackno: u64) {
        while self.has_outstanding_segment() {
            let front = &self.segments[0];
            let end_absolute_seqno =
                front.seqno.unwrap(self.isn, self.absolute_seqno) + front.sequence_length();
            if unwrapped_ackno < end_absolute_seqno {
                return;
            }
            let front = self.segments.pop_front().unwrap();
            self.sequence_numbers_in_flight -= front.sequence_length();
            self.next_segment -= 1;
        }
    }

    pub fn tick(&mut self, ms_since_last_tick: u64) {
        if !self.has_outstanding_segment() && !self.has_queued_segment() {
            self.timer.stop();
            return;
        }
        self.timer.elapse(ms_since_last_tick);
        if self.timer.expired() {
            self.retransmit_flag = true;
            if !self.window_is_zero {
                self.consecutive_retransmissions += 1;
                self.timer.set_rto_by_factor(2);
                debug!(
                    consecutive = self.consecutive_retransmissions,
                    "RTO expired, retransmitting with back-off"
                );
            } else {
                self.timer.set_rto_by_factor(0);
                debug!("RTO expired against a zero window, retransmitting without back-off");
            }
            self.timer.restart();
        }
    }
}
