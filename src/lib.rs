//! A user-space TCP/IP stack: sequence-number arithmetic, a bounded byte
//! stream, stream reassembly, and a split TCP sender/receiver pair, plus
//! the link layer (Ethernet/ARP) and routing needed to actually move
//! datagrams between interfaces. None of this owns a socket or an event
//! loop; see `bin/tcp_stack_demo.rs` for a minimal embedder wired up
//! against a TAP device.

pub mod byte_stream;
pub mod ipv4;
pub mod network_interface;
pub mod reassembler;
pub mod router;
pub mod tcp;
pub mod wire;
pub mod wrap32;

pub use byte_stream::ByteStream;
pub use ipv4::Ipv4Datagram;
pub use network_interface::NetworkInterface;
pub use reassembler::Reassembler;
pub use router::{QueuedInterface, Route, Router};
pub use tcp::{TcpReceiver, TcpReceiverMessage, TcpSender, TcpSenderMessage};
pub use wrap32::Wrap32;
