//! Wire codecs for the link-layer framing this stack needs but doesn't own
//! the specification for (Ethernet, ARP). IPv4 itself is handled by the
//! `etherparse` crate; see [`crate::network_interface`].

pub mod arp;
pub mod error;
pub mod ethernet;

pub use arp::ArpMessage;
pub use error::WireError;
pub use ethernet::{EthernetFrame, EthernetHeader, MacAddress};
