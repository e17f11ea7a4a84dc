//! Translates between Ethernet frames (what actually crosses a network
//! link) and IPv4 datagrams (what the rest of the stack deals in), doing
//! ARP resolution for outbound datagrams whose next hop isn't yet known.
//! Grounded on the original `AsyncNetworkInterface`/`NetworkInterface`
//! split in `examples/original_source/`: here that split becomes
//! [`NetworkInterface`] (this module, synchronous per-call) plus
//! [`crate::router::QueuedInterface`] (the queuing wrapper a [`crate::router::Router`]
//! drives). Time is tracked the way the original does it: every entry
//! carries its own age, advanced by whatever `dt` a caller passes to
//! `tick`, not by comparison against a wall-clock timestamp.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use crate::ipv4::Ipv4Datagram;
use crate::wire::{ArpMessage, EthernetFrame, MacAddress};
use crate::wire::ethernet::{BROADCAST, TYPE_ARP, TYPE_IPV4};

/// How long a learned (IP -> Ethernet address) mapping stays valid.
pub const ARP_ENTRY_TTL_MS: u64 = 30_000;
/// How long to wait before re-sending an ARP request for an IP we're
/// already waiting on.
pub const ARP_REQUEST_RETRY_MS: u64 = 5_000;

struct ArpCacheEntry {
    mac: MacAddress,
    age_ms: u64,
}

struct PendingArpRequest {
    ms_since_request: u64,
    waiting_datagram: Ipv4Datagram,
}

/// A network interface that sends and receives Ethernet frames on a
/// physical link, and handles the lower-layer details of Ethernet and
/// ARP so that the rest of the stack can work at the level of IPv4
/// datagrams addressed to known next hops.
pub struct NetworkInterface {
    name: String,
    ethernet_addr: MacAddress,
    ip_addr: u32,

    /// Frames ready to go out over the physical link, oldest first.
    outgoing_frames: VecDeque<EthernetFrame>,

    arp_cache: HashMap<u32, ArpCacheEntry>,
    pending_arp: HashMap<u32, PendingArpRequest>,
}

impl NetworkInterface {
    pub fn new(name: impl Into<String>, ethernet_addr: MacAddress, ip_addr: u32) -> Self {
        NetworkInterface {
            name: name.into(),
            ethernet_addr,
            ip_addr,
            outgoing_frames: VecDeque::new(),
            arp_cache: HashMap::new(),
            pending_arp: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ip_addr(&self) -> u32 {
        self.ip_addr
    }

    pub fn ethernet_addr(&self) -> MacAddress {
        self.ethernet_addr
    }

    pub fn arp_cache_len(&self) -> usize {
        self.arp_cache.len()
    }

    /// Send an IPv4 datagram to `next_hop` (already chosen by the
    /// router). If the Ethernet address for `next_hop` is known, frame
    /// and queue the datagram immediately; otherwise queue an ARP
    /// request (unless one is already outstanding) and hold the datagram
    /// until the reply arrives. If a request is already outstanding for
    /// `next_hop`, the new datagram is dropped: at most one datagram
    /// waits per pending ARP request.
    pub fn send_datagram(&mut self, datagram: Ipv4Datagram, next_hop: u32) {
        if let Some(entry) = self.arp_cache.get(&next_hop) {
            self.queue_ipv4_frame(entry.mac, &datagram);
            return;
        }

        if self.pending_arp.contains_key(&next_hop) {
            trace!(interface = %self.name, ip = %format_ipv4(next_hop), "dropping datagram, ARP already in flight");
            return;
        }

        trace!(interface = %self.name, ip = %format_ipv4(next_hop), "sending ARP request");
        let request = ArpMessage::request(self.ethernet_addr, self.ip_addr, next_hop);
        self.outgoing_frames.push_back(EthernetFrame::new(
            BROADCAST,
            self.ethernet_addr,
            TYPE_ARP,
            request.serialize(),
        ));
        self.pending_arp.insert(
            next_hop,
            PendingArpRequest {
                ms_since_request: 0,
                waiting_datagram: datagram,
            },
        );
    }

    fn queue_ipv4_frame(&mut self, dst: MacAddress, datagram: &Ipv4Datagram) {
        self.outgoing_frames.push_back(EthernetFrame::new(
            dst,
            self.ethernet_addr,
            TYPE_IPV4,
            datagram.serialize(),
        ));
    }

    /// Pop the next frame ready to be handed to the physical link, if any.
    pub fn maybe_send(&mut self) -> Option<EthernetFrame> {
        self.outgoing_frames.pop_front()
    }

    /// Handle a frame that arrived on the physical link. Returns a parsed
    /// IPv4 datagram if the frame carried one addressed to us; ARP
    /// traffic is consumed internally (answering requests, learning
    /// mappings, releasing anything that was pending on a reply).
    pub fn recv_frame(&mut self, frame: EthernetFrame) -> Option<Ipv4Datagram> {
        if frame.header.dst != self.ethernet_addr && frame.header.dst != BROADCAST {
            return None;
        }

        match frame.header.ethertype {
            TYPE_IPV4 => Ipv4Datagram::parse(&frame.payload).ok(),
            TYPE_ARP => {
                self.handle_arp(frame.header.src, &frame.payload);
                None
            }
            _ => None,
        }
    }

    fn handle_arp(&mut self, frame_src: MacAddress, payload: &[u8]) {
        let Ok(msg) = ArpMessage::parse(payload) else {
            return;
        };

        self.learn(msg.sender_ip, msg.sender_mac);

        if msg.opcode == crate::wire::arp::OPCODE_REQUEST && msg.target_ip == self.ip_addr {
            debug!(interface = %self.name, from = %format_ipv4(msg.sender_ip), "answering ARP request");
            let reply = ArpMessage::reply(self.ethernet_addr, self.ip_addr, msg.sender_mac, msg.sender_ip);
            self.outgoing_frames.push_back(EthernetFrame::new(
                frame_src,
                self.ethernet_addr,
                TYPE_ARP,
                reply.serialize(),
            ));
        }
    }

    fn learn(&mut self, ip: u32, mac: MacAddress) {
        self.arp_cache.insert(ip, ArpCacheEntry { mac, age_ms: 0 });
        if let Some(pending) = self.pending_arp.remove(&ip) {
            self.queue_ipv4_frame(mac, &pending.waiting_datagram);
        }
    }

    /// Advance internal state by `delta_ms`: age (and evict) cache
    /// entries, and re-broadcast ARP requests for anything we're still
    /// waiting on after `ARP_REQUEST_RETRY_MS`.
    pub fn tick(&mut self, delta_ms: u64) {
        self.arp_cache.retain(|_, entry| {
            entry.age_ms += delta_ms;
            entry.age_ms < ARP_ENTRY_TTL_MS
        });

        let mut retries = Vec::new();
        for (&ip, pending) in self.pending_arp.iter_mut() {
            pending.ms_since_request += delta_ms;
            while pending.ms_since_request >= ARP_REQUEST_RETRY_MS {
                pending.ms_since_request -= ARP_REQUEST_RETRY_MS;
                retries.push(ip);
            }
        }
        for ip in retries {
            trace!(interface = %self.name, ip = %format_ipv4(ip), "re-sending ARP request");
            let request = ArpMessage::request(self.ethernet_addr, self.ip_addr, ip);
            self.outgoing_frames.push_back(EthernetFrame::new(
                BROADCAST,
                self.ethernet_addr,
                TYPE_ARP,
                request.serialize(),
            ));
        }
    }
}

fn format_ipv4(addr: u32) -> String {
    let o = addr.to_be_bytes();
    format!("{}.{}.{}.{}", o[0], o[1], o[2], o[3])
}
