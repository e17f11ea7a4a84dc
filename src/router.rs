//! Longest-prefix-match routing across a set of interfaces, plus the
//! queuing wrapper each interface needs so a router tick can drain
//! whatever datagrams arrived on it without blocking on I/O. Grounded on
//! the `AsyncNetworkInterface`-over-`NetworkInterface` layering in
//! `examples/original_source/`.

use std::collections::VecDeque;

use tracing::trace;

use crate::ipv4::Ipv4Datagram;
use crate::network_interface::NetworkInterface;
use crate::wire::EthernetFrame;

/// Wraps a [`NetworkInterface`] with inbound/outbound queues so a
/// [`Router`] (or any other embedder) can hand it frames and drain
/// datagrams without each call being synchronous with the physical
/// link. Mirrors what the original implementation's async wrapper does
/// around its bare interface type.
pub struct QueuedInterface {
    interface: NetworkInterface,
    inbound_frames: VecDeque<EthernetFrame>,
    datagrams_received: VecDeque<Ipv4Datagram>,
}

impl QueuedInterface {
    pub fn new(interface: NetworkInterface) -> Self {
        QueuedInterface {
            interface,
            inbound_frames: VecDeque::new(),
            datagrams_received: VecDeque::new(),
        }
    }

    pub fn interface(&self) -> &NetworkInterface {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut NetworkInterface {
        &mut self.interface
    }

    /// Hand the interface a frame that arrived on its physical link.
    pub fn push_inbound_frame(&mut self, frame: EthernetFrame) {
        self.inbound_frames.push_back(frame);
    }

    /// Drain every queued inbound frame through the interface, stashing
    /// any IPv4 datagrams it yields for later retrieval. Call this once
    /// per router tick before routing.
    fn drain_inbound(&mut self) {
        while let Some(frame) = self.inbound_frames.pop_front() {
            if let Some(datagram) = self.interface.recv_frame(frame) {
                self.datagrams_received.push_back(datagram);
            }
        }
    }

    pub fn pop_received_datagram(&mut self) -> Option<Ipv4Datagram> {
        self.datagrams_received.pop_front()
    }

    pub fn send_datagram(&mut self, datagram: Ipv4Datagram, next_hop: u32) {
        self.interface.send_datagram(datagram, next_hop);
    }

    pub fn maybe_send(&mut self) -> Option<EthernetFrame> {
        self.interface.maybe_send()
    }

    pub fn tick(&mut self, delta_ms: u64) {
        self.interface.tick(delta_ms);
    }
}

/// A single routing table entry. `next_hop == None` means the
/// destination is directly attached to `interface_index`; deliver
/// straight to `datagram.destination()` rather than to a gateway.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub route_prefix: u32,
    pub prefix_length: u8,
    pub next_hop: Option<u32>,
    pub interface_index: usize,
}

impl Route {
    fn matches(&self, addr: u32) -> bool {
        if self.prefix_length == 0 {
            return true;
        }
        let mask = u32::MAX.checked_shl(32 - self.prefix_length as u32).unwrap_or(0);
        (addr & mask) == (self.route_prefix & mask)
    }
}

/// Routes IPv4 datagrams among a set of interfaces by longest-prefix
/// match, decrementing TTL and recomputing the checksum on every hop,
/// and silently dropping anything whose TTL would reach zero.
pub struct Router {
    interfaces: Vec<QueuedInterface>,
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Router {
            interfaces: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Add an interface to the router, returning its index for use in
    /// `add_route`.
    pub fn add_interface(&mut self, interface: NetworkInterface) -> usize {
        self.interfaces.push(QueuedInterface::new(interface));
        self.interfaces.len() - 1
    }

    pub fn interface(&self, index: usize) -> &QueuedInterface {
        &self.interfaces[index]
    }

    pub fn interface_mut(&mut self, index: usize) -> &mut QueuedInterface {
        &mut self.interfaces[index]
    }

    pub fn add_route(&mut self, route_prefix: u32, prefix_length: u8, next_hop: Option<u32>, interface_index: usize) {
        self.routes.push(Route {
            route_prefix,
            prefix_length,
            next_hop,
            interface_index,
        });
    }

    /// Find the route with the longest matching prefix for `addr`. Ties
    /// (equal prefix length) are broken in favor of whichever route was
    /// added first: later routes only replace the current best when
    /// they're *strictly* longer, so an equal-length contender never
    /// displaces one already found.
    fn find_route(&self, addr: u32) -> Option<&Route> {
        let mut best: Option<&Route> = None;
        for route in &self.routes {
            if !route.matches(addr) {
                continue;
            }
            match best {
                Some(b) if route.prefix_length <= b.prefix_length => {}
                _ => best = Some(route),
            }
        }
        best
    }

    /// Drain inbound frames on every interface, route whatever datagrams
    /// they yielded, and queue each onto its outgoing interface. Anything
    /// with no matching route, or whose TTL is already <= 1, is dropped.
    pub fn route(&mut self) {
        for iface in &mut self.interfaces {
            iface.drain_inbound();
        }

        for i in 0..self.interfaces.len() {
            while let Some(mut datagram) = self.interfaces[i].pop_received_datagram() {
                let dest = datagram.destination();
                let Some(route) = self.find_route(dest) else {
                    trace!(dest = %dest, "no route, dropping");
                    continue;
                };
                if datagram.ttl() <= 1 {
                    trace!(dest = %dest, "ttl expired, dropping");
                    continue;
                }
                datagram.decrement_ttl_and_recompute_checksum();
                let next_hop = route.next_hop.unwrap_or(dest);
                self.interfaces[route.interface_index].send_datagram(datagram, next_hop);
            }
        }
    }

    /// Advance every interface's ARP/cache timers by `delta_ms`.
    pub fn tick(&mut self, delta_ms: u64) {
        for iface in &mut self.interfaces {
            iface.tick(delta_ms);
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Router::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ethernet::TYPE_IPV4;
    use etherparse::{IpNumber, Ipv4Header};

    fn ip(a: u8, b: u8, c: u8, d: u8) -> u32 {
        u32::from_be_bytes([a, b, c, d])
    }

    fn datagram_to(dst: u32, ttl: u8) -> Ipv4Datagram {
        let header = Ipv4Header::new(4, ttl, IpNumber::UDP, [10, 0, 0, 9], dst.to_be_bytes()).unwrap();
        Ipv4Datagram::new(header, vec![9, 9, 9, 9])
    }

    #[test]
    fn longest_prefix_match_prefers_more_specific_route() {
        let mut router = Router::new();
        let if0 = router.add_interface(NetworkInterface::new("if0", [1; 6], ip(192, 168, 0, 1)));
        let if1 = router.add_interface(NetworkInterface::new("if1", [2; 6], ip(10, 0, 0, 1)));

        router.add_route(ip(0, 0, 0, 0), 0, Some(ip(192, 168, 0, 254)), if0);
        router.add_route(ip(10, 0, 0, 0), 8, None, if1);

        let matched = router.find_route(ip(10, 1, 2, 3)).unwrap();
        assert_eq!(matched.interface_index, if1);
        assert_eq!(matched.next_hop, None);

        let default_matched = router.find_route(ip(8, 8, 8, 8)).unwrap();
        assert_eq!(default_matched.interface_index, if0);
    }

    #[test]
    fn equal_length_prefix_tie_breaks_toward_the_first_route_added() {
        let mut router = Router::new();
        let if0 = router.add_interface(NetworkInterface::new("if0", [1; 6], ip(192, 168, 0, 1)));
        let if1 = router.add_interface(NetworkInterface::new("if1", [2; 6], ip(10, 0, 0, 1)));

        // Both /8 routes match 10.x.x.x equally well; the one added first wins.
        router.add_route(ip(10, 0, 0, 0), 8, None, if0);
        router.add_route(ip(10, 0, 0, 0), 8, None, if1);

        let matched = router.find_route(ip(10, 1, 2, 3)).unwrap();
        assert_eq!(matched.interface_index, if0);
    }

    #[test]
    fn routes_a_datagram_onto_the_matching_interface() {
        let mut router = Router::new();
        let if0 = router.add_interface(NetworkInterface::new("if0", [1; 6], ip(192, 168, 0, 1)));
        let if1 = router.add_interface(NetworkInterface::new("if1", [2; 6], ip(10, 0, 0, 1)));
        router.add_route(ip(10, 0, 0, 0), 8, None, if1);

        let original = datagram_to(ip(10, 0, 0, 5), 5);
        let frame = EthernetFrame::new([1; 6], [9; 6], TYPE_IPV4, original.serialize());
        router.interface_mut(if0).push_inbound_frame(frame);

        router.route();

        // no ARP mapping for 10.0.0.5 yet on if1, so the forwarded datagram
        // is queued behind an ARP request rather than sent directly
        let queued_frame = router.interface_mut(if1).maybe_send();
        assert_eq!(queued_frame.unwrap().header.ethertype, crate::wire::ethernet::TYPE_ARP);
    }

    #[test]
    fn drops_datagram_with_expired_ttl() {
        let mut router = Router::new();
        let if0 = router.add_interface(NetworkInterface::new("if0", [1; 6], ip(192, 168, 0, 1)));
        let if1 = router.add_interface(NetworkInterface::new("if1", [2; 6], ip(10, 0, 0, 1)));
        router.add_route(ip(10, 0, 0, 0), 8, None, if1);

        let dying = datagram_to(ip(10, 0, 0, 5), 1);
        let frame = EthernetFrame::new([1; 6], [9; 6], TYPE_IPV4, dying.serialize());
        router.interface_mut(if0).push_inbound_frame(frame);

        router.route();
        assert!(router.interface_mut(if1).maybe_send().is_none());
    }

    #[test]
    fn drops_datagram_with_no_matching_route() {
        let mut router = Router::new();
        let if0 = router.add_interface(NetworkInterface::new("if0", [1; 6], ip(192, 168, 0, 1)));

        let datagram = datagram_to(ip(172, 16, 0, 5), 64);
        let frame = EthernetFrame::new([1; 6], [9; 6], TYPE_IPV4, datagram.serialize());
        router.interface_mut(if0).push_inbound_frame(frame);

        router.route();
        assert!(router.interface_mut(if0).maybe_send().is_none());
    }
}
