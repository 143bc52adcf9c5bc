//! The adapter: the only component with a nontrivial state machine.
//! Frames it, checksums it, resolves network addresses to link addresses,
//! and routes around a single default gateway.

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use ipnetwork::Ipv4Network;

use crate::errors::AdapterError;
use crate::frame::{Frame, RESOLUTION_PROTONUM};
use crate::hwaddr::{Hwaddr, BROADCAST};
use crate::link::Link;
use crate::node::{LinkNode, NodeId};
use crate::resolution::ResolutionPayload;
use crate::waiter::BlockingKeyedWaiter;

/// Number of broadcast-request/wait rounds the resolution protocol will
/// attempt before giving up.
const RESOLUTION_ATTEMPTS: u32 = 3;

/// How long a single resolution attempt waits for a reply before retrying.
const RESOLUTION_TIMEOUT: Duration = Duration::from_millis(100);

/// Bound on gateway-redirect iterations in `output_ip`, so a misconfigured
/// gateway chain fails fast instead of looping forever.
const MAX_REDIRECTS: u32 = 8;

/// An adapter's local network-layer identity: an address plus the subnet it
/// belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interface {
    ip: Ipv4Addr,
    network: Ipv4Network,
}

impl Interface {
    /// Builds an interface descriptor for `ip` with the given subnet prefix
    /// length (e.g. `24` for a `/24`).
    pub fn new(ip: Ipv4Addr, prefix: u8) -> Result<Interface, ipnetwork::IpNetworkError> {
        let network = Ipv4Network::new(ip, prefix)?;
        Ok(Interface { ip, network })
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn network(&self) -> Ipv4Network {
        self.network
    }

    /// True if `addr` lies in this interface's subnet.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.network.contains(addr)
    }
}

struct AdapterInner {
    link: Option<Arc<Link>>,
}

/// A single-port adapter: frames/deframes, address-resolves, and routes.
pub struct Adapter {
    id: NodeId,
    self_ref: Weak<Adapter>,
    hwaddr: Hwaddr,
    iface: Interface,
    gateway: Ipv4Addr,
    /// Doubles as the resolution cache *and* the mechanism a thread blocks
    /// on while a resolution round-trip is in flight: an entry
    /// becoming present is simultaneously "the cache now has this mapping"
    /// and "wake up anyone waiting for it".
    resolved: BlockingKeyedWaiter<Ipv4Addr, Hwaddr>,
    inner: Mutex<AdapterInner>,
    input: Box<dyn Fn(u64, &[u8]) + Send + Sync>,
}

impl Adapter {
    /// Creates an adapter. `input` is the upper-layer delivery hook,
    /// invoked with `(protonum, payload)` for every frame accepted by
    /// `rx`.
    pub fn new<F>(hwaddr: Hwaddr, iface: Interface, gateway: Ipv4Addr, input: F) -> Arc<Adapter>
    where
        F: Fn(u64, &[u8]) + Send + Sync + 'static,
    {
        Arc::new_cyclic(|weak| Adapter {
            id: NodeId::fresh(),
            self_ref: weak.clone(),
            hwaddr,
            iface,
            gateway,
            resolved: BlockingKeyedWaiter::new(),
            inner: Mutex::new(AdapterInner { link: None }),
            input: Box::new(input),
        })
    }

    pub fn hwaddr(&self) -> Hwaddr {
        self.hwaddr
    }

    pub fn iface(&self) -> Interface {
        self.iface
    }

    pub fn gateway(&self) -> Ipv4Addr {
        self.gateway
    }

    /// Attaches this adapter to `link`, unplugging any link it was
    /// previously attached to.
    pub fn plug(self: &Arc<Self>, link: &Arc<Link>) {
        self.unplug();
        let self_node = self.as_link_node();
        link.attach(&self_node).expect("freshly-unplugged adapter cannot already be attached");
        self.inner.lock().expect("Adapter mutex poisoned").link = Some(link.clone());
    }

    /// Detaches this adapter from whatever link it is plugged into, if any.
    pub fn unplug(&self) {
        let existing = self.inner.lock().expect("Adapter mutex poisoned").link.take();
        if let Some(link) = existing {
            let self_node = self.as_link_node();
            let _ = link.detach(&self_node);
        }
    }

    /// Whether this adapter has a resolved mapping for `addr` cached.
    pub fn cached(&self, addr: Ipv4Addr) -> Option<Hwaddr> {
        self.resolved.peek(&addr)
    }

    fn as_link_node(&self) -> Arc<dyn LinkNode> {
        self.self_ref.upgrade().expect("Adapter dropped while still in use") as Arc<dyn LinkNode>
    }

    /// Link-layer send: frames `payload` and transmits it. A no-op if no
    /// link is attached.
    pub fn output(&self, protonum: u64, dst_hw: Hwaddr, payload: Vec<u8>) {
        let link = self.inner.lock().expect("Adapter mutex poisoned").link.clone();
        let Some(link) = link else {
            log::debug!("adapter {}: output with no link attached, dropping", self.hwaddr);
            return;
        };
        let frame = Frame::new(protonum, dst_hw, self.hwaddr, payload);
        let self_node = self.as_link_node();
        link.tx(&self_node, &frame.encode());
    }

    /// Network-layer send: resolves `dst_ip` to a link address (via the
    /// default gateway if necessary) and sends. Fails with
    /// `NoRouteToHost` if resolution cannot complete.
    pub fn output_ip(&self, protonum: u64, dst_ip: Ipv4Addr, payload: Vec<u8>) -> Result<(), AdapterError> {
        let mut target = dst_ip;
        for _ in 0..MAX_REDIRECTS {
            if !self.iface.contains(target) {
                log::trace!("adapter {}: {} off-subnet, redirecting via gateway {}", self.hwaddr, target, self.gateway);
                target = self.gateway;
                continue;
            }
            if let Some(hw) = self.resolved.peek(&target) {
                self.output(protonum, hw, payload);
                return Ok(());
            }
            self.resolve(target)?;
        }
        Err(AdapterError::NoRouteToHost { addr: dst_ip })
    }

    /// Runs the request/wait/retry resolution protocol for `target`:
    /// up to three broadcast requests, each followed by a 100ms
    /// wait for a success reply.
    fn resolve(&self, target: Ipv4Addr) -> Result<(), AdapterError> {
        for attempt in 1..=RESOLUTION_ATTEMPTS {
            let request = ResolutionPayload::request(self.hwaddr, self.iface.ip(), target);
            log::debug!("adapter {}: resolution attempt {} for {}", self.hwaddr, attempt, target);
            self.output(RESOLUTION_PROTONUM, BROADCAST, request.encode());
            if self.resolved.get(&target, RESOLUTION_TIMEOUT).is_some() {
                return Ok(());
            }
        }
        Err(AdapterError::NoRouteToHost { addr: target })
    }

    /// Called by `rx_link` glue with the raw bytes of an inbound frame.
    pub fn rx(&self, buf: &[u8]) {
        let frame = match Frame::decode(buf) {
            Ok(f) => f,
            Err(e) => {
                log::warn!("adapter {}: dropping undecodable frame: {}", self.hwaddr, e);
                return;
            }
        };
        if !frame.verify_checksum() {
            log::warn!("adapter {}: dropping frame with bad checksum from {}", self.hwaddr, frame.src_hw);
            return;
        }

        if frame.protonum == RESOLUTION_PROTONUM {
            self.handle_resolution(&frame.payload);
            return;
        }

        if frame.dst_hw == self.hwaddr || frame.dst_hw.is_broadcast() {
            (self.input)(frame.protonum, &frame.payload);
        }
    }

    fn handle_resolution(&self, payload_bytes: &[u8]) {
        let payload = match ResolutionPayload::decode(payload_bytes) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("adapter {}: dropping undecodable resolution payload: {}", self.hwaddr, e);
                return;
            }
        };
        if payload.dst_ip != self.iface.ip() {
            return;
        }

        // Unconditional learn: whether this is a request or a reply, the
        // sender's mapping is now known.
        self.resolved.put(payload.src_ip, payload.src_hw);

        if payload.success && payload.dst_hw == self.hwaddr {
            log::debug!("adapter {}: resolution for {} completed", self.hwaddr, payload.src_ip);
            return;
        }

        let reply = ResolutionPayload::reply(payload.src_hw, self.hwaddr, payload.src_ip, self.iface.ip());
        // Routed through output_ip so it travels via whatever path the
        // responder itself would use; the learn step above guarantees a
        // cache hit and thus a direct unicast, not a fresh resolution.
        if let Err(e) = self.output_ip(RESOLUTION_PROTONUM, payload.src_ip, reply.encode()) {
            log::warn!("adapter {}: could not route resolution reply: {}", self.hwaddr, e);
        }
    }
}

impl LinkNode for Adapter {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn rx_link(&self, link: &Arc<Link>, buf: &[u8]) {
        let attached = self.inner.lock().expect("Adapter mutex poisoned").link.clone();
        match attached {
            Some(ref attached) if Arc::ptr_eq(attached, link) => {}
            _ => panic!("Adapter received frame from a link it is not attached to"),
        }
        self.rx(buf);
    }
}
