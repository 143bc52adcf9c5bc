//! The learning switch: floods on an unknown or broadcast
//! destination, forwards out a single learned port otherwise, and never
//! sends a frame back out the port it arrived on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use crate::errors::LinkError;
use crate::frame::Frame;
use crate::hwaddr::Hwaddr;
use crate::link::Link;
use crate::node::{LinkNode, NodeId};

struct SwitchInner {
    ports: Vec<Option<Arc<Link>>>,
    /// source hwaddr -> ingress port it was last observed on. Only ever
    /// updated on the flood path: a frame
    /// forwarded because its destination was already known does *not*
    /// refresh this table for its source.
    table: HashMap<Hwaddr, usize>,
}

/// A multi-port learning switch.
pub struct Switch {
    id: NodeId,
    self_ref: Weak<Switch>,
    inner: Mutex<SwitchInner>,
}

impl Switch {
    /// Creates a switch with `nports` unplugged ports.
    pub fn new(nports: usize) -> Arc<Switch> {
        Arc::new_cyclic(|weak| Switch {
            id: NodeId::fresh(),
            self_ref: weak.clone(),
            inner: Mutex::new(SwitchInner { ports: vec![None; nports], table: HashMap::new() }),
        })
    }

    pub fn nports(&self) -> usize {
        self.inner.lock().expect("Switch mutex poisoned").ports.len()
    }

    /// Plugs `link` into `port`, unplugging whatever was there first.
    pub fn plug(self: &Arc<Self>, port: usize, link: &Arc<Link>) -> Result<(), LinkError> {
        self.check_port(port)?;
        self.unplug(port)?;
        let self_node = self.as_link_node();
        link.attach(&self_node).expect("freshly-allocated switch cannot already be attached");
        self.inner.lock().expect("Switch mutex poisoned").ports[port] = Some(link.clone());
        log::debug!("switch: plugged port {}", port);
        Ok(())
    }

    /// Unplugs whatever link is plugged into `port`, if any.
    pub fn unplug(&self, port: usize) -> Result<(), LinkError> {
        self.check_port(port)?;
        let existing = self.inner.lock().expect("Switch mutex poisoned").ports[port].take();
        if let Some(link) = existing {
            let self_node = self.as_link_node();
            let _ = link.detach(&self_node);
            log::debug!("switch: unplugged port {}", port);
        }
        Ok(())
    }

    fn check_port(&self, port: usize) -> Result<(), LinkError> {
        let nports = self.nports();
        if port >= nports {
            return Err(LinkError::PortOutOfRange { port, nports });
        }
        Ok(())
    }

    fn as_link_node(&self) -> Arc<dyn LinkNode> {
        self.self_ref.upgrade().expect("Switch dropped while still in use") as Arc<dyn LinkNode>
    }

    fn ingress_port(ports: &[Option<Arc<Link>>], link: &Arc<Link>) -> Option<usize> {
        ports.iter().position(|slot| matches!(slot, Some(l) if Arc::ptr_eq(l, link)))
    }
}

impl LinkNode for Switch {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn rx_link(&self, link: &Arc<Link>, buf: &[u8]) {
        let frame = match Frame::decode(buf) {
            Ok(f) => f,
            Err(e) => {
                log::warn!("switch: dropping undecodable frame: {}", e);
                return;
            }
        };
        if !frame.verify_checksum() {
            log::warn!("switch: dropping frame with bad checksum from {}", frame.src_hw);
            return;
        }

        let outbound: Vec<Arc<Link>> = {
            let mut inner = self.inner.lock().expect("Switch mutex poisoned");
            let ingress = match Self::ingress_port(&inner.ports, link) {
                Some(p) => p,
                None => {
                    log::warn!("switch: rx_link from an unplugged link, dropping");
                    return;
                }
            };

            let known_port = if frame.dst_hw.is_broadcast() {
                None
            } else {
                inner.table.get(&frame.dst_hw).copied()
            };

            match known_port {
                Some(learned_port) if learned_port == ingress => {
                    log::trace!("switch: dropping frame for {} destined back out its own port", frame.dst_hw);
                    Vec::new()
                }
                Some(learned_port) => {
                    log::trace!("switch: forwarding to {} via learned port {}", frame.dst_hw, learned_port);
                    inner.ports[learned_port].iter().cloned().collect()
                }
                None => {
                    inner.table.insert(frame.src_hw, ingress);
                    log::trace!("switch: flooding from port {} ({} learned there)", ingress, frame.src_hw);
                    inner
                        .ports
                        .iter()
                        .enumerate()
                        .filter(|(p, _)| *p != ingress)
                        .filter_map(|(_, slot)| slot.clone())
                        .collect()
                }
            }
        };

        let self_node = self.as_link_node();
        for out_link in &outbound {
            out_link.tx(&self_node, buf);
        }
    }
}
