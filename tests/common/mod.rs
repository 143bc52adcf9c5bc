//! Shared scaffolding for the scenario tests. Lives under `tests/common/`
//! rather than directly in `tests/`, so Cargo includes it without treating
//! it as its own test binary.

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use netsim::{Adapter, Interface};

/// Records every `(protonum, datagram)` pair delivered to an adapter's
/// upper layer, in delivery order.
#[derive(Clone, Default)]
pub struct Deliveries(pub Arc<Mutex<Vec<(u64, Vec<u8>)>>>);

impl Deliveries {
    pub fn snapshot(&self) -> Vec<(u64, Vec<u8>)> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// Builds an adapter whose upper-layer callback appends to a `Deliveries`
/// log instead of doing anything with the datagram.
pub fn recording_adapter(ip: Ipv4Addr, prefix: u8, gateway: Ipv4Addr, hw: [u8; 6]) -> (Arc<Adapter>, Deliveries) {
    let deliveries = Deliveries::default();
    let sink = deliveries.clone();
    let adapter = Adapter::new(
        netsim::Hwaddr(hw),
        Interface::new(ip, prefix).unwrap(),
        gateway,
        move |proto, dgram| sink.0.lock().unwrap().push((proto, dgram.to_vec())),
    );
    (adapter, deliveries)
}
