//! The shared broadcast medium: every node attached to a `Link`
//! receives a copy of everything any other attached node transmits.

use std::sync::{Arc, Mutex, Weak};

use rand::Rng;

use crate::errors::LinkError;
use crate::node::{LinkNode, NodeId};

/// Name of the environment variable that turns on hex-dumping of every
/// transmitted buffer to stderr, read once at construction.
pub const DEBUG_ENV_VAR: &str = "NET_DEBUG";

struct LinkInner {
    nodes: Vec<Weak<dyn LinkNode>>,
    corrupt_next: bool,
}

/// A shared broadcast link. Always held behind an `Arc` since both the
/// harness and every attached node need a handle to it, and a node's
/// `rx_link` is passed the link it arrived on.
pub struct Link {
    name: String,
    debug: bool,
    inner: Mutex<LinkInner>,
}

impl Link {
    /// Creates a link named `name`, deciding whether to hex-dump
    /// transmissions by checking [`DEBUG_ENV_VAR`].
    pub fn new(name: impl Into<String>) -> Arc<Link> {
        Self::with_debug(name, std::env::var(DEBUG_ENV_VAR).is_ok())
    }

    /// Creates a link with an explicit debug-dump setting, bypassing the
    /// environment variable. Mainly useful for tests that want deterministic
    /// output regardless of how the test binary was invoked.
    pub fn with_debug(name: impl Into<String>, debug: bool) -> Arc<Link> {
        Arc::new(Link {
            name: name.into(),
            debug,
            inner: Mutex::new(LinkInner { nodes: Vec::new(), corrupt_next: false }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attaches `node` to this link. Fails if `node` is already attached.
    pub fn attach(&self, node: &Arc<dyn LinkNode>) -> Result<(), LinkError> {
        let mut inner = self.inner.lock().expect("Link mutex poisoned");
        let id = node.node_id();
        if inner.nodes.iter().any(|n| upgraded_id(n) == Some(id)) {
            return Err(LinkError::AlreadyAttached);
        }
        inner.nodes.retain(|n| n.upgrade().is_some());
        inner.nodes.push(Arc::downgrade(node));
        log::debug!("link \"{}\": attached node {:?}", self.name, id);
        Ok(())
    }

    /// Detaches `node` from this link. Fails if `node` was not attached.
    pub fn detach(&self, node: &Arc<dyn LinkNode>) -> Result<(), LinkError> {
        let mut inner = self.inner.lock().expect("Link mutex poisoned");
        let id = node.node_id();
        let before = inner.nodes.len();
        inner.nodes.retain(|n| upgraded_id(n) != Some(id));
        if inner.nodes.len() == before {
            return Err(LinkError::NotAttached);
        }
        log::debug!("link \"{}\": detached node {:?}", self.name, id);
        Ok(())
    }

    /// Arms the one-shot corruption flag: the next `tx` call will flip a
    /// single random bit in a single random byte before delivery.
    pub fn corrupt_next(&self) {
        let mut inner = self.inner.lock().expect("Link mutex poisoned");
        inner.corrupt_next = true;
    }

    /// Transmits `buf` from `sender` to every other attached node. Asserts
    /// that `sender` is attached (a violation is a harness bug).
    pub fn tx(self: &Arc<Self>, sender: &Arc<dyn LinkNode>, buf: &[u8]) {
        let sender_id = sender.node_id();
        let (mut frame, receivers, corrupted) = {
            let mut inner = self.inner.lock().expect("Link mutex poisoned");
            assert!(
                inner.nodes.iter().any(|n| upgraded_id(n) == Some(sender_id)),
                "Link::tx called by a node not attached to this link"
            );
            let receivers: Vec<Arc<dyn LinkNode>> = inner
                .nodes
                .iter()
                .filter_map(Weak::upgrade)
                .filter(|n| n.node_id() != sender_id)
                .collect();
            let corrupted = inner.corrupt_next;
            inner.corrupt_next = false;
            (buf.to_vec(), receivers, corrupted)
        };

        if corrupted && !frame.is_empty() {
            corrupt_one_bit(&mut frame);
        }

        log::trace!(
            "link \"{}\": tx {} bytes to {} receivers{}",
            self.name,
            frame.len(),
            receivers.len(),
            if corrupted { " (corrupted)" } else { "" }
        );
        if self.debug {
            eprintln!(
                "Frame on link \"{}\"{}:",
                self.name,
                if corrupted { " (CORRUPTED)" } else { "" }
            );
            eprint!("{}", hexdump(&frame));
        }

        for receiver in &receivers {
            receiver.rx_link(self, &frame);
        }
    }
}

fn upgraded_id(weak: &Weak<dyn LinkNode>) -> Option<NodeId> {
    weak.upgrade().map(|n| n.node_id())
}

fn corrupt_one_bit(buf: &mut [u8]) {
    let mut rng = rand::thread_rng();
    let byte_idx = rng.gen_range(0..buf.len());
    let bit_idx = rng.gen_range(0..8u32);
    buf[byte_idx] ^= 1 << bit_idx;
}

fn hexdump(data: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    for (ofs, line) in data.chunks(16).enumerate() {
        let hex1: Vec<String> = line[..line.len().min(8)].iter().map(|b| format!("{:02x}", b)).collect();
        let hex2: Vec<String> = if line.len() > 8 {
            line[8..].iter().map(|b| format!("{:02x}", b)).collect()
        } else {
            Vec::new()
        };
        let disp: String = line
            .iter()
            .map(|&b| if (32..128).contains(&b) { b as char } else { '.' })
            .collect();
        let _ = writeln!(
            out,
            "{:08x}  {:<23}  {:<23}  |{}|",
            ofs * 16,
            hex1.join(" "),
            hex2.join(" "),
            disp
        );
    }
    let _ = writeln!(out, "{:08x}", data.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct Recorder {
        id: NodeId,
        received: StdMutex<Vec<Vec<u8>>>,
    }

    impl Recorder {
        fn new() -> Arc<Recorder> {
            Arc::new(Recorder { id: NodeId::fresh(), received: StdMutex::new(Vec::new()) })
        }
    }

    impl LinkNode for Recorder {
        fn node_id(&self) -> NodeId {
            self.id
        }

        fn rx_link(&self, _link: &Arc<Link>, buf: &[u8]) {
            self.received.lock().unwrap().push(buf.to_vec());
        }
    }

    fn as_node(r: &Arc<Recorder>) -> Arc<dyn LinkNode> {
        r.clone() as Arc<dyn LinkNode>
    }

    #[test]
    fn tx_delivers_to_every_other_attached_node_exactly_once() {
        let link = Link::with_debug("test", false);
        let a = Recorder::new();
        let b = Recorder::new();
        let c = Recorder::new();
        link.attach(&as_node(&a)).unwrap();
        link.attach(&as_node(&b)).unwrap();
        link.attach(&as_node(&c)).unwrap();

        link.tx(&as_node(&a), b"hello");

        assert_eq!(a.received.lock().unwrap().len(), 0);
        assert_eq!(b.received.lock().unwrap().as_slice(), &[b"hello".to_vec()]);
        assert_eq!(c.received.lock().unwrap().as_slice(), &[b"hello".to_vec()]);
    }

    #[test]
    fn double_attach_is_rejected() {
        let link = Link::with_debug("test", false);
        let a = Recorder::new();
        link.attach(&as_node(&a)).unwrap();
        assert_eq!(link.attach(&as_node(&a)), Err(LinkError::AlreadyAttached));
    }

    #[test]
    fn detach_of_non_member_fails() {
        let link = Link::with_debug("test", false);
        let a = Recorder::new();
        assert_eq!(link.detach(&as_node(&a)), Err(LinkError::NotAttached));
    }

    #[test]
    #[should_panic(expected = "not attached")]
    fn tx_from_unattached_sender_panics() {
        let link = Link::with_debug("test", false);
        let a = Recorder::new();
        link.tx(&as_node(&a), b"x");
    }

    #[test]
    fn corrupt_next_flips_exactly_one_bit_then_clears() {
        let link = Link::with_debug("test", false);
        let a = Recorder::new();
        let b = Recorder::new();
        link.attach(&as_node(&a)).unwrap();
        link.attach(&as_node(&b)).unwrap();

        link.corrupt_next();
        let original = vec![0u8; 32];
        link.tx(&as_node(&a), &original);
        let received = b.received.lock().unwrap()[0].clone();
        let diff_bits: u32 = original
            .iter()
            .zip(received.iter())
            .map(|(x, y)| (x ^ y).count_ones())
            .sum();
        assert_eq!(diff_bits, 1);

        // flag was consumed: a second transmission is untouched
        b.received.lock().unwrap().clear();
        link.tx(&as_node(&a), &original);
        assert_eq!(b.received.lock().unwrap()[0], original);
    }

    #[test]
    fn corrupt_next_is_consumed_even_with_no_receivers() {
        let link = Link::with_debug("test", false);
        let a = Recorder::new();
        let b = Recorder::new();
        link.attach(&as_node(&a)).unwrap();
        link.corrupt_next();
        link.tx(&as_node(&a), b"no receivers yet");
        link.attach(&as_node(&b)).unwrap();
        link.tx(&as_node(&a), b"later, uncorrupted");
        assert_eq!(b.received.lock().unwrap()[0], b"later, uncorrupted".to_vec());
    }
}
