//! The single capability every node on a `Link` needs: an identity (so a
//! link can tell who attached, and who is sending) and a way to receive
//! bytes. `Adapter` (one port) and `Switch` (many ports) both implement it;
//! a port count of one versus many is just a difference in how the node maps
//! the incoming link back to an ingress index, not a different trait.
//!
//! No inheritance hierarchy here, just one small trait object shared by
//! both concrete node types.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::link::Link;

/// Opaque, process-unique identity for anything that can attach to a
/// `Link`. Used only to answer "is this the node I think it is" without
/// requiring `LinkNode` implementors to be comparable or hashable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

impl NodeId {
    /// Allocates a fresh, never-reused id.
    pub fn fresh() -> NodeId {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Anything that can be attached to a `Link` and receive delivered bytes.
pub trait LinkNode: Send + Sync {
    /// This node's stable identity, used for attach/detach bookkeeping.
    fn node_id(&self) -> NodeId;

    /// Called by `Link::tx` for every attached node other than the sender.
    /// `link` is the link the bytes arrived on (so an implementor holding
    /// more than one link can tell which); `buf` is a defensive copy that
    /// already has any simulated corruption applied.
    fn rx_link(&self, link: &Arc<Link>, buf: &[u8]);
}
