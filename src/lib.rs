//! # netsim - a small layered packet-switched network simulator
//!
//! `netsim` models a physical broadcast medium shared by several attached
//! stations ([`Link`]), a learning link-layer switch ([`Switch`]), and an
//! adapter ([`Adapter`]) that frames datagrams, checksums them, and
//! resolves network addresses to link addresses with a minimal
//! request/reply protocol. It is meant for educational and testing use: a
//! harness builds nodes, wires them together through links, and exercises
//! delivery deterministically, optionally corrupting a single bit of a
//! chosen transmission.
//!
//! ## Layout
//!
//! - [`frame`] and [`resolution`] are pure codecs: bytes in, structured
//!   values out, and back.
//! - [`link`] is the shared medium every node is attached to.
//! - [`switch`] is the learning multi-port forwarder.
//! - [`adapter`] is the single-port, address-resolving endpoint: this is
//!   where almost all of the interesting behaviour lives.
//! - [`waiter`] is the small blocking-map primitive the adapter uses to let
//!   one thread wait on a resolution another thread's delivery completes.
//! - [`node`] is the one capability (`LinkNode`) both the switch and the
//!   adapter implement so a [`Link`] can treat them uniformly.
//!
//! Frame corruption, routing, and resolution are not real networking: there
//! is no raw socket or physical NIC anywhere in this crate. Everything runs
//! in-process, which is what makes the deterministic single-bit corruption
//! and the scenario tests under `tests/` possible.

pub mod adapter;
pub mod errors;
pub mod frame;
pub mod hwaddr;
pub mod link;
pub mod node;
pub mod resolution;
pub mod switch;
pub mod waiter;

pub use adapter::{Adapter, Interface};
pub use errors::{AdapterError, FrameError, LinkError};
pub use frame::{Frame, RESOLUTION_PROTONUM};
pub use hwaddr::{Hwaddr, BROADCAST};
pub use link::Link;
pub use node::{LinkNode, NodeId};
pub use resolution::ResolutionPayload;
pub use switch::Switch;
