use std::error::Error;
use std::fmt;
use std::net::Ipv4Addr;

/// Errors raised by `Link::attach`/`detach`/`tx` and by port-indexed plug
/// operations on multi-port nodes.
#[derive(Debug, Eq, PartialEq)]
pub enum LinkError {
    /// `detach` was called with a node that is not currently attached.
    NotAttached,

    /// `attach` was called with a node that is already attached.
    AlreadyAttached,

    /// A port index passed to `plug`/`unplug`/`forward` was out of range.
    PortOutOfRange {
        /// The port index that was requested.
        port: usize,
        /// The number of ports the node actually has.
        nports: usize,
    },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LinkError::NotAttached => write!(f, "node is not attached to this link"),
            LinkError::AlreadyAttached => write!(f, "node is already attached to this link"),
            LinkError::PortOutOfRange { port, nports } => {
                write!(f, "port {} out of range for node with {} ports", port, nports)
            }
        }
    }
}

impl Error for LinkError {}

/// Errors raised while decoding bytes read off a link into a `Frame` or
/// `ResolutionPayload`.
#[derive(Debug, Eq, PartialEq)]
pub enum FrameError {
    /// The buffer was shorter than the format's fixed header.
    BadFrame {
        /// What was being decoded and why it was rejected.
        reason: &'static str,
    },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FrameError::BadFrame { reason } => write!(f, "malformed frame: {}", reason),
        }
    }
}

impl Error for FrameError {}

/// Errors raised by `Adapter::output_ip`.
#[derive(Debug, Eq, PartialEq)]
pub enum AdapterError {
    /// Resolution was attempted and retried but never completed.
    NoRouteToHost {
        /// The network address that could not be resolved.
        addr: Ipv4Addr,
    },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AdapterError::NoRouteToHost { addr } => write!(f, "no route to host {}", addr),
        }
    }
}

impl Error for AdapterError {}
