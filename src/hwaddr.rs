use std::fmt;

/// A 6-byte link-layer address.
///
/// This plays the role `pnet::util::MacAddr` plays in a real datalink stack,
/// but the simulator never touches a physical NIC so there is no reason to
/// depend on `pnet` for it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hwaddr(pub [u8; 6]);

/// The reserved all-ones address. A frame destined for it is accepted by
/// every adapter on the link.
pub const BROADCAST: Hwaddr = Hwaddr([0xff; 6]);

impl Hwaddr {
    /// Builds a `Hwaddr` from six octets, in the order they appear on the
    /// wire.
    pub const fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Hwaddr {
        Hwaddr([a, b, c, d, e, f])
    }

    /// True for the reserved broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == BROADCAST
    }

    pub(crate) fn from_slice(bytes: &[u8]) -> Hwaddr {
        let mut buf = [0u8; 6];
        buf.copy_from_slice(&bytes[..6]);
        Hwaddr(buf)
    }
}

impl fmt::Display for Hwaddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}
