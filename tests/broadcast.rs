//! Link-layer broadcast delivery.

mod common;

use std::net::Ipv4Addr;
use std::thread::sleep;
use std::time::Duration;

use netsim::{Link, BROADCAST};

#[test]
fn broadcast_reaches_every_peer_except_the_sender() {
    let link = Link::with_debug("s2", false);
    let (a, a_log) = common::recording_adapter(Ipv4Addr::new(10, 0, 0, 1), 24, Ipv4Addr::new(10, 0, 0, 254), [0, 0, 0, 0, 0, 1]);
    let (b, b_log) = common::recording_adapter(Ipv4Addr::new(10, 0, 0, 2), 24, Ipv4Addr::new(10, 0, 0, 254), [0, 0, 0, 0, 0, 2]);
    let (c, c_log) = common::recording_adapter(Ipv4Addr::new(10, 0, 0, 3), 24, Ipv4Addr::new(10, 0, 0, 254), [0, 0, 0, 0, 0, 3]);
    let (d, d_log) = common::recording_adapter(Ipv4Addr::new(10, 0, 0, 4), 24, Ipv4Addr::new(10, 0, 0, 254), [0, 0, 0, 0, 0, 4]);
    for adapter in [&a, &b, &c, &d] {
        adapter.plug(&link);
    }

    b.output(0xf00f, BROADCAST, b"hello everybody I'm a baby seal".to_vec());
    sleep(Duration::from_millis(20));

    let expected = vec![(0xf00f, b"hello everybody I'm a baby seal".to_vec())];
    assert_eq!(a_log.snapshot(), expected);
    assert_eq!(c_log.snapshot(), expected);
    assert_eq!(d_log.snapshot(), expected);
    assert_eq!(b_log.len(), 0);
}
