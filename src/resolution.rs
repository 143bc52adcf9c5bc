//! Address-resolution payload: the format carried inside a `Frame` whose
//! `protonum` is `RESOLUTION_PROTONUM`.

use std::net::Ipv4Addr;

use crate::errors::FrameError;
use crate::hwaddr::Hwaddr;

const HEADER_LEN: usize = 20;

/// Serialised as the four ASCII bytes `"0xff"` rather than a single flag
/// byte, matching how peers on the wire expect a reply to look. Any
/// non-empty tail decodes as "success" on the receiving end.
const SUCCESS_MARKER: &[u8] = b"0xff";

/// A decoded resolution payload (request or reply).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionPayload {
    pub dst_hw: Hwaddr,
    pub src_hw: Hwaddr,
    pub dst_ip: Ipv4Addr,
    pub src_ip: Ipv4Addr,
    pub success: bool,
}

impl ResolutionPayload {
    /// Builds a resolution *request*: no success marker, `dst_hw` unused by
    /// responders.
    pub fn request(src_hw: Hwaddr, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> ResolutionPayload {
        ResolutionPayload { dst_hw: src_hw, src_hw, dst_ip, src_ip, success: false }
    }

    /// Builds a resolution *reply* addressed back at the original requester.
    pub fn reply(
        dst_hw: Hwaddr,
        src_hw: Hwaddr,
        dst_ip: Ipv4Addr,
        src_ip: Ipv4Addr,
    ) -> ResolutionPayload {
        ResolutionPayload { dst_hw, src_hw, dst_ip, src_ip, success: true }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + SUCCESS_MARKER.len());
        buf.extend_from_slice(&self.dst_hw.0);
        buf.extend_from_slice(&self.src_hw.0);
        buf.extend_from_slice(&self.dst_ip.octets());
        buf.extend_from_slice(&self.src_ip.octets());
        if self.success {
            buf.extend_from_slice(SUCCESS_MARKER);
        }
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<ResolutionPayload, FrameError> {
        if buf.len() < HEADER_LEN {
            return Err(FrameError::BadFrame { reason: "buffer shorter than resolution payload header" });
        }
        let dst_hw = Hwaddr::from_slice(&buf[0..6]);
        let src_hw = Hwaddr::from_slice(&buf[6..12]);
        let dst_ip = Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15]);
        let src_ip = Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]);
        let success = buf.len() > HEADER_LEN;
        Ok(ResolutionPayload { dst_hw, src_hw, dst_ip, src_ip, success })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips_as_not_success() {
        let req = ResolutionPayload::request(
            Hwaddr::new(1, 2, 3, 4, 5, 6),
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
        );
        let decoded = ResolutionPayload::decode(&req.encode()).unwrap();
        assert_eq!(req, decoded);
        assert!(!decoded.success);
    }

    #[test]
    fn reply_round_trips_as_success() {
        let rep = ResolutionPayload::reply(
            Hwaddr::new(1, 2, 3, 4, 5, 6),
            Hwaddr::new(9, 8, 7, 6, 5, 4),
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
        );
        let decoded = ResolutionPayload::decode(&rep.encode()).unwrap();
        assert_eq!(rep, decoded);
        assert!(decoded.success);
    }

    #[test]
    fn any_non_empty_tail_decodes_as_success() {
        let mut buf = vec![0u8; HEADER_LEN];
        buf.push(0xff); // a single arbitrary byte, not the canonical marker
        let decoded = ResolutionPayload::decode(&buf).unwrap();
        assert!(decoded.success);
    }

    #[test]
    fn decode_rejects_short_buffers() {
        assert!(ResolutionPayload::decode(&[0u8; HEADER_LEN - 1]).is_err());
    }
}
