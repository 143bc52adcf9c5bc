//! The link frame codec: the wire format carried by every transmission on a
//! `Link`, plus its checksum.

use crate::errors::FrameError;
use crate::hwaddr::Hwaddr;

/// Protocol number reserved for the address-resolution payload.
pub const RESOLUTION_PROTONUM: u64 = 0x0806;

/// Fixed header size: 6 (protonum) + 6 (dst) + 6 (src) + 4 (checksum).
const HEADER_LEN: usize = 22;

/// A decoded link frame: protocol number, destination/source hwaddr, a
/// checksum, and a variable-length payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub protonum: u64,
    pub dst_hw: Hwaddr,
    pub src_hw: Hwaddr,
    pub checksum: [u8; 4],
    pub payload: Vec<u8>,
}

impl Frame {
    /// Builds a new frame and computes its checksum. The `checksum` field of
    /// the returned frame is always correct for the given fields.
    pub fn new(protonum: u64, dst_hw: Hwaddr, src_hw: Hwaddr, payload: Vec<u8>) -> Frame {
        let checksum = compute_checksum(protonum, dst_hw, src_hw, &payload);
        Frame { protonum, dst_hw, src_hw, checksum, payload }
    }

    /// Serialises this frame to its wire representation.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len());
        buf.extend_from_slice(&be48(self.protonum));
        buf.extend_from_slice(&self.dst_hw.0);
        buf.extend_from_slice(&self.src_hw.0);
        buf.extend_from_slice(&self.checksum);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Parses a wire buffer into a `Frame`. Rejects buffers shorter than the
    /// fixed 22-byte header.
    pub fn decode(buf: &[u8]) -> Result<Frame, FrameError> {
        if buf.len() < HEADER_LEN {
            return Err(FrameError::BadFrame { reason: "buffer shorter than link frame header" });
        }
        let protonum = from_be48(&buf[0..6]);
        let dst_hw = Hwaddr::from_slice(&buf[6..12]);
        let src_hw = Hwaddr::from_slice(&buf[12..18]);
        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&buf[18..22]);
        let payload = buf[22..].to_vec();
        Ok(Frame { protonum, dst_hw, src_hw, checksum, payload })
    }

    /// Recomputes the checksum over this frame's fields (with the checksum
    /// field itself treated as zero) and compares it to the stored value.
    pub fn verify_checksum(&self) -> bool {
        self.checksum == compute_checksum(self.protonum, self.dst_hw, self.src_hw, &self.payload)
    }
}

fn compute_checksum(protonum: u64, dst_hw: Hwaddr, src_hw: Hwaddr, payload: &[u8]) -> [u8; 4] {
    let mut acc = 0u8;
    for byte in be48(protonum) {
        acc ^= byte;
    }
    for byte in dst_hw.0.iter().chain(src_hw.0.iter()) {
        acc ^= byte;
    }
    // the checksum field itself contributes four zero bytes, which is a
    // no-op under XOR, so it is simply omitted from the accumulation
    for byte in payload {
        acc ^= byte;
    }
    [0, 0, 0, acc]
}

fn be48(value: u64) -> [u8; 6] {
    let bytes = value.to_be_bytes();
    [bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]]
}

fn from_be48(buf: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes[2..8].copy_from_slice(&buf[0..6]);
    u64::from_be_bytes(bytes)
}
