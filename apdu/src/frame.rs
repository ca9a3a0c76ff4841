// Copyright (c) 2022-2023 The TurtleCoin Developers

//! APDU request framing, response parsing and primitive codecs
//!
//! ## Request framing:
//! ```text
//! +------+------+------+------+----------+----------+
//! | CLA  | INS  |  P1  |  P2  |  LEN     |  DATA    |
//! | u8   | u8   | u8   | u8   |  u16be   |  LEN B   |
//! +------+------+------+------+----------+----------+
//! ```
//!
//! ## Response framing:
//! ```text
//! +----------------+----------+
//! |     BODY       |  SW      |
//! |   variable     |  u16be   |
//! +----------------+----------+
//! ```
//!
//! A status word of `0x9000` signals success. On any other status, a `u16be`
//! error code read from the first two body bytes supersedes the status word
//! when the body is at least two bytes long.

use crate::{
    ApduError, ApduRequest, DeviceError, Key, Signature, CN_APDU_CLA, P1_CONFIRM, P1_NON_CONFIRM,
    P2_UNUSED,
};

/// Maximum total APDU length accepted by the device transport
pub const APDU_MAX_LEN: usize = 512;

/// Length of the fixed request header
pub const APDU_HEADER_LEN: usize = 6;

/// Maximum data section length for a single request
pub const APDU_MAX_DATA_LEN: usize = APDU_MAX_LEN - APDU_HEADER_LEN;

/// Success status word
pub const SW_OK: u16 = 0x9000;

/// Frame a request APDU for the wire.
///
/// `confirm` sets `P1` to request on-device user confirmation; non-confirm
/// requests are only honoured by DEBUG application builds. Oversized data
/// sections are rejected locally, before any transport involvement.
pub fn frame_request<R: ApduRequest>(req: &R, confirm: bool) -> Result<Vec<u8>, ApduError> {
    let mut w = Writer::new();
    req.encode(&mut w)?;
    let data = w.into_inner();

    if data.len() > APDU_MAX_DATA_LEN {
        return Err(ApduError::PayloadTooLarge(data.len()));
    }

    let mut out = Vec::with_capacity(APDU_HEADER_LEN + data.len());
    out.push(CN_APDU_CLA);
    out.push(R::INS as u8);
    out.push(if confirm { P1_CONFIRM } else { P1_NON_CONFIRM });
    out.push(P2_UNUSED);
    out.extend_from_slice(&(data.len() as u16).to_be_bytes());
    out.extend_from_slice(&data);

    Ok(out)
}

/// Parse a raw device response, returning the body on success.
///
/// Any status word other than [SW_OK] is surfaced as a [DeviceError],
/// preferring the error code carried in the body when present.
pub fn parse_response(resp: &[u8]) -> Result<&[u8], ApduError> {
    if resp.len() < 2 {
        return Err(ApduError::Truncated);
    }

    let (body, sw) = resp.split_at(resp.len() - 2);
    let sw = u16::from_be_bytes([sw[0], sw[1]]);

    if sw == SW_OK {
        return Ok(body);
    }

    let code = match body.len() >= 2 {
        true => u16::from_be_bytes([body[0], body[1]]),
        false => sw,
    };

    Err(ApduError::Device(DeviceError::from_code(code)))
}

/// Structured writer for APDU data sections
///
/// Multi-byte integers are written big-endian.
#[derive(Clone, Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Create a new empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Current encoded length
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer, returning the encoded bytes
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn write_u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn write_bytes(&mut self, b: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(b);
        self
    }

    pub fn write_key(&mut self, k: &Key) -> &mut Self {
        self.buf.extend_from_slice(k.as_bytes());
        self
    }

    pub fn write_signature(&mut self, s: &Signature) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }
}

/// Structured reader over an APDU response body
///
/// Multi-byte integers are read big-endian. Reads past the end of the body
/// fail with [ApduError::Truncated].
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    index: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over a response body
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, index: 0 }
    }

    /// Bytes remaining to be read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.index
    }

    /// Whether the body has been fully consumed
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ApduError> {
        if self.remaining() < n {
            return Err(ApduError::Truncated);
        }

        let b = &self.buf[self.index..self.index + n];
        self.index += n;
        Ok(b)
    }

    pub fn read_u8(&mut self) -> Result<u8, ApduError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ApduError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ApduError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, ApduError> {
        let b = self.take(8)?;
        let mut v = [0u8; 8];
        v.copy_from_slice(b);
        Ok(u64::from_be_bytes(v))
    }

    pub fn read_key(&mut self) -> Result<Key, ApduError> {
        let b = self.take(Key::SIZE)?;
        let mut v = [0u8; Key::SIZE];
        v.copy_from_slice(b);
        Ok(Key::from_bytes(v))
    }

    pub fn read_signature(&mut self) -> Result<Signature, ApduError> {
        let b = self.take(Signature::SIZE)?;
        let mut v = [0u8; Signature::SIZE];
        v.copy_from_slice(b);
        Ok(Signature::from_bytes(v))
    }

    /// Consume and return the unread remainder of the body
    pub fn rest(&mut self) -> &'a [u8] {
        let b = &self.buf[self.index..];
        self.index = self.buf.len();
        b
    }
}
