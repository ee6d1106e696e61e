use msgs::codec;
use msgs::codec::{Codec, Reader};

/// An externally length'd payload: takes everything left in
/// the current Reader.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(pub Vec<u8>);

impl Codec for Payload {
  fn encode(&self, bytes: &mut Vec<u8>) {
    bytes.extend_from_slice(&self.0);
  }

  fn read(r: &mut Reader) -> Option<Payload> {
    Some(Payload(r.rest().to_vec()))
  }
}

impl Payload {
  pub fn new(bytes: Vec<u8>) -> Payload {
    Payload(bytes)
  }

  pub fn empty() -> Payload {
    Payload(Vec::new())
  }
}

/// An arbitrary, unknown-content, u8-length-prefixed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadU8(pub Vec<u8>);

impl PayloadU8 {
  pub fn new(bytes: Vec<u8>) -> PayloadU8 {
    PayloadU8(bytes)
  }
}

impl Codec for PayloadU8 {
  fn encode(&self, bytes: &mut Vec<u8>) {
    codec::encode_u8(self.0.len() as u8, bytes);
    bytes.extend_from_slice(&self.0);
  }

  fn read(r: &mut Reader) -> Option<PayloadU8> {
    let len = try_ret!(codec::read_u8(r)) as usize;
    let body = try_ret!(r.take(len));
    Some(PayloadU8(body.to_vec()))
  }
}

/// An arbitrary, unknown-content, u16-length-prefixed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadU16(pub Vec<u8>);

impl PayloadU16 {
  pub fn new(bytes: Vec<u8>) -> PayloadU16 {
    PayloadU16(bytes)
  }
}

impl Codec for PayloadU16 {
  fn encode(&self, bytes: &mut Vec<u8>) {
    codec::encode_u16(self.0.len() as u16, bytes);
    bytes.extend_from_slice(&self.0);
  }

  fn read(r: &mut Reader) -> Option<PayloadU16> {
    let len = try_ret!(codec::read_u16(r)) as usize;
    let body = try_ret!(r.take(len));
    Some(PayloadU16(body.to_vec()))
  }
}
