use ring::digest;
use msgs::codec;
use msgs::handshake::HandshakeMessage;

/// This deals with keeping a running hash of the handshake
/// payloads.  This is computed by buffering initially.  Once
/// the selected cipher suite fixes the hash function, we pipe
/// the buffer (and everything thereafter) into a hash context.
///
/// If a HelloRetryRequest intervened, the buffered first
/// ClientHello is replaced at that point by a synthetic
/// `message_hash` message containing its digest, as the
/// handshake hash is defined to be computed over that form.
pub struct HandshakeHash {
  alg: Option<&'static digest::Algorithm>,
  ctx: Option<digest::Context>,
  buffer: Vec<u8>,
  retry_offset: Option<usize>
}

impl HandshakeHash {
  pub fn new() -> HandshakeHash {
    HandshakeHash {
      alg: None,
      ctx: None,
      buffer: Vec::new(),
      retry_offset: None
    }
  }

  /// We decided a HelloRetryRequest follows everything buffered
  /// so far.  The buffered prefix becomes the `message_hash`
  /// input once the hash function is known.
  pub fn set_retry_point(&mut self) {
    debug_assert!(self.ctx.is_none());
    debug_assert!(self.retry_offset.is_none());
    self.retry_offset = Some(self.buffer.len());
  }

  /// We now know what hash function the verify_data will use.
  pub fn start_hash(&mut self, alg: &'static digest::Algorithm) {
    assert!(self.ctx.is_none(), "hash function already selected");
    self.alg = Some(alg);

    let mut ctx = digest::Context::new(alg);

    match self.retry_offset {
      Some(offs) => {
        let first_hello_hash = digest::digest(alg, &self.buffer[..offs]);

        let mut synthetic = Vec::new();
        codec::encode_u8(0xfe, &mut synthetic); /* message_hash */
        codec::encode_u24(alg.output_len as u32, &mut synthetic);
        ctx.update(&synthetic);
        ctx.update(first_hello_hash.as_ref());
        ctx.update(&self.buffer[offs..]);
      }
      None => {
        ctx.update(&self.buffer);
      }
    }

    self.ctx = Some(ctx);
    self.buffer.clear();
  }

  /// Hash or buffer a handshake message.
  pub fn add_message(&mut self, m: &HandshakeMessage) -> &mut HandshakeHash {
    let buf = m.encoding();
    self.update_raw(&buf);
    self
  }

  fn update_raw(&mut self, buf: &[u8]) {
    match self.ctx {
      Some(ref mut ctx) => ctx.update(buf),
      None => self.buffer.extend_from_slice(buf)
    }
  }

  /// Get the hash value of the transcript observed so far.
  /// Only valid after `start_hash`.
  pub fn get_current_hash(&self) -> Vec<u8> {
    let hash = self.ctx
      .as_ref()
      .expect("digest not ready")
      .clone()
      .finish();
    hash.as_ref().to_vec()
  }
}
