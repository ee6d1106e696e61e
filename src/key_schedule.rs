/// Key schedule maintenance for TLS 1.3.
///
/// The schedule is a chain of HKDF-Extract invocations, each
/// stage mixing in one input keying material: first the PSK (or
/// zeroes), then the ECDHE result, then zeroes again.  Traffic
/// and resumption secrets are expanded off the current stage
/// under the handshake hash current at that point.

use ring::digest;
use ring::hmac;
use msgs::codec;
use record_layer::TrafficKeys;
use suites::SupportedCipherSuite;

/// The kinds of secret we can extract from the key schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SecretKind {
  ClientEarlyTrafficSecret,
  ClientHandshakeTrafficSecret,
  ServerHandshakeTrafficSecret,
  ClientApplicationTrafficSecret,
  ServerApplicationTrafficSecret,
  ResumptionMasterSecret
}

impl SecretKind {
  fn to_bytes(self) -> &'static [u8] {
    match self {
      SecretKind::ClientEarlyTrafficSecret => b"c e traffic",
      SecretKind::ClientHandshakeTrafficSecret => b"c hs traffic",
      SecretKind::ServerHandshakeTrafficSecret => b"s hs traffic",
      SecretKind::ClientApplicationTrafficSecret => b"c ap traffic",
      SecretKind::ServerApplicationTrafficSecret => b"s ap traffic",
      SecretKind::ResumptionMasterSecret => b"res master"
    }
  }
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum ExtractStage {
  Start,
  Early,
  Handshake,
  Master
}

impl ExtractStage {
  fn next(self) -> ExtractStage {
    match self {
      ExtractStage::Start => ExtractStage::Early,
      ExtractStage::Early => ExtractStage::Handshake,
      ExtractStage::Handshake => ExtractStage::Master,
      ExtractStage::Master => unreachable!()
    }
  }
}

/// This is the TLS 1.3 key schedule.  It contains the current
/// secret, and advances strictly early -> handshake -> master.
pub struct KeySchedule {
  hash: &'static digest::Algorithm,
  current: Vec<u8>,
  stage: ExtractStage
}

impl KeySchedule {
  pub fn new(hash: &'static digest::Algorithm) -> KeySchedule {
    KeySchedule {
      hash: hash,
      current: vec![0u8; hash.output_len],
      stage: ExtractStage::Start
    }
  }

  /// Input the empty secret: `hash_len` zero bytes.
  pub fn input_empty(&mut self) {
    let zeroes = vec![0u8; self.hash.output_len];
    self.input_secret(&zeroes);
  }

  /// Input a secret, advancing to the next extract stage.
  pub fn input_secret(&mut self, secret: &[u8]) {
    assert!(self.stage != ExtractStage::Master,
            "key schedule already completed");

    /* The first extract is salted with zeroes; later ones with
     * the "derived" expansion of the previous stage. */
    let salt = match self.stage {
      ExtractStage::Start => self.current.clone(),
      _ => self.derive_for_empty_hash(b"derived")
    };

    let key = hmac::SigningKey::new(self.hash, &salt);
    let new = hmac::sign(&key, secret);

    wipe(&mut self.current);
    self.current = new.as_ref().to_vec();
    self.stage = self.stage.next();
  }

  /// Derive a secret of the given kind, using the current
  /// handshake hash.
  pub fn derive(&self, kind: SecretKind, hs_hash: &[u8]) -> Vec<u8> {
    debug_assert_eq!(hs_hash.len(), self.hash.output_len);
    hkdf_expand_label(self.hash,
                      &self.current,
                      kind.to_bytes(),
                      hs_hash,
                      self.hash.output_len)
  }

  fn derive_for_empty_hash(&self, label: &[u8]) -> Vec<u8> {
    let empty_hash = digest::digest(self.hash, b"");
    hkdf_expand_label(self.hash,
                      &self.current,
                      label,
                      empty_hash.as_ref(),
                      self.hash.output_len)
  }

  /// Sign the finished message consisting of `hs_hash` using
  /// the key derived from `base_secret`.
  pub fn sign_finish(&self, base_secret: &[u8], hs_hash: &[u8]) -> Vec<u8> {
    let finished_key = hkdf_expand_label(self.hash,
                                         base_secret,
                                         b"finished",
                                         b"",
                                         self.hash.output_len);
    let key = hmac::SigningKey::new(self.hash, &finished_key);
    hmac::sign(&key, hs_hash).as_ref().to_vec()
  }

  pub fn current_secret(&self) -> &[u8] {
    &self.current
  }
}

impl Drop for KeySchedule {
  fn drop(&mut self) {
    wipe(&mut self.current);
  }
}

pub fn wipe(buf: &mut Vec<u8>) {
  for b in buf.iter_mut() {
    *b = 0;
  }
  buf.clear();
}

/// Expand the record-protection key and nonce for one direction
/// from its traffic secret.
pub fn derive_traffic_keys(suite: &'static SupportedCipherSuite,
                           secret: &[u8]) -> TrafficKeys {
  let hash = suite.get_hash();
  TrafficKeys {
    suite: suite,
    key: hkdf_expand_label(hash, secret, b"key", b"", suite.enc_key_len),
    iv: hkdf_expand_label(hash, secret, b"iv", b"", suite.fixed_iv_len)
  }
}

fn hkdf_expand(hash: &'static digest::Algorithm,
               prk: &[u8],
               info: &[u8],
               required: usize) -> Vec<u8> {
  let key = hmac::SigningKey::new(hash, prk);
  let mut out = Vec::new();
  let mut block = Vec::new();
  let mut n = 1u8;

  while out.len() < required {
    let mut input = block.clone();
    input.extend_from_slice(info);
    input.push(n);

    let signed = hmac::sign(&key, &input);
    block = signed.as_ref().to_vec();
    out.extend_from_slice(&block);
    n += 1;
  }

  out.truncate(required);
  out
}

pub fn hkdf_expand_label(hash: &'static digest::Algorithm,
                         secret: &[u8],
                         label: &[u8],
                         context: &[u8],
                         len: usize) -> Vec<u8> {
  const LABEL_PREFIX: &'static [u8] = b"tls13 ";

  let mut info = Vec::new();
  codec::encode_u16(len as u16, &mut info);
  codec::encode_u8((LABEL_PREFIX.len() + label.len()) as u8, &mut info);
  info.extend_from_slice(LABEL_PREFIX);
  info.extend_from_slice(label);
  codec::encode_u8(context.len() as u8, &mut info);
  info.extend_from_slice(context);

  hkdf_expand(hash, secret, &info, len)
}
