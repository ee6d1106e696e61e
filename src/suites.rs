use msgs::enums::{CipherSuite, HashAlgorithm, NamedGroup};

use ring;
use untrusted;

#[allow(non_camel_case_types)]
#[derive(Debug, PartialEq)]
pub enum BulkAlgorithm {
  AES_128_GCM,
  AES_256_GCM,
  CHACHA20_POLY1305
}

/// The result of a key exchange.  This has our public key,
/// and the agreed shared secret.
pub struct KeyExchangeResult {
  pub pubkey: Vec<u8>,
  pub shared_secret: Vec<u8>
}

/// An in-progress key exchange.  This has the algorithm,
/// our private key, and our public key.
pub struct KeyExchange {
  pub group: NamedGroup,
  alg: &'static ring::agreement::Algorithm,
  privkey: ring::agreement::EphemeralPrivateKey,
  pub pubkey: Vec<u8>
}

impl KeyExchange {
  pub fn named_group_to_ecdh_alg(group: NamedGroup)
      -> Option<&'static ring::agreement::Algorithm> {
    match group {
      NamedGroup::X25519 => Some(&ring::agreement::X25519),
      NamedGroup::secp256r1 => Some(&ring::agreement::ECDH_P256),
      NamedGroup::secp384r1 => Some(&ring::agreement::ECDH_P384),
      _ => None
    }
  }

  pub fn supported_group(group: NamedGroup) -> bool {
    KeyExchange::named_group_to_ecdh_alg(group).is_some()
  }

  pub fn start_ecdhe(named_group: NamedGroup) -> Option<KeyExchange> {
    let alg = try_ret!(KeyExchange::named_group_to_ecdh_alg(named_group));
    let rng = ring::rand::SystemRandom::new();
    let ours = try_ret!(
      ring::agreement::EphemeralPrivateKey::generate(alg, &rng).ok()
    );

    let mut pubkey = Vec::new();
    pubkey.resize(ours.public_key_len(), 0u8);
    try_ret!(ours.compute_public_key(pubkey.as_mut_slice()).ok());

    Some(KeyExchange {
      group: named_group,
      alg: alg,
      privkey: ours,
      pubkey: pubkey
    })
  }

  pub fn complete(self, peer: &[u8]) -> Option<KeyExchangeResult> {
    let secret = ring::agreement::agree_ephemeral(
      self.privkey,
      self.alg,
      untrusted::Input::from(peer),
      (),
      |v| {
        let mut r = Vec::new();
        r.extend_from_slice(v);
        Ok(r)
      }
    );

    match secret {
      Ok(shared) => {
        Some(KeyExchangeResult {
          pubkey: self.pubkey,
          shared_secret: shared
        })
      }
      Err(()) => None
    }
  }
}

/// A TLS 1.3 cipher suite supported by this library.
///
/// All possible instances of this class are provided by the
/// library in the ALL_CIPHERSUITES array.
#[derive(Debug)]
pub struct SupportedCipherSuite {
  /// The TLS enumeration naming this cipher suite.
  pub suite: CipherSuite,
  pub bulk: BulkAlgorithm,
  pub hash: HashAlgorithm,
  pub enc_key_len: usize,
  pub fixed_iv_len: usize
}

impl PartialEq for SupportedCipherSuite {
  fn eq(&self, other: &SupportedCipherSuite) -> bool {
    self.suite == other.suite
  }
}

impl SupportedCipherSuite {
  pub fn get_hash(&self) -> &'static ring::digest::Algorithm {
    match self.hash {
      HashAlgorithm::SHA256 => &ring::digest::SHA256,
      HashAlgorithm::SHA384 => &ring::digest::SHA384,
      _ => unreachable!()
    }
  }

  pub fn get_aead_alg(&self) -> &'static ring::aead::Algorithm {
    match self.bulk {
      BulkAlgorithm::AES_128_GCM => &ring::aead::AES_128_GCM,
      BulkAlgorithm::AES_256_GCM => &ring::aead::AES_256_GCM,
      BulkAlgorithm::CHACHA20_POLY1305 => &ring::aead::CHACHA20_POLY1305
    }
  }

  /// Lengths of the hash this suite uses for HKDF and the
  /// transcript.
  pub fn hash_len(&self) -> usize {
    self.get_hash().output_len
  }
}

pub static TLS13_CHACHA20_POLY1305_SHA256: SupportedCipherSuite =
SupportedCipherSuite {
  suite: CipherSuite::TLS13_CHACHA20_POLY1305_SHA256,
  bulk: BulkAlgorithm::CHACHA20_POLY1305,
  hash: HashAlgorithm::SHA256,
  enc_key_len: 32,
  fixed_iv_len: 12
};

pub static TLS13_AES_256_GCM_SHA384: SupportedCipherSuite =
SupportedCipherSuite {
  suite: CipherSuite::TLS13_AES_256_GCM_SHA384,
  bulk: BulkAlgorithm::AES_256_GCM,
  hash: HashAlgorithm::SHA384,
  enc_key_len: 32,
  fixed_iv_len: 12
};

pub static TLS13_AES_128_GCM_SHA256: SupportedCipherSuite =
SupportedCipherSuite {
  suite: CipherSuite::TLS13_AES_128_GCM_SHA256,
  bulk: BulkAlgorithm::AES_128_GCM,
  hash: HashAlgorithm::SHA256,
  enc_key_len: 16,
  fixed_iv_len: 12
};

/// A list of all the cipher suites supported by this library.
pub static ALL_CIPHERSUITES: [&'static SupportedCipherSuite; 3] = [
  &TLS13_CHACHA20_POLY1305_SHA256,
  &TLS13_AES_256_GCM_SHA384,
  &TLS13_AES_128_GCM_SHA256
];
