use msgs::enums::{AlertLevel, AlertDescription};
use msgs::handshake::HandshakeMessage;
use suites::SupportedCipherSuite;

use ring;

/// Record-protection keying material for one direction, as
/// expanded from a traffic secret.  Handing one of these to the
/// record layer starts a new protection epoch.
#[derive(Debug)]
pub struct TrafficKeys {
  pub suite: &'static SupportedCipherSuite,
  pub key: Vec<u8>,
  pub iv: Vec<u8>
}

impl TrafficKeys {
  pub fn aead_algorithm(&self) -> &'static ring::aead::Algorithm {
    self.suite.get_aead_alg()
  }
}

/// How the handshake drives the record layer.  The handshake
/// itself performs no I/O and no record protection: it reads
/// whole handshake messages from here, queues messages, alerts
/// and ChangeCipherSpec back, and installs keys.
///
/// Key installation must be observable before the next record
/// is processed at the new epoch; `set_read_state` and
/// `set_write_state` are that fence.
pub trait RecordAdapter {
  /// Return the next inbound handshake message, without
  /// consuming it.  None means the handshake must suspend
  /// until more data arrives.
  fn get_message(&mut self) -> Option<HandshakeMessage>;

  /// Consume the message `get_message` returned.
  fn next_message(&mut self);

  /// Start decrypting inbound records with `keys`.
  fn set_read_state(&mut self, keys: TrafficKeys);

  /// Start encrypting outbound records with `keys`; None
  /// reverts the write side to plaintext, discarding any
  /// earlier epoch.
  fn set_write_state(&mut self, keys: Option<TrafficKeys>);

  /// Queue an alert record.
  fn add_alert(&mut self, level: AlertLevel, desc: AlertDescription);

  /// Queue a ChangeCipherSpec record.
  fn add_change_cipher_spec(&mut self);

  /// Queue a handshake message.
  fn add_message(&mut self, m: &HandshakeMessage);

  /// The queued records should be written to the transport.
  fn flush(&mut self);
}
