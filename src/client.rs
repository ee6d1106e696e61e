use msgs::enums::{CipherSuite, NamedGroup, SignatureScheme};
use msgs::handshake::{HandshakeMessage, DistinguishedName};
use hash_hs::HandshakeHash;
use key_schedule::KeySchedule;
use record_layer::RecordAdapter;
use session::Session;
use suites::{SupportedCipherSuite, KeyExchange, ALL_CIPHERSUITES};
use verify::CertificateSubsystem;
use error::TLSError;

use std::sync::Arc;

/// Which TLS 1.3 encoding we talk.
///
/// `Experiment` is the middlebox-compatibility variant: the
/// record layer advertises TLS 1.2, the ServerHello carries
/// legacy session id and compression fields, and
/// ChangeCipherSpec records are interleaved at fixed points.
/// Everything else is identical; it is deliberately a single
/// flag rather than a parallel state machine.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Tls13Variant {
  Draft,
  Experiment
}

/// Common configuration for all connections made by a client.
pub struct ClientConfig {
  /// List of cipher suites we support, in preference order.
  pub cipher_suites: Vec<&'static SupportedCipherSuite>,

  /// Key exchange groups we will offer or accept via
  /// HelloRetryRequest, in preference order.
  pub supported_groups: Vec<NamedGroup>,

  /// Protocols for ALPN, in preference order.  Empty if ALPN
  /// is not offered.
  pub alpn_protocols: Vec<String>,

  /// Application-set session context; resumed sessions must
  /// carry the same value.
  pub session_id_context: Vec<u8>,

  /// Timeout given to sessions resumed with a PSK plus fresh
  /// key exchange, in seconds.
  pub psk_dhe_timeout: u64,

  /// Timeout given to freshly established sessions, in
  /// seconds.
  pub session_timeout: u64,

  /// Whether we offered Channel ID on this connection's
  /// ClientHello.
  pub enable_channel_id: bool,

  pub variant: Tls13Variant
}

impl ClientConfig {
  pub fn new() -> ClientConfig {
    ClientConfig {
      cipher_suites: ALL_CIPHERSUITES.to_vec(),
      supported_groups: vec![
        NamedGroup::X25519,
        NamedGroup::secp384r1,
        NamedGroup::secp256r1
      ],
      alpn_protocols: Vec::new(),
      session_id_context: Vec::new(),
      psk_dhe_timeout: 172800,
      session_timeout: 7200,
      enable_channel_id: false,
      variant: Tls13Variant::Draft
    }
  }

  pub fn find_cipher_suite(&self, suite: CipherSuite)
      -> Option<&'static SupportedCipherSuite> {
    self.cipher_suites
      .iter()
      .find(|x| x.suite == suite)
      .map(|x| *x)
  }
}

/// A Channel ID key, supplied by the embedder: a P-256 key
/// whose public half is the 64-byte x||y concatenation and
/// whose signatures are the raw 64-byte r||s concatenation.
pub trait ChannelIdKey {
  fn public_key(&self) -> Vec<u8>;
  fn sign(&self, digest: &[u8]) -> Result<Vec<u8>, TLSError>;
}

/// Callbacks into the embedding application.
pub trait ClientCallbacks {
  /// A session (from a post-handshake ticket) is offered to
  /// the application.  Return true to take ownership of it;
  /// on false it is dropped.
  fn new_session(&mut self, _session: Session) -> bool {
    false
  }

  /// Called once per state transition with the new state's
  /// name, for diagnostics.
  fn on_state_change(&mut self, _state: &'static str) {}

  /// Fetch the Channel ID key.  None suspends the handshake
  /// with `ChannelIdLookup` until a key is available.
  fn channel_id_key(&mut self) -> Option<Box<dyn ChannelIdKey>> {
    None
  }
}

/// Re-emission of the ClientHello after a HelloRetryRequest.
/// Initial ClientHello construction happens before the state
/// machine starts and is not our business; the retry hello
/// must quote the new key share and the server's cookie.
pub trait ClientHelloBuilder {
  fn second_client_hello(&mut self,
                         key_share: &KeyExchange,
                         cookie: Option<&[u8]>) -> Vec<u8>;
}

/// Everything external the handshake needs, for one drive of
/// the state machine.
pub struct HandshakeEnv<'a> {
  pub records: &'a mut dyn RecordAdapter,
  pub certs: &'a mut dyn CertificateSubsystem,
  pub hello: &'a mut dyn ClientHelloBuilder,
  pub callbacks: &'a mut dyn ClientCallbacks
}

/// The client handshake states.  `Done` is terminal.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum HandshakeState {
  ReadHelloRetryRequest,
  SendSecondClientHello,
  ReadServerHello,
  ProcessChangeCipherSpec,
  ReadEncryptedExtensions,
  ReadCertificateRequest,
  ReadServerCertificate,
  ReadServerCertificateVerify,
  ReadServerFinished,
  SendEndOfEarlyData,
  SendClientCertificate,
  SendClientCertificateVerify,
  CompleteSecondFlight,
  Done
}

impl HandshakeState {
  pub fn name(&self) -> &'static str {
    match *self {
      HandshakeState::ReadHelloRetryRequest => "read_hello_retry_request",
      HandshakeState::SendSecondClientHello => "send_second_client_hello",
      HandshakeState::ReadServerHello => "read_server_hello",
      HandshakeState::ProcessChangeCipherSpec => "process_change_cipher_spec",
      HandshakeState::ReadEncryptedExtensions => "read_encrypted_extensions",
      HandshakeState::ReadCertificateRequest => "read_certificate_request",
      HandshakeState::ReadServerCertificate => "read_server_certificate",
      HandshakeState::ReadServerCertificateVerify => "read_server_certificate_verify",
      HandshakeState::ReadServerFinished => "read_server_finished",
      HandshakeState::SendEndOfEarlyData => "send_end_of_early_data",
      HandshakeState::SendClientCertificate => "send_client_certificate",
      HandshakeState::SendClientCertificateVerify => "send_client_certificate_verify",
      HandshakeState::CompleteSecondFlight => "complete_second_flight",
      HandshakeState::Done => "done"
    }
  }
}

/// Why the handshake returned to its caller.  None of these are
/// errors; each names the external condition to satisfy before
/// driving the state machine again.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum HsStatus {
  /// Another handshake message is needed.
  ReadMessage,

  /// A ChangeCipherSpec record is expected next and should be
  /// consumed and discarded.
  ReadChangeCipherSpec,

  /// The outbound queue must be drained to the transport.
  Flush,

  /// The signing oracle is computing asynchronously.
  PrivateKeyOperation,

  /// The peer certificate verifier is computing
  /// asynchronously.
  CertificateVerify,

  /// The certificate selection callback deferred.
  X509Lookup,

  /// The Channel ID key is not yet available.
  ChannelIdLookup,

  /// The server declined our early data; the application must
  /// discard what it wrote and re-drive.
  EarlyDataRejected,

  /// The handshake is complete.
  Done
}

/// The state for one client handshake.  This is exclusively
/// owned by the connection driving it; it is not re-entrant
/// and not for sharing between threads.
pub struct ClientHandshake {
  pub config: Arc<ClientConfig>,
  pub state: HandshakeState,
  pub failed: bool,

  pub transcript: HandshakeHash,
  pub key_schedule: Option<KeySchedule>,

  /// Our in-flight ECDHE private key.  Consumed when the
  /// server's share arrives, or dropped on HelloRetryRequest.
  pub key_share: Option<KeyExchange>,

  /* Populated only by a HelloRetryRequest. */
  pub cookie: Option<Vec<u8>>,
  pub retry_group: Option<NamedGroup>,
  pub received_hello_retry_request: bool,

  /* Session lifecycle: the session we offered for resumption,
   * the one this handshake is building, the parameters early
   * data was keyed on, and the final result. */
  pub offered_session: Option<Session>,
  pub new_session: Option<Session>,
  pub early_session: Option<Session>,
  pub established_session: Option<Session>,
  pub session_reused: bool,

  /* Client authentication. */
  pub cert_request: bool,
  pub ca_names: Vec<DistinguishedName>,
  pub peer_sigalgs: Vec<SignatureScheme>,

  /* 0-RTT sub-state. */
  pub in_early_data: bool,
  pub early_data_offered: bool,
  pub early_data_accepted: bool,
  pub can_early_write: bool,

  pub received_custom_extension: bool,
  pub channel_id_valid: bool,

  pub suite: Option<&'static SupportedCipherSuite>,
  pub client_hs_traffic_secret: Vec<u8>,
  pub server_hs_traffic_secret: Vec<u8>,
  pub client_app_traffic_secret: Vec<u8>,
  pub server_app_traffic_secret: Vec<u8>
}

impl ClientHandshake {
  /// Start the state machine for a connection whose first
  /// ClientHello (given here for the transcript) is already on
  /// the wire.  `key_share` is the ECDHE offer made in it;
  /// `offered_session` the session quoted in its pre_shared_key
  /// extension, if any; `offer_early_data` whether 0-RTT data
  /// is in flight under that session's parameters.
  pub fn new(config: Arc<ClientConfig>,
             key_share: KeyExchange,
             first_hello: &HandshakeMessage,
             offered_session: Option<Session>,
             offer_early_data: bool) -> ClientHandshake {
    debug_assert!(!offer_early_data || offered_session.is_some());

    let mut transcript = HandshakeHash::new();
    transcript.add_message(first_hello);

    let early_session = if offer_early_data {
      offered_session.clone()
    } else {
      None
    };

    ClientHandshake {
      config: config,
      state: HandshakeState::ReadHelloRetryRequest,
      failed: false,
      transcript: transcript,
      key_schedule: None,
      key_share: Some(key_share),
      cookie: None,
      retry_group: None,
      received_hello_retry_request: false,
      offered_session: offered_session,
      new_session: None,
      early_session: early_session,
      established_session: None,
      session_reused: false,
      cert_request: false,
      ca_names: Vec::new(),
      peer_sigalgs: Vec::new(),
      in_early_data: offer_early_data,
      early_data_offered: offer_early_data,
      early_data_accepted: false,
      can_early_write: offer_early_data,
      received_custom_extension: false,
      channel_id_valid: false,
      suite: None,
      client_hs_traffic_secret: Vec::new(),
      server_hs_traffic_secret: Vec::new(),
      client_app_traffic_secret: Vec::new(),
      server_app_traffic_secret: Vec::new()
    }
  }

  pub fn state_name(&self) -> &'static str {
    self.state.name()
  }

  pub fn is_complete(&self) -> bool {
    self.state == HandshakeState::Done
  }

  pub fn established_session(&self) -> Option<&Session> {
    self.established_session.as_ref()
  }
}

#[cfg(test)]
mod test {
  use super::ClientConfig;
  use msgs::enums::CipherSuite;
  use suites;

  #[test]
  fn find_cipher_suite_rejects_unknown_suites() {
    let config = ClientConfig::new();
    assert!(config.find_cipher_suite(CipherSuite::TLS13_AES_128_GCM_SHA256).is_some());
    assert!(config.find_cipher_suite(CipherSuite::TLS13_AES_256_GCM_SHA384).is_some());
    /* a TLS 1.2 code point never resolves */
    assert!(config.find_cipher_suite(CipherSuite::Unknown(0xc02b)).is_none());
  }

  #[test]
  fn find_cipher_suite_honours_configured_list() {
    let mut config = ClientConfig::new();
    config.cipher_suites = vec![&suites::TLS13_AES_256_GCM_SHA384];
    assert!(config.find_cipher_suite(CipherSuite::TLS13_AES_128_GCM_SHA256).is_none());
    assert!(config.find_cipher_suite(CipherSuite::TLS13_AES_256_GCM_SHA384).is_some());
  }
}
