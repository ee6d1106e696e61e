use std::collections::VecDeque;
use std::sync::Arc;

use tls13_engine::msgs::enums::{AlertLevel, AlertDescription, HandshakeType};
use tls13_engine::msgs::enums::{NamedGroup, SignatureScheme, CipherSuite};
use tls13_engine::msgs::handshake::{HandshakeMessage, ServerHelloPayload};
use tls13_engine::msgs::handshake::{ServerHelloExtension, KeyShareEntry, Random};
use tls13_engine::msgs::handshake::{EncryptedExtension, EncryptedExtensions};
use tls13_engine::msgs::enums::ProtocolVersion;
use tls13_engine::{RecordAdapter, TrafficKeys, CertificateSubsystem};
use tls13_engine::{CertVerifyResult, CertSelectResult, SignResult};
use tls13_engine::{ClientCallbacks, ClientHelloBuilder, ChannelIdKey};
use tls13_engine::{ClientConfig, ClientHandshake, KeyExchange, Session};
use tls13_engine::{TLSError, TLS13_DRAFT_VERSION};

/* --- record layer mock --- */

pub struct MockRecords {
  pub inbound: VecDeque<HandshakeMessage>,
  pub outbound: Vec<HandshakeMessage>,
  pub alerts: Vec<(AlertLevel, AlertDescription)>,
  pub ccs_sent: usize,
  pub installs: Vec<&'static str>,
  pub flushes: usize
}

impl MockRecords {
  pub fn new() -> MockRecords {
    MockRecords {
      inbound: VecDeque::new(),
      outbound: Vec::new(),
      alerts: Vec::new(),
      ccs_sent: 0,
      installs: Vec::new(),
      flushes: 0
    }
  }

  pub fn queue(&mut self, m: HandshakeMessage) {
    self.inbound.push_back(m);
  }

  pub fn sent_types(&self) -> Vec<HandshakeType> {
    self.outbound.iter().map(|m| m.typ).collect()
  }
}

impl RecordAdapter for MockRecords {
  fn get_message(&mut self) -> Option<HandshakeMessage> {
    self.inbound.front().cloned()
  }

  fn next_message(&mut self) {
    self.inbound.pop_front().expect("consumed absent message");
  }

  fn set_read_state(&mut self, _keys: TrafficKeys) {
    self.installs.push("read");
  }

  fn set_write_state(&mut self, keys: Option<TrafficKeys>) {
    match keys {
      Some(_) => self.installs.push("write"),
      None => self.installs.push("write-null")
    }
  }

  fn add_alert(&mut self, level: AlertLevel, desc: AlertDescription) {
    self.alerts.push((level, desc));
  }

  fn add_change_cipher_spec(&mut self) {
    self.ccs_sent += 1;
  }

  fn add_message(&mut self, m: &HandshakeMessage) {
    self.outbound.push(m.clone());
  }

  fn flush(&mut self) {
    self.flushes += 1;
  }
}

/* --- certificate subsystem mock --- */

pub struct MockCerts {
  pub verify_results: VecDeque<CertVerifyResult>,
  pub select_results: VecDeque<CertSelectResult>,
  pub sign_results: VecDeque<SignResult>,
  pub has_cert: bool,
  pub stored_chain: Vec<Vec<u8>>,
  pub signature_messages: Vec<Vec<u8>>
}

impl MockCerts {
  pub fn new() -> MockCerts {
    MockCerts {
      verify_results: VecDeque::new(),
      select_results: VecDeque::new(),
      sign_results: VecDeque::new(),
      has_cert: false,
      stored_chain: Vec::new(),
      signature_messages: Vec::new()
    }
  }

  /// Body we use for our Certificate message: empty context,
  /// empty certificate list.
  pub fn empty_client_certificate() -> Vec<u8> {
    vec![0x00, 0x00, 0x00, 0x00]
  }
}

impl CertificateSubsystem for MockCerts {
  fn process_server_certificate(&mut self,
                                payload: &[u8],
                                required: bool) -> Result<(), TLSError> {
    if required && payload.is_empty() {
      return Err(TLSError::NoCertificatesPresented);
    }
    self.stored_chain = vec![payload.to_vec()];
    Ok(())
  }

  fn peer_certificates(&self) -> Vec<Vec<u8>> {
    self.stored_chain.clone()
  }

  fn verify_peer_certificate(&mut self) -> CertVerifyResult {
    self.verify_results
      .pop_front()
      .unwrap_or(CertVerifyResult::Valid)
  }

  fn verify_signature(&mut self,
                      _scheme: SignatureScheme,
                      message: &[u8],
                      _sig: &[u8]) -> Result<(), TLSError> {
    self.signature_messages.push(message.to_vec());
    Ok(())
  }

  fn select_client_certificate(&mut self) -> CertSelectResult {
    self.select_results
      .pop_front()
      .unwrap_or(CertSelectResult::Proceed)
  }

  fn on_certificate_selected(&mut self) -> Result<(), TLSError> {
    Ok(())
  }

  fn has_client_certificate(&self) -> bool {
    self.has_cert
  }

  fn client_certificate_payload(&mut self) -> Result<Vec<u8>, TLSError> {
    Ok(MockCerts::empty_client_certificate())
  }

  fn sign_certificate_verify(&mut self,
                             _schemes: &[SignatureScheme],
                             _message: &[u8]) -> SignResult {
    self.sign_results
      .pop_front()
      .unwrap_or(SignResult::Signed(SignatureScheme::ECDSA_NISTP256_SHA256,
                                    vec![0xcd; 64]))
  }
}

/* --- hello builder mock --- */

pub struct MockHello {
  pub second_hello_body: Vec<u8>,
  pub retry_calls: Vec<(NamedGroup, Option<Vec<u8>>)>,
  pub retry_pubkey: Option<Vec<u8>>
}

impl MockHello {
  pub fn new() -> MockHello {
    MockHello {
      second_hello_body: b"client hello two".to_vec(),
      retry_calls: Vec::new(),
      retry_pubkey: None
    }
  }
}

impl ClientHelloBuilder for MockHello {
  fn second_client_hello(&mut self,
                         key_share: &KeyExchange,
                         cookie: Option<&[u8]>) -> Vec<u8> {
    self.retry_calls.push((key_share.group, cookie.map(|c| c.to_vec())));
    self.retry_pubkey = Some(key_share.pubkey.clone());
    self.second_hello_body.clone()
  }
}

/* --- application callbacks mock --- */

pub struct TestChannelIdKey;

impl ChannelIdKey for TestChannelIdKey {
  fn public_key(&self) -> Vec<u8> {
    vec![0x0f; 64]
  }

  fn sign(&self, _digest: &[u8]) -> Result<Vec<u8>, TLSError> {
    Ok(vec![0x1f; 64])
  }
}

pub struct MockCallbacks {
  pub states: Vec<&'static str>,
  pub sessions: Vec<Session>,
  pub take_sessions: bool,
  pub channel_id_available: bool
}

impl MockCallbacks {
  pub fn new() -> MockCallbacks {
    MockCallbacks {
      states: Vec::new(),
      sessions: Vec::new(),
      take_sessions: true,
      channel_id_available: false
    }
  }
}

impl ClientCallbacks for MockCallbacks {
  fn new_session(&mut self, session: Session) -> bool {
    self.sessions.push(session);
    self.take_sessions
  }

  fn on_state_change(&mut self, state: &'static str) {
    self.states.push(state);
  }

  fn channel_id_key(&mut self) -> Option<Box<dyn ChannelIdKey>> {
    if self.channel_id_available {
      Some(Box::new(TestChannelIdKey))
    } else {
      None
    }
  }
}

/* --- message builders --- */

pub fn client_hello() -> HandshakeMessage {
  HandshakeMessage::new(HandshakeType::ClientHello, b"client hello one".to_vec())
}

pub fn server_hello(server_share: &KeyExchange,
                    psk_index: Option<u16>) -> HandshakeMessage {
  let mut exts = vec![
    ServerHelloExtension::KeyShare(
      KeyShareEntry::new(server_share.group, &server_share.pubkey))
  ];
  if let Some(idx) = psk_index {
    exts.push(ServerHelloExtension::PresharedKey(idx));
  }

  let sh = ServerHelloPayload {
    legacy_version: ProtocolVersion::Unknown(TLS13_DRAFT_VERSION),
    random: Random::from_slice(&[0x5a; 32]),
    session_id: None,
    cipher_suite: CipherSuite::TLS13_AES_128_GCM_SHA256,
    compression_method: None,
    extensions: exts
  };

  let mut body = Vec::new();
  sh.encode_in(false, &mut body);
  HandshakeMessage::new(HandshakeType::ServerHello, body)
}

pub fn encrypted_extensions(exts: EncryptedExtensions) -> HandshakeMessage {
  HandshakeMessage::build(HandshakeType::EncryptedExtensions, &exts)
}

pub fn empty_encrypted_extensions() -> HandshakeMessage {
  let exts: Vec<EncryptedExtension> = Vec::new();
  encrypted_extensions(exts)
}

pub fn server_certificate() -> HandshakeMessage {
  /* Opaque to the handshake; the certificate subsystem is a
   * mock here. */
  HandshakeMessage::new(HandshakeType::Certificate, b"fixture-a".to_vec())
}

pub fn base_config() -> Arc<ClientConfig> {
  Arc::new(ClientConfig::new())
}

pub fn resumable_session(alpn: Option<&str>) -> Session {
  use tls13_engine::suites;

  let mut sess = Session::new(&suites::TLS13_AES_128_GCM_SHA256,
                              ProtocolVersion::TLSv1_3,
                              Vec::new(),
                              7200);
  sess.master_secret = vec![0x99; 32];
  sess.ticket = vec![0x77; 16];
  sess.alpn_protocol = alpn.map(|s| s.to_string());
  sess
}

/// Convenience: run one handshake() call against the mocks.
pub fn drive(hs: &mut ClientHandshake,
             records: &mut MockRecords,
             certs: &mut MockCerts,
             hello: &mut MockHello,
             callbacks: &mut MockCallbacks)
             -> Result<tls13_engine::HsStatus, TLSError> {
  let mut env = tls13_engine::HandshakeEnv {
    records: records,
    certs: certs,
    hello: hello,
    callbacks: callbacks
  };
  hs.handshake(&mut env)
}
