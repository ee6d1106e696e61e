use msgs::enums::{HandshakeType, AlertLevel, AlertDescription};
use msgs::enums::{ProtocolVersion, Compression, ExtensionType};
use msgs::codec;
use msgs::codec::{Codec, Reader};
use msgs::handshake::{HandshakeMessage, HelloRetryRequest, ServerHelloPayload};
use msgs::handshake::{ServerHelloExtension, EncryptedExtension, EncryptedExtensions};
use msgs::handshake::{ServerExtensionSet, CertificateRequestPayload};
use msgs::handshake::{DigitallySignedStruct, NewSessionTicketPayload};
use client::{ClientHandshake, HandshakeEnv, HandshakeState, HsStatus};
use client::{ChannelIdKey, ClientCallbacks, Tls13Variant};
use key_schedule::{KeySchedule, SecretKind, derive_traffic_keys, wipe};
use record_layer::RecordAdapter;
use session::Session;
use suites::KeyExchange;
use verify;
use verify::{CertVerifyResult, CertSelectResult, SignResult};
use error::TLSError;

use ring;

/* draft-ietf-tls-tls13-18 */
pub const TLS13_DRAFT_VERSION: u16 = 0x7f12;

const CHANNEL_ID_SIGNATURE_MAGIC: &'static [u8] = b"TLS Channel ID signature";

type HandlerResult = Result<Option<HsStatus>, TLSError>;

fn send_fatal(env: &mut HandshakeEnv, desc: AlertDescription) {
  env.records.add_alert(AlertLevel::Fatal, desc);
}

fn unexpected(env: &mut HandshakeEnv,
              got: HandshakeType,
              expect: &[HandshakeType]) -> TLSError {
  send_fatal(env, AlertDescription::UnexpectedMessage);
  TLSError::InappropriateMessage {
    expect_types: expect.to_vec(),
    got_type: got
  }
}

fn corrupt(env: &mut HandshakeEnv, typ: HandshakeType) -> TLSError {
  send_fatal(env, AlertDescription::DecodeError);
  TLSError::CorruptMessagePayload(typ)
}

fn illegal(env: &mut HandshakeEnv, why: &str) -> TLSError {
  send_fatal(env, AlertDescription::IllegalParameter);
  TLSError::PeerMisbehavedError(why.to_string())
}

fn unsupported_ext(env: &mut HandshakeEnv, why: &str) -> TLSError {
  send_fatal(env, AlertDescription::UnsupportedExtension);
  TLSError::PeerMisbehavedError(why.to_string())
}

/* --- read_hello_retry_request ---
 * A HelloRetryRequest may or may not be first; we peek, and
 * anything else falls through to read_server_hello without
 * being consumed. */
fn do_read_hello_retry_request(hs: &mut ClientHandshake,
                               env: &mut HandshakeEnv) -> HandlerResult {
  let m = match env.records.get_message() {
    Some(m) => m,
    None => return Ok(Some(HsStatus::ReadMessage))
  };

  if m.typ != HandshakeType::HelloRetryRequest {
    hs.state = HandshakeState::ReadServerHello;
    return Ok(None);
  }

  let mut rd = Reader::init(&m.payload.0);
  let hrr = match HelloRetryRequest::read(&mut rd) {
    Some(hrr) => hrr,
    None => return Err(corrupt(env, HandshakeType::HelloRetryRequest))
  };

  if rd.any_left() || hrr.extensions.is_empty() {
    return Err(corrupt(env, HandshakeType::HelloRetryRequest));
  }

  if hrr.has_unknown_extension() {
    return Err(corrupt(env, HandshakeType::HelloRetryRequest));
  }

  debug!("got HelloRetryRequest {:?}", hrr);

  if let Some(group) = hrr.get_requested_key_share_group() {
    if !hs.config.supported_groups.contains(&group) {
      return Err(illegal(env, "wrong curve: retry group not supported"));
    }

    let offered_group = hs.key_share.as_ref().map(|kx| kx.group);
    if offered_group == Some(group) {
      return Err(illegal(env, "wrong curve: retry of group we offered"));
    }

    hs.retry_group = Some(group);
    hs.key_share = None;
  }

  if let Some(cookie) = hrr.get_cookie() {
    if cookie.0.is_empty() {
      return Err(corrupt(env, HandshakeType::HelloRetryRequest));
    }
    hs.cookie = Some(cookie.0.clone());
  }

  /* The transcript replaces everything before this point with
   * a message_hash once the suite is known. */
  hs.transcript.set_retry_point();
  hs.transcript.add_message(&m);
  env.records.next_message();

  hs.received_hello_retry_request = true;
  hs.state = HandshakeState::SendSecondClientHello;

  /* 0-RTT does not survive a retry. */
  if hs.in_early_data {
    hs.in_early_data = false;
    hs.can_early_write = false;
    info!("early data rejected by HelloRetryRequest");
    return Ok(Some(HsStatus::EarlyDataRejected));
  }

  Ok(None)
}

/* --- send_second_client_hello --- */
fn do_send_second_client_hello(hs: &mut ClientHandshake,
                               env: &mut HandshakeEnv) -> HandlerResult {
  /* Any 0-RTT write epoch is dead now. */
  env.records.set_write_state(None);

  if let Some(group) = hs.retry_group {
    hs.key_share = match KeyExchange::start_ecdhe(group) {
      Some(kx) => Some(kx),
      None => return Err(TLSError::General("key share generation failed".to_string()))
    };
  }

  let body = {
    let key_share = hs.key_share
      .as_ref()
      .expect("second hello without a key share");
    env.hello.second_client_hello(key_share,
                                  hs.cookie.as_ref().map(|c| &c[..]))
  };

  let m = HandshakeMessage::new(HandshakeType::ClientHello, body);
  hs.transcript.add_message(&m);
  env.records.add_message(&m);
  env.records.flush();

  hs.state = HandshakeState::ReadServerHello;
  Ok(Some(HsStatus::Flush))
}

/* --- read_server_hello --- */
fn do_read_server_hello(hs: &mut ClientHandshake,
                        env: &mut HandshakeEnv) -> HandlerResult {
  let m = match env.records.get_message() {
    Some(m) => m,
    None => return Ok(Some(HsStatus::ReadMessage))
  };

  if m.typ != HandshakeType::ServerHello {
    return Err(unexpected(env, m.typ, &[HandshakeType::ServerHello]));
  }

  let compat = hs.config.variant == Tls13Variant::Experiment;

  let mut rd = Reader::init(&m.payload.0);
  let server_hello = match ServerHelloPayload::read_in(&mut rd, compat) {
    Some(sh) => sh,
    None => return Err(corrupt(env, HandshakeType::ServerHello))
  };

  if rd.any_left() {
    return Err(corrupt(env, HandshakeType::ServerHello));
  }

  debug!("got ServerHello {:?}", server_hello);

  let expect_version = if compat {
    ProtocolVersion::TLSv1_2
  } else {
    ProtocolVersion::Unknown(TLS13_DRAFT_VERSION)
  };

  if server_hello.legacy_version != expect_version {
    send_fatal(env, AlertDescription::ProtocolVersion);
    return Err(TLSError::PeerIncompatibleError(
      "server sent unexpected legacy version".to_string()));
  }

  if compat && server_hello.compression_method != Some(Compression::Null) {
    return Err(illegal(env, "server chose non-null compression"));
  }

  let suite = match hs.config.find_cipher_suite(server_hello.cipher_suite) {
    Some(suite) => suite,
    None => {
      send_fatal(env, AlertDescription::IllegalParameter);
      return Err(TLSError::PeerIncompatibleError(
        "server chose a cipher suite outside the TLS 1.3 set".to_string()));
    }
  };

  info!("using cipher suite {:?}", server_hello.cipher_suite);
  hs.suite = Some(suite);
  hs.transcript.start_hash(suite.get_hash());

  let mut their_key_share = None;
  let mut psk_index = None;

  for ext in &server_hello.extensions {
    match *ext {
      ServerHelloExtension::KeyShare(ref share) => {
        their_key_share = Some(share.clone());
      }
      ServerHelloExtension::PresharedKey(idx) => {
        psk_index = Some(idx);
      }
      ServerHelloExtension::SupportedVersions(_) => {
        /* Version selection already happened outside this
         * machine; the variant merely tolerates its echo. */
        if !compat {
          return Err(unsupported_ext(env,
            "server sent supported_versions in ServerHello"));
        }
      }
      ServerHelloExtension::Unknown(ref unk) => {
        debug!("unexpected ServerHello extension {:?}", unk.typ);
        return Err(unsupported_ext(env, "server sent unexpected extension"));
      }
    }
  }

  let mut key_schedule = KeySchedule::new(suite.get_hash());

  match psk_index {
    Some(idx) => {
      let offered = match hs.offered_session.take() {
        Some(sess) => sess,
        None => {
          return Err(unsupported_ext(env,
            "server selected a psk we never offered"));
        }
      };

      /* We offer a single identity, so only index zero can be
       * valid. */
      if idx != 0 {
        return Err(illegal(env, "server selected an invalid psk identity"));
      }

      if offered.version != ProtocolVersion::TLSv1_3 {
        return Err(illegal(env, "resumed session has wrong version"));
      }

      if offered.suite.hash != suite.hash {
        return Err(illegal(env, "resumed session has wrong prf hash"));
      }

      if offered.sid_ctx != hs.config.session_id_context {
        /* The application changed its session id context
         * between connections; surface it loudly. */
        warn!("session offered under a different session id context");
        send_fatal(env, AlertDescription::IllegalParameter);
        return Err(TLSError::General(
          "session id context changed during resumption".to_string()));
      }

      info!("resuming session");
      let mut resumed = offered.dup_auth_only();
      resumed.session_reused = true;
      resumed.renew(hs.config.psk_dhe_timeout);
      hs.session_reused = true;
      hs.new_session = Some(resumed);

      key_schedule.input_secret(&offered.master_secret);
      /* `offered` ends here; nothing may refer to it again. */
    }
    None => {
      info!("not resuming");
      hs.offered_session = None;
      hs.new_session = Some(Session::new(suite,
                                         ProtocolVersion::TLSv1_3,
                                         hs.config.session_id_context.clone(),
                                         hs.config.session_timeout));
      key_schedule.input_empty();
    }
  }

  /* psk_ke-only operation is refused: a key share is always
   * required. */
  let their_share = match their_key_share {
    Some(share) => share,
    None => {
      send_fatal(env, AlertDescription::MissingExtension);
      return Err(TLSError::PeerMisbehavedError("missing key share".to_string()));
    }
  };

  let our_share = match hs.key_share.take() {
    Some(kx) => kx,
    None => return Err(TLSError::General("no key share in flight".to_string()))
  };

  if their_share.group != our_share.group {
    return Err(illegal(env, "wrong group for key share"));
  }

  let mut ecdhe = match our_share.complete(&their_share.payload.0) {
    Some(result) => result,
    None => return Err(illegal(env, "key exchange failed"))
  };

  key_schedule.input_secret(&ecdhe.shared_secret);
  wipe(&mut ecdhe.shared_secret);

  hs.transcript.add_message(&m);
  env.records.next_message();

  let handshake_hash = hs.transcript.get_current_hash();
  hs.client_hs_traffic_secret =
    key_schedule.derive(SecretKind::ClientHandshakeTrafficSecret, &handshake_hash);
  hs.server_hs_traffic_secret =
    key_schedule.derive(SecretKind::ServerHandshakeTrafficSecret, &handshake_hash);
  hs.key_schedule = Some(key_schedule);

  hs.state = HandshakeState::ProcessChangeCipherSpec;
  if compat {
    Ok(Some(HsStatus::ReadChangeCipherSpec))
  } else {
    Ok(None)
  }
}

/* --- process_change_cipher_spec ---
 * Install the handshake read key, and (unless 0-RTT data is
 * still in flight under its own epoch) the handshake write key
 * so even our alerts go out encrypted. */
fn do_process_change_cipher_spec(hs: &mut ClientHandshake,
                                 env: &mut HandshakeEnv) -> HandlerResult {
  let suite = hs.suite.expect("no cipher suite set");

  env.records.set_read_state(
    derive_traffic_keys(suite, &hs.server_hs_traffic_secret));

  if !hs.early_data_offered {
    if hs.config.variant == Tls13Variant::Experiment {
      env.records.add_change_cipher_spec();
    }
    env.records.set_write_state(Some(
      derive_traffic_keys(suite, &hs.client_hs_traffic_secret)));
  }

  hs.state = HandshakeState::ReadEncryptedExtensions;
  Ok(None)
}

/* --- read_encrypted_extensions --- */
fn do_read_encrypted_extensions(hs: &mut ClientHandshake,
                                env: &mut HandshakeEnv) -> HandlerResult {
  let m = match env.records.get_message() {
    Some(m) => m,
    None => return Ok(Some(HsStatus::ReadMessage))
  };

  if m.typ != HandshakeType::EncryptedExtensions {
    return Err(unexpected(env, m.typ, &[HandshakeType::EncryptedExtensions]));
  }

  let mut rd = Reader::init(&m.payload.0);
  let exts = match EncryptedExtensions::read(&mut rd) {
    Some(exts) => exts,
    None => return Err(corrupt(env, HandshakeType::EncryptedExtensions))
  };

  if rd.any_left() {
    return Err(corrupt(env, HandshakeType::EncryptedExtensions));
  }

  debug!("got EncryptedExtensions {:?}", exts);

  if exts.has_duplicate_extension() {
    send_fatal(env, AlertDescription::DecodeError);
    return Err(TLSError::PeerMisbehavedError(
      "server sent duplicate encrypted extensions".to_string()));
  }

  for ext in &exts {
    match *ext {
      EncryptedExtension::Protocols(_) |
      EncryptedExtension::ServerNameAck => (),
      EncryptedExtension::EarlyData => {
        if !hs.early_data_offered {
          return Err(unsupported_ext(env,
            "server accepted early data we never offered"));
        }
        hs.early_data_accepted = true;
      }
      EncryptedExtension::ChannelId => {
        if !hs.config.enable_channel_id {
          return Err(unsupported_ext(env, "server sent unsolicited channel id"));
        }
        hs.channel_id_valid = true;
      }
      EncryptedExtension::Unknown(ref unk) => {
        debug!("custom extension {:?} in EncryptedExtensions", unk.typ);
        hs.received_custom_extension = true;
      }
    }
  }

  if let Some(proto) = exts.get_alpn_protocol() {
    if !hs.config.alpn_protocols.contains(&proto) {
      return Err(illegal(env, "server sent non-offered alpn protocol"));
    }
    info!("alpn protocol is {:?}", proto);
    hs.new_session
      .as_mut()
      .expect("no session under construction")
      .alpn_protocol = Some(proto);
  }

  if hs.early_data_accepted {
    /* Early data was written under the offered session's
     * parameters; the server must not have diverged from
     * them, and must not have granted anything 0-RTT cannot
     * carry. */
    if !hs.session_reused {
      return Err(illegal(env, "early data accepted without resumption"));
    }

    {
      let early = hs.early_session
        .as_ref()
        .expect("early data accepted but never offered");
      let new = hs.new_session.as_ref().unwrap();

      if early.suite.suite != new.suite.suite {
        return Err(illegal(env, "cipher suite changed under early data"));
      }

      if early.alpn_protocol != new.alpn_protocol {
        return Err(illegal(env, "alpn mismatch on early data"));
      }
    }

    if hs.channel_id_valid {
      return Err(unsupported_ext(env, "channel id granted with early data"));
    }

    if hs.received_custom_extension {
      return Err(unsupported_ext(env, "unexpected extension on early data"));
    }
  }

  hs.transcript.add_message(&m);
  env.records.next_message();
  hs.state = HandshakeState::ReadCertificateRequest;

  if hs.early_data_offered && !hs.early_data_accepted && hs.in_early_data {
    hs.in_early_data = false;
    hs.can_early_write = false;
    info!("early data rejected");
    return Ok(Some(HsStatus::EarlyDataRejected));
  }

  Ok(None)
}

/* --- read_certificate_request --- */
fn do_read_certificate_request(hs: &mut ClientHandshake,
                               env: &mut HandshakeEnv) -> HandlerResult {
  /* A resumed server is already authenticated. */
  if hs.session_reused {
    hs.state = HandshakeState::ReadServerFinished;
    return Ok(None);
  }

  let m = match env.records.get_message() {
    Some(m) => m,
    None => return Ok(Some(HsStatus::ReadMessage))
  };

  if m.typ != HandshakeType::CertificateRequest {
    hs.state = HandshakeState::ReadServerCertificate;
    return Ok(None);
  }

  let mut rd = Reader::init(&m.payload.0);
  let certreq = match CertificateRequestPayload::read(&mut rd) {
    Some(cr) => cr,
    None => return Err(corrupt(env, HandshakeType::CertificateRequest))
  };

  if rd.any_left() {
    return Err(corrupt(env, HandshakeType::CertificateRequest));
  }

  /* The request context is reserved for post-handshake
   * authentication; during the handshake it must be empty. */
  if !certreq.context.0.is_empty() {
    return Err(corrupt(env, HandshakeType::CertificateRequest));
  }

  if certreq.sigschemes.is_empty() {
    return Err(corrupt(env, HandshakeType::CertificateRequest));
  }

  debug!("got CertificateRequest {:?}", certreq);

  hs.cert_request = true;
  hs.peer_sigalgs = certreq.sigschemes.clone();
  hs.ca_names = certreq.canames.clone();

  hs.transcript.add_message(&m);
  env.records.next_message();
  hs.state = HandshakeState::ReadServerCertificate;
  Ok(None)
}

/* --- read_server_certificate --- */
fn do_read_server_certificate(hs: &mut ClientHandshake,
                              env: &mut HandshakeEnv) -> HandlerResult {
  let m = match env.records.get_message() {
    Some(m) => m,
    None => return Ok(Some(HsStatus::ReadMessage))
  };

  if m.typ != HandshakeType::Certificate {
    return Err(unexpected(env, m.typ, &[HandshakeType::Certificate]));
  }

  if m.payload.0.is_empty() {
    return Err(corrupt(env, HandshakeType::Certificate));
  }

  if let Err(err) = env.certs.process_server_certificate(&m.payload.0, true) {
    send_fatal(env, AlertDescription::BadCertificate);
    return Err(err);
  }

  hs.new_session
    .as_mut()
    .expect("no session under construction")
    .peer_certificates = env.certs.peer_certificates();

  hs.transcript.add_message(&m);
  env.records.next_message();
  hs.state = HandshakeState::ReadServerCertificateVerify;
  Ok(None)
}

/* --- read_server_certificate_verify --- */
fn do_read_server_certificate_verify(hs: &mut ClientHandshake,
                                     env: &mut HandshakeEnv) -> HandlerResult {
  /* Chain verification runs before we look at the signature;
   * it may be asynchronous, in which case we stay here. */
  match env.certs.verify_peer_certificate() {
    CertVerifyResult::Valid => (),
    CertVerifyResult::Invalid => {
      send_fatal(env, AlertDescription::BadCertificate);
      return Err(TLSError::General("certificate verification failed".to_string()));
    }
    CertVerifyResult::Retry => return Ok(Some(HsStatus::CertificateVerify))
  }

  let m = match env.records.get_message() {
    Some(m) => m,
    None => return Ok(Some(HsStatus::ReadMessage))
  };

  if m.typ != HandshakeType::CertificateVerify {
    return Err(unexpected(env, m.typ, &[HandshakeType::CertificateVerify]));
  }

  let mut rd = Reader::init(&m.payload.0);
  let dss = match DigitallySignedStruct::read(&mut rd) {
    Some(dss) => dss,
    None => return Err(corrupt(env, HandshakeType::CertificateVerify))
  };

  if rd.any_left() {
    return Err(corrupt(env, HandshakeType::CertificateVerify));
  }

  let message = verify::server_verify_message(&hs.transcript.get_current_hash());
  if let Err(err) = env.certs.verify_signature(dss.scheme, &message, &dss.sig.0) {
    send_fatal(env, AlertDescription::DecryptError);
    return Err(err);
  }

  hs.transcript.add_message(&m);
  env.records.next_message();
  hs.state = HandshakeState::ReadServerFinished;
  Ok(None)
}

/* --- read_server_finished --- */
fn do_read_server_finished(hs: &mut ClientHandshake,
                           env: &mut HandshakeEnv) -> HandlerResult {
  let m = match env.records.get_message() {
    Some(m) => m,
    None => return Ok(Some(HsStatus::ReadMessage))
  };

  if m.typ != HandshakeType::Finished {
    return Err(unexpected(env, m.typ, &[HandshakeType::Finished]));
  }

  {
    let key_schedule = hs.key_schedule.as_ref().expect("no key schedule");
    let handshake_hash = hs.transcript.get_current_hash();
    let expect_verify_data =
      key_schedule.sign_finish(&hs.server_hs_traffic_secret, &handshake_hash);

    if ring::constant_time::verify_slices_are_equal(&expect_verify_data,
                                                    &m.payload.0).is_err() {
      send_fatal(env, AlertDescription::DecryptError);
      return Err(TLSError::DecryptError);
    }
  }

  hs.transcript.add_message(&m);
  env.records.next_message();

  /* Move to the master secret, and cut the application traffic
   * secrets over the transcript including this Finished. */
  let handshake_hash = hs.transcript.get_current_hash();
  let key_schedule = hs.key_schedule.as_mut().expect("no key schedule");
  key_schedule.input_empty();
  hs.server_app_traffic_secret =
    key_schedule.derive(SecretKind::ServerApplicationTrafficSecret, &handshake_hash);
  hs.client_app_traffic_secret =
    key_schedule.derive(SecretKind::ClientApplicationTrafficSecret, &handshake_hash);

  hs.state = HandshakeState::SendEndOfEarlyData;
  Ok(None)
}

/* --- send_end_of_early_data --- */
fn do_send_end_of_early_data(hs: &mut ClientHandshake,
                             env: &mut HandshakeEnv) -> HandlerResult {
  let suite = hs.suite.expect("no cipher suite set");

  if hs.early_data_accepted {
    hs.can_early_write = false;
    env.records.add_alert(AlertLevel::Warning, AlertDescription::EndOfEarlyData);
  }

  if hs.early_data_offered {
    /* The early data write epoch ends here; the handshake
     * write key replaces it. */
    if hs.config.variant == Tls13Variant::Experiment {
      env.records.add_change_cipher_spec();
    }
    env.records.set_write_state(Some(
      derive_traffic_keys(suite, &hs.client_hs_traffic_secret)));
  }

  hs.in_early_data = false;
  hs.state = HandshakeState::SendClientCertificate;
  Ok(None)
}

/* --- send_client_certificate --- */
fn do_send_client_certificate(hs: &mut ClientHandshake,
                              env: &mut HandshakeEnv) -> HandlerResult {
  if !hs.cert_request {
    hs.state = HandshakeState::CompleteSecondFlight;
    return Ok(None);
  }

  match env.certs.select_client_certificate() {
    CertSelectResult::Fail => {
      send_fatal(env, AlertDescription::InternalError);
      return Err(TLSError::General(
        "client certificate selection failed".to_string()));
    }
    CertSelectResult::Retry => return Ok(Some(HsStatus::X509Lookup)),
    CertSelectResult::Proceed => ()
  }

  if let Err(err) = env.certs.on_certificate_selected() {
    send_fatal(env, AlertDescription::InternalError);
    return Err(err);
  }

  let body = match env.certs.client_certificate_payload() {
    Ok(body) => body,
    Err(err) => {
      send_fatal(env, AlertDescription::InternalError);
      return Err(err);
    }
  };

  let m = HandshakeMessage::new(HandshakeType::Certificate, body);
  hs.transcript.add_message(&m);
  env.records.add_message(&m);

  hs.state = HandshakeState::SendClientCertificateVerify;
  Ok(None)
}

/* --- send_client_certificate_verify --- */
fn do_send_client_certificate_verify(hs: &mut ClientHandshake,
                                     env: &mut HandshakeEnv) -> HandlerResult {
  if !env.certs.has_client_certificate() {
    debug!("not sending CertificateVerify, no certificate");
    hs.state = HandshakeState::CompleteSecondFlight;
    return Ok(None);
  }

  let message = verify::client_verify_message(&hs.transcript.get_current_hash());

  match env.certs.sign_certificate_verify(&hs.peer_sigalgs, &message) {
    SignResult::Signed(scheme, sig) => {
      let dss = DigitallySignedStruct::new(scheme, sig);
      let m = HandshakeMessage::build(HandshakeType::CertificateVerify, &dss);
      hs.transcript.add_message(&m);
      env.records.add_message(&m);

      hs.state = HandshakeState::CompleteSecondFlight;
      Ok(None)
    }
    SignResult::Retry => Ok(Some(HsStatus::PrivateKeyOperation)),
    SignResult::Failure => {
      send_fatal(env, AlertDescription::InternalError);
      Err(TLSError::General("client private key failure".to_string()))
    }
  }
}

fn emit_channel_id(hs: &mut ClientHandshake,
                   env: &mut HandshakeEnv,
                   key: &dyn ChannelIdKey) -> Result<(), TLSError> {
  let mut ctx = ring::digest::Context::new(&ring::digest::SHA256);
  ctx.update(CHANNEL_ID_SIGNATURE_MAGIC);
  ctx.update(&hs.transcript.get_current_hash());
  let digest = ctx.finish();

  let public = key.public_key();
  let sig = key.sign(digest.as_ref())?;

  if public.len() != 64 || sig.len() != 64 {
    return Err(TLSError::General("malformed channel id key output".to_string()));
  }

  let mut body = Vec::new();
  ExtensionType::ChannelId.encode(&mut body);
  codec::encode_u16(128, &mut body);
  body.extend_from_slice(&public);
  body.extend_from_slice(&sig);

  let m = HandshakeMessage::new(HandshakeType::ChannelId, body);
  hs.transcript.add_message(&m);
  env.records.add_message(&m);
  Ok(())
}

/* --- complete_second_flight --- */
fn do_complete_second_flight(hs: &mut ClientHandshake,
                             env: &mut HandshakeEnv) -> HandlerResult {
  if hs.channel_id_valid {
    let key = match env.callbacks.channel_id_key() {
      Some(key) => key,
      None => return Ok(Some(HsStatus::ChannelIdLookup))
    };

    emit_channel_id(hs, env, &*key)?;
    hs.channel_id_valid = false;
  }

  let suite = hs.suite.expect("no cipher suite set");

  /* Our Finished, under the handshake write key. */
  let verify_data = {
    let key_schedule = hs.key_schedule.as_ref().expect("no key schedule");
    let handshake_hash = hs.transcript.get_current_hash();
    key_schedule.sign_finish(&hs.client_hs_traffic_secret, &handshake_hash)
  };

  let m = HandshakeMessage::new(HandshakeType::Finished, verify_data);
  hs.transcript.add_message(&m);
  env.records.add_message(&m);

  /* Both sides of the connection move to application keys:
   * read first, then write. */
  env.records.set_read_state(
    derive_traffic_keys(suite, &hs.server_app_traffic_secret));
  env.records.set_write_state(Some(
    derive_traffic_keys(suite, &hs.client_app_traffic_secret)));

  /* The resumption master secret covers our Finished too. */
  let resumption_secret = {
    let key_schedule = hs.key_schedule.as_ref().expect("no key schedule");
    let handshake_hash = hs.transcript.get_current_hash();
    key_schedule.derive(SecretKind::ResumptionMasterSecret, &handshake_hash)
  };

  let mut session = hs.new_session
    .take()
    .expect("no session under construction");
  session.master_secret = resumption_secret;

  /* Resumable only once the server supplies a ticket. */
  session.not_resumable = true;
  hs.established_session = Some(session);

  wipe(&mut hs.client_hs_traffic_secret);
  wipe(&mut hs.server_hs_traffic_secret);

  hs.state = HandshakeState::Done;
  env.records.flush();
  Ok(Some(HsStatus::Flush))
}

impl ClientHandshake {
  /// Drive the handshake as far as it can go.  Returns the
  /// suspension reason describing what must happen before the
  /// next call, `HsStatus::Done` once complete, or the fatal
  /// error that ended the connection.  After an error the
  /// state machine refuses re-entry.
  pub fn handshake(&mut self, env: &mut HandshakeEnv) -> Result<HsStatus, TLSError> {
    if self.failed {
      return Err(TLSError::General("handshake previously failed".to_string()));
    }

    loop {
      if self.state == HandshakeState::Done {
        return Ok(HsStatus::Done);
      }

      let prev = self.state;

      let ret = match self.state {
        HandshakeState::ReadHelloRetryRequest =>
          do_read_hello_retry_request(self, env),
        HandshakeState::SendSecondClientHello =>
          do_send_second_client_hello(self, env),
        HandshakeState::ReadServerHello =>
          do_read_server_hello(self, env),
        HandshakeState::ProcessChangeCipherSpec =>
          do_process_change_cipher_spec(self, env),
        HandshakeState::ReadEncryptedExtensions =>
          do_read_encrypted_extensions(self, env),
        HandshakeState::ReadCertificateRequest =>
          do_read_certificate_request(self, env),
        HandshakeState::ReadServerCertificate =>
          do_read_server_certificate(self, env),
        HandshakeState::ReadServerCertificateVerify =>
          do_read_server_certificate_verify(self, env),
        HandshakeState::ReadServerFinished =>
          do_read_server_finished(self, env),
        HandshakeState::SendEndOfEarlyData =>
          do_send_end_of_early_data(self, env),
        HandshakeState::SendClientCertificate =>
          do_send_client_certificate(self, env),
        HandshakeState::SendClientCertificateVerify =>
          do_send_client_certificate_verify(self, env),
        HandshakeState::CompleteSecondFlight =>
          do_complete_second_flight(self, env),
        HandshakeState::Done => unreachable!()
      };

      let status = match ret {
        Ok(status) => status,
        Err(err) => {
          self.failed = true;
          return Err(err);
        }
      };

      if self.state != prev {
        debug!("handshake state {} -> {}", prev.name(), self.state.name());
        env.callbacks.on_state_change(self.state.name());
      }

      if let Some(status) = status {
        return Ok(status);
      }
    }
  }

  /// Take in a NewSessionTicket arriving on the established
  /// connection.  The established session is duplicated,
  /// ticket fields applied, and the result offered to the
  /// application through its session callback.
  pub fn process_new_session_ticket(&mut self,
                                    records: &mut dyn RecordAdapter,
                                    callbacks: &mut dyn ClientCallbacks,
                                    payload: &[u8]) -> Result<(), TLSError> {
    let established = match self.established_session {
      Some(ref sess) => sess,
      None => {
        return Err(TLSError::General(
          "ticket arrived before handshake completion".to_string()));
      }
    };

    let mut rd = Reader::init(payload);
    let nst = match NewSessionTicketPayload::read(&mut rd) {
      Some(nst) => nst,
      None => {
        records.add_alert(AlertLevel::Fatal, AlertDescription::DecodeError);
        return Err(TLSError::CorruptMessagePayload(HandshakeType::NewSessionTicket));
      }
    };

    if rd.any_left() {
      records.add_alert(AlertLevel::Fatal, AlertDescription::DecodeError);
      return Err(TLSError::CorruptMessagePayload(HandshakeType::NewSessionTicket));
    }

    debug!("got NewSessionTicket lifetime {}", nst.lifetime);

    let mut session = established.clone();
    session.rebase_time();
    session.ticket = nst.ticket.0.clone();
    session.ticket_age_add = nst.age_add;
    session.ticket_age_add_valid = true;
    session.not_resumable = false;
    session.cap_timeout(nst.lifetime as u64);

    if let Some(max) = nst.get_max_early_data_size() {
      session.max_early_data_size = max;
    }

    if !callbacks.new_session(session) {
      debug!("session ticket not taken by application");
    }

    Ok(())
  }
}
