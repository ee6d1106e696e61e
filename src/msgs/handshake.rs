use msgs::enums::{ProtocolVersion, HandshakeType};
use msgs::enums::{CipherSuite, Compression, ExtensionType};
use msgs::enums::{SignatureScheme, NamedGroup};
use msgs::base::{Payload, PayloadU8, PayloadU16};
use msgs::codec;
use msgs::codec::{Codec, Reader};

use std::collections;

macro_rules! declare_u16_vec(
  ($name:ident, $itemtype:ty) => {
    pub type $name = Vec<$itemtype>;

    impl Codec for $name {
      fn encode(&self, bytes: &mut Vec<u8>) {
        codec::encode_vec_u16(bytes, self);
      }

      fn read(r: &mut Reader) -> Option<$name> {
        codec::read_vec_u16::<$itemtype>(r)
      }
    }
  }
);

#[derive(Debug, Clone)]
pub struct Random([u8; 32]);

impl Codec for Random {
  fn encode(&self, bytes: &mut Vec<u8>) {
    bytes.extend_from_slice(&self.0);
  }

  fn read(r: &mut Reader) -> Option<Random> {
    let bytes = try_ret!(r.take(32));
    let mut opaque = [0; 32];
    opaque.clone_from_slice(bytes);

    Some(Random(opaque))
  }
}

impl Random {
  pub fn from_slice(bytes: &[u8]) -> Random {
    let mut rd = Reader::init(bytes);
    Random::read(&mut rd).unwrap()
  }
}

#[derive(Debug, PartialEq, Clone)]
pub struct SessionID {
  bytes: Vec<u8>
}

impl Codec for SessionID {
  fn encode(&self, bytes: &mut Vec<u8>) {
    debug_assert!(self.bytes.len() <= 32);
    bytes.push(self.bytes.len() as u8);
    bytes.extend_from_slice(&self.bytes);
  }

  fn read(r: &mut Reader) -> Option<SessionID> {
    let len = try_ret!(codec::read_u8(r)) as usize;
    if len > 32 {
      return None;
    }

    let bytes = try_ret!(r.take(len));
    Some(SessionID { bytes: bytes.to_vec() })
  }
}

impl SessionID {
  pub fn new(mut bytes: Vec<u8>) -> SessionID {
    bytes.truncate(32);
    SessionID { bytes: bytes }
  }

  pub fn empty() -> SessionID {
    SessionID::new(Vec::new())
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }
}

#[derive(Debug, Clone)]
pub struct UnknownExtension {
  pub typ: ExtensionType,
  pub payload: Payload
}

impl UnknownExtension {
  fn encode(&self, bytes: &mut Vec<u8>) {
    self.payload.encode(bytes);
  }

  fn read(typ: ExtensionType, r: &mut Reader) -> Option<UnknownExtension> {
    let payload = try_ret!(Payload::read(r));
    Some(UnknownExtension {
      typ: typ,
      payload: payload
    })
  }
}

pub type ProtocolName = PayloadU8;
declare_u16_vec!(ProtocolNameList, ProtocolName);

pub trait ConvertProtocolNameList {
  fn from_strings(names: &[String]) -> Self;
  fn to_single_string(&self) -> Option<String>;
}

impl ConvertProtocolNameList for ProtocolNameList {
  fn from_strings(names: &[String]) -> ProtocolNameList {
    names.iter()
      .map(|name| PayloadU8::new(name.as_bytes().to_vec()))
      .collect()
  }

  fn to_single_string(&self) -> Option<String> {
    if self.len() == 1 {
      String::from_utf8(self[0].0.clone()).ok()
    } else {
      None
    }
  }
}

declare_u16_vec!(SupportedSignatureSchemes, SignatureScheme);

/* --- Key shares --- */
#[derive(Debug, Clone)]
pub struct KeyShareEntry {
  pub group: NamedGroup,
  pub payload: PayloadU16
}

impl KeyShareEntry {
  pub fn new(group: NamedGroup, payload: &[u8]) -> KeyShareEntry {
    KeyShareEntry {
      group: group,
      payload: PayloadU16::new(payload.to_vec())
    }
  }
}

impl Codec for KeyShareEntry {
  fn encode(&self, bytes: &mut Vec<u8>) {
    self.group.encode(bytes);
    self.payload.encode(bytes);
  }

  fn read(r: &mut Reader) -> Option<KeyShareEntry> {
    let group = try_ret!(NamedGroup::read(r));
    let payload = try_ret!(PayloadU16::read(r));

    Some(KeyShareEntry {
      group: group,
      payload: payload
    })
  }
}

/* --- HelloRetryRequest --- */
#[derive(Debug, Clone)]
pub enum HelloRetryExtension {
  KeyShare(NamedGroup),
  Cookie(PayloadU16),
  Unknown(UnknownExtension)
}

impl HelloRetryExtension {
  pub fn get_type(&self) -> ExtensionType {
    match *self {
      HelloRetryExtension::KeyShare(_) => ExtensionType::KeyShare,
      HelloRetryExtension::Cookie(_) => ExtensionType::Cookie,
      HelloRetryExtension::Unknown(ref r) => r.typ
    }
  }
}

impl Codec for HelloRetryExtension {
  fn encode(&self, bytes: &mut Vec<u8>) {
    self.get_type().encode(bytes);

    let mut sub: Vec<u8> = Vec::new();
    match *self {
      HelloRetryExtension::KeyShare(ref r) => r.encode(&mut sub),
      HelloRetryExtension::Cookie(ref r) => r.encode(&mut sub),
      HelloRetryExtension::Unknown(ref r) => r.encode(&mut sub)
    }

    codec::encode_u16(sub.len() as u16, bytes);
    bytes.append(&mut sub);
  }

  fn read(r: &mut Reader) -> Option<HelloRetryExtension> {
    let typ = try_ret!(ExtensionType::read(r));
    let len = try_ret!(codec::read_u16(r)) as usize;
    let mut sub = try_ret!(r.sub(len));

    Some(match typ {
      ExtensionType::KeyShare =>
        HelloRetryExtension::KeyShare(try_ret!(NamedGroup::read(&mut sub))),
      ExtensionType::Cookie =>
        HelloRetryExtension::Cookie(try_ret!(PayloadU16::read(&mut sub))),
      _ =>
        HelloRetryExtension::Unknown(try_ret!(UnknownExtension::read(typ, &mut sub)))
    })
  }
}

#[derive(Debug, Clone)]
pub struct HelloRetryRequest {
  pub server_version: ProtocolVersion,
  pub extensions: Vec<HelloRetryExtension>
}

impl Codec for HelloRetryRequest {
  fn encode(&self, bytes: &mut Vec<u8>) {
    self.server_version.encode(bytes);
    codec::encode_vec_u16(bytes, &self.extensions);
  }

  fn read(r: &mut Reader) -> Option<HelloRetryRequest> {
    Some(HelloRetryRequest {
      server_version: try_ret!(ProtocolVersion::read(r)),
      extensions: try_ret!(codec::read_vec_u16::<HelloRetryExtension>(r))
    })
  }
}

impl HelloRetryRequest {
  pub fn get_requested_key_share_group(&self) -> Option<NamedGroup> {
    for ext in &self.extensions {
      if let HelloRetryExtension::KeyShare(group) = *ext {
        return Some(group);
      }
    }
    None
  }

  pub fn get_cookie(&self) -> Option<&PayloadU16> {
    for ext in &self.extensions {
      if let HelloRetryExtension::Cookie(ref ck) = *ext {
        return Some(ck);
      }
    }
    None
  }

  pub fn has_unknown_extension(&self) -> bool {
    self.extensions
      .iter()
      .any(|ext| {
        match *ext {
          HelloRetryExtension::Unknown(_) => true,
          _ => false
        }
      })
  }
}

/* --- ServerHello --- */
#[derive(Debug, Clone)]
pub enum ServerHelloExtension {
  KeyShare(KeyShareEntry),
  PresharedKey(u16),
  SupportedVersions(ProtocolVersion),
  Unknown(UnknownExtension)
}

impl ServerHelloExtension {
  pub fn get_type(&self) -> ExtensionType {
    match *self {
      ServerHelloExtension::KeyShare(_) => ExtensionType::KeyShare,
      ServerHelloExtension::PresharedKey(_) => ExtensionType::PreSharedKey,
      ServerHelloExtension::SupportedVersions(_) => ExtensionType::SupportedVersions,
      ServerHelloExtension::Unknown(ref r) => r.typ
    }
  }
}

impl Codec for ServerHelloExtension {
  fn encode(&self, bytes: &mut Vec<u8>) {
    self.get_type().encode(bytes);

    let mut sub: Vec<u8> = Vec::new();
    match *self {
      ServerHelloExtension::KeyShare(ref r) => r.encode(&mut sub),
      ServerHelloExtension::PresharedKey(r) => codec::encode_u16(r, &mut sub),
      ServerHelloExtension::SupportedVersions(ref r) => r.encode(&mut sub),
      ServerHelloExtension::Unknown(ref r) => r.encode(&mut sub)
    }

    codec::encode_u16(sub.len() as u16, bytes);
    bytes.append(&mut sub);
  }

  fn read(r: &mut Reader) -> Option<ServerHelloExtension> {
    let typ = try_ret!(ExtensionType::read(r));
    let len = try_ret!(codec::read_u16(r)) as usize;
    let mut sub = try_ret!(r.sub(len));

    Some(match typ {
      ExtensionType::KeyShare =>
        ServerHelloExtension::KeyShare(try_ret!(KeyShareEntry::read(&mut sub))),
      ExtensionType::PreSharedKey =>
        ServerHelloExtension::PresharedKey(try_ret!(codec::read_u16(&mut sub))),
      ExtensionType::SupportedVersions =>
        ServerHelloExtension::SupportedVersions(try_ret!(ProtocolVersion::read(&mut sub))),
      _ =>
        ServerHelloExtension::Unknown(try_ret!(UnknownExtension::read(typ, &mut sub)))
    })
  }
}

#[derive(Debug, Clone)]
pub struct ServerHelloPayload {
  pub legacy_version: ProtocolVersion,
  pub random: Random,
  pub session_id: Option<SessionID>,
  pub cipher_suite: CipherSuite,
  pub compression_method: Option<Compression>,
  pub extensions: Vec<ServerHelloExtension>
}

impl ServerHelloPayload {
  /* The ServerHello encoding differs between the draft and the
   * middlebox-compatible variant: the latter echoes a legacy
   * session id and carries a compression byte.  That makes the
   * parse context-sensitive, so this is not a plain Codec. */
  pub fn read_in(r: &mut Reader, compat: bool) -> Option<ServerHelloPayload> {
    let version = try_ret!(ProtocolVersion::read(r));
    let random = try_ret!(Random::read(r));

    let session_id = if compat {
      Some(try_ret!(SessionID::read(r)))
    } else {
      None
    };

    let suite = try_ret!(CipherSuite::read(r));

    let compression = if compat {
      Some(try_ret!(Compression::read(r)))
    } else {
      None
    };

    Some(ServerHelloPayload {
      legacy_version: version,
      random: random,
      session_id: session_id,
      cipher_suite: suite,
      compression_method: compression,
      extensions: try_ret!(codec::read_vec_u16::<ServerHelloExtension>(r))
    })
  }

  pub fn encode_in(&self, compat: bool, bytes: &mut Vec<u8>) {
    self.legacy_version.encode(bytes);
    self.random.encode(bytes);

    if compat {
      match self.session_id {
        Some(ref sid) => sid.encode(bytes),
        None => SessionID::empty().encode(bytes)
      }
    }

    self.cipher_suite.encode(bytes);

    if compat {
      self.compression_method
        .unwrap_or(Compression::Null)
        .encode(bytes);
    }

    codec::encode_vec_u16(bytes, &self.extensions);
  }

  pub fn get_key_share(&self) -> Option<&KeyShareEntry> {
    for ext in &self.extensions {
      if let ServerHelloExtension::KeyShare(ref share) = *ext {
        return Some(share);
      }
    }
    None
  }

  pub fn get_psk_index(&self) -> Option<u16> {
    for ext in &self.extensions {
      if let ServerHelloExtension::PresharedKey(idx) = *ext {
        return Some(idx);
      }
    }
    None
  }
}

/* --- EncryptedExtensions --- */
#[derive(Debug, Clone)]
pub enum EncryptedExtension {
  Protocols(ProtocolNameList),
  ServerNameAck,
  EarlyData,
  ChannelId,
  Unknown(UnknownExtension)
}

impl EncryptedExtension {
  pub fn get_type(&self) -> ExtensionType {
    match *self {
      EncryptedExtension::Protocols(_) => ExtensionType::ALProtocolNegotiation,
      EncryptedExtension::ServerNameAck => ExtensionType::ServerName,
      EncryptedExtension::EarlyData => ExtensionType::EarlyData,
      EncryptedExtension::ChannelId => ExtensionType::ChannelId,
      EncryptedExtension::Unknown(ref r) => r.typ
    }
  }
}

impl Codec for EncryptedExtension {
  fn encode(&self, bytes: &mut Vec<u8>) {
    self.get_type().encode(bytes);

    let mut sub: Vec<u8> = Vec::new();
    match *self {
      EncryptedExtension::Protocols(ref r) => r.encode(&mut sub),
      EncryptedExtension::ServerNameAck => (),
      EncryptedExtension::EarlyData => (),
      EncryptedExtension::ChannelId => (),
      EncryptedExtension::Unknown(ref r) => r.encode(&mut sub)
    }

    codec::encode_u16(sub.len() as u16, bytes);
    bytes.append(&mut sub);
  }

  fn read(r: &mut Reader) -> Option<EncryptedExtension> {
    let typ = try_ret!(ExtensionType::read(r));
    let len = try_ret!(codec::read_u16(r)) as usize;
    let mut sub = try_ret!(r.sub(len));

    Some(match typ {
      ExtensionType::ALProtocolNegotiation =>
        EncryptedExtension::Protocols(try_ret!(ProtocolNameList::read(&mut sub))),
      ExtensionType::ServerName =>
        EncryptedExtension::ServerNameAck,
      ExtensionType::EarlyData =>
        EncryptedExtension::EarlyData,
      ExtensionType::ChannelId =>
        EncryptedExtension::ChannelId,
      _ =>
        EncryptedExtension::Unknown(try_ret!(UnknownExtension::read(typ, &mut sub)))
    })
  }
}

declare_u16_vec!(EncryptedExtensions, EncryptedExtension);

pub trait ServerExtensionSet {
  fn has_duplicate_extension(&self) -> bool;
  fn find_extension(&self, typ: ExtensionType) -> Option<&EncryptedExtension>;
  fn get_alpn_protocol(&self) -> Option<String>;
  fn early_data_offered(&self) -> bool;
}

impl ServerExtensionSet for EncryptedExtensions {
  fn has_duplicate_extension(&self) -> bool {
    let mut seen = collections::HashSet::new();

    for ext in self {
      let typ = ext.get_type().get_u16();

      if seen.contains(&typ) {
        return true;
      }
      seen.insert(typ);
    }

    false
  }

  fn find_extension(&self, typ: ExtensionType) -> Option<&EncryptedExtension> {
    self.iter().find(|x| x.get_type() == typ)
  }

  fn get_alpn_protocol(&self) -> Option<String> {
    let ext = try_ret!(self.find_extension(ExtensionType::ALProtocolNegotiation));
    match *ext {
      EncryptedExtension::Protocols(ref protos) => protos.to_single_string(),
      _ => None
    }
  }

  fn early_data_offered(&self) -> bool {
    self.find_extension(ExtensionType::EarlyData).is_some()
  }
}

/* --- CertificateRequest --- */
pub type DistinguishedName = PayloadU16;
declare_u16_vec!(DistinguishedNames, DistinguishedName);

#[derive(Debug, Clone)]
pub struct CertificateRequestPayload {
  pub context: PayloadU8,
  pub sigschemes: SupportedSignatureSchemes,
  pub canames: DistinguishedNames,
  pub extensions: PayloadU16
}

impl Codec for CertificateRequestPayload {
  fn encode(&self, bytes: &mut Vec<u8>) {
    self.context.encode(bytes);
    self.sigschemes.encode(bytes);
    self.canames.encode(bytes);
    self.extensions.encode(bytes);
  }

  fn read(r: &mut Reader) -> Option<CertificateRequestPayload> {
    Some(CertificateRequestPayload {
      context: try_ret!(PayloadU8::read(r)),
      sigschemes: try_ret!(SupportedSignatureSchemes::read(r)),
      canames: try_ret!(DistinguishedNames::read(r)),
      extensions: try_ret!(PayloadU16::read(r))
    })
  }
}

/* --- CertificateVerify --- */
#[derive(Debug, Clone)]
pub struct DigitallySignedStruct {
  pub scheme: SignatureScheme,
  pub sig: PayloadU16
}

impl DigitallySignedStruct {
  pub fn new(scheme: SignatureScheme, sig: Vec<u8>) -> DigitallySignedStruct {
    DigitallySignedStruct {
      scheme: scheme,
      sig: PayloadU16::new(sig)
    }
  }
}

impl Codec for DigitallySignedStruct {
  fn encode(&self, bytes: &mut Vec<u8>) {
    self.scheme.encode(bytes);
    self.sig.encode(bytes);
  }

  fn read(r: &mut Reader) -> Option<DigitallySignedStruct> {
    let scheme = try_ret!(SignatureScheme::read(r));
    let sig = try_ret!(PayloadU16::read(r));

    Some(DigitallySignedStruct {
      scheme: scheme,
      sig: sig
    })
  }
}

/* --- NewSessionTicket --- */
#[derive(Debug, Clone)]
pub enum NewSessionTicketExtension {
  EarlyDataInfo(u32),
  Unknown(UnknownExtension)
}

impl NewSessionTicketExtension {
  pub fn get_type(&self) -> ExtensionType {
    match *self {
      NewSessionTicketExtension::EarlyDataInfo(_) => ExtensionType::TicketEarlyDataInfo,
      NewSessionTicketExtension::Unknown(ref r) => r.typ
    }
  }
}

impl Codec for NewSessionTicketExtension {
  fn encode(&self, bytes: &mut Vec<u8>) {
    self.get_type().encode(bytes);

    let mut sub: Vec<u8> = Vec::new();
    match *self {
      NewSessionTicketExtension::EarlyDataInfo(r) => codec::encode_u32(r, &mut sub),
      NewSessionTicketExtension::Unknown(ref r) => r.encode(&mut sub)
    }

    codec::encode_u16(sub.len() as u16, bytes);
    bytes.append(&mut sub);
  }

  fn read(r: &mut Reader) -> Option<NewSessionTicketExtension> {
    let typ = try_ret!(ExtensionType::read(r));
    let len = try_ret!(codec::read_u16(r)) as usize;
    let mut sub = try_ret!(r.sub(len));

    Some(match typ {
      ExtensionType::TicketEarlyDataInfo => {
        let max = try_ret!(codec::read_u32(&mut sub));
        if sub.any_left() {
          return None;
        }
        NewSessionTicketExtension::EarlyDataInfo(max)
      }
      _ =>
        NewSessionTicketExtension::Unknown(try_ret!(UnknownExtension::read(typ, &mut sub)))
    })
  }
}

#[derive(Debug, Clone)]
pub struct NewSessionTicketPayload {
  pub lifetime: u32,
  pub age_add: u32,
  pub ticket: PayloadU16,
  pub exts: Vec<NewSessionTicketExtension>
}

impl Codec for NewSessionTicketPayload {
  fn encode(&self, bytes: &mut Vec<u8>) {
    codec::encode_u32(self.lifetime, bytes);
    codec::encode_u32(self.age_add, bytes);
    self.ticket.encode(bytes);
    codec::encode_vec_u16(bytes, &self.exts);
  }

  fn read(r: &mut Reader) -> Option<NewSessionTicketPayload> {
    Some(NewSessionTicketPayload {
      lifetime: try_ret!(codec::read_u32(r)),
      age_add: try_ret!(codec::read_u32(r)),
      ticket: try_ret!(PayloadU16::read(r)),
      exts: try_ret!(codec::read_vec_u16::<NewSessionTicketExtension>(r))
    })
  }
}

impl NewSessionTicketPayload {
  pub fn get_max_early_data_size(&self) -> Option<u32> {
    for ext in &self.exts {
      if let NewSessionTicketExtension::EarlyDataInfo(sz) = *ext {
        return Some(sz);
      }
    }
    None
  }
}

/* --- Framing --- */

/// One handshake-level message: its type and body, without the
/// four byte header.  `encoding` restores the header, which is
/// what the transcript hash is computed over.
#[derive(Debug, Clone)]
pub struct HandshakeMessage {
  pub typ: HandshakeType,
  pub payload: Payload
}

impl HandshakeMessage {
  pub fn new(typ: HandshakeType, body: Vec<u8>) -> HandshakeMessage {
    HandshakeMessage {
      typ: typ,
      payload: Payload::new(body)
    }
  }

  pub fn build<T: Codec>(typ: HandshakeType, body: &T) -> HandshakeMessage {
    HandshakeMessage::new(typ, body.get_encoding())
  }

  pub fn encoding(&self) -> Vec<u8> {
    let mut ret = Vec::new();
    self.typ.encode(&mut ret);
    codec::encode_u24(self.payload.0.len() as u32, &mut ret);
    self.payload.encode(&mut ret);
    ret
  }
}
