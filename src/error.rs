use msgs::enums::HandshakeType;

use std::fmt;
use std::error::Error;

/// The reasons a TLS client handshake can fail.
#[derive(Debug, PartialEq, Clone)]
pub enum TLSError {
  /// We received a message we expected at a different point in
  /// the handshake.
  InappropriateMessage {
    expect_types: Vec<HandshakeType>,
    got_type: HandshakeType
  },

  /// The peer sent us a syntactically incorrect handshake
  /// payload.
  CorruptMessagePayload(HandshakeType),

  /// The peer didn't give us any certificates.
  NoCertificatesPresented,

  /// The peer violated the protocol: the relevant data is
  /// in the string.
  PeerMisbehavedError(String),

  /// The peer is only willing to talk in ways we won't.
  PeerIncompatibleError(String),

  /// A Finished message failed verification.
  DecryptError,

  /// General failure; the relevant data is in the string.
  General(String)
}

impl fmt::Display for TLSError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      TLSError::InappropriateMessage { ref expect_types, ref got_type } => {
        write!(f,
               "received unexpected handshake message: got {:?} when expecting {:?}",
               got_type,
               expect_types)
      }
      TLSError::CorruptMessagePayload(ref typ) => {
        write!(f, "received corrupt {:?} message", typ)
      }
      TLSError::PeerMisbehavedError(ref why) => {
        write!(f, "peer misbehaved: {}", why)
      }
      TLSError::PeerIncompatibleError(ref why) => {
        write!(f, "peer incompatible: {}", why)
      }
      TLSError::NoCertificatesPresented |
      TLSError::DecryptError => {
        write!(f, "{}", self.description())
      }
      TLSError::General(ref err) => write!(f, "error: {}", err)
    }
  }
}

impl Error for TLSError {
  fn description(&self) -> &str {
    match *self {
      TLSError::InappropriateMessage { .. } => "received unexpected message",
      TLSError::CorruptMessagePayload(_) => "received corrupt message",
      TLSError::NoCertificatesPresented => "peer sent no certificates",
      TLSError::PeerMisbehavedError(_) => "peer misbehaved",
      TLSError::PeerIncompatibleError(_) => "peer incompatible",
      TLSError::DecryptError => "cannot decrypt peer's message",
      TLSError::General(_) => "general error"
    }
  }
}

#[cfg(test)]
mod test {
  use super::TLSError;
  use msgs::enums::HandshakeType;

  #[test]
  fn errors_are_printable() {
    let err = TLSError::InappropriateMessage {
      expect_types: vec![HandshakeType::ServerHello],
      got_type: HandshakeType::HelloRetryRequest
    };
    assert!(format!("{}", err).contains("HelloRetryRequest"));

    let err = TLSError::PeerMisbehavedError("wrong curve for key share".to_string());
    assert!(format!("{}", err).contains("wrong curve"));
  }
}
