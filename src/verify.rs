use msgs::enums::SignatureScheme;
use error::TLSError;

/// What the peer certificate verifier concluded.  Retry means
/// the verification is running asynchronously: the handshake
/// suspends in place and must be re-driven once it concludes.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum CertVerifyResult {
  Valid,
  Invalid,
  Retry
}

/// The embedder's answer when asked to choose a client
/// certificate.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum CertSelectResult {
  Proceed,
  Retry,
  Fail
}

/// The signing oracle's answer for an outbound
/// CertificateVerify.
#[derive(Debug)]
pub enum SignResult {
  Signed(SignatureScheme, Vec<u8>),
  Retry,
  Failure
}

/// The certificate subsystem the handshake leans on.  Path
/// building, chain verification and private key operations all
/// live behind this; the handshake only sequences them.
pub trait CertificateSubsystem {
  /// Take the body of a Certificate message.  `required` is set
  /// when an anonymous server is unacceptable, which is always
  /// the case for a full TLS 1.3 handshake.
  fn process_server_certificate(&mut self,
                                payload: &[u8],
                                required: bool) -> Result<(), TLSError>;

  /// The peer's certificates, DER-encoded, as previously given
  /// to `process_server_certificate`.
  fn peer_certificates(&self) -> Vec<Vec<u8>>;

  /// Verify the previously processed chain.
  fn verify_peer_certificate(&mut self) -> CertVerifyResult;

  /// Check `sig` over `message` with the peer's end-entity
  /// public key.
  fn verify_signature(&mut self,
                      scheme: SignatureScheme,
                      message: &[u8],
                      sig: &[u8]) -> Result<(), TLSError>;

  /// The server asked for a client certificate; let the
  /// embedder pick one.
  fn select_client_certificate(&mut self) -> CertSelectResult;

  /// A certificate decision has been made; last chance for
  /// the embedder to veto the configuration.
  fn on_certificate_selected(&mut self) -> Result<(), TLSError>;

  /// Whether a client certificate (and key) is loaded.
  fn has_client_certificate(&self) -> bool;

  /// Produce the body of our Certificate message.  An empty
  /// certificate list is valid: it declines authentication.
  fn client_certificate_payload(&mut self) -> Result<Vec<u8>, TLSError>;

  /// Sign `message` for our CertificateVerify with a scheme
  /// drawn from `schemes`.
  fn sign_certificate_verify(&mut self,
                             schemes: &[SignatureScheme],
                             message: &[u8]) -> SignResult;
}

const SIGNING_CONTEXT_PREAMBLE: [u8; 64] = [0x20; 64];

fn construct_verify_message(context: &[u8], handshake_hash: &[u8]) -> Vec<u8> {
  let mut msg = Vec::new();
  msg.extend_from_slice(&SIGNING_CONTEXT_PREAMBLE);
  msg.extend_from_slice(context);
  msg.push(0x00);
  msg.extend_from_slice(handshake_hash);
  msg
}

/// The content covered by the server's CertificateVerify
/// signature, given the handshake hash at that point.
pub fn server_verify_message(handshake_hash: &[u8]) -> Vec<u8> {
  construct_verify_message(b"TLS 1.3, server CertificateVerify", handshake_hash)
}

/// Likewise for the CertificateVerify we send.
pub fn client_verify_message(handshake_hash: &[u8]) -> Vec<u8> {
  construct_verify_message(b"TLS 1.3, client CertificateVerify", handshake_hash)
}
