use msgs::enums::ProtocolVersion;
use suites::SupportedCipherSuite;

use time;

/// The authentication and resumption material agreed by a
/// handshake, and carried over to later connections by a
/// session ticket.
#[derive(Debug, Clone)]
pub struct Session {
  /// The negotiated cipher suite.  This fixes the PRF hash
  /// identity for everything derived from this session.
  pub suite: &'static SupportedCipherSuite,
  pub version: ProtocolVersion,
  pub master_secret: Vec<u8>,
  pub sid_ctx: Vec<u8>,

  /// The peer's certificate chain, DER-encoded, end entity
  /// first.  Opaque to this crate.
  pub peer_certificates: Vec<Vec<u8>>,
  pub alpn_protocol: Option<String>,

  pub ticket: Vec<u8>,
  pub ticket_age_add: u32,
  pub ticket_age_add_valid: bool,
  pub max_early_data_size: u32,

  /// Creation/renewal time, in seconds.
  pub time: u64,
  /// Lifetime from `time`, in seconds.
  pub timeout: u64,

  pub not_resumable: bool,
  pub session_reused: bool
}

fn timebase() -> u64 {
  time::get_time().sec as u64
}

impl Session {
  pub fn new(suite: &'static SupportedCipherSuite,
             version: ProtocolVersion,
             sid_ctx: Vec<u8>,
             timeout: u64) -> Session {
    Session {
      suite: suite,
      version: version,
      master_secret: Vec::new(),
      sid_ctx: sid_ctx,
      peer_certificates: Vec::new(),
      alpn_protocol: None,
      ticket: Vec::new(),
      ticket_age_add: 0,
      ticket_age_add_valid: false,
      max_early_data_size: 0,
      time: timebase(),
      timeout: timeout,
      not_resumable: false,
      session_reused: false
    }
  }

  /// Duplicate carrying only the fields relevant to
  /// authentication; resumption-only state (secret, ticket,
  /// early data allowance) starts afresh.
  pub fn dup_auth_only(&self) -> Session {
    let mut ret = Session::new(self.suite,
                               self.version,
                               self.sid_ctx.clone(),
                               self.timeout);
    ret.peer_certificates = self.peer_certificates.clone();
    ret
  }

  pub fn rebase_time(&mut self) {
    self.time = timebase();
  }

  /// Give the session a fresh lifetime starting now.
  pub fn renew(&mut self, timeout: u64) {
    self.timeout = timeout;
    self.rebase_time();
  }

  pub fn cap_timeout(&mut self, max: u64) {
    if self.timeout > max {
      self.timeout = max;
    }
  }
}
