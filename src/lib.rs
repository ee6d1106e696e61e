//! # tls13-engine
//!
//! The client side of the TLS 1.3 handshake, as a pure state
//! machine.  This crate parses and emits handshake messages,
//! keeps the transcript hash, drives the key schedule, and
//! tells the record layer which traffic keys to install and
//! when.  It does no I/O, no record protection and no X.509
//! work itself: those arrive through the capability traits in
//! `record_layer`, `verify` and `client`.
//!
//! A connection drives the machine by calling
//! `ClientHandshake::handshake` repeatedly; each return value
//! names the external condition (more data, a flush, an
//! asynchronous private key or verifier, ...) to satisfy
//! before calling again.

/* Our dependencies:
 *
 * ring for cryptography.
 * untrusted for feeding ring.
 * time for session timestamps.
 * log for logging, optionally. */

extern crate ring;
extern crate untrusted;
extern crate time;

#[cfg(feature = "logging")]
#[macro_use]
extern crate log;

#[cfg(not(feature = "logging"))]
#[macro_use]
mod compile_out_log {
  macro_rules! trace ( ($($tt:tt)*) => {{}} );
  macro_rules! debug ( ($($tt:tt)*) => {{}} );
  macro_rules! info ( ($($tt:tt)*) => {{}} );
  macro_rules! warn ( ($($tt:tt)*) => {{}} );
}

#[macro_use]
pub mod msgs;
pub mod error;
pub mod hash_hs;
pub mod key_schedule;
pub mod suites;
pub mod session;
pub mod record_layer;
pub mod verify;
pub mod client;
mod client_hs;

pub use error::TLSError;
pub use session::Session;
pub use suites::{SupportedCipherSuite, KeyExchange, ALL_CIPHERSUITES};
pub use record_layer::{RecordAdapter, TrafficKeys};
pub use verify::{CertificateSubsystem, CertVerifyResult, CertSelectResult, SignResult};
pub use client::{ClientConfig, ClientHandshake, HandshakeEnv, HandshakeState, HsStatus};
pub use client::{ClientCallbacks, ClientHelloBuilder, ChannelIdKey, Tls13Variant};
pub use client_hs::TLS13_DRAFT_VERSION;
