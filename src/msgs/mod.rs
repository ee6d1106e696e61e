#[macro_use]
mod macros;

pub mod codec;
pub mod base;
pub mod enums;
pub mod handshake;
