//! OSC packet model and wire encoding.

pub mod codec;
pub mod packet;

pub use packet::{OscArg, Packet};
