//! Wire transport abstraction.
//!
//! The `Transport` trait decouples the executor and scheduler from the
//! socket: tests plug in recording fakes, the host plugs in [`UdpTransport`].

pub mod udp;

pub use udp::UdpTransport;

use crate::error::Result;
use crate::osc::Packet;

/// Contract for anything that can put a [`Packet`] on the wire.
///
/// `send` is called concurrently from the scheduler thread and any number of
/// executor threads, so implementors must be `Sync`.
pub trait Transport: Send + Sync + 'static {
    /// Transmit one packet. A failure is final for this packet; callers never
    /// retry.
    fn send(&self, packet: &Packet) -> Result<()>;

    /// Assert or release the chatbox typing indicator.
    fn set_typing(&self, typing: bool) -> Result<()>;
}
